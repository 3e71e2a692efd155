use indicatif::{MultiProgress, ProgressBar};

pub struct ProgressManager {
    mp: MultiProgress,
    indexing: ProgressBar,
}

impl ProgressManager {
    pub fn new() -> Self {
        let mp = MultiProgress::new();

        let indexing = mp.add(ProgressBar::new(0).with_message("Indexing files"));
        let indexing = if console::Term::stdout().is_term() {
            indexing
        } else {
            ProgressBar::hidden()
        };

        Self { mp, indexing }
    }

    /// Bar driven by the indexer; its length is set once the walk is done
    pub fn indexing(&self) -> &ProgressBar {
        &self.indexing
    }

    pub fn clear(&self) {
        self.mp.clear().ok();
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}
