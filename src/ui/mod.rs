pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    dim, error, header, info, move_line, muted, phase, section, status, success, violation_line,
    warn, warning_line,
};
pub use progress::ProgressManager;
pub use table::{moves_table, substitutions_table, summary_table};
pub use theme::{theme, Theme};
