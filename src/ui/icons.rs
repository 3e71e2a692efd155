pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const FILE: &str = "📄";
    pub const FOLDER: &str = "📁";
    pub const LINK: &str = "🔗";
    pub const ARROW: &str = "➡️";
    pub const PLUG: &str = "🔌";
    pub const GEAR: &str = "⚙️";
    pub const CLOCK: &str = "⏱️";
    pub const CYCLE: &str = "🔁";
}
