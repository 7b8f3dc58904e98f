//! Default values for optional settings.

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 8000;

pub const DEFAULT_WEBHOOK_PATH: &str = "/callback";

pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";

/// Sliding-window size in user/assistant turns. `0` disables the window.
pub const DEFAULT_HISTORY_MAX_TURNS: usize = 10;

pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOG_LEVEL: &str = "info";
