use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log artifact configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Per-session transcoder diagnostic log directory
    /// (None = platform data dir + "logs/sessions").
    #[serde(default)]
    pub session_log_dir: Option<PathBuf>,
}
