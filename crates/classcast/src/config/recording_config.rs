use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Recording destination configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Recordings directory (None = platform data dir + "recordings").
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}
