use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Transcoder location configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Explicit transcoder executable. None = probe the fallback strategies
    /// at every start.
    #[serde(default)]
    pub transcoder_path: Option<PathBuf>,
}
