use crate::{CaptureError, CoreResult};

use std::panic::Location;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Logical description of one capture session. Immutable once a start
/// command accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureIntent {
    /// 0-based index of the display to capture. The argument builder
    /// translates this to whatever addressing the target platform uses.
    pub display_index: u32,
    /// Include an audio track in the recording.
    pub record_audio: bool,
    /// Push to a network target while also writing the local file.
    pub push_stream: bool,
    /// Stream URI; required (non-empty) when `push_stream` is set.
    pub stream_target: Option<String>,
}

impl CaptureIntent {
    /// Screen-only intent for the given display: no audio, no stream push.
    pub fn screen(display_index: u32) -> Self {
        Self {
            display_index,
            record_audio: false,
            push_stream: false,
            stream_target: None,
        }
    }

    /// Check the intent's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidIntent`] when `push_stream` is set
    /// without a non-empty `stream_target`.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        if self.push_stream
            && self
                .stream_target
                .as_deref()
                .is_none_or(|target| target.trim().is_empty())
        {
            return Err(CaptureError::InvalidIntent {
                reason: "push_stream requires a non-empty stream_target".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

/// Capture platforms the argument builder understands.
///
/// Passed explicitly rather than read from ambient state so argument
/// construction stays pure and unit-testable on every host. The Linux
/// variant carries its display-server target for the same reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Windows: gdigrab against the `desktop` pseudo-device.
    Windows,
    /// macOS: AVFoundation, 1-based device addressing.
    MacOs,
    /// Linux: x11grab against the given display-server target (e.g. `:0`).
    Linux {
        /// X display string, screen suffix excluded.
        display: String,
    },
}

impl Platform {
    /// Detect the platform of the running host.
    ///
    /// On Linux the display target is read from `$DISPLAY` once, here,
    /// defaulting to `:0` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::UnsupportedPlatform`] on any other OS;
    /// guessing a capture subsystem would crash far from the real cause.
    #[track_caller]
    pub fn current() -> CoreResult<Self> {
        if cfg!(target_os = "windows") {
            Ok(Platform::Windows)
        } else if cfg!(target_os = "macos") {
            Ok(Platform::MacOs)
        } else if cfg!(target_os = "linux") {
            let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0".to_string());
            Ok(Platform::Linux { display })
        } else {
            Err(CaptureError::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
