use crate::capture::exit::LaunchFailureKind;

use error_location::ErrorLocation;
use thiserror::Error;

/// Capture-supervision errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No usable transcoder executable was found by any probe strategy.
    #[error("transcoder not found: {remediation} {location}")]
    TranscoderNotFound {
        /// What the caller can do about it.
        remediation: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The running host is not one of the supported capture platforms.
    #[error("unsupported platform: {os} {location}")]
    UnsupportedPlatform {
        /// OS name reported by the runtime.
        os: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capture intent violated its own invariants.
    #[error("invalid capture intent: {reason} {location}")]
    InvalidIntent {
        /// Description of the violated invariant.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A supervised transcoder process is already live.
    #[error("a capture process is already running (pid {pid}) {location}")]
    AlreadyRunning {
        /// Pid of the live process.
        pid: u32,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The spawn call itself failed.
    #[error("failed to launch transcoder: {kind} {location}")]
    LaunchFailed {
        /// Classification of the OS error, with remediation.
        kind: LaunchFailureKind,
        /// Underlying OS error from the spawn call.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A capability probe invocation failed or timed out.
    #[error("capability probe failed: {reason} {location}")]
    ProbeFailed {
        /// Description of the probe failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// IO error from filesystem operations.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

// Manual From with location tracking; #[from] does not support extra fields.
impl From<std::io::Error> for CaptureError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CaptureError::Io {
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
