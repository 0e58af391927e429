use crate::{AppResult, RecordingStatus};

use std::path::PathBuf;

use classcast_core::{CaptureIntent, CapabilityReport};
use tokio::sync::oneshot;

/// Commands sent from the controller to the application actor.
///
/// All request/response commands carry a oneshot reply channel; the actor
/// answers after the state machine has admitted or rejected the command.
#[derive(Debug)]
pub enum AppCommand {
    /// Start a new recording session.
    Start {
        /// What to capture.
        intent: CaptureIntent,
        /// Replies with the allocated output path.
        reply: oneshot::Sender<AppResult<PathBuf>>,
    },
    /// Pause the live session.
    Pause {
        /// Replies once the toggle byte has been sent.
        reply: oneshot::Sender<AppResult<()>>,
    },
    /// Resume the paused session.
    Resume {
        /// Replies once the toggle byte has been sent.
        reply: oneshot::Sender<AppResult<()>>,
    },
    /// Gracefully stop the live session.
    Stop {
        /// Replies with the session's output path; the exit itself arrives
        /// later as an event.
        reply: oneshot::Sender<AppResult<PathBuf>>,
    },
    /// Snapshot of the current recording state.
    Status {
        /// Replies with the snapshot.
        reply: oneshot::Sender<RecordingStatus>,
    },
    /// Probe the transcoder: resolution, version, device enumeration.
    TestCapability {
        /// Replies with the probe report.
        reply: oneshot::Sender<AppResult<CapabilityReport>>,
    },
    /// Stop any live session and end the actor loop.
    Shutdown,
}
