//! Recording session state machine.
//!
//! The single authority on whether a session command is admissible. Holds
//! no process handle of its own, only the current state plus the session
//! metadata; the supervisor owns the process. All transitions go through
//! the methods here, never through direct writes.

use crate::{AppError, AppResult};

use std::mem;
use std::panic::Location;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use error_location::ErrorLocation;
use uuid::Uuid;

/// Metadata for the single live recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSession {
    /// Unique session ID for log correlation.
    pub id: Uuid,
    /// Destination file the transcoder writes.
    pub output_path: PathBuf,
    /// When recording started.
    pub started_at: Instant,
    /// When the current pause began, if paused.
    pub paused_at: Option<Instant>,
    /// Total time spent paused across the session.
    pub accumulated_pause: Duration,
}

impl RecordingSession {
    /// Open a new session writing to `output_path`.
    pub fn begin(output_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            output_path,
            started_at: Instant::now(),
            paused_at: None,
            accumulated_pause: Duration::ZERO,
        }
    }

    fn fold_pending_pause(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_pause += paused_at.elapsed();
        }
    }
}

/// Snapshot returned by the status command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStatus {
    /// A session is live (recording, paused, or stopping).
    pub recording: bool,
    /// The live session is currently paused.
    pub paused: bool,
    /// Destination of the live session, if any.
    pub output_path: Option<PathBuf>,
}

/// Lifecycle of the recording core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingState {
    /// No session live.
    Idle,
    /// Transcoder running and capturing.
    Recording(RecordingSession),
    /// Transcoder paused via the toggle byte.
    Paused(RecordingSession),
    /// Graceful stop issued, waiting for the exit observation.
    Stopping(RecordingSession),
}

impl RecordingState {
    /// True when no session is live.
    pub fn is_idle(&self) -> bool {
        matches!(self, RecordingState::Idle)
    }

    /// The live session's metadata, if any.
    pub fn session(&self) -> Option<&RecordingSession> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording(session)
            | RecordingState::Paused(session)
            | RecordingState::Stopping(session) => Some(session),
        }
    }

    /// Snapshot for the status command.
    pub fn status(&self) -> RecordingStatus {
        RecordingStatus {
            recording: !self.is_idle(),
            paused: matches!(self, RecordingState::Paused(_)),
            output_path: self.session().map(|session| session.output_path.clone()),
        }
    }

    /// Admit a new session. Valid from `Idle` only; a live session is never
    /// queued behind or silently replaced.
    ///
    /// # Errors
    ///
    /// [`AppError::AlreadyRecording`] when any session is live.
    #[track_caller]
    pub fn begin_recording(&mut self, session: RecordingSession) -> AppResult<()> {
        match self {
            RecordingState::Idle => {
                *self = RecordingState::Recording(session);
                Ok(())
            }
            _ => Err(AppError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Pause the live session, stamping the pause start.
    ///
    /// # Errors
    ///
    /// [`AppError::NoActiveRecording`] unless currently `Recording`.
    #[track_caller]
    pub fn pause(&mut self) -> AppResult<()> {
        match mem::replace(self, RecordingState::Idle) {
            RecordingState::Recording(mut session) => {
                session.paused_at = Some(Instant::now());
                *self = RecordingState::Paused(session);
                Ok(())
            }
            other => {
                *self = other;
                Err(AppError::NoActiveRecording {
                    operation: "pause",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Resume the paused session, folding the pause into the accumulated
    /// total.
    ///
    /// # Errors
    ///
    /// [`AppError::NoActiveRecording`] unless currently `Paused`.
    #[track_caller]
    pub fn resume(&mut self) -> AppResult<()> {
        match mem::replace(self, RecordingState::Idle) {
            RecordingState::Paused(mut session) => {
                session.fold_pending_pause();
                *self = RecordingState::Recording(session);
                Ok(())
            }
            other => {
                *self = other;
                Err(AppError::NoActiveRecording {
                    operation: "resume",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Enter `Stopping`, returning the session's output path for the stop
    /// reply. Valid from `Recording` or `Paused`; a pending pause is folded
    /// so the accumulated total is final.
    ///
    /// # Errors
    ///
    /// [`AppError::NoActiveRecording`] otherwise.
    #[track_caller]
    pub fn begin_stop(&mut self) -> AppResult<PathBuf> {
        match mem::replace(self, RecordingState::Idle) {
            RecordingState::Recording(session) => {
                let output_path = session.output_path.clone();
                *self = RecordingState::Stopping(session);
                Ok(output_path)
            }
            RecordingState::Paused(mut session) => {
                session.fold_pending_pause();
                let output_path = session.output_path.clone();
                *self = RecordingState::Stopping(session);
                Ok(output_path)
            }
            other => {
                *self = other;
                Err(AppError::NoActiveRecording {
                    operation: "stop",
                    location: ErrorLocation::from(Location::caller()),
                })
            }
        }
    }

    /// Close whatever session is live and return to `Idle`.
    ///
    /// Driven by the supervisor's exit observation, which always wins:
    /// solicited or not, an observed exit ends the session.
    pub fn complete(&mut self) -> Option<RecordingSession> {
        match mem::replace(self, RecordingState::Idle) {
            RecordingState::Idle => None,
            RecordingState::Recording(mut session) | RecordingState::Paused(mut session) => {
                session.fold_pending_pause();
                Some(session)
            }
            RecordingState::Stopping(session) => Some(session),
        }
    }
}
