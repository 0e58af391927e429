//! Caller-facing handle for the application actor.
//!
//! The UI collaborator holds a [`Controller`] and drives the whole command
//! surface through it. Each call enqueues a command with a oneshot reply
//! and awaits the answer; racing calls serialize through the actor's
//! command channel, which is the single mutual-exclusion boundary.

use crate::{AppCommand, AppError, AppResult, RecordingStatus};

use std::panic::Location;
use std::path::PathBuf;

use classcast_core::{CaptureIntent, CapabilityReport};
use error_location::ErrorLocation;
use tokio::sync::{mpsc, oneshot};

/// Cloneable handle the UI uses to drive the recorder.
#[derive(Clone)]
pub struct Controller {
    command_tx: mpsc::Sender<AppCommand>,
}

impl Controller {
    pub(crate) fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Start a recording session, returning its output path.
    ///
    /// # Errors
    ///
    /// `AlreadyRecording` when a session is live; resolution and launch
    /// failures surface here synchronously.
    pub async fn start(&self, intent: CaptureIntent) -> AppResult<PathBuf> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::Start {
            intent,
            reply: reply_tx,
        })
        .await?;
        Self::await_reply(reply_rx).await?
    }

    /// Pause the live session.
    ///
    /// # Errors
    ///
    /// `NoActiveRecording` unless a session is recording.
    pub async fn pause(&self) -> AppResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::Pause { reply: reply_tx }).await?;
        Self::await_reply(reply_rx).await?
    }

    /// Resume the paused session.
    ///
    /// # Errors
    ///
    /// `NoActiveRecording` unless a session is paused.
    pub async fn resume(&self) -> AppResult<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::Resume { reply: reply_tx }).await?;
        Self::await_reply(reply_rx).await?
    }

    /// Gracefully stop the live session, returning its output path. The
    /// exit itself arrives later as an [`crate::AppEvent::SessionEnded`].
    ///
    /// # Errors
    ///
    /// `NoActiveRecording` when nothing is live.
    pub async fn stop(&self) -> AppResult<PathBuf> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::Stop { reply: reply_tx }).await?;
        Self::await_reply(reply_rx).await?
    }

    /// Snapshot of the current recording state.
    ///
    /// # Errors
    ///
    /// Only when the actor is gone.
    pub async fn status(&self) -> AppResult<RecordingStatus> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::Status { reply: reply_tx }).await?;
        Self::await_reply(reply_rx).await
    }

    /// Probe the transcoder: resolution, a version invocation, and device
    /// enumeration where the platform supports it.
    ///
    /// # Errors
    ///
    /// Resolution failures and probe invocation failures.
    pub async fn test_capability(&self) -> AppResult<CapabilityReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(AppCommand::TestCapability { reply: reply_tx })
            .await?;
        Self::await_reply(reply_rx).await?
    }

    /// Ask the actor to stop any live session and shut down.
    ///
    /// # Errors
    ///
    /// Only when the actor is already gone.
    pub async fn shutdown(&self) -> AppResult<()> {
        self.send(AppCommand::Shutdown).await
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|error| AppError::ChannelSendFailed {
                message: format!("actor command channel closed: {error}"),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    async fn await_reply<T>(reply_rx: oneshot::Receiver<T>) -> AppResult<T> {
        reply_rx.await.map_err(|_| AppError::ChannelSendFailed {
            message: "actor dropped the reply channel".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
