use crate::{
    AppCommand, AppError, AppEvent, AppResult, Controller, RecordingSession, RecordingState,
    config::Config,
};

use std::panic::Location;
use std::path::PathBuf;
use std::time::Duration;

use classcast_core::{
    CaptureEvent, CaptureIntent, CaptureSupervisor, CapabilityReport, DEFAULT_GRACE_PERIOD,
    Platform, allocate_output_path, build_args, diagnose, diagnostic_prefix, is_executable,
    probe_capability, resolve_transcoder,
};
use error_location::ErrorLocation;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// Application actor: owns the supervisor and the recording state machine.
///
/// Runs a single `tokio::select!` loop over the command channel and the
/// supervisor's event channel, so every check-then-act on the state machine
/// happens inside one mutual-exclusion boundary: two racing `start` calls
/// serialize through the command channel and the second is rejected.
pub struct App {
    config: Config,
    state: RecordingState,
    supervisor: CaptureSupervisor,
    command_rx: mpsc::Receiver<AppCommand>,
    capture_rx: mpsc::Receiver<CaptureEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Build the actor and its caller-facing controller.
    ///
    /// # Errors
    ///
    /// Platform directories unavailable for the session-log path.
    pub fn new(config: Config, event_tx: mpsc::Sender<AppEvent>) -> AppResult<(Self, Controller)> {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (capture_tx, capture_rx) = mpsc::channel(256);

        let session_log_dir = config.session_log_dir()?;
        let supervisor = CaptureSupervisor::new(capture_tx, session_log_dir);

        let app = Self {
            config,
            state: RecordingState::Idle,
            supervisor,
            command_rx,
            capture_rx,
            event_tx,
        };

        Ok((app, Controller::new(command_tx)))
    }

    /// Run the actor event loop until shutdown.
    ///
    /// # Errors
    ///
    /// Currently infallible at the loop level; the signature leaves room
    /// for startup failures surfaced by future wiring.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> AppResult<()> {
        info!("Classcast core starting");

        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if self.handle_command(command).await {
                        break;
                    }
                }

                Some(event) = self.capture_rx.recv() => {
                    self.handle_capture_event(event).await;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.finish().await;
        info!("Classcast core shut down");

        Ok(())
    }

    /// Dispatch one command; returns true on shutdown.
    async fn handle_command(&mut self, command: AppCommand) -> bool {
        match command {
            AppCommand::Start { intent, reply } => {
                let result = self.start_recording(intent).await;
                if let Err(error) = &result {
                    warn!(%error, "Start rejected");
                }
                let _ = reply.send(result);
            }
            AppCommand::Pause { reply } => {
                let _ = reply.send(self.pause_recording().await);
            }
            AppCommand::Resume { reply } => {
                let _ = reply.send(self.resume_recording().await);
            }
            AppCommand::Stop { reply } => {
                let result = self.stop_recording().await;
                if let Err(error) = &result {
                    warn!(%error, "Stop rejected");
                }
                let _ = reply.send(result);
            }
            AppCommand::Status { reply } => {
                let _ = reply.send(self.state.status());
            }
            AppCommand::TestCapability { reply } => {
                let _ = reply.send(self.test_capability().await);
            }
            AppCommand::Shutdown => {
                info!("Shutdown requested");
                return true;
            }
        }
        false
    }

    /// Start a recording session: resolve, allocate, build, spawn.
    #[instrument(skip(self, intent))]
    async fn start_recording(&mut self, intent: CaptureIntent) -> AppResult<PathBuf> {
        if !self.state.is_idle() {
            return Err(AppError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        intent.validate().map_err(AppError::from)?;

        // Re-resolved every session: installation state can change between
        // recordings, so a cached path would go stale.
        let executable = self.resolve_transcoder()?;
        let platform = Platform::current().map_err(AppError::from)?;

        let output_dir = self.config.recordings_dir()?;
        let output_path = allocate_output_path(&output_dir).map_err(AppError::from)?;

        let mut args = diagnostic_prefix();
        args.extend(build_args(&intent, &platform, &output_path).map_err(AppError::from)?);

        let pid = self
            .supervisor
            .start(&executable, &args)
            .await
            .map_err(AppError::from)?;

        let session = RecordingSession::begin(output_path.clone());
        info!(
            session_id = %session.id,
            pid,
            output = %output_path.display(),
            "Recording started"
        );
        self.state.begin_recording(session)?;

        Ok(output_path)
    }

    /// Transcoder path: config override first, fallback probes otherwise.
    fn resolve_transcoder(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.config.capture.transcoder_path {
            if is_executable(path) {
                return Ok(path.clone());
            }
            return Err(AppError::ConfigError {
                reason: format!(
                    "configured transcoder at {} is missing or not executable; \
                     fix capture.transcoder_path or remove it to re-enable probing",
                    path.display()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        resolve_transcoder().map_err(AppError::from)
    }

    #[instrument(skip(self))]
    async fn pause_recording(&mut self) -> AppResult<()> {
        self.state.pause()?;
        // Fire-and-forget toggle; the transcoder holds the authoritative
        // toggle state.
        self.supervisor
            .send_control(classcast_core::control::PAUSE_TOGGLE)
            .await;
        info!("Recording paused");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resume_recording(&mut self) -> AppResult<()> {
        self.state.resume()?;
        self.supervisor
            .send_control(classcast_core::control::PAUSE_TOGGLE)
            .await;
        info!("Recording resumed");
        Ok(())
    }

    /// Begin the two-phase stop. Replies immediately with the output path;
    /// the exit observation arrives later as a [`AppEvent::SessionEnded`].
    #[instrument(skip(self))]
    async fn stop_recording(&mut self) -> AppResult<PathBuf> {
        let output_path = self.state.begin_stop()?;
        self.supervisor.stop().await;
        info!(output = %output_path.display(), "Stop requested");
        Ok(output_path)
    }

    #[instrument(skip(self))]
    async fn test_capability(&self) -> AppResult<CapabilityReport> {
        let executable = self.resolve_transcoder()?;
        let platform = Platform::current().map_err(AppError::from)?;
        probe_capability(&executable, &platform)
            .await
            .map_err(AppError::from)
    }

    /// Handle one supervisor event. The exit observation always drives the
    /// state machine back to `Idle`, regardless of how termination
    /// happened.
    async fn handle_capture_event(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::Output { level, line } => {
                if self
                    .event_tx
                    .send(AppEvent::Diagnostic { level, line })
                    .await
                    .is_err()
                {
                    debug!("Event channel closed, diagnostic dropped");
                }
            }
            CaptureEvent::Exited(outcome) => {
                let solicited = matches!(self.state, RecordingState::Stopping(_));
                let session = self.state.complete();
                let diagnosis = diagnose(&outcome);

                match (&session, solicited) {
                    (Some(session), true) => info!(
                        session_id = %session.id,
                        exit_code = ?outcome.exit_code,
                        duration_ms = session.started_at.elapsed().as_millis(),
                        paused_ms = session.accumulated_pause.as_millis(),
                        "Recording finished"
                    ),
                    (Some(session), false) => warn!(
                        session_id = %session.id,
                        exit_code = ?outcome.exit_code,
                        signal = ?outcome.signal,
                        duration_ms = session.started_at.elapsed().as_millis(),
                        diagnosis = %diagnosis.summary,
                        "Transcoder exited unsolicited"
                    ),
                    (None, _) => debug!("Exit observed with no live session"),
                }

                if !outcome.is_clean() {
                    error!(
                        diagnosis = %diagnosis.summary,
                        remediation = ?diagnosis.remediation,
                        "Session ended abnormally"
                    );
                }

                let notification = AppEvent::SessionEnded {
                    session_id: session.as_ref().map(|s| s.id),
                    output_path: session.map(|s| s.output_path),
                    outcome,
                    diagnosis,
                };
                if self.event_tx.send(notification).await.is_err() {
                    debug!("Event channel closed, exit notification dropped");
                }
            }
        }
    }

    /// Drain on shutdown: stop any live session and wait (bounded) for its
    /// exit so the session log gets flushed.
    async fn finish(&mut self) {
        if self.state.is_idle() {
            return;
        }

        info!("Live session at shutdown, stopping transcoder");
        if !matches!(self.state, RecordingState::Stopping(_)) {
            if let Err(error) = self.stop_recording().await {
                warn!(%error, "Stop at shutdown failed");
                return;
            }
        }

        let deadline = DEFAULT_GRACE_PERIOD + Duration::from_secs(2);
        let drained = tokio::time::timeout(deadline, async {
            while let Some(event) = self.capture_rx.recv().await {
                let exited = matches!(event, CaptureEvent::Exited(_));
                self.handle_capture_event(event).await;
                if exited {
                    break;
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("Transcoder did not exit before the shutdown deadline");
        }
    }
}
