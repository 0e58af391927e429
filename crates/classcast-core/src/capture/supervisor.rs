//! Transcoder process supervision.
//!
//! Owns the single active child process. Three independent event sources
//! run concurrently per child and never block one another: caller commands
//! arrive on the supervisor itself, two reader tasks drain stdout/stderr
//! from spawn to exit (so the pipe buffers can never fill and stall the
//! encoder), and a waiter task observes the exit. The waiter emits exactly
//! one [`CaptureEvent::Exited`] per child, after the readers are joined and
//! the session diagnostics are flushed to disk.

use crate::capture::exit::{ExitOutcome, LaunchFailureKind};
use crate::capture::output::local_stamp;
use crate::{CaptureError, CoreResult};

use std::{
    ffi::OsString,
    panic::Location,
    path::{Path, PathBuf},
    process::Stdio,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, Command},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

/// Control bytes understood by the transcoder's interactive command reader.
pub mod control {
    /// Graceful quit: the transcoder flushes trailing frames and finalizes
    /// the container before exiting.
    pub const QUIT: u8 = b'q';
    /// Pause/resume toggle. The same byte both directions; the transcoder
    /// holds the authoritative toggle state.
    pub const PAUSE_TOGGLE: u8 = b'p';
}

/// Default bounded wait between the graceful-quit byte and the forced kill.
///
/// Long enough for the encoder to flush trailing frames and finalize the
/// container; short enough that a wedged process cannot hang shutdown.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Severity assigned to a transcoder output line by [`classify_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Line matched an error keyword.
    Error,
    /// Line matched a warning keyword.
    Warning,
    /// Everything else, including progress lines.
    Debug,
}

/// Events pushed by the supervisor, uncorrelated with any request.
#[derive(Debug)]
pub enum CaptureEvent {
    /// One non-empty line of transcoder output.
    Output {
        /// Heuristic severity of the line.
        level: OutputLevel,
        /// The line, trailing whitespace stripped.
        line: String,
    },
    /// The child exited. Fired exactly once per child, whether it exited on
    /// its own, was quit gracefully, or was force-killed.
    Exited(ExitOutcome),
}

/// Classify a transcoder output line by keyword.
///
/// A documented heuristic, not a guaranteed classifier: case-insensitive
/// `error`/`failed` marks a line error-level, `warning` warning-level,
/// everything else debug-level.
pub fn classify_line(line: &str) -> OutputLevel {
    let lower = line.to_lowercase();
    if lower.contains("error") || lower.contains("failed") {
        OutputLevel::Error
    } else if lower.contains("warning") {
        OutputLevel::Warning
    } else {
        OutputLevel::Debug
    }
}

struct ActiveChild {
    pid: u32,
    /// Kept for control bytes; the child itself lives in the waiter task.
    stdin: Option<ChildStdin>,
    kill_tx: mpsc::Sender<()>,
    kill_armed: bool,
    done: Arc<AtomicBool>,
}

/// Supervises at most one transcoder child process at a time.
///
/// The OS process handle is owned exclusively by the supervisor's waiter
/// task; callers see only the pid and a liveness query.
pub struct CaptureSupervisor {
    event_tx: mpsc::Sender<CaptureEvent>,
    session_log_dir: PathBuf,
    grace_period: Duration,
    active: Option<ActiveChild>,
}

impl CaptureSupervisor {
    /// Create a supervisor pushing events into `event_tx` and flushing
    /// per-session diagnostic logs under `session_log_dir`.
    pub fn new(event_tx: mpsc::Sender<CaptureEvent>, session_log_dir: PathBuf) -> Self {
        Self {
            event_tx,
            session_log_dir,
            grace_period: DEFAULT_GRACE_PERIOD,
            active: None,
        }
    }

    /// Override the graceful-stop window.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// True while a supervised child is live.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.done.load(Ordering::Acquire))
    }

    /// Pid of the live child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.active
            .as_ref()
            .filter(|active| !active.done.load(Ordering::Acquire))
            .map(|active| active.pid)
    }

    /// Spawn the transcoder and begin forwarding its output.
    ///
    /// stdin/stdout/stderr are all piped, never inherited, so output is
    /// intercepted rather than mixed into the host console. The environment
    /// is inherited with the executable's directory appended to `PATH`.
    ///
    /// # Errors
    ///
    /// [`CaptureError::AlreadyRunning`] when a child is live;
    /// [`CaptureError::LaunchFailed`] when the spawn call fails, classified
    /// per [`LaunchFailureKind`].
    #[instrument(skip(self, args))]
    pub async fn start(&mut self, executable: &Path, args: &[String]) -> CoreResult<u32> {
        if let Some(active) = &self.active {
            if !active.done.load(Ordering::Acquire) {
                return Err(CaptureError::AlreadyRunning {
                    pid: active.pid,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        info!(executable = %executable.display(), ?args, "Spawning transcoder");

        let mut child = Command::new(executable)
            .args(args)
            .env("PATH", augmented_path(executable))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                let kind = LaunchFailureKind::from_io(&source);
                error!(%kind, error = %source, "Transcoder launch failed");
                CaptureError::LaunchFailed {
                    kind,
                    source,
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        // id() is None only once the child has been reaped, which cannot
        // have happened yet; 0 is a harmless placeholder if it somehow has.
        let pid = child.id().unwrap_or(0);

        let stdin = child.stdin.take();
        let diagnostics: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(
                stdout,
                self.event_tx.clone(),
                Arc::clone(&diagnostics),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(
                stderr,
                self.event_tx.clone(),
                Arc::clone(&diagnostics),
            ));
        }

        let (kill_tx, kill_rx) = mpsc::channel(1);
        let done = Arc::new(AtomicBool::new(false));
        let session_log = self
            .session_log_dir
            .join(format!("capture_{}.log", local_stamp()));

        tokio::spawn(wait_for_exit(
            child,
            kill_rx,
            readers,
            diagnostics,
            self.event_tx.clone(),
            session_log,
            Arc::clone(&done),
            pid,
        ));

        self.active = Some(ActiveChild {
            pid,
            stdin,
            kill_tx,
            kill_armed: false,
            done,
        });

        info!(pid, "Transcoder started");
        Ok(pid)
    }

    /// Best-effort single-byte write to the child's input stream.
    ///
    /// A no-op, not an error, when no child is live or the stream has
    /// closed: control bytes are signals to a process that may have already
    /// exited.
    #[instrument(skip(self))]
    pub async fn send_control(&mut self, byte: u8) {
        let Some(active) = self.active.as_mut() else {
            debug!("No active transcoder, control byte dropped");
            return;
        };
        let Some(stdin) = active.stdin.as_mut() else {
            debug!("Transcoder stdin already closed, control byte dropped");
            return;
        };

        let mut stream_gone = false;
        if let Err(error) = stdin.write_all(&[byte]).await {
            debug!(%error, "Control byte write failed");
            stream_gone = true;
        } else if let Err(error) = stdin.flush().await {
            debug!(%error, "Control byte flush failed");
            stream_gone = true;
        }
        if stream_gone {
            active.stdin = None;
        }
    }

    /// Two-phase stop: graceful-quit byte now, unconditional kill if the
    /// child has not exited when the grace period elapses.
    ///
    /// The encoder needs the graceful phase to flush trailing frames and
    /// finalize the container; the bounded kill keeps a wedged process from
    /// hanging forever. Not revocable once called, and the armed kill
    /// fallback fires at most once.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) {
        self.send_control(control::QUIT).await;

        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.kill_armed {
            debug!(pid = active.pid, "Forced-kill fallback already armed");
            return;
        }
        active.kill_armed = true;

        let kill_tx = active.kill_tx.clone();
        let grace_period = self.grace_period;
        tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            // Receiver gone means the child exited inside the window.
            let _ = kill_tx.send(()).await;
        });
    }
}

/// Inherited `PATH` with the executable's directory appended, so helper
/// binaries shipped next to the transcoder resolve.
fn augmented_path(executable: &Path) -> OsString {
    let mut paths: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    if let Some(dir) = executable.parent() {
        if !dir.as_os_str().is_empty() {
            paths.push(dir.to_path_buf());
        }
    }
    std::env::join_paths(paths)
        .unwrap_or_else(|_| std::env::var_os("PATH").unwrap_or_default())
}

/// Drain one output stream line-by-line for the child's entire lifetime.
///
/// Every non-empty line is classified, buffered for the session log, and
/// forwarded as an event. Draining continues even if the event receiver is
/// gone, otherwise the child's pipe buffer fills and stalls it.
fn spawn_line_reader<R>(
    stream: R,
    event_tx: mpsc::Sender<CaptureEvent>,
    diagnostics: Arc<Mutex<Vec<String>>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut receiver_open = true;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim_end().to_string();
                    if line.trim().is_empty() {
                        continue;
                    }

                    let level = classify_line(&line);
                    match level {
                        OutputLevel::Error => error!(line = %line, "Transcoder output"),
                        OutputLevel::Warning => warn!(line = %line, "Transcoder output"),
                        OutputLevel::Debug => debug!(line = %line, "Transcoder output"),
                    }

                    diagnostics
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(line.clone());

                    if receiver_open
                        && event_tx
                            .send(CaptureEvent::Output { level, line })
                            .await
                            .is_err()
                    {
                        receiver_open = false;
                    }
                }
                Ok(None) => break,
                Err(error) => {
                    debug!(%error, "Transcoder output stream read failed");
                    break;
                }
            }
        }
    })
}

/// Observe the child's exit: join the drain tasks, flush the session log,
/// then emit the single exit notification.
#[allow(clippy::too_many_arguments)]
async fn wait_for_exit(
    mut child: Child,
    mut kill_rx: mpsc::Receiver<()>,
    readers: Vec<JoinHandle<()>>,
    diagnostics: Arc<Mutex<Vec<String>>>,
    event_tx: mpsc::Sender<CaptureEvent>,
    session_log: PathBuf,
    done: Arc<AtomicBool>,
    pid: u32,
) {
    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(()) = kill_rx.recv() => {
                warn!(pid, "Graceful stop window elapsed, sending kill signal");
                if let Err(error) = child.start_kill() {
                    warn!(pid, %error, "Kill signal failed, child may have already exited");
                }
            }
        }
    };

    // Join the readers first so the buffer holds every line the child wrote.
    for reader in readers {
        let _ = reader.await;
    }

    let lines = diagnostics
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();

    let outcome = match status {
        Ok(status) => ExitOutcome::from_status(status, lines),
        Err(error) => {
            error!(pid, %error, "Failed to observe transcoder exit");
            ExitOutcome {
                exit_code: None,
                signal: None,
                diagnostics: lines,
            }
        }
    };

    // Flush before the notification so a listener reacting to the exit
    // always finds the log artifact on disk.
    flush_session_log(&session_log, &outcome);
    done.store(true, Ordering::Release);

    info!(
        pid,
        exit_code = ?outcome.exit_code,
        signal = ?outcome.signal,
        "Transcoder exited"
    );

    if event_tx.send(CaptureEvent::Exited(outcome)).await.is_err() {
        debug!(pid, "Event channel closed, exit notification dropped");
    }
}

/// Write the session's buffered diagnostics to its dedicated log artifact,
/// independent of the main log stream. Best-effort: a failed flush is
/// logged, never fatal.
fn flush_session_log(path: &Path, outcome: &ExitOutcome) {
    if outcome.diagnostics.is_empty() {
        debug!("No session diagnostics to flush");
        return;
    }

    if let Some(parent) = path.parent() {
        if let Err(error) = std::fs::create_dir_all(parent) {
            warn!(path = %path.display(), %error, "Could not create session log directory");
            return;
        }
    }

    let mut contents = outcome.diagnostics.join("\n");
    contents.push('\n');

    match std::fs::write(path, contents) {
        Ok(()) => info!(
            path = %path.display(),
            lines = outcome.diagnostics.len(),
            "Session diagnostics flushed"
        ),
        Err(error) => warn!(path = %path.display(), %error, "Session diagnostics flush failed"),
    }
}
