use crate::{CaptureError, CaptureEvent, CaptureSupervisor, ExitOutcome, OutputLevel, classify_line};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;

/// WHAT: Known sample lines classify by the keyword heuristic
/// WHY: The heuristic is documented behavior; completeness is not claimed
#[test]
fn given_sample_lines_when_classifying_then_expected_levels() {
    assert_eq!(
        classify_line("Error while opening encoder for output stream #0:0"),
        OutputLevel::Error
    );
    assert_eq!(
        classify_line("FAILED to configure the capture device"),
        OutputLevel::Error
    );
    assert_eq!(
        classify_line("deprecated pixel format used, Warning: make sure you know what you do"),
        OutputLevel::Warning
    );
    assert_eq!(
        classify_line("frame=  123 fps= 30 q=23.0 size=1024kB time=00:00:04.10"),
        OutputLevel::Debug
    );
    assert_eq!(
        classify_line("Stream mapping: Stream #0:0 -> #0:0 (rawvideo -> h264)"),
        OutputLevel::Debug
    );
}

#[cfg(unix)]
mod unix {
    use super::*;

    fn scratch_log_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "classcast-supervisor-{}-{name}",
            std::process::id()
        ))
    }

    #[allow(clippy::unwrap_used)]
    async fn wait_for_exit(event_rx: &mut mpsc::Receiver<CaptureEvent>) -> ExitOutcome {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), event_rx.recv())
                .await
                .unwrap()
                .unwrap();
            if let CaptureEvent::Exited(outcome) = event {
                return outcome;
            }
        }
    }

    /// WHAT: Output lines are drained, classified, and flushed to the
    /// session log before the exit notification fires
    /// WHY: A listener reacting to the exit must find the artifact on disk
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn given_child_emitting_error_line_when_exiting_then_event_and_log() {
        // Given: A supervisor over a shell child that prints one error line
        let log_dir = scratch_log_dir("diagnostics");
        let _ = std::fs::remove_dir_all(&log_dir);
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut supervisor = CaptureSupervisor::new(event_tx, log_dir.clone());

        let args = vec![
            "-c".to_string(),
            "echo 'Error while opening encoder' 1>&2; exit 1".to_string(),
        ];

        // When: Starting and letting it exit on its own
        let pid = supervisor
            .start("/bin/sh".as_ref(), &args)
            .await
            .unwrap();
        assert!(pid > 0);

        let mut saw_error_line = false;
        let outcome = loop {
            let event = tokio::time::timeout(Duration::from_secs(10), event_rx.recv())
                .await
                .unwrap()
                .unwrap();
            match event {
                CaptureEvent::Output { level, line } => {
                    if level == OutputLevel::Error && line.contains("opening encoder") {
                        saw_error_line = true;
                    }
                }
                CaptureEvent::Exited(outcome) => break outcome,
            }
        };

        // Then: Classified event seen, real exit code captured, log flushed
        assert!(saw_error_line);
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(outcome.signal, None);
        assert!(
            outcome
                .diagnostics
                .iter()
                .any(|line| line.contains("opening encoder"))
        );
        assert!(!supervisor.is_running());

        let mut log_files = std::fs::read_dir(&log_dir).unwrap();
        let entry = log_files.next().unwrap().unwrap();
        let contents = std::fs::read_to_string(entry.path()).unwrap();
        assert!(contents.contains("opening encoder"));

        let _ = std::fs::remove_dir_all(&log_dir);
    }

    /// WHAT: start while a child is live fails fast and spawns nothing
    /// WHY: Exactly one supervised process may exist at a time
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn given_live_child_when_starting_again_then_already_running() {
        // Given: A long-running child under supervision
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut supervisor = CaptureSupervisor::new(event_tx, scratch_log_dir("already"))
            .with_grace_period(Duration::from_millis(100));

        let args = vec!["-c".to_string(), "exec sleep 30".to_string()];
        supervisor.start("/bin/sh".as_ref(), &args).await.unwrap();
        assert!(supervisor.is_running());

        // When: Starting again
        let second = supervisor.start("/bin/sh".as_ref(), &args).await;

        // Then: Rejected without touching the live child
        assert!(matches!(second, Err(CaptureError::AlreadyRunning { .. })));
        assert!(supervisor.is_running());

        supervisor.stop().await;
        let outcome = wait_for_exit(&mut event_rx).await;
        assert_eq!(outcome.signal.as_deref(), Some("SIGKILL"));
    }

    /// WHAT: A stop past the grace period force-kills and records the signal
    /// WHY: The outcome must reflect the kill, never a fabricated clean exit
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn given_unresponsive_child_when_stopped_then_killed_after_grace() {
        // Given: A child that ignores the quit byte, 100ms grace window
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut supervisor = CaptureSupervisor::new(event_tx, scratch_log_dir("kill"))
            .with_grace_period(Duration::from_millis(100));

        let args = vec!["-c".to_string(), "exec sleep 30".to_string()];
        supervisor.start("/bin/sh".as_ref(), &args).await.unwrap();

        // When: Stopping
        supervisor.stop().await;
        let outcome = wait_for_exit(&mut event_rx).await;

        // Then: Killed, with the signal in the outcome and no exit code
        assert_eq!(outcome.exit_code, None);
        assert_eq!(outcome.signal.as_deref(), Some("SIGKILL"));
        assert!(!supervisor.is_running());
    }

    /// WHAT: A child that honors the quit byte exits cleanly inside the
    /// grace period
    /// WHY: Graceful shutdown must win whenever the child cooperates
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn given_cooperative_child_when_stopped_then_clean_exit() {
        // Given: A child that exits 0 after one byte of stdin
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut supervisor = CaptureSupervisor::new(event_tx, scratch_log_dir("graceful"));

        let args = vec![
            "-c".to_string(),
            "head -c 1 >/dev/null; exit 0".to_string(),
        ];
        supervisor.start("/bin/sh".as_ref(), &args).await.unwrap();

        // When: Stopping
        supervisor.stop().await;
        let outcome = wait_for_exit(&mut event_rx).await;

        // Then: Clean code-zero exit, no kill signal involved
        assert!(outcome.is_clean());
        assert_eq!(outcome.signal, None);
    }

    /// WHAT: Control bytes after exit are a silent no-op
    /// WHY: Control bytes are best-effort signals to a process that may
    /// already be gone
    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn given_exited_child_when_sending_control_then_noop() {
        // Given: A child that exits immediately
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut supervisor = CaptureSupervisor::new(event_tx, scratch_log_dir("noop"));

        let args = vec!["-c".to_string(), "exit 0".to_string()];
        supervisor.start("/bin/sh".as_ref(), &args).await.unwrap();
        let _ = wait_for_exit(&mut event_rx).await;

        // When/Then: Sending a control byte neither errors nor panics
        supervisor.send_control(b'p').await;
        supervisor.send_control(b'q').await;
        assert!(!supervisor.is_running());
    }
}
