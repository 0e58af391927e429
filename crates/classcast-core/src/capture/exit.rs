//! Exit observation and diagnosis.
//!
//! Maps raw exit codes, terminating signals, and spawn-time OS errors to
//! plain-language causes and remediation hints.

use std::fmt;
use std::process::ExitStatus;

/// How a supervised transcoder process terminated. Produced exactly once
/// per session and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Process exit code, absent when a signal terminated it.
    pub exit_code: Option<i32>,
    /// Name of the terminating signal, when one did.
    pub signal: Option<String>,
    /// Every diagnostic line the process emitted before exiting, in order.
    pub diagnostics: Vec<String>,
}

impl ExitOutcome {
    /// Build an outcome from the observed [`ExitStatus`] plus the drained
    /// diagnostic buffer.
    pub(crate) fn from_status(status: ExitStatus, diagnostics: Vec<String>) -> Self {
        Self {
            exit_code: status.code(),
            signal: terminating_signal(&status),
            diagnostics,
        }
    }

    /// True for a clean, code-zero completion.
    pub fn is_clean(&self) -> bool {
        self.signal.is_none() && self.exit_code == Some(0)
    }
}

#[cfg(unix)]
fn terminating_signal(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map(signal_name)
}

#[cfg(not(unix))]
fn terminating_signal(_status: &ExitStatus) -> Option<String> {
    None
}

#[cfg(unix)]
fn signal_name(signum: i32) -> String {
    match signum {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        3 => "SIGQUIT".to_string(),
        6 => "SIGABRT".to_string(),
        9 => "SIGKILL".to_string(),
        11 => "SIGSEGV".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("signal {other}"),
    }
}

/// Plain-language reading of an [`ExitOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitDiagnosis {
    /// What happened.
    pub summary: String,
    /// What the user can do about it, where known.
    pub remediation: Option<String>,
}

/// Diagnose a transcoder exit.
///
/// Signal-terminated exits are read first; exit codes otherwise. Unknown
/// observations are surfaced verbatim rather than guessed at.
pub fn diagnose(outcome: &ExitOutcome) -> ExitDiagnosis {
    if let Some(signal) = outcome.signal.as_deref() {
        return diagnose_signal(signal);
    }

    match outcome.exit_code {
        Some(0) => ExitDiagnosis {
            summary: "recording completed cleanly".to_string(),
            remediation: None,
        },
        Some(1) => ExitDiagnosis {
            summary: "transcoder reported a general error".to_string(),
            remediation: Some("check the session diagnostic log for the failing argument".to_string()),
        },
        Some(2) => ExitDiagnosis {
            summary: "transcoder reported a severe error".to_string(),
            remediation: Some("check the session diagnostic log for the failing argument".to_string()),
        },
        Some(126) => ExitDiagnosis {
            summary: "transcoder could not be executed (permission denied at exec)".to_string(),
            remediation: Some("restore the execute permission on the transcoder binary".to_string()),
        },
        Some(127) => ExitDiagnosis {
            summary: "transcoder executable disappeared before exec".to_string(),
            remediation: Some("reinstall the transcoder or fix its configured path".to_string()),
        },
        Some(130) => ExitDiagnosis {
            summary: "transcoder was interrupted by the user".to_string(),
            remediation: None,
        },
        Some(code) => ExitDiagnosis {
            summary: format!("transcoder exited with unrecognized code {code}"),
            remediation: Some("check the session diagnostic log".to_string()),
        },
        None => ExitDiagnosis {
            summary: "transcoder exit could not be observed".to_string(),
            remediation: None,
        },
    }
}

fn diagnose_signal(signal: &str) -> ExitDiagnosis {
    match signal {
        "SIGSEGV" => ExitDiagnosis {
            summary: "capture backend crashed (segmentation fault)".to_string(),
            remediation: Some(
                "not retryable with the same capture parameters; change display or audio settings"
                    .to_string(),
            ),
        },
        "SIGABRT" => ExitDiagnosis {
            summary: "transcoder was aborted by a platform security policy or internal assertion"
                .to_string(),
            remediation: Some("check the screen-capture permission grant first".to_string()),
        },
        "SIGKILL" => ExitDiagnosis {
            summary: "transcoder was force-killed (system OOM, or our stop timeout fired)"
                .to_string(),
            remediation: Some("check free memory; the local file may be truncated".to_string()),
        },
        other => ExitDiagnosis {
            summary: format!("transcoder was terminated by {other}"),
            remediation: None,
        },
    }
}

/// Classification of spawn-time OS errors, each paired with remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchFailureKind {
    /// Resolved path went stale or the file was removed after resolution.
    MissingExecutable,
    /// The file exists but lost its execute bit, or sandboxing blocked exec.
    PermissionDenied,
    /// Platform security policy blocked the spawn itself.
    BlockedBySystemPolicy,
    /// The spawn call did not complete in a bounded window.
    Timeout,
    /// Anything else; the OS error text is surfaced alongside.
    Other,
}

impl LaunchFailureKind {
    /// Map a spawn error to its caller-facing cause.
    ///
    /// EPERM is checked by raw errno before the kind match: the standard
    /// library folds it into `PermissionDenied`, but it signals a security
    /// policy block, which has different remediation than a lost execute bit.
    pub fn from_io(error: &std::io::Error) -> Self {
        if error.raw_os_error() == Some(1) {
            return LaunchFailureKind::BlockedBySystemPolicy;
        }
        match error.kind() {
            std::io::ErrorKind::NotFound => LaunchFailureKind::MissingExecutable,
            std::io::ErrorKind::PermissionDenied => LaunchFailureKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => LaunchFailureKind::Timeout,
            _ => LaunchFailureKind::Other,
        }
    }

    /// Remediation hint for this failure class.
    pub fn remediation(&self) -> &'static str {
        match self {
            LaunchFailureKind::MissingExecutable => {
                "the transcoder binary vanished after resolution; reinstall it and start again"
            }
            LaunchFailureKind::PermissionDenied => {
                "restore the execute permission on the transcoder binary (chmod +x)"
            }
            LaunchFailureKind::BlockedBySystemPolicy => {
                "grant the screen-recording permission in system settings, then restart the app"
            }
            LaunchFailureKind::Timeout => "the spawn timed out; check system load and retry",
            LaunchFailureKind::Other => "check the application log for the underlying OS error",
        }
    }
}

impl fmt::Display for LaunchFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = match self {
            LaunchFailureKind::MissingExecutable => "executable not found",
            LaunchFailureKind::PermissionDenied => "permission denied",
            LaunchFailureKind::BlockedBySystemPolicy => "operation not permitted",
            LaunchFailureKind::Timeout => "launch timed out",
            LaunchFailureKind::Other => "launch failed",
        };
        write!(f, "{summary} ({})", self.remediation())
    }
}
