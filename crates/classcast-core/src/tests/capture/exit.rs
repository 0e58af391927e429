use crate::{ExitOutcome, LaunchFailureKind, diagnose};

fn outcome_with_code(code: i32) -> ExitOutcome {
    ExitOutcome {
        exit_code: Some(code),
        signal: None,
        diagnostics: Vec::new(),
    }
}

fn outcome_with_signal(signal: &str) -> ExitOutcome {
    ExitOutcome {
        exit_code: None,
        signal: Some(signal.to_string()),
        diagnostics: Vec::new(),
    }
}

/// WHAT: Exit code 0 diagnoses as clean with no remediation
/// WHY: A successful recording needs no user action
#[test]
fn given_code_zero_when_diagnosing_then_clean() {
    // Given/When
    let outcome = outcome_with_code(0);
    let diagnosis = diagnose(&outcome);

    // Then
    assert!(outcome.is_clean());
    assert!(diagnosis.summary.contains("cleanly"));
    assert!(diagnosis.remediation.is_none());
}

/// WHAT: Codes 1 and 2 diagnose as encoder-reported errors
/// WHY: The transcoder distinguishes general from severe failures
#[test]
fn given_error_codes_when_diagnosing_then_encoder_errors() {
    let general = diagnose(&outcome_with_code(1));
    let severe = diagnose(&outcome_with_code(2));

    assert!(general.summary.contains("general"));
    assert!(severe.summary.contains("severe"));
    assert!(general.remediation.is_some());
}

/// WHAT: Codes 126/127 diagnose as exec-layer failures
/// WHY: These should have been caught at launch; the diagnosis says what
/// still needs fixing
#[test]
fn given_exec_layer_codes_when_diagnosing_then_exec_failures() {
    let permission = diagnose(&outcome_with_code(126));
    let missing = diagnose(&outcome_with_code(127));

    assert!(permission.summary.contains("permission"));
    assert!(
        missing
            .remediation
            .as_deref()
            .is_some_and(|hint| hint.contains("reinstall"))
    );
}

/// WHAT: Code 130 diagnoses as a user interrupt
/// WHY: Ctrl+C is not an error condition worth remediation text
#[test]
fn given_code_130_when_diagnosing_then_user_interrupt() {
    let diagnosis = diagnose(&outcome_with_code(130));

    assert!(diagnosis.summary.contains("interrupted"));
    assert!(diagnosis.remediation.is_none());
}

/// WHAT: An unrecognized code is surfaced verbatim
/// WHY: Guessing at unknown codes would mislead more than it helps
#[test]
fn given_unknown_code_when_diagnosing_then_code_in_summary() {
    let diagnosis = diagnose(&outcome_with_code(42));

    assert!(diagnosis.summary.contains("42"));
}

/// WHAT: SIGABRT remediation points at the capture permission grant
/// WHY: On the capture platform an abort usually means a security policy
/// block, and that is the first thing to check
#[test]
fn given_sigabrt_when_diagnosing_then_permission_remediation() {
    let diagnosis = diagnose(&outcome_with_signal("SIGABRT"));

    assert!(
        diagnosis
            .remediation
            .as_deref()
            .is_some_and(|hint| hint.contains("permission"))
    );
}

/// WHAT: SIGSEGV is diagnosed as non-retryable with the same parameters
/// WHY: Retrying an identical capture after a backend crash just crashes
/// again
#[test]
fn given_sigsegv_when_diagnosing_then_not_retryable() {
    let diagnosis = diagnose(&outcome_with_signal("SIGSEGV"));

    assert!(diagnosis.summary.contains("crash"));
    assert!(
        diagnosis
            .remediation
            .as_deref()
            .is_some_and(|hint| hint.contains("not retryable"))
    );
}

/// WHAT: SIGKILL mentions forced termination
/// WHY: The kill may be our own stop-timeout fallback, not only the OOM
/// killer
#[test]
fn given_sigkill_when_diagnosing_then_forced_kill_summary() {
    let diagnosis = diagnose(&outcome_with_signal("SIGKILL"));

    assert!(diagnosis.summary.contains("force"));
}

/// WHAT: Launch errors map to the caller-facing failure classes
/// WHY: Each class carries distinct remediation guidance
#[test]
fn given_spawn_errors_when_classifying_then_expected_kinds() {
    use std::io::{Error, ErrorKind};

    assert_eq!(
        LaunchFailureKind::from_io(&Error::from(ErrorKind::NotFound)),
        LaunchFailureKind::MissingExecutable
    );
    assert_eq!(
        LaunchFailureKind::from_io(&Error::from_raw_os_error(13)),
        LaunchFailureKind::PermissionDenied
    );
    assert_eq!(
        LaunchFailureKind::from_io(&Error::from(ErrorKind::TimedOut)),
        LaunchFailureKind::Timeout
    );
    assert_eq!(
        LaunchFailureKind::from_io(&Error::from(ErrorKind::Interrupted)),
        LaunchFailureKind::Other
    );
}

/// WHAT: Raw EPERM classifies as a system-policy block, not permission loss
/// WHY: The standard library folds EPERM into PermissionDenied, but its
/// remediation is granting the screen-capture permission, not chmod
#[test]
fn given_eperm_when_classifying_then_blocked_by_system_policy() {
    let error = std::io::Error::from_raw_os_error(1);

    let kind = LaunchFailureKind::from_io(&error);

    assert_eq!(kind, LaunchFailureKind::BlockedBySystemPolicy);
    assert!(kind.remediation().contains("screen-recording permission"));
}

/// WHAT: Wait statuses convert into code-or-signal outcomes
/// WHY: The outcome must reflect what the OS reported, never a fabricated
/// zero exit
#[cfg(unix)]
#[test]
fn given_unix_wait_statuses_when_converting_then_code_or_signal() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    // Clean exit: raw status 0
    let clean = ExitOutcome::from_status(ExitStatus::from_raw(0), Vec::new());
    assert_eq!(clean.exit_code, Some(0));
    assert_eq!(clean.signal, None);

    // Exit code 1: code lives in the high byte of the wait status
    let errored = ExitOutcome::from_status(ExitStatus::from_raw(1 << 8), Vec::new());
    assert_eq!(errored.exit_code, Some(1));
    assert_eq!(errored.signal, None);

    // Killed by SIGKILL: signal number in the low bits, no exit code
    let killed = ExitOutcome::from_status(ExitStatus::from_raw(9), Vec::new());
    assert_eq!(killed.exit_code, None);
    assert_eq!(killed.signal.as_deref(), Some("SIGKILL"));

    // Crashed with SIGSEGV
    let crashed = ExitOutcome::from_status(ExitStatus::from_raw(11), Vec::new());
    assert_eq!(crashed.signal.as_deref(), Some("SIGSEGV"));
}
