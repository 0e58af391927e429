//! Transcoder executable resolution.
//!
//! Probes a fixed set of fallback strategies in order, first hit wins.
//! Resolution is never cached across sessions: installation state can
//! change between recordings, so callers re-resolve per start.

use crate::{CaptureError, CoreResult};

use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Environment variable naming a transcoder binary directly, the equivalent
/// of an installed helper package providing one.
pub const TRANSCODER_ENV_VAR: &str = "FFMPEG_PATH";

/// Directory probed for a project-local binary, relative to the working
/// directory.
const PROJECT_LOCAL_DIR: &str = "ffmpeg";

const BINARY_NAME: &str = "ffmpeg";

/// Locate a usable transcoder executable.
///
/// Probe order: a project-local binary under `./ffmpeg/`, then the
/// [`TRANSCODER_ENV_VAR`] environment variable, then a PATH lookup via the
/// OS-native `which`/`where`. A candidate that exists but is not executable
/// is skipped: the remediation (install or chmod) is the same as for a
/// missing one.
///
/// # Errors
///
/// Returns [`CaptureError::TranscoderNotFound`] with remediation text when
/// every strategy misses.
#[track_caller]
#[instrument]
pub fn resolve_transcoder() -> CoreResult<PathBuf> {
    if let Some(path) = project_local_binary() {
        info!(path = %path.display(), "Transcoder resolved from project-local directory");
        return absolute(path);
    }

    if let Some(path) = env_provided_binary() {
        info!(path = %path.display(), "Transcoder resolved from {TRANSCODER_ENV_VAR}");
        return absolute(path);
    }

    if let Some(path) = path_lookup() {
        info!(path = %path.display(), "Transcoder resolved from PATH");
        return absolute(path);
    }

    Err(CaptureError::TranscoderNotFound {
        remediation: format!(
            "probed ./{PROJECT_LOCAL_DIR}/{}, ${TRANSCODER_ENV_VAR}, and the system PATH; \
             place a platform binary under ./{PROJECT_LOCAL_DIR}/, set {TRANSCODER_ENV_VAR}, \
             or install {BINARY_NAME} on PATH",
            binary_file_name()
        ),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Whether `path` points at a file this process could execute.
///
/// On Unix any execute bit counts; elsewhere existence suffices. Present
/// but non-executable is reported as absent on purpose, see
/// [`resolve_transcoder`].
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

fn binary_file_name() -> &'static str {
    if cfg!(windows) { "ffmpeg.exe" } else { BINARY_NAME }
}

fn project_local_binary() -> Option<PathBuf> {
    let candidate = std::env::current_dir()
        .ok()?
        .join(PROJECT_LOCAL_DIR)
        .join(binary_file_name());
    if is_executable(&candidate) {
        Some(candidate)
    } else {
        debug!(candidate = %candidate.display(), "No usable project-local transcoder");
        None
    }
}

fn env_provided_binary() -> Option<PathBuf> {
    let value = std::env::var_os(TRANSCODER_ENV_VAR)?;
    if value.is_empty() {
        return None;
    }
    let candidate = PathBuf::from(value);
    if is_executable(&candidate) {
        Some(candidate)
    } else {
        debug!(candidate = %candidate.display(), "{TRANSCODER_ENV_VAR} does not point at an executable");
        None
    }
}

/// PATH lookup via the OS-native `which`/`where`, first line of output.
fn path_lookup() -> Option<PathBuf> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = std::process::Command::new(finder)
        .arg(BINARY_NAME)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next()?.trim();
    if first.is_empty() {
        return None;
    }

    let candidate = PathBuf::from(first);
    is_executable(&candidate).then_some(candidate)
}

#[track_caller]
fn absolute(path: PathBuf) -> CoreResult<PathBuf> {
    std::fs::canonicalize(&path).map_err(|source| CaptureError::Io {
        source,
        location: ErrorLocation::from(Location::caller()),
    })
}
