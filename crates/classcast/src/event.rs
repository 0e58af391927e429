use std::path::PathBuf;

use classcast_core::{ExitDiagnosis, ExitOutcome, OutputLevel};
use uuid::Uuid;

/// Events pushed to the collaborator that owns the user interface.
///
/// Push-based and uncorrelated with any request: the caller that issued
/// `start` may no longer be the one best positioned to hear about a crash.
#[derive(Debug)]
pub enum AppEvent {
    /// One classified line of transcoder output.
    Diagnostic {
        /// Heuristic severity of the line.
        level: OutputLevel,
        /// The line itself.
        line: String,
    },
    /// A session finished: graceful stop, clean completion, crash, or kill.
    SessionEnded {
        /// ID of the session that ended, when one was live.
        session_id: Option<Uuid>,
        /// How the transcoder terminated.
        outcome: ExitOutcome,
        /// Plain-language reading of the outcome.
        diagnosis: ExitDiagnosis,
        /// Where the (possibly partial) recording was written.
        output_path: Option<PathBuf>,
    },
}
