//! Classcast Core Library
//!
//! Supervision engine for an external ffmpeg-style screen/audio transcoder:
//! locating a usable executable, building platform-correct capture arguments,
//! spawning and observing the process, and diagnosing how it exited.
//!
//! # Example
//!
//! ```no_run
//! use classcast_core::{CaptureIntent, CaptureSupervisor, Platform, CoreResult};
//!
//! use std::path::Path;
//!
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let executable = classcast_core::resolve_transcoder()?;
//!     let output = classcast_core::allocate_output_path(Path::new("recordings"))?;
//!
//!     let intent = CaptureIntent::screen(0);
//!     let args = classcast_core::build_args(&intent, &Platform::current()?, &output)?;
//!
//!     let (event_tx, mut event_rx) = mpsc::channel(64);
//!     let mut supervisor = CaptureSupervisor::new(event_tx, "logs".into());
//!     supervisor.start(&executable, &args).await?;
//!     supervisor.stop().await;
//!
//!     while let Some(_event) = event_rx.recv().await {}
//!     Ok(())
//! }
//! ```

mod capture;
mod error;

pub use {
    capture::args::{build_args, diagnostic_prefix},
    capture::devices::{
        CapabilityReport, Device, DeviceKind, enumerate_devices, parse_device_list,
        probe_capability,
    },
    capture::exit::{ExitDiagnosis, ExitOutcome, LaunchFailureKind, diagnose},
    capture::intent::{CaptureIntent, Platform},
    capture::locate::{is_executable, resolve_transcoder},
    capture::output::allocate_output_path,
    capture::supervisor::{
        CaptureEvent, CaptureSupervisor, DEFAULT_GRACE_PERIOD, OutputLevel, classify_line, control,
    },
    error::{CaptureError, Result as CoreResult},
};

#[cfg(test)]
mod tests;
