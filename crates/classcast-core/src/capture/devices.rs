//! Capability probing and capture-device enumeration.
//!
//! The probe invokes the resolved transcoder once with `-version` under a
//! bounded wait; on macOS it additionally asks AVFoundation to list capture
//! devices and parses the diagnostic text the transcoder prints.

use crate::capture::intent::Platform;
use crate::{CaptureError, CoreResult};

use std::panic::Location;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use error_location::ErrorLocation;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Header the transcoder prints above its video-device rows.
pub const VIDEO_DEVICES_HEADER: &str = "AVFoundation video devices:";
/// Header the transcoder prints above its audio-device rows.
pub const AUDIO_DEVICES_HEADER: &str = "AVFoundation audio devices:";

/// Bounded wait for a single probe invocation.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Kind of a capture device, decided by the most recent header above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Screen or camera input.
    Video,
    /// Audio input.
    Audio,
}

/// One capture device row parsed from the transcoder's enumeration output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Video or audio, per the enclosing header.
    pub kind: DeviceKind,
    /// Device index as printed by the transcoder.
    pub index: u32,
    /// Human-readable device name.
    pub name: String,
}

/// Result of a capability probe.
#[derive(Debug, Clone)]
pub struct CapabilityReport {
    /// Whether the transcoder responded to the version invocation.
    pub ok: bool,
    /// Version banner on success, failure description otherwise.
    pub message: String,
    /// Enumerated capture devices, empty off macOS.
    pub devices: Vec<Device>,
}

/// Probe the transcoder at `executable`.
///
/// # Errors
///
/// Returns [`CaptureError::ProbeFailed`] when the invocation cannot run or
/// does not finish inside the bounded wait. A transcoder that runs but
/// reports failure yields `ok: false`, not an error.
#[instrument(skip(executable, platform))]
pub async fn probe_capability(
    executable: &Path,
    platform: &Platform,
) -> CoreResult<CapabilityReport> {
    let output = run_probe(executable, &["-version"]).await?;

    if !output.status.success() {
        return Ok(CapabilityReport {
            ok: false,
            message: format!(
                "transcoder version check exited with {:?}",
                output.status.code()
            ),
            devices: Vec::new(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let message = stdout
        .lines()
        .next()
        .unwrap_or("transcoder available")
        .to_string();

    // Device enumeration only exists on the AVFoundation platform; a failed
    // enumeration degrades the report instead of failing the probe.
    let devices = if matches!(platform, Platform::MacOs) {
        match enumerate_devices(executable).await {
            Ok(devices) => devices,
            Err(error) => {
                warn!(%error, "Device enumeration failed");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(CapabilityReport {
        ok: true,
        message,
        devices,
    })
}

/// Ask AVFoundation to list capture devices and parse the diagnostic text.
///
/// The listing invocation always "fails" (there is no input to open), so
/// only its stderr text matters, not its exit status.
///
/// # Errors
///
/// Returns [`CaptureError::ProbeFailed`] when the invocation cannot run or
/// times out.
pub async fn enumerate_devices(executable: &Path) -> CoreResult<Vec<Device>> {
    let output = run_probe(
        executable,
        &["-f", "avfoundation", "-list_devices", "true", "-i", ""],
    )
    .await?;

    let devices = parse_device_list(&String::from_utf8_lossy(&output.stderr));
    debug!(count = devices.len(), "Capture devices enumerated");
    Ok(devices)
}

/// Parse device rows out of enumeration diagnostic text.
///
/// Rows are classified video/audio by whichever header most recently
/// appeared above them; rows before any header are ignored.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();
    let mut current_kind: Option<DeviceKind> = None;

    for line in output.lines() {
        if line.contains(VIDEO_DEVICES_HEADER) {
            current_kind = Some(DeviceKind::Video);
        } else if line.contains(AUDIO_DEVICES_HEADER) {
            current_kind = Some(DeviceKind::Audio);
        } else if let Some(kind) = current_kind {
            if let Some(device) = parse_device_row(kind, line) {
                devices.push(device);
            }
        }
    }

    devices
}

/// Parse one `[<index>] <name>` row.
///
/// The transcoder prefixes each row with its own bracketed logger tag, so
/// the device index is the first bracketed group holding only digits.
fn parse_device_row(kind: DeviceKind, line: &str) -> Option<Device> {
    let mut rest = line.trim();
    if !rest.starts_with('[') {
        return None;
    }

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let close = after.find(']')?;
        let token = &after[..close];

        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(index) = token.parse::<u32>() {
                let name = after[close + 1..].trim();
                if name.is_empty() {
                    return None;
                }
                return Some(Device {
                    kind,
                    index,
                    name: name.to_string(),
                });
            }
        }

        rest = &after[close + 1..];
    }

    None
}

async fn run_probe(executable: &Path, args: &[&str]) -> CoreResult<std::process::Output> {
    let invocation = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    match tokio::time::timeout(PROBE_TIMEOUT, invocation).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(CaptureError::ProbeFailed {
            reason: format!("failed to invoke transcoder: {source}"),
            location: ErrorLocation::from(Location::caller()),
        }),
        Err(_elapsed) => Err(CaptureError::ProbeFailed {
            reason: format!("transcoder probe did not finish within {PROBE_TIMEOUT:?}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
