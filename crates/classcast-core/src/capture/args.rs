//! Transcoder command-line construction.
//!
//! All OS-specific capture knowledge lives here: which capture subsystem a
//! platform uses, how it addresses displays, and whether its screen input
//! can multiplex an audio track. Everything downstream of the builder is
//! platform-independent.

use crate::capture::intent::{CaptureIntent, Platform};
use crate::error::Result as CoreResult;

use std::path::Path;

/// Capture framerate on platforms where the input requires one.
const MACOS_FRAMERATE: &str = "30";
/// Pixel format AVFoundation delivers without conversion overhead.
const MACOS_PIXEL_FORMAT: &str = "uyvy422";
/// Suffix marking an AVFoundation input as video-only.
const NO_AUDIO_SENTINEL: &str = ":none";
/// AVFoundation audio device substituted when audio is requested.
const MACOS_DEFAULT_AUDIO_DEVICE: &str = "0";
/// DirectShow microphone label used for the separate Windows audio input.
const DSHOW_DEFAULT_MICROPHONE: &str = "Microphone";

/// Fixed encode parameters: a real-time video preset, a quality target, an
/// audio codec and bitrate, and the overwrite-destination flag. These are
/// deliberately not tunable per call; only "is audio included" is.
const ENCODE_ARGS: [&str; 10] = [
    "-c:v", "libx264", "-preset", "ultrafast", "-crf", "23", "-c:a", "aac", "-b:a", "128k",
];

/// Log-verbosity arguments the supervisor prepends ahead of the capture
/// arguments. Prepend-only: capture subsystems are order-sensitive, so input
/// flags must stay directly in front of the `-i` they configure.
pub fn diagnostic_prefix() -> Vec<String> {
    vec!["-loglevel".to_string(), "verbose".to_string()]
}

/// Build the ordered transcoder argument list for one capture session.
///
/// Deterministic and side-effect-free: identical inputs always produce the
/// identical sequence.
///
/// # Errors
///
/// Returns [`crate::CaptureError::InvalidIntent`] when the intent's
/// invariants do not hold.
pub fn build_args(
    intent: &CaptureIntent,
    platform: &Platform,
    output_path: &Path,
) -> CoreResult<Vec<String>> {
    intent.validate()?;

    let mut args = screen_capture_args(intent.display_index, platform);

    if intent.record_audio {
        apply_audio_capture(&mut args, platform);
    }

    args.extend(ENCODE_ARGS.iter().map(|arg| (*arg).to_string()));
    args.push("-y".to_string());

    append_destination(&mut args, intent, output_path);

    Ok(args)
}

/// Platform-specific screen-capture input group.
///
/// The caller-facing display index is 0-based; AVFoundation addresses
/// screens 1-based (0 is the default camera), so macOS translates. gdigrab
/// and x11grab address the whole desktop / a display-server target and
/// ignore the index.
fn screen_capture_args(display_index: u32, platform: &Platform) -> Vec<String> {
    match platform {
        Platform::Windows => vec![
            "-f".to_string(),
            "gdigrab".to_string(),
            "-i".to_string(),
            "desktop".to_string(),
        ],
        Platform::MacOs => vec![
            "-f".to_string(),
            "avfoundation".to_string(),
            "-framerate".to_string(),
            MACOS_FRAMERATE.to_string(),
            "-pixel_format".to_string(),
            MACOS_PIXEL_FORMAT.to_string(),
            "-i".to_string(),
            format!("{}{}", display_index + 1, NO_AUDIO_SENTINEL),
        ],
        Platform::Linux { display } => vec![
            "-f".to_string(),
            "x11grab".to_string(),
            "-i".to_string(),
            format!("{display}.0"),
        ],
    }
}

/// Enable audio capture in an already-emitted argument list.
///
/// On macOS the screen input itself multiplexes the audio track: the input
/// specifier is rewritten in place, swapping the no-audio sentinel for an
/// audio device index. Appending a second AVFoundation input instead would
/// capture twice and desync timing. Platforms without a multiplexing screen
/// input get a wholly separate audio input group.
fn apply_audio_capture(args: &mut Vec<String>, platform: &Platform) {
    match platform {
        Platform::MacOs => {
            if let Some(position) = args.iter().position(|arg| arg == "-i") {
                if let Some(input) = args.get_mut(position + 1) {
                    if let Some(device) = input.strip_suffix(NO_AUDIO_SENTINEL) {
                        *input = format!("{device}:{MACOS_DEFAULT_AUDIO_DEVICE}");
                    }
                }
            }
        }
        Platform::Windows => {
            args.extend([
                "-f".to_string(),
                "dshow".to_string(),
                "-i".to_string(),
                format!("audio={DSHOW_DEFAULT_MICROPHONE}"),
            ]);
        }
        Platform::Linux { .. } => {
            args.extend([
                "-f".to_string(),
                "pulse".to_string(),
                "-i".to_string(),
                "default".to_string(),
            ]);
        }
    }
}

/// Append the destination leg(s).
///
/// With `push_stream` set, a tee-style specifier writes the network target
/// and the local file from one encoding pass; each leg is marked
/// `onfail=ignore` so a dropped network connection does not kill local
/// recording, and vice versa.
fn append_destination(args: &mut Vec<String>, intent: &CaptureIntent, output_path: &Path) {
    match (intent.push_stream, &intent.stream_target) {
        (true, Some(target)) => {
            args.push("-f".to_string());
            args.push("tee".to_string());
            args.push(format!(
                "[onfail=ignore]{target}|[onfail=ignore]{}",
                output_path.display()
            ));
        }
        _ => args.push(output_path.display().to_string()),
    }
}
