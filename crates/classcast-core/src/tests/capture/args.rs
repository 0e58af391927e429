use crate::{CaptureError, CaptureIntent, Platform, build_args, diagnostic_prefix};

use std::path::Path;

fn audio_intent(display_index: u32) -> CaptureIntent {
    CaptureIntent {
        display_index,
        record_audio: true,
        push_stream: false,
        stream_target: None,
    }
}

fn input_count(args: &[String]) -> usize {
    args.iter().filter(|arg| *arg == "-i").count()
}

/// WHAT: Identical inputs produce identical argument sequences
/// WHY: The builder must be deterministic for every platform and intent
#[test]
fn given_identical_inputs_when_building_twice_then_sequences_match() {
    // Given: One intent, platform, and output path
    let intent = audio_intent(0);
    let output = Path::new("/tmp/recording_20260101_120000.mp4");

    // When: Building twice
    let first = build_args(&intent, &Platform::MacOs, output);
    let second = build_args(&intent, &Platform::MacOs, output);

    // Then: The sequences are identical
    assert!(first.is_ok());
    assert_eq!(first.ok(), second.ok());
}

/// WHAT: macOS audio rewrites the screen input specifier in place
/// WHY: A second AVFoundation input would double-capture and desync timing
#[test]
fn given_macos_with_audio_when_building_then_input_rewritten_not_appended() {
    // Given: Audio requested on the multiplexing platform
    let intent = audio_intent(0);

    // When: Building for macOS
    let args = build_args(&intent, &Platform::MacOs, Path::new("/tmp/out.mp4"))
        .unwrap_or_default();

    // Then: Exactly one input group, its specifier audio-enabled
    assert_eq!(input_count(&args), 1);
    let input_position = args.iter().position(|arg| arg == "-i");
    assert_eq!(
        input_position.and_then(|p| args.get(p + 1)).map(String::as_str),
        Some("1:0")
    );
    assert!(!args.iter().any(|arg| arg == "dshow" || arg == "pulse"));
}

/// WHAT: macOS without audio keeps the no-audio sentinel
/// WHY: Audio must only be captured when the intent asks for it
#[test]
fn given_macos_without_audio_when_building_then_sentinel_preserved() {
    // Given: Screen-only intent
    let intent = CaptureIntent::screen(0);

    // When: Building for macOS
    let args = build_args(&intent, &Platform::MacOs, Path::new("/tmp/out.mp4"))
        .unwrap_or_default();

    // Then: The input specifier ends with the no-audio sentinel
    let input_position = args.iter().position(|arg| arg == "-i");
    assert_eq!(
        input_position.and_then(|p| args.get(p + 1)).map(String::as_str),
        Some("1:none")
    );
}

/// WHAT: Caller's 0-based display index becomes AVFoundation's 1-based index
/// WHY: Each capture subsystem has its own device-addressing convention
#[test]
fn given_display_index_two_when_building_for_macos_then_device_three() {
    // Given: The third display, 0-based
    let intent = CaptureIntent::screen(2);

    // When: Building for macOS
    let args = build_args(&intent, &Platform::MacOs, Path::new("/tmp/out.mp4"))
        .unwrap_or_default();

    // Then: The specifier addresses device 3
    let input_position = args.iter().position(|arg| arg == "-i");
    assert_eq!(
        input_position.and_then(|p| args.get(p + 1)).map(String::as_str),
        Some("3:none")
    );
}

/// WHAT: Windows audio appends a separate DirectShow input group
/// WHY: gdigrab cannot multiplex an audio track into the screen input
#[test]
fn given_windows_with_audio_when_building_then_two_input_groups() {
    // Given: Audio requested on a non-multiplexing platform
    let intent = audio_intent(0);

    // When: Building for Windows
    let args = build_args(&intent, &Platform::Windows, Path::new("out.mp4"))
        .unwrap_or_default();

    // Then: Exactly two input groups, screen then audio
    assert_eq!(input_count(&args), 2);
    assert!(args.iter().any(|arg| arg == "gdigrab"));
    assert!(args.iter().any(|arg| arg == "dshow"));
}

/// WHAT: Linux audio appends a separate PulseAudio input group
/// WHY: x11grab cannot multiplex an audio track into the screen input
#[test]
fn given_linux_with_audio_when_building_then_pulse_group_appended() {
    // Given: Audio requested, display target ":1"
    let intent = audio_intent(0);
    let platform = Platform::Linux {
        display: ":1".to_string(),
    };

    // When: Building for Linux
    let args = build_args(&intent, &platform, Path::new("/tmp/out.mp4")).unwrap_or_default();

    // Then: Two input groups, screen addressed via the display target
    assert_eq!(input_count(&args), 2);
    assert!(args.iter().any(|arg| arg == "x11grab"));
    assert!(args.iter().any(|arg| arg == "pulse"));
    assert!(args.iter().any(|arg| arg == ":1.0"));
}

/// WHAT: Stream push uses a tee destination with per-leg failure isolation
/// WHY: A dropped network connection must not kill local recording
#[test]
fn given_push_stream_when_building_then_tee_destination() {
    // Given: Dual local + network output
    let intent = CaptureIntent {
        display_index: 0,
        record_audio: false,
        push_stream: true,
        stream_target: Some("rtmp://example.com/live/key".to_string()),
    };

    // When: Building
    let args = build_args(&intent, &Platform::MacOs, Path::new("/tmp/out.mp4"))
        .unwrap_or_default();

    // Then: Tee muxer selected, both legs marked onfail=ignore
    assert!(args.iter().any(|arg| arg == "tee"));
    assert_eq!(
        args.last().map(String::as_str),
        Some("[onfail=ignore]rtmp://example.com/live/key|[onfail=ignore]/tmp/out.mp4")
    );
}

/// WHAT: Local-only recording ends with the bare output path
/// WHY: No tee indirection when there is a single destination
#[test]
fn given_local_only_when_building_then_output_path_is_last() {
    // Given: Local-only intent
    let intent = CaptureIntent::screen(0);

    // When: Building
    let args = build_args(&intent, &Platform::Windows, Path::new("out.mp4"))
        .unwrap_or_default();

    // Then: The path is the final argument and no tee muxer appears
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    assert!(!args.iter().any(|arg| arg == "tee"));
}

/// WHAT: push_stream without a stream target is rejected at build time
/// WHY: The intent invariant must fail fast, not surface as a runtime crash
#[test]
fn given_push_stream_without_target_when_building_then_invalid_intent() {
    // Given: push_stream set but no target
    let intent = CaptureIntent {
        display_index: 0,
        record_audio: false,
        push_stream: true,
        stream_target: None,
    };

    // When: Building
    let result = build_args(&intent, &Platform::MacOs, Path::new("/tmp/out.mp4"));

    // Then: InvalidIntent error
    assert!(matches!(result, Err(CaptureError::InvalidIntent { .. })));
}

/// WHAT: Encode parameters appear as one fixed, ordered block
/// WHY: They are non-negotiable defaults; only audio inclusion is tunable
#[test]
fn given_any_intent_when_building_then_fixed_encode_block() {
    // Given: A plain screen intent
    let intent = CaptureIntent::screen(0);

    // When: Building for Linux
    let platform = Platform::Linux {
        display: ":0".to_string(),
    };
    let args = build_args(&intent, &platform, Path::new("/tmp/out.mp4")).unwrap_or_default();

    // Then: The encode block is present verbatim, ahead of the destination
    let expected = [
        "-c:v", "libx264", "-preset", "ultrafast", "-crf", "23", "-c:a", "aac", "-b:a", "128k",
        "-y",
    ];
    let start = args.iter().position(|arg| arg == "-c:v");
    assert!(start.is_some());
    let block: Vec<&str> = args
        .iter()
        .skip(start.unwrap_or(0))
        .take(expected.len())
        .map(String::as_str)
        .collect();
    assert_eq!(block, expected);
}

/// WHAT: The diagnostic prefix is separate from the built sequence
/// WHY: Verbosity flags are prepended by the caller; inserting them would
/// disturb the order-sensitive input flags
#[test]
fn given_built_args_when_inspected_then_no_verbosity_flags() {
    // Given: A built sequence
    let intent = CaptureIntent::screen(0);
    let args = build_args(&intent, &Platform::Windows, Path::new("out.mp4"))
        .unwrap_or_default();

    // Then: The prefix lives apart and never inside the build output
    assert_eq!(diagnostic_prefix(), vec!["-loglevel", "verbose"]);
    assert!(!args.iter().any(|arg| arg == "-loglevel"));
}
