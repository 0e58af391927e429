//! Classcast: supervised screen/audio capture via an external transcoder.
//!
//! The binary wires the supervision core to a line-oriented console. The
//! console is a stand-in for the out-of-scope UI: a real frontend embeds
//! [`Controller`] and the [`AppEvent`] channel exactly the same way.

mod app;
mod app_command;
mod config;
mod controller;
mod error;
mod event;
mod logging;
mod recording_state;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    controller::Controller,
    error::{AppError, Result as AppResult},
    event::AppEvent,
    recording_state::{RecordingSession, RecordingState, RecordingStatus},
};

use crate::config::Config;

use std::time::Duration;

use classcast_core::{CaptureIntent, OutputLevel};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::error;

/// Application entry point.
#[tokio::main]
async fn main() {
    let log_dir = match Config::main_log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Failed to locate log directory: {e}");
            std::process::exit(1);
        }
    };

    // Held until exit so buffered log lines are flushed.
    let _log_guard = match logging::init(&log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let (event_tx, event_rx) = mpsc::channel(256);
    let (app, controller) = match App::new(config, event_tx) {
        Ok(pair) => pair,
        Err(e) => {
            error!("Failed to create App: {:?}", e);
            std::process::exit(1);
        }
    };

    let app_handle = tokio::spawn(app.run());

    run_console(&controller, event_rx).await;

    if let Err(e) = controller.shutdown().await {
        error!(error = ?e, "Failed to send shutdown command");
    }

    match tokio::time::timeout(Duration::from_secs(10), app_handle).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = ?e, "App error"),
        Ok(Err(e)) => error!(error = ?e, "App task panicked"),
        Err(_) => error!("App did not shut down within timeout"),
    }
}

/// Drive the command surface from stdin lines, printing push events as
/// they arrive.
async fn run_console(controller: &Controller, mut event_rx: mpsc::Receiver<AppEvent>) {
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if handle_line(controller, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = ?e, "Console read failed");
                        break;
                    }
                }
            }

            Some(event) = event_rx.recv() => {
                print_event(&event);
            }
        }
    }
}

/// Execute one console command; returns true on quit.
async fn handle_line(controller: &Controller, line: &str) -> bool {
    let mut parts = line.split_whitespace();

    match parts.next() {
        Some("start") => {
            let intent = parse_start_intent(parts.collect::<Vec<_>>().as_slice());
            match controller.start(intent).await {
                Ok(path) => println!("recording -> {}", path.display()),
                Err(e) => println!("error: {e}"),
            }
        }
        Some("pause") => report_unit(controller.pause().await, "paused"),
        Some("resume") => report_unit(controller.resume().await, "resumed"),
        Some("stop") => match controller.stop().await {
            Ok(path) => println!("stopping, file at {}", path.display()),
            Err(e) => println!("error: {e}"),
        },
        Some("status") => match controller.status().await {
            Ok(status) => println!(
                "recording: {} | paused: {} | output: {}",
                status.recording,
                status.paused,
                status
                    .output_path
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            Err(e) => println!("error: {e}"),
        },
        Some("test") => match controller.test_capability().await {
            Ok(report) => {
                println!("ok: {} | {}", report.ok, report.message);
                for device in report.devices {
                    println!("  {:?} [{}] {}", device.kind, device.index, device.name);
                }
            }
            Err(e) => println!("error: {e}"),
        },
        Some("quit") | Some("exit") => return true,
        Some(other) => println!("unknown command: {other}"),
        None => {}
    }

    false
}

/// `start [display] [audio] [stream <url>]`
fn parse_start_intent(tokens: &[&str]) -> CaptureIntent {
    let mut intent = CaptureIntent::screen(0);
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if let Ok(index) = token.parse::<u32>() {
            intent.display_index = index;
        } else if *token == "audio" {
            intent.record_audio = true;
        } else if *token == "stream" {
            intent.push_stream = true;
            intent.stream_target = iter.next().map(|url| (*url).to_string());
        }
    }

    intent
}

fn report_unit(result: AppResult<()>, done: &str) {
    match result {
        Ok(()) => println!("{done}"),
        Err(e) => println!("error: {e}"),
    }
}

fn print_event(event: &AppEvent) {
    match event {
        // Debug-level transcoder chatter stays in the log file only.
        AppEvent::Diagnostic { level, line } => match level {
            OutputLevel::Error => println!("[transcoder error] {line}"),
            OutputLevel::Warning => println!("[transcoder warning] {line}"),
            OutputLevel::Debug => {}
        },
        AppEvent::SessionEnded {
            session_id,
            outcome,
            diagnosis,
            output_path,
        } => {
            match session_id {
                Some(id) => println!("session {id} ended: {}", diagnosis.summary),
                None => println!("session ended: {}", diagnosis.summary),
            }
            if let Some(hint) = &diagnosis.remediation {
                println!("  hint: {hint}");
            }
            if let (Some(path), true) = (output_path, outcome.is_clean()) {
                println!("  saved: {}", path.display());
            }
        }
    }
}

fn print_help() {
    println!("commands: start [display] [audio] [stream <url>] | pause | resume | stop");
    println!("          status | test | quit");
}
