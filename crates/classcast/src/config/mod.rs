mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod recording_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, logging_config::LoggingConfig,
    recording_config::RecordingConfig,
};

pub(crate) const RECORDINGS_DIR_NAME: &str = "recordings";
pub(crate) const SESSION_LOG_DIR_NAME: &str = "sessions";
pub(crate) const LOG_DIR_NAME: &str = "logs";
