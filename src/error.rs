use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
