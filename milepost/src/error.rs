use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MilepostError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("invalid config, {0}")]
    Config(&'static str),

    #[error("unknown strategy '{0}', expected one of auto, reference, track")]
    Strategy(String),

    #[error("expected a JSON array in {0}")]
    NotAnArray(PathBuf),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Gpx(#[from] gpx::errors::GpxError),
}
