use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeedMapError>;

#[derive(Error, Debug)]
pub enum DeedMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
