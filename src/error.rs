use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}
