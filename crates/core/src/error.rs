use thiserror::Error;

pub type Result<T> = std::result::Result<T, TallyError>;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to fetch {origin}: {message}")]
    Fetch { origin: String, message: String },

    #[error("Concurrency limit must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("{0}")]
    Other(String),
}

impl TallyError {
    pub fn fetch(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            origin: origin.into(),
            message: message.into(),
        }
    }
}
