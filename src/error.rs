use thiserror::Error;

/// Errors that stop a whole batch (as opposed to a single file)
#[derive(Error, Debug)]
pub enum StereoError {
    /// The transcoding backend is missing, not executable or failed verification
    #[error("Transcoding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output archive could not be written
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Invalid or unreadable settings
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StereoError>;
