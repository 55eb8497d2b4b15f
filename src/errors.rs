use thiserror::Error;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Writer failed to start: {0}")]
    StartFailed(String),
    #[error("Muxing error: {0}")]
    Muxing(String),
    #[cfg(feature = "recording")]
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Recording is not capturing")]
    NotCapturing,
    #[error("Capture queue is full, sample dropped")]
    QueueFull,
    #[error("Device configuration error: {0}")]
    Device(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<std::io::Error> for MuxError {
    fn from(err: std::io::Error) -> Self {
        MuxError::Io(err.to_string())
    }
}
