use thiserror::Error;

pub type Result<T> = std::result::Result<T, PhosphorError>;

#[derive(Debug, Error)]
pub enum PhosphorError {
    #[error("no audio source is loaded")]
    NotLoaded,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording is in progress")]
    NotRecording,

    #[error("invalid analyser setting: {0}")]
    InvalidAnalyser(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sink(#[from] anyhow::Error),
}
