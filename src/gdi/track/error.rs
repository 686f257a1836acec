use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Track file has already been unloaded: {0}")]
    Unloaded(PathBuf),

    #[error("Track file could not be opened: {0}")]
    NotOpened(PathBuf),
}

pub type TrackResult<T> = Result<T, TrackError>;
