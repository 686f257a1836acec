use crate::gdi::writer::error::WriterError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GdiError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    WriterError(#[from] WriterError),

    #[error("Could not find the gdi file: {0}")]
    GdiFileNotFound(PathBuf),
}

pub type GdiResult<T> = Result<T, GdiError>;
