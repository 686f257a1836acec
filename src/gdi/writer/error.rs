use crate::gdi::track::error::TrackError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    TrackError(#[from] TrackError),

    #[error("Disc is not valid for conversion: IP.BIN missing or a track file is invalid")]
    InvalidDisc,

    #[error("Output directory does not exist: {0}")]
    OutputDirectoryNotFound(PathBuf),

    #[error("Track {0} is referenced by a copy plan but missing from the disc")]
    MissingTrack(u32),

    #[error("Track {0} has no data range to copy")]
    EmptyRange(u32),

    #[error("Short write on track {track}: {written} of {expected} bytes")]
    ShortWrite {
        track: u32,
        expected: usize,
        written: usize,
    },
}

pub type WriterResult<T> = Result<T, WriterError>;
