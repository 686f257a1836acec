use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Single density area already holds tracks 1 and 2")]
    SdAreaFull,

    #[error("Pattern III high density area accepts no more tracks")]
    HdAreaClosed,

    #[error("Pattern I high density area only accepts an audio track next")]
    DataTrackAfterPatternI,

    #[error("Track 3 must be a data track")]
    AudioTrackAsFirstHdTrack,

    #[error("Track {track_no} does not follow the last track {last_track_no}")]
    NonConsecutiveTrackNo { track_no: u8, last_track_no: u8 },

    #[error("Track number {0} is out of range for this area")]
    TrackNoOutOfRange(u8),

    #[error("Track 3 can only be a data track")]
    Track3MustBeData,

    #[error("Track 4 can only be an audio track")]
    Track4MustBeAudio,

    #[error("Data track {0} must be track 3 or the last track")]
    DataTrackNotAtEdge(u8),

    #[error("Only index 00 and 01 exist, got {0}")]
    InvalidIndex(u8),
}

pub type LayoutResult<T> = Result<T, LayoutError>;
