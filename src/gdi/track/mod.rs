pub mod content;
pub mod error;

use crate::cd::{PREGAP_SECTORS, TrackMode};
use crate::gdi::track::content::TrackContent;
use crate::logger::SharedLogger;
use std::fmt::Display;
use std::path::Path;

const EMBEDDED_PREGAP_PROBE_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    Audio = 0,
    Data = 4,
}

impl TrackType {
    pub fn from_type_id(type_id: u32) -> Option<Self> {
        match type_id {
            0 => Some(Self::Audio),
            4 => Some(Self::Data),
            _ => None,
        }
    }

    pub fn type_id(&self) -> u32 {
        *self as u32
    }

    pub fn mode(&self) -> TrackMode {
        match self {
            Self::Audio => TrackMode::Audio,
            Self::Data => TrackMode::Data,
        }
    }
}

impl Display for TrackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "Audio"),
            Self::Data => write!(f, "Data"),
        }
    }
}

/// One track line of a `.gdi` cue sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub number: u32,
    pub lba: u32,
    pub track_type: TrackType,
    pub sector_size: u32,
    pub filename: String,
    pub reserved: i64,
}

/// A track of a loaded disc plus its derived geometry.
///
/// All LBAs are disc LBAs unless the name says otherwise. Track LBA 0 is the
/// first sector of the track's real data, which sits after the embedded pregap
/// when the dump carries one.
#[derive(Debug)]
pub struct GdiTrack {
    record: TrackRecord,
    content: TrackContent,
    pregap_embedded: bool,
}

impl GdiTrack {
    pub async fn load(record: TrackRecord, dir: impl AsRef<Path>, logger: &SharedLogger) -> Self {
        let content = TrackContent::open(dir, &record.filename, record.sector_size, logger).await;
        let pregap_embedded = probe_embedded_pregap(&record, &content, logger).await;

        Self {
            record,
            content,
            pregap_embedded,
        }
    }

    pub fn record(&self) -> &TrackRecord {
        &self.record
    }

    pub fn content(&self) -> &TrackContent {
        &self.content
    }

    pub fn number(&self) -> u32 {
        self.record.number
    }

    pub fn filename(&self) -> &str {
        &self.record.filename
    }

    pub fn track_type(&self) -> TrackType {
        self.record.track_type
    }

    pub fn sector_size(&self) -> u32 {
        self.record.sector_size
    }

    pub fn reserved(&self) -> i64 {
        self.record.reserved
    }

    pub fn is_audio_track(&self) -> bool {
        self.record.track_type == TrackType::Audio
    }

    pub fn is_data_track(&self) -> bool {
        self.record.track_type == TrackType::Data
    }

    /// Audio tracks are preceded by a 150 sector pregap.
    pub fn pregap_length_in_sector(&self) -> i64 {
        if self.is_audio_track() {
            PREGAP_SECTORS as i64
        } else {
            0
        }
    }

    pub fn start_lba_pregap(&self) -> i64 {
        self.record.lba as i64 - self.pregap_length_in_sector()
    }

    pub fn start_lba_data(&self) -> i64 {
        self.record.lba as i64
    }

    /// Exclusive end, i.e. the first LBA after the last sector of the file.
    pub fn end_lba(&self) -> i64 {
        let length = if self.content.is_valid() {
            self.content.length_in_sector() as i64
        } else {
            0
        };
        self.start_lba_data() + length
    }

    /// Redump audio tracks carry 150 zeroed pregap sectors at the head of the file.
    /// TruRip and TOSEC dumps never do.
    pub fn is_pregap_data_embedded(&self) -> bool {
        self.pregap_embedded
    }

    fn embedded_pregap_sectors(&self) -> i64 {
        if self.pregap_embedded {
            PREGAP_SECTORS as i64
        } else {
            0
        }
    }

    pub fn normalized_start_lba_pregap(&self) -> i64 {
        self.start_lba_pregap() + self.embedded_pregap_sectors()
    }

    pub fn normalized_start_lba_data(&self) -> i64 {
        self.start_lba_data() + self.embedded_pregap_sectors()
    }

    /// TruRip/TOSEC style dumps reuse the trailing sectors of the previous track as this track's pregap.
    pub fn is_overlapped_with(&self, previous: Option<&GdiTrack>) -> bool {
        if self.number() == 1 || self.number() == 3 {
            return false;
        }
        previous.is_some_and(|prev| prev.end_lba() > self.start_lba_pregap())
    }

    pub fn disc_lba_to_track_lba(&self, disc_lba: i64) -> i64 {
        disc_lba - self.normalized_start_lba_data()
    }

    pub fn track_lba_to_disc_lba(&self, track_lba: i64) -> i64 {
        track_lba + self.normalized_start_lba_data()
    }

    pub fn track_lba_to_file_byte_offset(&self, track_lba: i64) -> i64 {
        (track_lba + self.embedded_pregap_sectors()) * self.sector_size() as i64
    }

    pub fn disc_lba_to_file_byte_offset(&self, disc_lba: i64) -> i64 {
        self.track_lba_to_file_byte_offset(self.disc_lba_to_track_lba(disc_lba))
    }

    /// Reads one raw sector at `track_lba`, or `None` if it is not fully backed by the file.
    pub async fn read_sector_raw(&self, track_lba: i64) -> Option<Vec<u8>> {
        let offset = self.track_lba_to_file_byte_offset(track_lba);
        if offset < 0 {
            return None;
        }
        let len = self.sector_size() as usize;
        let mut buf = vec![0u8; len];
        match self.content.read_byte_data(&mut buf, 0, offset as u64, len).await {
            Ok(n) if n == len => Some(buf),
            _ => None,
        }
    }
}

async fn probe_embedded_pregap(
    record: &TrackRecord,
    content: &TrackContent,
    logger: &SharedLogger,
) -> bool {
    if record.track_type != TrackType::Audio || !content.is_valid() {
        return false;
    }

    let mut head = [0u8; EMBEDDED_PREGAP_PROBE_LEN];
    match content
        .read_byte_data(&mut head, 0, 0, EMBEDDED_PREGAP_PROBE_LEN)
        .await
    {
        Ok(n) if n == EMBEDDED_PREGAP_PROBE_LEN => {
            logger.log(&format!(
                "Track {} head: {}",
                record.number,
                hex::encode(head)
            ));
            head.iter().all(|&b| b == 0)
        }
        Ok(_) => {
            logger.error(&format!(
                "Track {}: file too short to probe for embedded pregap",
                record.number
            ));
            false
        }
        Err(e) => {
            logger.error(&format!(
                "Track {}: failed to read data from track: {e}",
                record.number
            ));
            false
        }
    }
}
