pub mod parser;

use crate::cd::{CdSector, PREGAP_SECTORS, RELOCATED_SECTORS, USER_DATA_SIZE};
use crate::gdi::disc::parser::GdiParser;
use crate::gdi::error::{GdiError, GdiResult};
use crate::gdi::ipbin::models::RefTrackInfo;
use crate::gdi::ipbin::{IP_BIN_SECTORS, IP_BIN_SIZE, InitialProgram};
use crate::gdi::track::{GdiTrack, TrackRecord, TrackType};
use crate::logger::SharedLogger;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Track that carries IP.BIN in its first 16 sectors.
pub const IP_BIN_TRACK: u32 = 3;

/// Disagreement between the cue sheet and the TOC embedded in IP.BIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocMismatch {
    TrackCount { toc: usize, disc: usize },
    MissingTrack { number: u32 },
    TrackType { number: u32, toc_type_id: u8, track_type: TrackType },
    StartLba { number: u32, toc: i64, disc: i64 },
}

impl Display for TocMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrackCount { toc, disc } => write!(
                f,
                "IP.BIN lists {toc} high density tracks, the gdi file has {disc}"
            ),
            Self::MissingTrack { number } => {
                write!(f, "Track {number} is listed in IP.BIN but missing from the gdi file")
            }
            Self::TrackType {
                number,
                toc_type_id,
                track_type,
            } => write!(
                f,
                "Track {number} is {track_type} but IP.BIN has type 0x{toc_type_id:02x}"
            ),
            Self::StartLba { number, toc, disc } => write!(
                f,
                "Track {number} starts at LBA {disc} but IP.BIN says {toc}"
            ),
        }
    }
}

/// A `.gdi` disc image: the track table plus the IP.BIN loaded from track 3.
#[derive(Debug)]
pub struct GdiDisc {
    source_dir: PathBuf,
    track_count: u32,
    tracks: BTreeMap<u32, GdiTrack>,
    ip_bin: Option<InitialProgram>,
    toc_mismatches: Vec<TocMismatch>,
    logger: SharedLogger,
}

impl GdiDisc {
    pub async fn load_from_file(gdi_path: impl AsRef<Path>, logger: SharedLogger) -> GdiResult<Self> {
        let gdi_path = gdi_path.as_ref();
        if !gdi_path.is_file() {
            return Err(GdiError::GdiFileNotFound(gdi_path.to_path_buf()));
        }

        let source_dir = gdi_path.parent().unwrap_or(Path::new("."));
        logger.log(&format!("Loading gdi file: {}", gdi_path.display()));

        let file = File::open(gdi_path).await?;
        Self::load_from_reader(BufReader::new(file), source_dir, logger).await
    }

    /// Feeds every line of `reader` through the parser; track files are resolved against `source_dir`.
    pub async fn load_from_reader<R: AsyncBufRead + Unpin>(
        reader: R,
        source_dir: impl AsRef<Path>,
        logger: SharedLogger,
    ) -> GdiResult<Self> {
        let mut reader = reader;
        let mut parser = GdiParser::new(source_dir, logger);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw).await? == 0 {
                break;
            }
            parser.handle_raw_line(&raw);
        }

        Ok(parser.finish().await)
    }

    pub(crate) async fn build(
        source_dir: PathBuf,
        track_count: u32,
        records: BTreeMap<u32, TrackRecord>,
        logger: SharedLogger,
    ) -> Self {
        let mut tracks = BTreeMap::new();
        for (number, record) in records {
            tracks.insert(number, GdiTrack::load(record, &source_dir, &logger).await);
        }

        let mut disc = Self {
            source_dir,
            track_count,
            tracks,
            ip_bin: None,
            toc_mismatches: Vec::new(),
            logger,
        };

        disc.ip_bin = match disc.read_ip_bin_buffer().await {
            Some(buf) => Some(InitialProgram::from_buffer(&buf, disc.logger.clone())),
            None => {
                disc.logger
                    .warn("Track 3 is missing or invalid, IP.BIN was not loaded");
                None
            }
        };
        disc.toc_mismatches = disc.cross_check_toc();
        for mismatch in &disc.toc_mismatches {
            disc.logger.warn(&mismatch.to_string());
        }

        disc.logger.log("GDI file parsing finished.");
        disc
    }

    /// Skips the 16 byte sync/header of each of the first 16 raw sectors of track 3.
    async fn read_ip_bin_buffer(&self) -> Option<Vec<u8>> {
        let track3 = self.track(IP_BIN_TRACK)?;
        if !track3.content().is_valid() {
            return None;
        }

        let sector_size = track3.sector_size() as usize;
        let mut buf = vec![0u8; IP_BIN_SIZE];
        let mut raw = vec![0u8; sector_size];

        for i in 0..IP_BIN_SECTORS {
            let offset = (i * sector_size) as u64;
            match track3.content().read_byte_data(&mut raw, 0, offset, sector_size).await {
                Ok(n) if n == sector_size => {}
                Ok(n) => {
                    self.logger.error(&format!(
                        "IP.BIN sector {i}: short read of {n} bytes from track 3"
                    ));
                    return None;
                }
                Err(e) => {
                    self.logger.error(&format!("IP.BIN sector {i}: {e}"));
                    return None;
                }
            }

            let sector = match CdSector::from_raw_bytes(&raw) {
                Ok(sector) => sector,
                Err(e) => {
                    self.logger.error(&format!("IP.BIN sector {i}: {e}"));
                    return None;
                }
            };
            buf[i * USER_DATA_SIZE..(i + 1) * USER_DATA_SIZE].copy_from_slice(&sector.data);
        }

        Some(buf)
    }

    fn cross_check_toc(&self) -> Vec<TocMismatch> {
        let Some(ip_bin) = &self.ip_bin else {
            return Vec::new();
        };

        let refs = ip_bin.ref_tracks();
        let hd_tracks = self.tracks.keys().filter(|&&n| n >= IP_BIN_TRACK).count();
        let mut mismatches = Vec::new();

        if refs.len() != hd_tracks {
            mismatches.push(TocMismatch::TrackCount {
                toc: refs.len(),
                disc: hd_tracks,
            });
        }

        for (i, entry) in refs.iter().enumerate() {
            let number = IP_BIN_TRACK + i as u32;
            let Some(track) = self.track(number) else {
                mismatches.push(TocMismatch::MissingTrack { number });
                continue;
            };

            if !type_matches(entry, track.track_type()) {
                mismatches.push(TocMismatch::TrackType {
                    number,
                    toc_type_id: entry.type_id,
                    track_type: track.track_type(),
                });
            }

            let disc_start = self.generic_start_lba(track);
            if entry.start_lba != disc_start {
                mismatches.push(TocMismatch::StartLba {
                    number,
                    toc: entry.start_lba,
                    disc: disc_start,
                });
            }
        }

        mismatches
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Track count declared on the first line of the gdi file.
    pub fn track_count(&self) -> u32 {
        self.track_count
    }

    /// Tracks in ascending index order.
    pub fn tracks(&self) -> impl Iterator<Item = &GdiTrack> {
        self.tracks.values()
    }

    pub fn track(&self, number: u32) -> Option<&GdiTrack> {
        self.tracks.get(&number)
    }

    pub fn ip_bin(&self) -> Option<&InitialProgram> {
        self.ip_bin.as_ref()
    }

    pub fn is_ip_bin_loaded(&self) -> bool {
        self.ip_bin.is_some()
    }

    pub fn toc_mismatches(&self) -> &[TocMismatch] {
        &self.toc_mismatches
    }

    pub fn is_redump_format_detected(&self) -> bool {
        self.tracks().any(GdiTrack::is_pregap_data_embedded)
    }

    pub fn is_valid(&self) -> bool {
        self.is_ip_bin_loaded() && self.tracks().all(|t| t.content().is_valid())
    }

    pub fn is_last_track(&self, track: &GdiTrack) -> bool {
        track.number() == self.track_count
    }

    /// Redump moves the first 75 sectors of a final data track to the tail of the track before it.
    pub fn needs_last_track_fix(&self, track: &GdiTrack) -> bool {
        self.is_last_track(track) && track.is_data_track() && self.is_redump_format_detected()
    }

    /// Start LBA the track has in the generic (TruRip/TOSEC) convention.
    pub fn generic_start_lba(&self, track: &GdiTrack) -> i64 {
        let start = track.normalized_start_lba_data();
        if self.needs_last_track_fix(track) {
            start + (RELOCATED_SECTORS + PREGAP_SECTORS) as i64
        } else {
            start
        }
    }

    pub fn is_overlapped_with_previous_track(&self, track: &GdiTrack) -> bool {
        let previous = track
            .number()
            .checked_sub(1)
            .and_then(|n| self.track(n));
        track.is_overlapped_with(previous)
    }

    /// First track, by index, whose data range holds `disc_lba`.
    ///
    /// Sectors of the final data track that redump stores in the previous file resolve to
    /// that previous track.
    pub fn sector_owner_track(&self, disc_lba: i64) -> Option<&GdiTrack> {
        self.tracks()
            .find(|t| t.normalized_start_lba_data() <= disc_lba && disc_lba < t.end_lba())
    }

    pub fn print_info(&self) {
        for track in self.tracks() {
            let field = |label: &str, value: String| {
                self.logger.info(&format!("{label:<35}{value}"));
            };

            self.logger
                .info(&format!("========== Track {} Info ==========", track.number()));
            let valid = track.content().is_valid();
            field("Valid:", if valid { "valid" } else { "invalid" }.to_string());
            if !valid {
                continue;
            }
            field("Type:", track.track_type().to_string());
            field("Size(Byte):", track.content().length_in_byte().to_string());
            field("Size(Sector):", track.content().length_in_sector().to_string());
            field("PreGap length:", track.pregap_length_in_sector().to_string());
            field("Start LBA(PreGap):", track.start_lba_pregap().to_string());
            field("Start LBA(Data):", track.start_lba_data().to_string());
            field(
                "Normalized start LBA(PreGap):",
                track.normalized_start_lba_pregap().to_string(),
            );
            field(
                "Normalized start LBA(Data):",
                track.normalized_start_lba_data().to_string(),
            );
            field("End LBA:", track.end_lba().to_string());
            field(
                "PreGap data embedded:",
                track.is_pregap_data_embedded().to_string(),
            );
            field(
                "Overlapped with previous track:",
                self.is_overlapped_with_previous_track(track).to_string(),
            );
        }
    }

    pub fn print_ip_bin_info(&self) {
        match &self.ip_bin {
            Some(ip_bin) => ip_bin.print_info(),
            None => self.logger.warn("IP.BIN is not loaded"),
        }
    }

    /// Closes every track file. The disc must not be read afterwards.
    pub async fn unload(&self) {
        for track in self.tracks() {
            self.logger
                .log(&format!("Unloading Track {} content ...", track.number()));
            track.content().unload().await;
        }
    }
}

fn type_matches(entry: &RefTrackInfo, track_type: TrackType) -> bool {
    match track_type {
        TrackType::Audio => entry.is_audio_track(),
        TrackType::Data => entry.is_data_track(),
    }
}
