use crate::cd::{PREGAP_SECTORS, RELOCATED_SECTORS, SECTOR_SIZE, TrackMode};
use crate::gdrom::error::{LayoutError, LayoutResult};
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

pub const INDEX_00: u8 = 0;
pub const INDEX_01: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Memory(Vec<u8>),
    FileRegion { path: PathBuf, offset: u64 },
}

/// A run of sectors starting at `fad`, backed by memory or a region of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPart {
    pub fad: u32,
    pub length_in_sector: u32,
    pub source: ContentSource,
}

impl ContentPart {
    pub fn memory(fad: u32, length_in_sector: u32, data: Vec<u8>) -> Self {
        Self {
            fad,
            length_in_sector,
            source: ContentSource::Memory(data),
        }
    }

    pub fn file_region(fad: u32, length_in_sector: u32, path: impl Into<PathBuf>, offset: u64) -> Self {
        Self {
            fad,
            length_in_sector,
            source: ContentSource::FileRegion {
                path: path.into(),
                offset,
            },
        }
    }

    pub fn end_fad(&self) -> u32 {
        self.fad + self.length_in_sector
    }

    pub fn is_fad_in_range(&self, fad: u32) -> bool {
        fad >= self.fad && fad < self.end_fad()
    }

    /// `None` when `fad` is outside the part or its backing store is too short.
    pub async fn read_sector_raw(&self, fad: u32, sector_size: u32) -> LayoutResult<Option<Vec<u8>>> {
        if !self.is_fad_in_range(fad) {
            return Ok(None);
        }
        let relative = (fad - self.fad) as u64 * sector_size as u64;
        let sector_size = sector_size as usize;

        match &self.source {
            ContentSource::Memory(data) => {
                let start = relative as usize;
                Ok(data.get(start..start + sector_size).map(<[u8]>::to_vec))
            }
            ContentSource::FileRegion { path, offset } => {
                let mut file = File::open(path).await?;
                file.seek(SeekFrom::Start(offset + relative)).await?;
                let mut buf = vec![0u8; sector_size];
                match file.read_exact(&mut buf).await {
                    Ok(_) => Ok(Some(buf)),
                    Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

/// An index of a track. Sectors not covered by any part read as pseudo-sectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackIndex {
    pub fad: u32,
    pub length_in_sector: u32,
    parts: Vec<ContentPart>,
}

impl TrackIndex {
    pub fn new(fad: u32, length_in_sector: u32) -> Self {
        Self {
            fad,
            length_in_sector,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.add_part(part);
        self
    }

    /// Parts are kept ordered by FAD.
    pub fn add_part(&mut self, part: ContentPart) {
        let at = self.parts.partition_point(|p| p.fad <= part.fad);
        self.parts.insert(at, part);
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    pub fn is_fad_in_range(&self, fad: u32) -> bool {
        fad >= self.fad && fad < self.fad + self.length_in_sector
    }

    fn part_at(&self, fad: u32) -> Option<&ContentPart> {
        let after = self.parts.partition_point(|p| p.fad <= fad);
        after
            .checked_sub(1)
            .map(|i| &self.parts[i])
            .filter(|p| p.is_fad_in_range(fad))
    }

    pub async fn read_sector_raw(
        &self,
        fad: u32,
        mode: TrackMode,
        sector_size: u32,
    ) -> LayoutResult<Option<Vec<u8>>> {
        if !self.is_fad_in_range(fad) {
            return Ok(None);
        }
        match self.part_at(fad) {
            Some(part) => part.read_sector_raw(fad, sector_size).await,
            None => Ok(pseudo_sector(mode, sector_size)),
        }
    }
}

/// Audio gaps read as silence. Data pseudo-sectors are not synthesized.
pub fn pseudo_sector(mode: TrackMode, sector_size: u32) -> Option<Vec<u8>> {
    match mode {
        TrackMode::Audio => Some(vec![0u8; sector_size as usize]),
        TrackMode::Data => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdRomTrack {
    pub track_no: u8,
    pub mode: TrackMode,
    pub fad: u32,
    pub length_in_sector: u32,
    pub sector_size: u32,
    indices: [Option<TrackIndex>; 2],
}

impl GdRomTrack {
    pub fn new(mode: TrackMode) -> Self {
        Self {
            track_no: 0,
            mode,
            fad: 0,
            length_in_sector: 0,
            sector_size: SECTOR_SIZE as u32,
            indices: [None, None],
        }
    }

    pub fn lba(&self) -> i64 {
        self.fad as i64 - PREGAP_SECTORS as i64
    }

    pub fn length_in_byte(&self) -> u64 {
        self.length_in_sector as u64 * self.sector_size as u64
    }

    pub fn is_fad_in_range(&self, fad: u32) -> bool {
        fad >= self.fad && fad < self.fad + self.length_in_sector
    }

    pub fn index(&self, index_no: u8) -> Option<&TrackIndex> {
        self.indices.get(index_no as usize)?.as_ref()
    }

    pub fn set_index(&mut self, index_no: u8, index: TrackIndex) -> LayoutResult<()> {
        let slot = self
            .indices
            .get_mut(index_no as usize)
            .ok_or(LayoutError::InvalidIndex(index_no))?;
        *slot = Some(index);
        Ok(())
    }

    /// A data track past track 3 can only be the closing track of a Pattern III layout.
    pub fn is_last_track_of_pattern3_hd_area(&self) -> bool {
        self.mode == TrackMode::Data && self.track_no > 3
    }

    pub fn length_of_index00_in_sector(&self) -> u32 {
        if self.is_last_track_of_pattern3_hd_area() {
            PREGAP_SECTORS + RELOCATED_SECTORS
        } else {
            PREGAP_SECTORS
        }
    }

    /// Resolves `fad` through index 00 then index 01.
    pub async fn read_sector_raw(&self, fad: u32) -> LayoutResult<Option<Vec<u8>>> {
        if !self.is_fad_in_range(fad) {
            return Ok(None);
        }
        for index in self.indices.iter().flatten() {
            if index.is_fad_in_range(fad) {
                return index.read_sector_raw(fad, self.mode, self.sector_size).await;
            }
        }
        Ok(None)
    }
}
