// src/cd/mod.rs
use binrw::BinResult;
use binrw::prelude::*;
use std::io::Cursor;

pub const SECTOR_SIZE: usize = 2352;
pub const SYNC_HEADER_SIZE: usize = 16;
pub const USER_DATA_SIZE: usize = 2048;

/// LBA = FAD - 150
pub const FAD_LBA_OFFSET: u32 = 150;
pub const PREGAP_SECTORS: u32 = 150;

/// Leading sectors of the final data track that redump dumps store at the tail of the previous track.
pub const RELOCATED_SECTORS: u32 = 75;

/// First FAD past the end of the GD-ROM high density area.
pub const GDROM_END_FAD: u32 = 0x861B4;
pub const GDROM_END_LBA: u32 = GDROM_END_FAD - FAD_LBA_OFFSET;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackMode {
    Audio,
    Data,
}

/// Raw 2352-byte data sector.
#[derive(Debug, BinRead)]
#[br(big)]
pub struct CdSector {
    pub sync: [u8; 12],
    pub header: [u8; 4],
    pub data: [u8; USER_DATA_SIZE],
    #[br(little)]
    pub edc: u32,
    pub intermediate: [u8; 8],
    pub ecc_p: [u8; 172],
    pub ecc_q: [u8; 104],
}

impl CdSector {
    pub fn from_raw_bytes(data: &[u8]) -> BinResult<Self> {
        let mut cursor = Cursor::new(data);
        CdSector::read(&mut cursor)
    }
}
