pub mod error;
pub mod models;

use crate::cd::{FAD_LBA_OFFSET, GDROM_END_LBA, PREGAP_SECTORS};
use crate::gdi::ipbin::error::{IpBinError, IpBinResult};
use crate::gdi::ipbin::models::{IpBinHeader, RefTrackInfo};
use crate::logger::SharedLogger;
use binrw::BinRead;
use byteorder::{ByteOrder, LittleEndian};
use std::io::Cursor;

/// IP.BIN spans the user data of the first 16 sectors of track 3.
pub const IP_BIN_SIZE: usize = 0x8000;
pub const IP_BIN_SECTORS: usize = 0x10;

const TOC_MAGIC_OFFSET: usize = 0x100;
const TOC_MAGIC: &[u8; 4] = b"TOC1";
const TOC_ENTRIES_OFFSET: usize = 0x104;
const TOC_ENTRY_SIZE: usize = 4;
/// 99 tracks minus the two in the low density area
const TOC_MAX_ENTRIES: usize = 97;

/// Decoded view of the boot sector region of a GD-ROM.
#[derive(Debug)]
pub struct InitialProgram {
    content: Vec<u8>,
    header: Option<IpBinHeader>,
    ref_tracks: Vec<RefTrackInfo>,
    logger: SharedLogger,
}

impl InitialProgram {
    /// Never fails: an undersized buffer produces an empty table and no header.
    pub fn from_buffer(data: &[u8], logger: SharedLogger) -> Self {
        let mut ip = Self {
            content: vec![0u8; IP_BIN_SIZE],
            header: None,
            ref_tracks: Vec::new(),
            logger,
        };

        if data.len() < IP_BIN_SIZE {
            ip.logger.warn(&format!(
                "IP.BIN: {}",
                IpBinError::BufferTooSmall(data.len())
            ));
            return ip;
        }

        ip.content.copy_from_slice(&data[..IP_BIN_SIZE]);

        match ip.parse_header() {
            Ok(header) => {
                if !header.is_sega_hardware() {
                    ip.logger.warn(&format!(
                        "IP.BIN: unexpected hardware id \"{}\"",
                        header.hardware_id()
                    ));
                }
                ip.header = Some(header);
            }
            Err(e) => ip.logger.error(&format!("IP.BIN header parse failed: {e}")),
        }

        if &ip.content[TOC_MAGIC_OFFSET..TOC_ENTRIES_OFFSET] != TOC_MAGIC {
            ip.logger.warn("IP.BIN: TOC1 signature missing, decoding track table anyway");
        }
        ip.ref_tracks = decode_ref_tracks(&ip.content);

        ip
    }

    fn parse_header(&self) -> IpBinResult<IpBinHeader> {
        let mut cursor = Cursor::new(&self.content[..IpBinHeader::SIZE]);
        Ok(IpBinHeader::read(&mut cursor)?)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn header(&self) -> Option<&IpBinHeader> {
        self.header.as_ref()
    }

    pub fn ref_tracks(&self) -> &[RefTrackInfo] {
        &self.ref_tracks
    }

    /// Hex listing of the whole region followed by the reference track start LBAs.
    pub fn dump_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.content.chunks(16).map(hex::encode).collect();
        lines.extend(
            self.ref_tracks
                .iter()
                .enumerate()
                .map(|(i, t)| format!("RefTrack {i} startLBA: {}", t.start_lba)),
        );
        lines
    }

    pub fn print_info(&self) {
        self.logger.info("IP.BIN content:");
        for line in self.dump_lines() {
            self.logger.info(&line);
        }
    }

    pub fn print_header(&self) {
        let field = |label: &str, value: String| {
            self.logger.info(&format!("{label:<20}{value}"));
        };

        match &self.header {
            Some(header) => {
                field("Hardware ID:", header.hardware_id());
                field("Maker ID:", header.maker_id());
                field("Device info:", header.device_info());
                field("Area symbols:", header.area_symbols());
                field("Product number:", header.product_number());
                field("Version:", header.product_version());
                field(
                    "Release date:",
                    header
                        .release_date()
                        .map_or_else(|| "unknown".to_string(), |d| d.to_string()),
                );
                field("Boot file:", header.boot_filename());
                field("Company:", header.company_name());
                field("Title:", header.software_title());
            }
            None => self.logger.warn("IP.BIN header unavailable"),
        }

        for (i, track) in self.ref_tracks.iter().enumerate() {
            let kind = if track.is_data_track() { "data" } else { "audio" };
            field(
                &format!("TOC track {}:", i + 3),
                format!(
                    "{kind} start LBA {} length {} sectors",
                    track.start_lba, track.length_in_sector
                ),
            );
        }
    }
}

fn decode_ref_tracks(content: &[u8]) -> Vec<RefTrackInfo> {
    let mut tracks: Vec<RefTrackInfo> = Vec::new();

    for i in 0..TOC_MAX_ENTRIES {
        let offset = TOC_ENTRIES_OFFSET + i * TOC_ENTRY_SIZE;
        let entry = &content[offset..offset + TOC_ENTRY_SIZE];
        let fad = LittleEndian::read_u24(&entry[..3]);
        let type_id = entry[3];

        if type_id != RefTrackInfo::TYPE_AUDIO && type_id != RefTrackInfo::TYPE_DATA {
            // usually 0xFFFFFFFF
            break;
        }

        tracks.push(RefTrackInfo {
            start_lba: fad as i64 - FAD_LBA_OFFSET as i64,
            type_id,
            length_in_sector: 0,
        });
    }

    let starts: Vec<i64> = tracks.iter().map(|t| t.start_lba).collect();
    for (i, track) in tracks.iter_mut().enumerate() {
        track.length_in_sector = match starts.get(i + 1) {
            Some(next) => next - track.start_lba - PREGAP_SECTORS as i64,
            None => GDROM_END_LBA as i64 - track.start_lba,
        };
    }

    tracks
}
