use binrw::BinRead;
use chrono::NaiveDate;

/// Fixed metadata block at the start of IP.BIN, 0x100 bytes of space padded ASCII.
#[derive(Debug, Clone, BinRead)]
#[br(little)]
pub struct IpBinHeader {
    /// Always "SEGA SEGAKATANA " on retail discs
    pub hardware_id: [u8; 16],
    pub maker_id: [u8; 16],
    /// CRC, "GD-ROM" and disc number ("1/1")
    pub device_info: [u8; 16],
    pub area_symbols: [u8; 8],
    pub peripherals: [u8; 8],
    pub product_number: [u8; 10],
    pub product_version: [u8; 6],
    /// YYYYMMDD followed by spaces
    pub release_date: [u8; 16],
    pub boot_filename: [u8; 16],
    pub company_name: [u8; 16],
    pub software_title: [u8; 128],
}

fn text(field: &[u8]) -> String {
    String::from_utf8_lossy(field)
        .trim_end_matches(['\0', ' '])
        .trim_start()
        .to_string()
}

impl IpBinHeader {
    pub const SIZE: usize = 0x100;

    pub fn hardware_id(&self) -> String {
        text(&self.hardware_id)
    }

    pub fn maker_id(&self) -> String {
        text(&self.maker_id)
    }

    pub fn device_info(&self) -> String {
        text(&self.device_info)
    }

    pub fn area_symbols(&self) -> String {
        text(&self.area_symbols)
    }

    pub fn product_number(&self) -> String {
        text(&self.product_number)
    }

    pub fn product_version(&self) -> String {
        text(&self.product_version)
    }

    pub fn boot_filename(&self) -> String {
        text(&self.boot_filename)
    }

    pub fn company_name(&self) -> String {
        text(&self.company_name)
    }

    pub fn software_title(&self) -> String {
        text(&self.software_title)
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        let raw = text(&self.release_date);
        let digits = raw.get(..8)?;
        NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
    }

    pub fn is_sega_hardware(&self) -> bool {
        self.hardware_id.starts_with(b"SEGA")
    }
}

/// Reference track entry of the IP.BIN TOC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefTrackInfo {
    pub start_lba: i64,
    pub type_id: u8,
    /// Sectors up to the next entry, excluding its 150 sector pregap
    pub length_in_sector: i64,
}

impl RefTrackInfo {
    pub const TYPE_AUDIO: u8 = 0x01;
    pub const TYPE_DATA: u8 = 0x41;

    pub fn is_audio_track(&self) -> bool {
        self.type_id == Self::TYPE_AUDIO
    }

    pub fn is_data_track(&self) -> bool {
        self.type_id == Self::TYPE_DATA
    }
}
