use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Commands specific to GD-ROM .gdi dumps
#[derive(Subcommand, Debug, Eq, PartialEq)]
pub enum GdiCommands {
    Info(InfoCommand),
    IpBin(IpBinCommand),
    Convert(ConvertCommand),
}

/// Prints the track table, dump format and layout pattern of a .gdi disc.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct InfoCommand {
    /// Path to the .gdi file
    #[arg(value_name = "INPUT_GDI")]
    pub input_gdi: PathBuf,
}

/// Prints the IP.BIN header and TOC read from track 3.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct IpBinCommand {
    /// Path to the .gdi file
    #[arg(value_name = "INPUT_GDI")]
    pub input_gdi: PathBuf,

    /// Also hex dump the first bytes of IP.BIN
    #[arg(long, short = 'x', default_value_t = false)]
    pub hex: bool,
}

/// Rewrites a .gdi disc (Redump, TruRip or TOSEC) into the generic TruRip/TOSEC layout.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
pub struct ConvertCommand {
    /// Path to the .gdi file
    #[arg(value_name = "INPUT_GDI")]
    pub input_gdi: PathBuf,

    /// Existing directory that receives disc.gdi and the track files
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Write the track files one after another instead of concurrently
    #[arg(long, short = 's', default_value_t = false)]
    pub sequential: bool,

    /// Tracks converted at once when not sequential
    #[arg(long, short = 'j', value_name = "TRACKS", default_value_t = 4)]
    pub jobs: usize,

    /// Copy buffer size in sectors
    #[arg(long, short = 'b', value_name = "SECTORS", default_value_t = 10240)]
    pub buffer_sectors: usize,
}
