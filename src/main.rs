use crate::commands::gdi::GdiCommands;
use crate::commands::{Cli, Commands};
use crate::gdi::writer::WriterOptions;
use crate::gdi::{convert_to_general_gdi, show_info, show_ip_bin};
use crate::logger::default_logger;
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

mod cd;
mod commands;
mod gdi;
mod gdrom;
mod logger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let env_logger = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .build();

    let level = env_logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), env_logger).try_init()?;
    log::set_max_level(level);

    let cli = Cli::parse();
    let logger = default_logger();

    match cli.command {
        Commands::Gdi(inner) => match inner {
            GdiCommands::Info(cmd) => show_info(cmd.input_gdi, logger).await?,
            GdiCommands::IpBin(cmd) => show_ip_bin(cmd.input_gdi, cmd.hex, logger).await?,
            GdiCommands::Convert(cmd) => {
                let options = WriterOptions {
                    copy_buffer_sectors: cmd.buffer_sectors,
                    concurrent: !cmd.sequential,
                    max_concurrent_tracks: cmd.jobs,
                };
                let summary =
                    convert_to_general_gdi(Some(pb.clone()), cmd.input_gdi, cmd.output_dir, options, logger)
                        .await?;
                if !summary.tracks_failed.is_empty() {
                    anyhow::bail!("Failed to write tracks {:?}", summary.tracks_failed);
                }
            }
        },
    }

    Ok(())
}
