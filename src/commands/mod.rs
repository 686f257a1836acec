use crate::commands::gdi::GdiCommands;
use clap::{Parser, Subcommand};

pub mod gdi;

/// CLI for inspecting and normalizing Dreamcast GD-ROM dumps.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(subcommand)]
    Gdi(GdiCommands),
}
