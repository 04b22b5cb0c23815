use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mirrors Meowcoin stats into Discord voice channel names", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to config/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}
