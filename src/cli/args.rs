use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(
    name = "quoteshot",
    version,
    about = "Generate, position and save quote images"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding saved favorites
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Root directory of the gallery that exports are written to
    #[clap(long, value_parser)]
    pub gallery_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the quoteshot application
    #[clap(subcommand)]
    pub command: Commands,
}
