use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lenscat")]
#[command(about = "Sorts eyewear product photographs into a reference catalog", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "LENSCAT_CONFIG", default_value = "lenscat.toml")]
    pub config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process the source directory until the backlog is empty
    Run,
    /// Print catalog statistics
    Stats,
}
