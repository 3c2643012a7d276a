pub mod toml_config;

pub use toml_config::{StorageKind, WorkerConfig};

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "counting-worker")]
#[command(about = "Consumes counting results from Kafka and stores them")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "worker-config.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Load and validate the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,
}
