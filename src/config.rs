//! Command line and environment configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5000";

#[derive(Parser, Debug)]
#[command(name = "quantum-ballot", version, about = "Quantum Ballot terminal client")]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Path to open at start; unknown paths redirect to the welcome step
    #[arg(long, default_value = "/")]
    pub route: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Base URL of the analysis service
    #[arg(long, env = "QUANTUM_BALLOT_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    pub service_url: String,

    /// Per-request timeout; requests wait indefinitely when unset
    #[arg(long, env = "QUANTUM_BALLOT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log file for the interactive UI
    #[arg(long, env = "QUANTUM_BALLOT_LOG")]
    pub log_file: Option<PathBuf>,

    /// Where exported images are written
    #[arg(long, env = "QUANTUM_BALLOT_EXPORT_DIR", default_value = "ballot-images")]
    pub export_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one analysis and print a summary
    Analyze {
        /// Two-bit message (00, 01, 10, 11) or a vote id such as `approve`
        #[arg(long)]
        message: String,

        /// Also simulate an eavesdropper
        #[arg(long)]
        eve: bool,

        /// Write the returned images to the export directory
        #[arg(long)]
        export: bool,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("service URL must start with http:// or https://, got {0:?}")]
    InvalidServiceUrl(String),
    #[error("timeout must be at least one second")]
    ZeroTimeout,
}

/// Validated settings shared by both modes
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_url: String,
    pub timeout: Option<Duration>,
    pub log_file: PathBuf,
    pub export_dir: PathBuf,
}

impl AppConfig {
    pub fn from_args(args: &CommonArgs) -> Result<Self, ConfigError> {
        let service_url = args.service_url.trim().trim_end_matches('/').to_string();
        if !(service_url.starts_with("http://") || service_url.starts_with("https://")) {
            return Err(ConfigError::InvalidServiceUrl(args.service_url.clone()));
        }

        let timeout = match args.timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let log_file = args.log_file.clone().unwrap_or_else(default_log_file);

        Ok(Self {
            service_url,
            timeout,
            log_file,
            export_dir: args.export_dir.clone(),
        })
    }
}

fn default_log_file() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".quantum-ballot")
        .join("quantum-ballot.log")
}
