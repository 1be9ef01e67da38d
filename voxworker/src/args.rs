use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use url::Url;

/// Serverless text-to-speech worker
#[derive(Debug, Parser)]
#[command(name = "voxworker", about = "Voice-cloning text-to-speech worker producing MP3 audio")]
pub struct Args {
    /// Path to configuration file, defaults are used when it does not exist
    #[arg(short, long, default_value = "voxworker.toml", env = "VOXWORKER_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "VOXWORKER_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the speech model server URL
    #[arg(long, env = "VOXWORKER_MODEL_URL")]
    pub model_url: Option<Url>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run a single job given as JSON, print the result and exit
    #[arg(long, value_name = "JOB_JSON")]
    pub test_input: Option<String>,
}
