#![allow(clippy::must_use_candidate)]

mod duration;
mod env;
pub mod fetch;
pub mod health;
mod loader;
pub mod model;
pub mod server;
pub mod synthesis;
pub mod telemetry;

use serde::Deserialize;

pub use fetch::*;
pub use health::*;
pub use model::*;
pub use server::*;
pub use synthesis::*;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level worker configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Speech model endpoint configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Reference audio retrieval configuration
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Synthesis pipeline tuning
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
