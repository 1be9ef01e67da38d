//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use voxworker_config::Config;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder bound to localhost with short fetch timeouts
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = SocketAddr::from(([127, 0, 0, 1], 0));
        config.fetch.timeout = Duration::from_secs(5);
        config.fetch.connect_timeout = Duration::from_secs(2);

        Self { config }
    }

    /// Point the pipeline at a model server
    pub fn with_model(mut self, base_url: &str) -> Self {
        self.config.model.base_url = base_url.parse().expect("valid URL");
        self
    }

    /// Stage reference audio under `dir`
    pub fn with_scratch_dir(mut self, dir: &Path) -> Self {
        self.config.fetch.scratch_dir = Some(dir.to_path_buf());
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
