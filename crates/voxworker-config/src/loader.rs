use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Load the file at `path` when it exists, otherwise fall back to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file fails to load
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        tracing::debug!(config_path = %path.display(), "config file not found, using defaults");

        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_server_config()?;
        self.validate_model_config()?;
        self.validate_fetch_config()?;
        self.validate_synthesis_config()?;
        self.validate_telemetry_config()?;
        Ok(())
    }

    fn validate_server_config(&self) -> anyhow::Result<()> {
        let health = &self.server.health;

        if health.enabled && !health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/', got '{}'", health.path);
        }

        Ok(())
    }

    fn validate_model_config(&self) -> anyhow::Result<()> {
        if !matches!(self.model.base_url.scheme(), "http" | "https") {
            anyhow::bail!("model.base_url must use http or https");
        }

        if self.model.sample_rate == 0 {
            anyhow::bail!("model.sample_rate must be greater than 0");
        }

        if self.model.connect_timeout.is_zero() {
            anyhow::bail!("model.connect_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_fetch_config(&self) -> anyhow::Result<()> {
        if self.fetch.timeout.is_zero() || self.fetch.connect_timeout.is_zero() {
            anyhow::bail!("fetch timeouts must be greater than 0");
        }

        if self.fetch.max_bytes == 0 {
            anyhow::bail!("fetch.max_bytes must be greater than 0");
        }

        Ok(())
    }

    fn validate_synthesis_config(&self) -> anyhow::Result<()> {
        let synthesis = &self.synthesis;

        if synthesis.max_segments == 0 {
            anyhow::bail!("synthesis.max_segments must be greater than 0");
        }

        if synthesis.max_total_pause < synthesis.max_pause {
            anyhow::bail!("synthesis.max_total_pause must be at least synthesis.max_pause");
        }

        Ok(())
    }

    fn validate_telemetry_config(&self) -> anyhow::Result<()> {
        let Some(rate) = self
            .telemetry
            .as_ref()
            .and_then(|t| t.tracing.as_ref())
            .map(|t| t.sampling_rate)
        else {
            return Ok(());
        };

        if !(0.0..=1.0).contains(&rate) {
            anyhow::bail!("telemetry.tracing.sampling_rate must be between 0.0 and 1.0, got {rate}");
        }

        Ok(())
    }
}
