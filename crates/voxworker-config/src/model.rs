use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Connection settings for the speech synthesis model server
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Base URL of the model server, `/generate` is appended
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Bearer token sent to the model server
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Upper bound on establishing the connection
    ///
    /// Generation itself is not timed out, the hosting runtime bounds the request.
    #[serde(default = "default_connect_timeout", with = "crate::duration")]
    pub connect_timeout: Duration,
    /// Native output sample rate of the model in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            connect_timeout: default_connect_timeout(),
            sample_rate: default_sample_rate(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("http://127.0.0.1:8001").expect("must be a valid URL")
}

#[allow(clippy::missing_const_for_fn)]
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

#[allow(clippy::missing_const_for_fn)]
fn default_sample_rate() -> u32 {
    24_000
}
