use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Reference audio download settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Total time allowed for one download, including the body
    #[serde(default = "default_timeout", with = "crate::duration")]
    pub timeout: Duration,
    #[serde(default = "default_connect_timeout", with = "crate::duration")]
    pub connect_timeout: Duration,
    /// Largest accepted reference clip in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Directory for staged clips, the system temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            max_bytes: default_max_bytes(),
            scratch_dir: None,
        }
    }
}

impl FetchConfig {
    /// Directory where staged clips are written
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[allow(clippy::missing_const_for_fn)]
fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_bytes() -> u64 {
    20 << 20
}
