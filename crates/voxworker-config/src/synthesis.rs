use std::time::Duration;

use serde::Deserialize;

/// Limits on what a single job's text may ask the pipeline to produce
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Longest silence a single `[pause:N]` marker may insert
    #[serde(default = "default_max_pause", with = "crate::duration")]
    pub max_pause: Duration,
    /// Upper bound on the summed silence of all markers in one job
    #[serde(default = "default_max_total_pause", with = "crate::duration")]
    pub max_total_pause: Duration,
    /// Upper bound on speech and pause segments in one job
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_pause: default_max_pause(),
            max_total_pause: default_max_total_pause(),
            max_segments: default_max_segments(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_pause() -> Duration {
    Duration::from_secs(30)
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_total_pause() -> Duration {
    Duration::from_secs(120)
}

const fn default_max_segments() -> usize {
    200
}
