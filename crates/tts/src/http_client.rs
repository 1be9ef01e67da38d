use std::time::Duration;

use axum::http;
use reqwest::Client;
use voxworker_config::{FetchConfig, ModelConfig};

const USER_AGENT: &str = concat!("voxworker/", env!("CARGO_PKG_VERSION"));

/// Client for downloading reference audio from caller-supplied URLs
///
/// The whole exchange is bounded by `fetch.timeout`.
pub fn fetch_client(config: &FetchConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
}

/// Client for the model server, reused across requests
///
/// Only the connection is time-boxed; generation may legitimately take as
/// long as the hosting runtime allows.
pub fn model_client(config: &ModelConfig) -> reqwest::Result<Client> {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
        .build()
}
