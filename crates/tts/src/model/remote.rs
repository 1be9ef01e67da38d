use std::{ffi::OsStr, path::Path};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{SpeechModel, decode_wav};
use crate::types::Waveform;

/// Chatterbox-compatible model server reached over HTTP
///
/// Sends `POST {base_url}/generate` as multipart form data and expects a
/// WAV body back.
pub struct RemoteModel {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    sample_rate: u32,
    name: String,
}

impl RemoteModel {
    pub fn new(client: Client, base_url: &Url, api_key: Option<SecretString>, sample_rate: u32) -> Self {
        let endpoint = format!("{}/generate", base_url.as_str().trim_end_matches('/'));
        let name = base_url.host_str().unwrap_or("model").to_string();

        Self {
            client,
            endpoint,
            api_key,
            sample_rate,
            name,
        }
    }
}

#[async_trait]
impl SpeechModel for RemoteModel {
    async fn synthesize(
        &self,
        text: &str,
        reference: Option<&Path>,
        exaggeration: f32,
        cfg_weight: f32,
    ) -> anyhow::Result<Waveform> {
        let mut form = Form::new()
            .text("text", text.to_string())
            .text("exaggeration", exaggeration.to_string())
            .text("cfg_weight", cfg_weight.to_string());

        if let Some(path) = reference {
            let audio = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read reference audio {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("prompt.wav")
                .to_string();

            form = form.part("audio_prompt", Part::bytes(audio).file_name(file_name));
        }

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach speech model at {}", self.endpoint))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("speech model returned {status}: {error_text}");
        }

        let body = response.bytes().await.context("failed to read speech model response")?;

        tracing::debug!(bytes = body.len(), "speech model response received");

        decode_wav(&body)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        &self.name
    }
}
