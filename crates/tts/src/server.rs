use std::sync::Arc;

use voxworker_config::Config;

use crate::{
    error::TtsError,
    fetch::AudioFetcher,
    handler::RequestHandler,
    http_client::{fetch_client, model_client},
    model::{RemoteModel, SpeechModel},
    validate::PauseLimits,
};

/// Builder for constructing the request pipeline from configuration
///
/// The speech model is created once here and shared by every request the
/// resulting handler serves.
pub struct PipelineBuilder<'a> {
    config: &'a Config,
    model: Option<Arc<dyn SpeechModel>>,
}

impl<'a> PipelineBuilder<'a> {
    pub const fn new(config: &'a Config) -> Self {
        Self { config, model: None }
    }

    /// Use an already-constructed model instead of the configured remote one
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn SpeechModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn build(self) -> crate::error::Result<RequestHandler> {
        let model = match self.model {
            Some(model) => model,
            None => {
                let model_config = &self.config.model;
                let client = model_client(model_config)
                    .map_err(|e| TtsError::Config(format!("failed to build speech model client: {e}")))?;

                Arc::new(RemoteModel::new(
                    client,
                    &model_config.base_url,
                    model_config.api_key.clone(),
                    model_config.sample_rate,
                ))
            }
        };

        let fetch_config = &self.config.fetch;
        let client = fetch_client(fetch_config)
            .map_err(|e| TtsError::Config(format!("failed to build reference audio client: {e}")))?;
        let fetcher = AudioFetcher::new(client, fetch_config.scratch_dir(), fetch_config.max_bytes);

        tracing::debug!(
            model = model.name(),
            sample_rate = model.sample_rate(),
            scratch_dir = %fetch_config.scratch_dir().display(),
            "speech pipeline initialized"
        );

        Ok(RequestHandler::new(
            model,
            fetcher,
            PauseLimits::from(&self.config.synthesis),
        ))
    }
}
