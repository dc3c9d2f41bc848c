//! Replicate prediction client

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::backend::traits::{InferenceBackend, PredictionOutput};
use crate::config::ReplicateConfig;
use crate::error::{AppError, Result};

/// Hosted-inference backend speaking the Replicate predictions API
pub struct ReplicateBackend {
    client: Client,
    api_base: String,
    api_token: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: String,
    #[serde(default)]
    output: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

impl ReplicateBackend {
    /// Create a backend from configuration; a missing token is a configuration failure
    pub fn new(config: &ReplicateConfig) -> Result<Self> {
        let api_token = config
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::NotConfigured("Replicate API token not configured".to_string())
            })?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        })
    }

    /// Endpoint and body for a model reference.
    ///
    /// Pinned references (`owner/name:version`) go through the generic
    /// predictions endpoint; bare `owner/name` uses the model's own endpoint.
    fn prediction_request(&self, model: &str, input: Value) -> (String, Value) {
        match model.split_once(':') {
            Some((_, version)) => (
                format!("{}/predictions", self.api_base),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.api_base, model),
                json!({ "input": input }),
            ),
        }
    }

    async fn parse_prediction(context: &str, response: Response) -> Result<Prediction> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Inference(format!(
                "{} returned {}: {}",
                context, status, body
            )));
        }
        response
            .json::<Prediction>()
            .await
            .map_err(|e| AppError::Inference(format!("Failed to parse {} response: {}", context, e)))
    }

    async fn poll(&self, poll_url: &str) -> Result<Prediction> {
        let started = Instant::now();
        loop {
            tokio::time::sleep(self.poll_interval).await;

            let response = self
                .client
                .get(poll_url)
                .bearer_auth(&self.api_token)
                .send()
                .await?;
            let prediction = Self::parse_prediction("Replicate poll", response).await?;

            match prediction.status.to_ascii_lowercase().as_str() {
                "starting" | "processing" => {
                    if started.elapsed() >= self.poll_timeout {
                        return Err(AppError::Inference(format!(
                            "Prediction timed out after {}s",
                            self.poll_timeout.as_secs()
                        )));
                    }
                    debug!(url = %poll_url, status = %prediction.status, "Prediction still running");
                }
                _ => return Ok(prediction),
            }
        }
    }
}

#[async_trait]
impl InferenceBackend for ReplicateBackend {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn run(&self, model: &str, input: Value) -> Result<PredictionOutput> {
        let (endpoint, body) = self.prediction_request(model, input);
        debug!(model = %model, endpoint = %endpoint, "Creating prediction");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;
        let mut prediction = Self::parse_prediction("Replicate", response).await?;

        if matches!(
            prediction.status.to_ascii_lowercase().as_str(),
            "starting" | "processing"
        ) {
            let poll_url = prediction
                .urls
                .as_ref()
                .and_then(|u| u.get.as_deref())
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .ok_or_else(|| AppError::Inference("Prediction missing poll URL".to_string()))?
                .to_string();
            prediction = self.poll(&poll_url).await?;
        }

        match prediction.status.to_ascii_lowercase().as_str() {
            "succeeded" => {
                info!(
                    model = %model,
                    prediction = prediction.id.as_deref().unwrap_or("-"),
                    "Prediction succeeded"
                );
                PredictionOutput::from_value(&prediction.output)
            }
            status => {
                warn!(model = %model, status = %status, error = %prediction.error, "Prediction did not succeed");
                let reason = match &prediction.error {
                    Value::String(message) => message.clone(),
                    Value::Null => format!("prediction {}", status),
                    other => other.to_string(),
                };
                Err(AppError::Inference(reason))
            }
        }
    }
}
