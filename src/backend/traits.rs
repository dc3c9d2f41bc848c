//! Common traits and types for inference backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Output of a finished prediction.
///
/// Hosted models return either one URL or a list of URLs depending on the
/// model; callers only ever need the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    /// Normalize to a single URL; empty values count as missing
    pub fn first(&self) -> Option<&str> {
        let url = match self {
            PredictionOutput::Single(url) => Some(url.as_str()),
            PredictionOutput::Many(urls) => urls.first().map(String::as_str),
        };
        url.map(str::trim).filter(|u| !u.is_empty())
    }

    /// Build from the raw `output` field of a prediction
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(url) => Ok(PredictionOutput::Single(url.clone())),
            Value::Array(items) => Ok(PredictionOutput::Many(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect(),
            )),
            Value::Null => Err(AppError::Inference(
                "Prediction finished without output".to_string(),
            )),
            other => Err(AppError::Inference(format!(
                "Unexpected prediction output: {}",
                other
            ))),
        }
    }

    /// Single URL or an inference error naming what was being generated
    pub fn into_url(self, what: &str) -> Result<String> {
        self.first()
            .map(String::from)
            .ok_or_else(|| AppError::Inference(format!("No output received from {}", what)))
    }
}

/// Trait for hosted inference providers
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Run a model (`owner/name:version`) with the given input and wait for its output
    async fn run(&self, model: &str, input: Value) -> Result<PredictionOutput>;
}
