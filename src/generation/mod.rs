//! Generation module - prompt building and provider calls for portraits and edits

pub mod payload;
pub mod prompts;

use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::InferenceBackend;
use crate::error::{AppError, Result};
use crate::media::data_url;
use payload::{InstantIdInput, Pix2PixInput, INSTANT_ID_MODEL, PIX2PIX_MODEL, SEED_RANGE};

/// Themed portrait plus its headshot companion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortraitSet {
    pub theme_image: String,
    pub headshot_image: String,
}

/// Issues the provider requests behind each booth step
pub struct Generator {
    backend: Arc<dyn InferenceBackend>,
}

fn random_seed() -> u32 {
    rand::thread_rng().gen_range(0..SEED_RANGE)
}

impl Generator {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Transform a captured photo into a themed portrait and a headshot
    pub async fn transform(&self, image: &str, theme: &str, style: &str) -> Result<PortraitSet> {
        info!(theme = %theme, style = %style, "Generating themed portrait");
        self.portraits(image, prompts::themed_prompt(theme, style))
            .await
    }

    /// Same as [`Generator::transform`] with a caller-supplied scene description
    pub async fn transform_custom(&self, image: &str, custom: &str) -> Result<PortraitSet> {
        info!("Generating portrait from custom prompt");
        self.portraits(image, prompts::custom_prompt(custom)).await
    }

    async fn portraits(&self, image: &str, prompt: String) -> Result<PortraitSet> {
        let image = data_url::as_jpeg_data_url(image)?;

        let themed = InstantIdInput::themed(image.clone(), prompt, random_seed());
        let theme_output = self
            .backend
            .run(INSTANT_ID_MODEL, serde_json::to_value(&themed)?)
            .await?;

        let headshot = InstantIdInput::headshot(
            image,
            prompts::HEADSHOT_PROMPT.to_string(),
            random_seed(),
        );
        let headshot_output = self
            .backend
            .run(INSTANT_ID_MODEL, serde_json::to_value(&headshot)?)
            .await?;

        match (theme_output.first(), headshot_output.first()) {
            (Some(theme_image), Some(headshot_image)) => Ok(PortraitSet {
                theme_image: theme_image.to_string(),
                headshot_image: headshot_image.to_string(),
            }),
            _ => Err(AppError::Inference(
                "Failed to generate all required images".to_string(),
            )),
        }
    }

    /// Apply an edit instruction to a generated image, returning the edited image URL
    pub async fn edit(&self, image: &str, prompt: &str) -> Result<String> {
        let image = if data_url::is_remote_url(image) {
            image.to_string()
        } else {
            // Inline images are sent as a JPEG data URL, the same form as captures
            data_url::as_jpeg_data_url(image)?
        };
        debug!(backend = %self.backend.name(), "Requesting image edit");

        let input = Pix2PixInput::new(image, prompt.to_string());
        self.backend
            .run(PIX2PIX_MODEL, serde_json::to_value(&input)?)
            .await?
            .into_url("image edit")
    }
}
