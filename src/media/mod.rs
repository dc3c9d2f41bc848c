//! Media module - data URLs, format detection, and fetching generated images

pub mod data_url;
pub mod format;

use reqwest::Client;
use tracing::debug;

use crate::error::{AppError, Result};
pub use data_url::DataUrl;
pub use format::ImageFormat;

/// Raw image bytes with the type they were detected or declared as
#[derive(Debug, Clone)]
pub struct ImageBytes {
    pub data: Vec<u8>,
    pub format: Option<ImageFormat>,
}

impl ImageBytes {
    pub fn new(data: Vec<u8>) -> Self {
        let format = ImageFormat::detect(&data);
        Self { data, format }
    }

    /// MIME type, falling back to the given default for unrecognized bytes
    pub fn mime_type_or<'a>(&self, fallback: &'a str) -> &'a str {
        self.format.map(ImageFormat::mime_type).unwrap_or(fallback)
    }

    /// File extension, falling back to the given default for unrecognized bytes
    pub fn extension_or<'a>(&self, fallback: &'a str) -> &'a str {
        self.format.map(ImageFormat::extension).unwrap_or(fallback)
    }
}

/// Resolve an image reference into bytes.
///
/// Generated images arrive as provider URLs while captures arrive as data
/// URLs; both end up as raw bytes for email, download and archival.
pub async fn load_image(client: &Client, source: &str) -> Result<ImageBytes> {
    if data_url::is_remote_url(source) {
        debug!(url = %source, "Fetching generated image");
        let response = client.get(source).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Inference(format!(
                "Image download failed ({}): {}",
                status, source
            )));
        }
        let data = response.bytes().await?.to_vec();
        return Ok(ImageBytes::new(data));
    }

    Ok(ImageBytes::new(DataUrl::parse(source).decode()?))
}
