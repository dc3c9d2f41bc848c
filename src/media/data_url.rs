//! Data URL parsing and base64 decoding

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};

/// A `data:<mime>;base64,<payload>` URL split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    pub mime_type: Option<&'a str>,
    pub payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a data URL; a bare string is treated as the payload itself
    pub fn parse(input: &'a str) -> Self {
        match input.split_once(',') {
            Some((header, payload)) => {
                let mime_type = header
                    .strip_prefix("data:")
                    .and_then(|rest| rest.split(';').next())
                    .filter(|m| !m.is_empty());
                Self {
                    mime_type,
                    payload: payload.trim(),
                }
            }
            None => Self {
                mime_type: None,
                payload: input.trim(),
            },
        }
    }

    /// Decode the payload into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        if self.payload.is_empty() {
            return Err(AppError::InvalidRequest("Empty image data".to_string()));
        }
        STANDARD
            .decode(self.payload)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid base64 data: {}", e)))
    }
}

/// True for `data:image/...` URLs
pub fn is_image_data_url(input: &str) -> bool {
    input.starts_with("data:image")
}

/// True for remote `http(s)` URLs
pub fn is_remote_url(input: &str) -> bool {
    input.starts_with("https://") || input.starts_with("http://")
}

/// Re-wrap an image data URL's base64 payload as a JPEG data URL.
///
/// Anything that is not an image data URL with a decodable payload is a bad request.
pub fn as_jpeg_data_url(input: &str) -> Result<String> {
    if !is_image_data_url(input) {
        return Err(AppError::InvalidRequest(
            "Image must be an image data URL".to_string(),
        ));
    }
    let url = DataUrl::parse(input);
    url.decode()?;
    Ok(format!("data:image/jpeg;base64,{}", url.payload))
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}
