//! Archival of generated images into a cloud drive folder

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DriveConfig;
use crate::error::{AppError, Result};
use crate::media::ImageBytes;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Refresh this long before the provider-reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Stores generated images somewhere durable
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Upload an image, returning the stored file id
    async fn store(&self, name: &str, image: ImageBytes) -> Result<String>;

    /// Verify credentials and folder access
    async fn check_setup(&self) -> Result<()>;
}

/// Supplies bearer tokens for the drive API
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Fixed token, for pre-authorized deployments and tests
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Fields of a service-account key file that the JWT grant needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::NotConfigured(format!(
                "Drive credentials unreadable at {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::NotConfigured(format!("Invalid drive credentials file: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// OAuth tokens from a service account via the JWT bearer grant
pub struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    token_uri: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(client: Client, key: ServiceAccountKey, default_token_uri: &str) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| AppError::NotConfigured(format!("Invalid drive private key: {}", e)))?;
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| default_token_uri.to_string());

        Ok(Self {
            client,
            key,
            encoding_key,
            token_uri,
            cached: Mutex::new(None),
        })
    }

    fn assertion(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Drive(format!("Failed to sign token request: {}", e)))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Drive(format!(
                "Token request failed ({}): {}",
                status, body
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Drive(format!("Invalid token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        debug!("Obtained drive access token");
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive v3 archive writing into a single folder
pub struct DriveArchive {
    client: Client,
    tokens: Arc<dyn TokenSource>,
    folder_id: String,
    api_base: String,
    upload_base: String,
}

impl DriveArchive {
    /// Build from configuration; missing folder or credentials leave archival unconfigured
    pub fn new(client: Client, config: &DriveConfig) -> Result<Self> {
        let folder_id = config
            .folder_id
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| AppError::NotConfigured("Drive folder ID not configured".to_string()))?;
        let credentials = config
            .credentials_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                AppError::NotConfigured("Drive credentials not configured".to_string())
            })?;

        let key = ServiceAccountKey::from_file(credentials)?;
        let tokens = ServiceAccountTokens::new(client.clone(), key, &config.token_uri)?;
        Ok(Self::with_token_source(
            client,
            Arc::new(tokens),
            folder_id,
            config,
        ))
    }

    pub fn with_token_source(
        client: Client,
        tokens: Arc<dyn TokenSource>,
        folder_id: &str,
        config: &DriveConfig,
    ) -> Self {
        Self {
            client,
            tokens,
            folder_id: folder_id.trim().to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }
}

/// `multipart/related` body carrying JSON metadata followed by the media
fn related_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {t}\r\n\r\n",
            b = boundary,
            m = metadata,
            t = mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl ArchiveStore for DriveArchive {
    async fn store(&self, name: &str, image: ImageBytes) -> Result<String> {
        let token = self.tokens.access_token().await?;
        let metadata = json!({ "name": name, "parents": [self.folder_id] });
        let boundary = format!("booth-{}", Uuid::new_v4().simple());
        let body = related_body(&boundary, &metadata, image.mime_type_or("image/webp"), &image.data);

        debug!(name = %name, folder = %self.folder_id, size = image.data.len(), "Uploading to drive");
        let response = self
            .client
            .post(format!("{}/files", self.upload_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Drive(format!(
                "Drive upload failed ({}): {}",
                status, body
            )));
        }
        let created: CreatedFile = response
            .json()
            .await
            .map_err(|e| AppError::Drive(format!("Invalid drive response: {}", e)))?;

        info!(file_id = %created.id, name = %name, "File created in drive");
        Ok(created.id)
    }

    async fn check_setup(&self) -> Result<()> {
        let token = self.tokens.access_token().await?;
        let query = format!("'{}' in parents", self.folder_id);
        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name)"),
                ("pageSize", "1"),
            ])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Drive(format!(
                "Drive setup check failed ({}): {}",
                status, body
            )));
        }
        info!(folder = %self.folder_id, "Successfully connected to drive");
        Ok(())
    }
}

/// File name for an archived image, e.g. `selfie-20240101T120000Z-theme-1a2b3c4d.webp`
pub fn archive_name(kind: &str, extension: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!(
        "selfie-{}-{}-{}.{}",
        Utc::now().format("%Y%m%dT%H%M%SZ"),
        kind,
        &id[..8],
        extension
    )
}
