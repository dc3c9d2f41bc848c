//! AI Selfie Booth service
//!
//! Turns a webcam capture into a themed portrait and a headshot through a
//! hosted inference provider, applies one round of free-text edits, and
//! delivers the result by download, email, or drive archive.

pub mod api;
pub mod backend;
pub mod booth;
pub mod config;
pub mod delivery;
pub mod error;
pub mod generation;
pub mod media;
pub mod middleware;

pub use error::{AppError, Result};

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use backend::{InferenceBackend, ReplicateBackend};
use booth::{ProgressCurve, SessionStore};
use delivery::{ArchiveStore, DriveArchive, Mailer, SmtpMailer};
use generation::Generator;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub generator: Option<Arc<Generator>>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub archive: Option<Arc<dyn ArchiveStore>>,
    pub sessions: Arc<SessionStore>,
    pub progress: ProgressCurve,
    pub http: reqwest::Client,
}

/// Keep an integration only when it is configured; anything else is a startup error
fn optional<T>(what: &str, built: Result<T>) -> Result<Option<T>> {
    match built {
        Ok(value) => {
            info!("{} configured", what);
            Ok(Some(value))
        }
        Err(AppError::NotConfigured(reason)) => {
            warn!(reason = %reason, "{} disabled", what);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

impl AppState {
    /// State with no external integrations attached
    pub fn new(settings: config::Settings) -> Self {
        let sessions = SessionStore::new(
            settings.booth.max_retakes,
            Duration::from_secs(settings.booth.session_ttl_secs),
        );
        Self {
            progress: ProgressCurve::from_config(&settings.booth),
            settings: Arc::new(settings),
            generator: None,
            mailer: None,
            archive: None,
            sessions: Arc::new(sessions),
            http: reqwest::Client::new(),
        }
    }

    /// State with every integration the settings configure
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let replicate = optional(
            "Inference backend",
            ReplicateBackend::new(&settings.replicate),
        )?;
        let mailer = optional("Email delivery", SmtpMailer::new(&settings.smtp))?;
        let http = reqwest::Client::new();
        let archive = optional(
            "Drive archive",
            DriveArchive::new(http.clone(), &settings.drive),
        )?;

        let mut state = Self::new(settings);
        state.http = http;
        if let Some(backend) = replicate {
            state = state.with_backend(Arc::new(backend));
        }
        if let Some(mailer) = mailer {
            state = state.with_mailer(Arc::new(mailer));
        }
        if let Some(archive) = archive {
            state = state.with_archive(Arc::new(archive));
        }
        Ok(state)
    }

    pub fn with_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.generator = Some(Arc::new(Generator::new(backend)));
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn ArchiveStore>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn generator(&self) -> Result<Arc<Generator>> {
        self.generator.clone().ok_or_else(|| {
            AppError::NotConfigured("Replicate API token not configured".to_string())
        })
    }

    pub fn mailer(&self) -> Result<Arc<dyn Mailer>> {
        self.mailer
            .clone()
            .ok_or_else(|| AppError::NotConfigured("Email service not configured".to_string()))
    }

    pub fn archive(&self) -> Result<Arc<dyn ArchiveStore>> {
        self.archive
            .clone()
            .ok_or_else(|| AppError::NotConfigured("Drive archive not configured".to_string()))
    }

    /// Best-effort archival of a generated image, when an archive is configured
    pub fn archive_generated(&self, source: &str, kind: &'static str) {
        if let Some(archive) = self.archive.clone() {
            delivery::archive_in_background(archive, self.http.clone(), source.to_string(), kind);
        }
    }
}
