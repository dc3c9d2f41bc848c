//! Fakes and request helpers shared by the functional tests

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use lettre::message::Mailbox;
use parking_lot::Mutex;
use selfie_booth::{
    api::routes::create_router,
    backend::{InferenceBackend, PredictionOutput},
    config::Settings,
    delivery::{ArchiveStore, EmailAttachment, Mailer},
    media::ImageBytes,
    AppError, AppState, Result,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Smallest payload that still detects as PNG
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAA=";
pub const CAPTURE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

/// Backend answering every prediction with the same output
pub struct FakeBackend {
    pub calls: Mutex<Vec<(String, Value)>>,
    output: Option<PredictionOutput>,
}

impl FakeBackend {
    pub fn returning(url: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: Some(PredictionOutput::Single(url.to_string())),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: None,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl InferenceBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, model: &str, input: Value) -> Result<PredictionOutput> {
        self.calls.lock().push((model.to_string(), input));
        self.output
            .clone()
            .ok_or_else(|| AppError::Inference("prediction failed".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, Vec<EmailAttachment>)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_images(&self, to: &Mailbox, attachments: Vec<EmailAttachment>) -> Result<()> {
        self.sent.lock().push((to.email.to_string(), attachments));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryArchive {
    pub stored: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl ArchiveStore for MemoryArchive {
    async fn store(&self, name: &str, image: ImageBytes) -> Result<String> {
        let mut stored = self.stored.lock();
        stored.push((name.to_string(), image.data.len()));
        Ok(format!("file-{}", stored.len()))
    }

    async fn check_setup(&self) -> Result<()> {
        Ok(())
    }
}

/// Archive whose uploads always fail
#[derive(Default)]
pub struct FailingArchive {
    pub attempts: Mutex<usize>,
}

#[async_trait]
impl ArchiveStore for FailingArchive {
    async fn store(&self, _name: &str, _image: ImageBytes) -> Result<String> {
        *self.attempts.lock() += 1;
        Err(AppError::Drive("Drive upload failed (403): quota exceeded".to_string()))
    }

    async fn check_setup(&self) -> Result<()> {
        Ok(())
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.rate_limit.enabled = false;
    settings.server.static_dir = "./does-not-exist".to_string();
    settings
}

pub fn app(state: AppState) -> Router {
    create_router(Arc::new(state))
}

/// Send a request and decode the JSON body (`Null` when empty)
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}
