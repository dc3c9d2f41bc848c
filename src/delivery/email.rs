//! Email delivery through an authenticated SMTP relay

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};
use crate::media::ImageBytes;

pub const EMAIL_SUBJECT: &str = "Your AI Transformed Selfie";
const EMAIL_HTML: &str = "<p>Here are your AI-transformed selfies!</p>";

/// Port on which the relay expects implicit TLS instead of STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// One image attached to an outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl EmailAttachment {
    /// Attachment for the `index`-th image (zero based), named `image-{n}.{ext}`
    pub fn from_image(index: usize, image: ImageBytes) -> Self {
        Self {
            filename: format!("image-{}.{}", index + 1, image.extension_or("jpg")),
            content_type: image.mime_type_or("image/jpeg").to_string(),
            data: image.data,
        }
    }
}

/// Parse a recipient address, rejecting malformed input as a bad request
pub fn parse_recipient(email: &str) -> Result<Mailbox> {
    email
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| AppError::InvalidRequest(format!("Invalid email address: {}", email)))
}

/// Sends booth results to a recipient
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_images(&self, to: &Mailbox, attachments: Vec<EmailAttachment>) -> Result<()>;
}

/// SMTP-backed mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the relay transport; incomplete settings leave email unconfigured
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let not_configured = || AppError::NotConfigured("Email service not configured".to_string());
        if !config.is_complete() {
            return Err(not_configured());
        }
        let (Some(host), Some(port), Some(user), Some(pass)) = (
            config.host.as_deref(),
            config.port,
            config.user.as_deref(),
            config.pass.as_deref(),
        ) else {
            return Err(not_configured());
        };

        let builder = if port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|e| {
            AppError::NotConfigured(format!(
                "Email service not configured: invalid SMTP relay {}: {}",
                host, e
            ))
        })?;

        let transport = builder
            .port(port)
            .credentials(Credentials::new(user.to_string(), pass.to_string()))
            .build();

        let from = config
            .from
            .as_deref()
            .unwrap_or(user)
            .parse::<Mailbox>()
            .map_err(|e| {
                AppError::NotConfigured(format!(
                    "Email service not configured: sender address required ({})",
                    e
                ))
            })?;

        Ok(Self { transport, from })
    }
}

/// Assemble the HTML message with one attachment per image
pub fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    attachments: Vec<EmailAttachment>,
) -> Result<Message> {
    let mut body = MultiPart::mixed().singlepart(SinglePart::html(EMAIL_HTML.to_string()));
    for attachment in attachments {
        let content_type = ContentType::parse(&attachment.content_type)
            .map_err(|e| AppError::Email(format!("Invalid attachment type: {}", e)))?;
        body = body.singlepart(Attachment::new(attachment.filename).body(attachment.data, content_type));
    }

    Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(EMAIL_SUBJECT)
        .multipart(body)
        .map_err(|e| AppError::Email(format!("Failed to build message: {}", e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_images(&self, to: &Mailbox, attachments: Vec<EmailAttachment>) -> Result<()> {
        let count = attachments.len();
        let message = build_message(&self.from, to, attachments)?;

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "Transporter error");
            AppError::Email(format!("SMTP error: {}", e))
        })?;

        info!(attachments = count, "Email sent");
        Ok(())
    }
}
