//! Delivery module - email and cloud drive archival

pub mod drive;
pub mod email;

use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

use crate::media;
pub use drive::{ArchiveStore, DriveArchive};
pub use email::{EmailAttachment, Mailer, SmtpMailer};

/// Upload a generated image without affecting the caller.
///
/// Failures are logged and dropped; the user-facing result stays as is.
pub fn archive_in_background(
    archive: Arc<dyn ArchiveStore>,
    client: Client,
    source: String,
    kind: &'static str,
) {
    tokio::spawn(async move {
        let result = async {
            let image = media::load_image(&client, &source).await?;
            let name = drive::archive_name(kind, image.extension_or("webp"));
            archive.store(&name, image).await
        }
        .await;

        match result {
            Ok(file_id) => info!(file_id = %file_id, kind = kind, "Archived generated image"),
            Err(e) => warn!(error = %e, kind = kind, "Archival failed"),
        }
    });
}
