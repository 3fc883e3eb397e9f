//! Capture-and-post workflow.
//!
//! Unlike the poll loops this is a self-rescheduling one-shot: the cooldown
//! timer is re-armed only after a full cycle, so a slow capture delays the
//! next cycle instead of overlapping it. Every cycle publishes the current
//! composite status, photo or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::home_logic::camera::CameraPort;
use crate::home_logic::feed::FeedPort;
use crate::home_logic::publisher::Publisher;
use crate::home_logic::state::StatusBoard;

/// Appended to the status text when the photo upload fails.
pub const UPLOAD_ERROR_MARKER: &str = "📷 ❌";

pub async fn run(
    cooldown_seconds: u64,
    photo_path: PathBuf,
    board: StatusBoard,
    camera: Arc<dyn CameraPort>,
    feed: Arc<dyn FeedPort>,
    publisher: Arc<Publisher>,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!("Capture workflow started, cooldown {cooldown_seconds}s");
    let cooldown = Duration::from_secs(cooldown_seconds);

    loop {
        run_cycle(&photo_path, &board, camera.as_ref(), feed.as_ref(), &publisher).await;

        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Capture workflow shutting down.");
                break;
            }
            _ = tokio::time::sleep(cooldown) => {}
        }
    }
}

/// One capture cycle. Whatever fails along the way, the cycle ends with
/// exactly one publish of the current composite status.
async fn run_cycle(
    photo_path: &Path,
    board: &StatusBoard,
    camera: &dyn CameraPort,
    feed: &dyn FeedPort,
    publisher: &Publisher,
) {
    let photo = take_photo(photo_path, camera).await;

    let mut text = board.composite().await;
    let media_id = match photo {
        Some(bytes) => match feed.upload_media(bytes).await {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("Media upload failed: {e:#}");
                text.push(' ');
                text.push_str(UPLOAD_ERROR_MARKER);
                None
            }
        },
        None => None,
    };

    publisher.publish(&text, media_id.as_deref()).await;
}

async fn take_photo(photo_path: &Path, camera: &dyn CameraPort) -> Option<Vec<u8>> {
    let expected = photo_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let event = match camera.capture().await {
        Ok(event) => event,
        Err(e) => {
            log::error!("Capture command failed: {e:#}");
            return None;
        }
    };

    if let Some(error) = event.error {
        log::warn!("Camera reported an error: {error}");
        return None;
    }

    // Drop completion events for anything but the expected photo file.
    if event.filename != expected {
        log::warn!("Ignoring camera event for unexpected file '{}'", event.filename);
        return None;
    }

    match tokio::fs::read(photo_path).await {
        Ok(bytes) => {
            log::debug!("Read {} photo bytes captured at {}", bytes.len(), event.timestamp);
            Some(bytes)
        }
        Err(e) => {
            log::warn!("Failed to read photo {}: {e}", photo_path.display());
            None
        }
    }
}
