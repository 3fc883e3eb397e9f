//! Display (TV) poll loop. Same shape as the weather loop, on its own
//! independent cadence.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::home_logic::publisher::Publisher;
use crate::home_logic::state::StatusBoard;
use crate::home_logic::tv::{TvPort, strip_symbols};

/// Fragment used whenever either TV request fails.
pub const DISPLAY_UNKNOWN_FRAGMENT: &str = "📺 ❓";

pub async fn run(
    poll_seconds: u64,
    board: StatusBoard,
    tv: Arc<dyn TvPort>,
    publisher: Arc<Publisher>,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!("Display loop started, polling every {poll_seconds}s");
    let period = Duration::from_secs(poll_seconds);

    loop {
        poll_once(&board, tv.as_ref(), &publisher).await;

        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Display loop shutting down.");
                break;
            }
            _ = tokio::time::sleep(period) => {}
        }
    }
}

async fn poll_once(board: &StatusBoard, tv: &dyn TvPort, publisher: &Publisher) {
    let fragment = build_fragment(tv).await;
    if board.replace_display(&fragment).await {
        publisher.publish(&board.composite().await, None).await;
    }
}

/// Builds the display fragment: the raw power status when the set is not
/// active, otherwise the now-playing title, with the sanitized program
/// title appended when one is present.
async fn build_fragment(tv: &dyn TvPort) -> String {
    let status = match tv.power_status().await {
        Ok(status) => status,
        Err(e) => {
            log::warn!("TV power status failed: {e}");
            return DISPLAY_UNKNOWN_FRAGMENT.to_string();
        }
    };

    if status != "active" {
        return format!("📺 {status}");
    }

    match tv.playing_content().await {
        Ok(info) => match info.program_title.as_deref().filter(|p| !p.is_empty()) {
            Some(program) => format!("📺 {}: {}", info.title, strip_symbols(program)),
            None => format!("📺 {}", info.title),
        },
        Err(e) => {
            log::warn!("TV content info failed: {e}");
            DISPLAY_UNKNOWN_FRAGMENT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home_logic::testutil::RecordingFeed;
    use crate::home_logic::tv::{ContentInfo, TvError};
    use async_trait::async_trait;

    /// TV stub; `None` on either field makes the matching call fail.
    struct FakeTv {
        power: Option<&'static str>,
        content: Option<ContentInfo>,
    }

    #[async_trait]
    impl TvPort for FakeTv {
        async fn power_status(&self) -> Result<String, TvError> {
            self.power
                .map(str::to_string)
                .ok_or_else(|| TvError::Malformed("no power status".to_string()))
        }

        async fn playing_content(&self) -> Result<ContentInfo, TvError> {
            self.content
                .clone()
                .ok_or_else(|| TvError::Malformed("no content".to_string()))
        }
    }

    #[tokio::test]
    async fn standby_status_becomes_raw_fragment() {
        let tv = FakeTv { power: Some("standby"), content: None };
        assert_eq!(build_fragment(&tv).await, "📺 standby");
    }

    #[tokio::test]
    async fn active_set_shows_title_and_stripped_program() {
        let tv = FakeTv {
            power: Some("active"),
            content: Some(ContentInfo {
                title: "BS1".to_string(),
                program_title: Some("World News 🌍\u{E040}".to_string()),
            }),
        };
        assert_eq!(build_fragment(&tv).await, "📺 BS1: World News ");
    }

    #[tokio::test]
    async fn active_set_without_program_title_shows_title_only() {
        let tv = FakeTv {
            power: Some("active"),
            content: Some(ContentInfo {
                title: "HDMI 1".to_string(),
                program_title: None,
            }),
        };
        assert_eq!(build_fragment(&tv).await, "📺 HDMI 1");
    }

    #[tokio::test]
    async fn any_failure_collapses_to_unknown() {
        let power_failure = FakeTv { power: None, content: None };
        assert_eq!(build_fragment(&power_failure).await, DISPLAY_UNKNOWN_FRAGMENT);

        let content_failure = FakeTv { power: Some("active"), content: None };
        assert_eq!(build_fragment(&content_failure).await, DISPLAY_UNKNOWN_FRAGMENT);
    }

    #[tokio::test]
    async fn repeated_status_is_published_once() {
        let board = StatusBoard::new();
        let feed = std::sync::Arc::new(RecordingFeed::default());
        let publisher = Publisher::new(feed.clone());
        let tv = FakeTv { power: Some("standby"), content: None };

        poll_once(&board, &tv, &publisher).await;
        poll_once(&board, &tv, &publisher).await;

        let posts = feed.posts.lock().await;
        assert_eq!(posts.len(), 1);
        assert!(posts[0].0.contains("📺 standby"));
    }
}
