//! Stamps and posts composite statuses.

use std::sync::Arc;

use crate::home_logic::feed::FeedPort;

pub struct Publisher {
    feed: Arc<dyn FeedPort>,
}

impl Publisher {
    pub fn new(feed: Arc<dyn FeedPort>) -> Self {
        Self { feed }
    }

    /// Appends the separator, the Unix-epoch timestamp and the UTC suffix.
    fn stamp(text: &str) -> String {
        format!("{} | {} UTC", text.trim_end(), chrono::Utc::now().timestamp())
    }

    /// Posts the given status. A failed post is logged and swallowed; a
    /// missed post is acceptable, a dead process is not.
    pub async fn publish(&self, text: &str, media_id: Option<&str>) {
        let stamped = Self::stamp(text);
        match self.feed.post_status(&stamped, media_id).await {
            Ok(()) => log::info!("Published: {stamped}"),
            Err(e) => log::error!("Status post failed: {e:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home_logic::testutil::RecordingFeed;

    #[test]
    fn stamp_appends_separator_epoch_and_utc_suffix() {
        let stamped = Publisher::stamp("💡 308 📺 standby");
        let suffix = stamped
            .strip_prefix("💡 308 📺 standby | ")
            .expect("separator present");
        let epoch = suffix.strip_suffix(" UTC").expect("UTC suffix present");
        assert!(epoch.parse::<i64>().is_ok(), "epoch not an integer: {epoch}");
    }

    #[tokio::test]
    async fn publish_passes_media_handle_through() {
        let feed = Arc::new(RecordingFeed::default());
        let publisher = Publisher::new(feed.clone());
        publisher.publish("📺 standby", Some("media-1")).await;

        let posts = feed.posts.lock().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1.as_deref(), Some("media-1"));
    }

    #[tokio::test]
    async fn failed_post_is_swallowed() {
        let feed = Arc::new(RecordingFeed::failing_posts());
        let publisher = Publisher::new(feed);
        // Must not panic or propagate.
        publisher.publish("📺 standby", None).await;
    }
}
