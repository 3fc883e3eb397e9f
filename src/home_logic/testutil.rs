//! In-memory feed double shared by the loop tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::home_logic::feed::FeedPort;

#[derive(Default)]
pub(crate) struct RecordingFeed {
    /// Posted (text, media_id) pairs.
    pub posts: Mutex<Vec<(String, Option<String>)>>,
    /// Byte lengths of uploaded media.
    pub uploads: Mutex<Vec<usize>>,
    fail_post: bool,
    fail_upload: bool,
}

impl RecordingFeed {
    pub fn failing_posts() -> Self {
        Self {
            fail_post: true,
            ..Self::default()
        }
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl FeedPort for RecordingFeed {
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String> {
        if self.fail_upload {
            bail!("upload refused");
        }
        let mut uploads = self.uploads.lock().await;
        uploads.push(bytes.len());
        Ok(format!("media-{}", uploads.len()))
    }

    async fn post_status(&self, text: &str, media_id: Option<&str>) -> Result<()> {
        if self.fail_post {
            bail!("post refused");
        }
        self.posts
            .lock()
            .await
            .push((text.to_string(), media_id.map(str::to_string)));
        Ok(())
    }
}
