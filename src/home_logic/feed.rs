//! Social feed client: media upload and status post.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[async_trait]
pub trait FeedPort: Send + Sync {
    /// Uploads image bytes, returning the opaque media handle.
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String>;
    /// Posts one status, optionally with an attached media handle.
    async fn post_status(&self, text: &str, media_id: Option<&str>) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FeedClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        // Uploads carry a photo, so the timeout is looser than for the
        // status post itself.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("homebot/0.1")
            .build()
            .context("Failed to build feed HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl FeedPort for FeedClient {
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("status.jpg")
            .mime_str("image/jpeg")
            .context("Invalid media mime type")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/v2/media", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .context("Media upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Media upload rejected: {status} {body}");
        }

        let media: MediaResponse = response
            .json()
            .await
            .context("Media upload response was not valid JSON")?;
        Ok(media.id)
    }

    async fn post_status(&self, text: &str, media_id: Option<&str>) -> Result<()> {
        let mut form: Vec<(&str, &str)> = vec![("status", text)];
        if let Some(id) = media_id {
            form.push(("media_ids[]", id));
        }

        let response = self
            .client
            .post(format!("{}/api/v1/statuses", self.base_url))
            .bearer_auth(&self.token)
            .form(&form)
            .send()
            .await
            .context("Status post request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Status post rejected: {status} {body}");
        }
        Ok(())
    }
}
