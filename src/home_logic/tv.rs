//! TV remote-control client.
//!
//! The set exposes a JSON-RPC style API on the local network, authenticated
//! with a pre-shared key header. Two calls are used: power status and
//! now-playing content info.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvError {
    #[error("tv request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("tv returned a malformed payload: {0}")]
    Malformed(String),
}

/// Now-playing info. `program_title` may carry broadcaster-controlled
/// symbols and is sanitized before display.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentInfo {
    pub title: String,
    #[serde(rename = "programTitle")]
    pub program_title: Option<String>,
}

#[async_trait]
pub trait TvPort: Send + Sync {
    /// Returns the power status keyword, e.g. "active" or "standby".
    async fn power_status(&self) -> Result<String, TvError>;
    async fn playing_content(&self) -> Result<ContentInfo, TvError>;
}

pub struct TvClient {
    client: reqwest::Client,
    host: String,
    psk: String,
}

impl TvClient {
    pub fn new(host: &str, psk: &str) -> Result<Self, reqwest::Error> {
        // The set is on the LAN; anything slower than a few seconds is as
        // good as unreachable.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            host: host.to_string(),
            psk: psk.to_string(),
        })
    }

    async fn call(
        &self,
        service: &str,
        method: &str,
        id: u32,
    ) -> Result<serde_json::Value, TvError> {
        let url = format!("http://{}/sony/{service}", self.host);
        let body = json!({
            "method": method,
            "params": [],
            "id": id,
            "version": "1.0",
        });

        let response = self
            .client
            .post(&url)
            .header("X-Auth-PSK", &self.psk)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: serde_json::Value = response.json().await?;
        if let Some(error) = payload.get("error") {
            return Err(TvError::Malformed(format!("api error {error}")));
        }
        payload
            .get("result")
            .and_then(|r| r.get(0))
            .cloned()
            .ok_or_else(|| TvError::Malformed("missing result".to_string()))
    }
}

#[async_trait]
impl TvPort for TvClient {
    async fn power_status(&self) -> Result<String, TvError> {
        let result = self.call("system", "getPowerStatus", 50).await?;
        result
            .get("status")
            .and_then(|s| s.as_str())
            .map(str::to_string)
            .ok_or_else(|| TvError::Malformed("missing power status".to_string()))
    }

    async fn playing_content(&self) -> Result<ContentInfo, TvError> {
        let result = self.call("avContent", "getPlayingContentInfo", 103).await?;
        serde_json::from_value(result).map_err(|e| TvError::Malformed(e.to_string()))
    }
}

/// Strips private-use-area and emoji/pictograph code points. Broadcasters
/// embed arbitrary symbols in program titles and those must not leak into
/// the published status.
pub fn strip_symbols(text: &str) -> String {
    text.chars().filter(|c| !is_stripped(*c)).collect()
}

fn is_stripped(c: char) -> bool {
    matches!(c,
        // Private use areas (BMP and planes 15/16)
        '\u{E000}'..='\u{F8FF}'
        | '\u{F0000}'..='\u{FFFFD}'
        | '\u{100000}'..='\u{10FFFD}'
        // Emoji and pictographs
        | '\u{1F000}'..='\u{1FAFF}'
        // Miscellaneous symbols and dingbats
        | '\u{2600}'..='\u{27BF}'
        // Miscellaneous symbols and arrows
        | '\u{2B00}'..='\u{2BFF}'
        // Variation selectors
        | '\u{FE00}'..='\u{FE0F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_private_use_area_code_points() {
        assert_eq!(strip_symbols("News\u{E200}flash"), "Newsflash");
        assert_eq!(strip_symbols("a\u{F0000}b\u{100000}c"), "abc");
    }

    #[test]
    fn strips_pictographs_and_variation_selectors() {
        assert_eq!(strip_symbols("Movie 🎬 Night ☀\u{FE0F}"), "Movie  Night ");
        assert_eq!(strip_symbols("⭐Premiere"), "Premiere");
    }

    #[test]
    fn ordinary_text_passes_through() {
        assert_eq!(strip_symbols("Evening News 21:00"), "Evening News 21:00");
        assert_eq!(strip_symbols("ニュース7"), "ニュース7");
    }

    #[test]
    fn content_info_decodes_with_and_without_program_title() {
        let with: ContentInfo = serde_json::from_str(
            r#"{"title": "BS1", "programTitle": "World News"}"#,
        )
        .unwrap();
        assert_eq!(with.title, "BS1");
        assert_eq!(with.program_title.as_deref(), Some("World News"));

        let without: ContentInfo = serde_json::from_str(r#"{"title": "HDMI 1"}"#).unwrap();
        assert_eq!(without.program_title, None);
    }
}
