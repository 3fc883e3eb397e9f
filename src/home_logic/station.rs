//! Weather-station client and snapshot formatting.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One station reading. Field names follow the vendor payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Pressure")]
    pub pressure: f64,
    #[serde(rename = "CO2")]
    pub co2: f64,
    #[serde(rename = "Noise")]
    pub noise: f64,
}

#[async_trait]
pub trait StationPort: Send + Sync {
    /// Fetches the current reading. `Ok(None)` means the station answered
    /// but carried no usable reading.
    async fn fetch_reading(&self) -> Result<Option<Reading>>;
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    body: StationsBody,
}

#[derive(Debug, Deserialize)]
struct StationsBody {
    devices: Vec<DeviceRecord>,
}

#[derive(Debug, Deserialize)]
struct DeviceRecord {
    dashboard_data: Option<Reading>,
}

/// HTTP client for the station vendor API.
pub struct StationClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    device_id: Option<String>,
}

impl StationClient {
    pub fn new(endpoint: &str, token: &str, device_id: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("homebot/0.1")
            .build()
            .context("Failed to build station HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            device_id: device_id.map(str::to_string),
        })
    }
}

#[async_trait]
impl StationPort for StationClient {
    async fn fetch_reading(&self) -> Result<Option<Reading>> {
        let mut request = self.client.get(&self.endpoint).bearer_auth(&self.token);
        if let Some(device_id) = &self.device_id {
            request = request.query(&[("device_id", device_id)]);
        }

        let response = request
            .send()
            .await
            .context("Station request failed")?
            .error_for_status()
            .context("Station returned an error status")?;

        let payload: StationsResponse = response
            .json()
            .await
            .context("Station payload was not valid JSON")?;

        // Only the first device record is of interest.
        Ok(payload
            .body
            .devices
            .into_iter()
            .next()
            .and_then(|device| device.dashboard_data))
    }
}

/// Formats a reading into the fixed-order weather fragment. A missing
/// reading yields an empty fragment and a warning; the poll loop carries on.
pub fn format_snapshot(reading: Option<&Reading>) -> String {
    let Some(r) = reading else {
        log::warn!("Station returned no usable reading this cycle");
        return String::new();
    };

    let fields: [(&str, f64, &str); 5] = [
        ("🌡", r.temperature, "℃"),
        ("💧", r.humidity, "%"),
        ("🎈", r.pressure, "hPa"),
        ("🌬", r.co2, "ppm"),
        ("🔊", r.noise, "dB"),
    ];

    let mut fragment = String::new();
    for (emoji, value, unit) in fields {
        fragment.push_str(&format!("{emoji} {value}{unit} "));
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Reading {
        Reading {
            temperature: 21.0,
            humidity: 55.0,
            pressure: 1008.0,
            co2: 450.0,
            noise: 40.0,
        }
    }

    #[test]
    fn snapshot_lists_fields_in_declared_order_with_units() {
        assert_eq!(
            format_snapshot(Some(&reading())),
            "🌡 21℃ 💧 55% 🎈 1008hPa 🌬 450ppm 🔊 40dB "
        );
    }

    #[test]
    fn fractional_values_keep_their_precision() {
        let mut r = reading();
        r.temperature = 21.3;
        assert!(format_snapshot(Some(&r)).starts_with("🌡 21.3℃ "));
    }

    #[test]
    fn missing_reading_yields_empty_fragment() {
        assert_eq!(format_snapshot(None), "");
    }

    #[test]
    fn vendor_payload_decodes_to_first_device_reading() {
        let payload = r#"{
            "body": {
                "devices": [
                    {"dashboard_data": {"Temperature": 21, "Humidity": 55, "Pressure": 1008, "CO2": 450, "Noise": 40}},
                    {"dashboard_data": {"Temperature": 99, "Humidity": 1, "Pressure": 900, "CO2": 9, "Noise": 9}}
                ]
            }
        }"#;
        let decoded: StationsResponse = serde_json::from_str(payload).unwrap();
        let first = decoded
            .body
            .devices
            .into_iter()
            .next()
            .and_then(|d| d.dashboard_data);
        assert_eq!(first, Some(reading()));
    }

    #[test]
    fn device_without_dashboard_data_decodes_to_none() {
        let payload = r#"{"body": {"devices": [{}]}}"#;
        let decoded: StationsResponse = serde_json::from_str(payload).unwrap();
        let first = decoded
            .body
            .devices
            .into_iter()
            .next()
            .and_then(|d| d.dashboard_data);
        assert_eq!(first, None);
    }
}
