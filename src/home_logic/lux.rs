//! Ambient-light sampling.
//!
//! Beacon advertisements push lux-like readings into a buffer; the weather
//! loop drains the buffer once per poll and reduces it to a single
//! emoji-coded fragment.

use std::sync::Arc;
use tokio::sync::Mutex;

/// Fragment returned when no samples arrived since the last drain.
pub const ASLEEP_FRAGMENT: &str = "😴 ";

/// Ordered bucket table; a mean strictly greater than the threshold selects
/// the bucket. Anything not above 10 falls through to the dark bucket.
const BUCKETS: [(u32, &str); 6] = [
    (2750, "🌞"),
    (2000, "⛅"),
    (1000, "🌥"),
    (500, "🌇"),
    (100, "💡"),
    (10, "🕯"),
];

const DARK_BUCKET: &str = "🌑";

fn bucket(mean: u32) -> &'static str {
    for (threshold, emoji) in BUCKETS {
        if mean > threshold {
            return emoji;
        }
    }
    DARK_BUCKET
}

/// Accumulates light samples between drains. The buffer grows unbounded
/// until [`LuxSampler::drain_and_summarize`] clears it; that call is the
/// only place the buffer is emptied.
#[derive(Clone)]
pub struct LuxSampler {
    samples: Arc<Mutex<Vec<u32>>>,
}

impl LuxSampler {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn record(&self, sample: u32) {
        self.samples.lock().await.push(sample);
    }

    /// Reduces the buffered samples to `"<emoji> <mean> "` and clears the
    /// buffer. With an empty buffer this returns the asleep fragment rather
    /// than dividing by zero.
    pub async fn drain_and_summarize(&self) -> String {
        let drained = {
            let mut guard = self.samples.lock().await;
            std::mem::take(&mut *guard)
        };

        if drained.is_empty() {
            return ASLEEP_FRAGMENT.to_string();
        }

        let sum: u64 = drained.iter().map(|&s| u64::from(s)).sum();
        let mean = (sum as f64 / drained.len() as f64).round() as u32;
        format!("{} {} ", bucket(mean), mean)
    }
}

impl Default for LuxSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a lux sample from one beacon advertisement.
///
/// Accepts the advertisement only when the device name starts with the
/// configured prefix and the raw manufacturer data carries at least six
/// bytes; the sample is the little-endian u16 at offsets 4 (low) and 5
/// (high).
pub fn sample_from_advert(name: Option<&str>, prefix: &str, data: Option<&[u8]>) -> Option<u32> {
    let name = name?;
    if !name.starts_with(prefix) {
        return None;
    }
    let data = data?;
    if data.len() < 6 {
        return None;
    }
    Some(u32::from(u16::from_le_bytes([data[4], data[5]])))
}
