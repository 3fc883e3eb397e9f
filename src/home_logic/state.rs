use std::sync::Arc;
use tokio::sync::Mutex;

use crate::home_logic::display::DISPLAY_UNKNOWN_FRAGMENT;
use crate::home_logic::lux::ASLEEP_FRAGMENT;

/// Shared store for the two status fragments. Each fragment has exactly one
/// writer loop; readers see either the old or the new value, never a partial
/// write.
#[derive(Clone)]
pub struct StatusBoard {
    weather: Arc<Mutex<String>>,
    display: Arc<Mutex<String>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            weather: Arc::new(Mutex::new(ASLEEP_FRAGMENT.to_string())),
            display: Arc::new(Mutex::new(DISPLAY_UNKNOWN_FRAGMENT.to_string())),
        }
    }

    /// Replaces the weather fragment if it differs from the stored one.
    /// Returns whether a replacement happened.
    pub async fn replace_weather(&self, fragment: &str) -> bool {
        let mut guard = self.weather.lock().await;
        if *guard == fragment {
            return false;
        }
        *guard = fragment.to_string();
        true
    }

    /// Replaces the display fragment if it differs from the stored one.
    /// Returns whether a replacement happened.
    pub async fn replace_display(&self, fragment: &str) -> bool {
        let mut guard = self.display.lock().await;
        if *guard == fragment {
            return false;
        }
        *guard = fragment.to_string();
        true
    }

    /// The composite status: weather fragment followed by display fragment.
    pub async fn composite(&self) -> String {
        let weather = self.weather.lock().await.clone();
        let display = self.display.lock().await.clone();
        format!("{weather}{display}")
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_asleep_and_unknown_defaults() {
        let board = StatusBoard::new();
        assert_eq!(board.composite().await, "😴 📺 ❓");
    }

    #[tokio::test]
    async fn replace_reports_change_only_when_text_differs() {
        let board = StatusBoard::new();
        assert!(board.replace_weather("🌞 3000 ").await);
        assert!(!board.replace_weather("🌞 3000 ").await);
        assert!(board.replace_weather("💡 308 ").await);
    }

    #[tokio::test]
    async fn composite_is_weather_then_display() {
        let board = StatusBoard::new();
        board.replace_weather("💡 308 ").await;
        board.replace_display("📺 standby").await;
        assert_eq!(board.composite().await, "💡 308 📺 standby");
    }
}
