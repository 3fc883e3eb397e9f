//! Weather poll loop.
//!
//! Self-scheduling: each cycle polls the station, folds the drained lux
//! summary into the fragment, and only then re-arms the timer, so polls
//! never overlap. A failed poll degrades the fragment and the loop carries
//! on at the next tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::home_logic::lux::LuxSampler;
use crate::home_logic::publisher::Publisher;
use crate::home_logic::state::StatusBoard;
use crate::home_logic::station::{self, StationPort};

/// Marker used in place of the snapshot when the station is unreachable.
pub const WEATHER_ERROR_FRAGMENT: &str = "🌡 ❓ ";

pub async fn run(
    poll_seconds: u64,
    board: StatusBoard,
    sampler: LuxSampler,
    station: Arc<dyn StationPort>,
    publisher: Arc<Publisher>,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!("Weather loop started, polling every {poll_seconds}s");
    let period = Duration::from_secs(poll_seconds);

    loop {
        poll_once(&board, &sampler, station.as_ref(), &publisher).await;

        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Weather loop shutting down.");
                break;
            }
            _ = tokio::time::sleep(period) => {}
        }
    }
}

async fn poll_once(
    board: &StatusBoard,
    sampler: &LuxSampler,
    station: &dyn StationPort,
    publisher: &Publisher,
) {
    let lux = sampler.drain_and_summarize().await;

    let fragment = match station.fetch_reading().await {
        Ok(reading) => format!("{lux}{}", station::format_snapshot(reading.as_ref())),
        Err(e) => {
            log::error!("Weather poll failed: {e:#}");
            format!("{lux}{WEATHER_ERROR_FRAGMENT}")
        }
    };

    if board.replace_weather(&fragment).await {
        publisher.publish(&board.composite().await, None).await;
    }
}
