use anyhow::Result;
use std::sync::Arc;
use tokio::signal;

mod home_logic;

use home_logic::camera::{CameraPort, ProcessCamera};
use home_logic::feed::{FeedClient, FeedPort};
use home_logic::publisher::Publisher;
use home_logic::station::{StationClient, StationPort};
use home_logic::tv::{TvClient, TvPort};
use home_logic::{beacon, capture, config, display, logger, lux, state, weather};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = config::load_config().resolve()?;
    logger::setup_logging(&settings.log_dir, &settings.log_level)?;
    log::info!("homebot starting");

    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    let board = state::StatusBoard::new();
    let sampler = lux::LuxSampler::new();

    let station: Arc<dyn StationPort> = Arc::new(StationClient::new(
        &settings.station_endpoint,
        &settings.station_token,
        settings.station_device_id.as_deref(),
    )?);
    let tv: Arc<dyn TvPort> = Arc::new(TvClient::new(&settings.tv_host, &settings.tv_psk)?);
    let feed: Arc<dyn FeedPort> = Arc::new(FeedClient::new(
        &settings.feed_endpoint,
        &settings.feed_token,
    )?);
    let camera: Arc<dyn CameraPort> = Arc::new(ProcessCamera::new(
        &settings.camera_command,
        &settings.photo_path,
    ));
    let publisher = Arc::new(Publisher::new(Arc::clone(&feed)));

    let beacon_handle = tokio::spawn(beacon::run(
        settings.beacon_prefix.clone(),
        sampler.clone(),
        shutdown_tx.subscribe(),
    ));

    let weather_handle = tokio::spawn(weather::run(
        settings.weather_poll_seconds,
        board.clone(),
        sampler.clone(),
        station,
        Arc::clone(&publisher),
        shutdown_tx.subscribe(),
    ));

    let display_handle = tokio::spawn(display::run(
        settings.display_poll_seconds,
        board.clone(),
        tv,
        Arc::clone(&publisher),
        shutdown_tx.subscribe(),
    ));

    let capture_handle = tokio::spawn(capture::run(
        settings.capture_cooldown_seconds,
        settings.photo_path.clone(),
        board.clone(),
        camera,
        feed,
        publisher,
        shutdown_tx.subscribe(),
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut term_signal) => {
                        term_signal.recv().await;
                        log::info!("SIGTERM received, initiating shutdown.");
                    }
                    Err(e) => {
                        log::warn!("Failed to install SIGTERM handler: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }

    // Send shutdown signal to all components
    let _ = shutdown_tx.send(());

    // Wait for components to shut down
    let _ = tokio::try_join!(beacon_handle, weather_handle, display_handle, capture_handle);

    log::info!("Shutdown complete.");
    Ok(())
}
