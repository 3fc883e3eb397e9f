//! BLE beacon scan task.
//!
//! Listens for advertisements from the light beacon and pushes decoded lux
//! samples into the sampler. Scan failures are never fatal; the task backs
//! off and brings the scan up again.

use anyhow::{Context, Result, bail};
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::home_logic::lux::{self, LuxSampler};

const RESCAN_DELAY: Duration = Duration::from_secs(30);

pub async fn run(prefix: String, sampler: LuxSampler, mut shutdown: broadcast::Receiver<()>) {
    loop {
        match scan(&prefix, &sampler, &mut shutdown).await {
            // A clean return means shutdown was requested.
            Ok(()) => break,
            Err(e) => {
                log::error!("Beacon scan failed: {e:#}. Restarting in {RESCAN_DELAY:?}...");
            }
        }

        tokio::select! {
            _ = shutdown.recv() => break,
            _ = tokio::time::sleep(RESCAN_DELAY) => {}
        }
    }
    log::info!("Beacon scanner shutting down.");
}

async fn scan(
    prefix: &str,
    sampler: &LuxSampler,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<()> {
    let manager = Manager::new().await.context("BLE manager unavailable")?;
    let adapter = manager
        .adapters()
        .await
        .context("Failed to list Bluetooth adapters")?
        .into_iter()
        .next()
        .context("No Bluetooth adapter found")?;

    let mut events = adapter
        .events()
        .await
        .context("Failed to open adapter event stream")?;
    adapter
        .start_scan(ScanFilter::default())
        .await
        .context("Failed to start BLE scan")?;
    log::info!("Scanning for beacons with name prefix '{prefix}'");

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                let _ = adapter.stop_scan().await;
                return Ok(());
            }
            event = events.next() => {
                let Some(event) = event else {
                    bail!("Adapter event stream ended");
                };
                if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event {
                    handle_advert(&adapter, &id, prefix, sampler).await;
                }
            }
        }
    }
}

async fn handle_advert(adapter: &Adapter, id: &PeripheralId, prefix: &str, sampler: &LuxSampler) {
    let properties = match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral.properties().await.ok().flatten(),
        Err(_) => None,
    };
    let Some(properties) = properties else {
        return;
    };

    let raw = raw_manufacturer_data(&properties.manufacturer_data);
    if let Some(sample) =
        lux::sample_from_advert(properties.local_name.as_deref(), prefix, raw.as_deref())
    {
        log::debug!("Recorded lux sample {sample}");
        sampler.record(sample).await;
    }
}

/// Rebuilds the advertisement's raw manufacturer-data bytes. The BLE stack
/// splits the field into company id and payload; the beacon's lux value sits
/// at fixed offsets of the raw field, so the two little-endian company-id
/// bytes are put back in front.
fn raw_manufacturer_data(data: &HashMap<u16, Vec<u8>>) -> Option<Vec<u8>> {
    let (company, payload) = data.iter().next()?;
    let mut raw = company.to_le_bytes().to_vec();
    raw.extend_from_slice(payload);
    Some(raw)
}
