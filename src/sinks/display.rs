//! Live rendering of the latest position.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select};

use super::SinkHandle;
use crate::bus::{EventBus, PositionUpdate};
use crate::common::utils::{format_coordinates, format_distance};

/// Renders each position update as a short log block.
///
/// Reads from the conflating `latest` channel: if rendering falls behind,
/// intermediate positions are skipped and only the newest one is shown.
pub struct DisplaySink;

impl DisplaySink {
    pub fn spawn(bus: &EventBus) -> Result<SinkHandle> {
        let subscription = bus.subscribe_latest();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let handle = std::thread::Builder::new()
            .name("geofencer-display".to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(stop_rx) -> _ => {
                            while let Some(item) = subscription.try_recv() {
                                render(&item);
                            }
                            break;
                        },
                        recv(subscription.receiver()) -> update => match update {
                            Ok(update) => render(&update),
                            Err(_) => break,
                        },
                    }
                }
            })
            .context("Failed to spawn display thread")?;

        Ok(SinkHandle::new("display", stop_tx, handle))
    }
}

/// One-line summary of an update.
pub fn describe(update: &PositionUpdate) -> String {
    format!(
        "{} | {} from center | {}",
        format_coordinates(update.position.latitude, update.position.longitude),
        format_distance(update.distance_meters),
        if update.inside { "inside" } else { "outside" }
    )
}

fn render(update: &PositionUpdate) {
    log_block_start!(
        "Position at {}",
        update
            .position
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
    );
    log_indented!("{}", describe(update));
}
