//! Lifecycle demo
//!
//! Runs a timed rocket board with shortened timers and prints every event.
//!
//! Run with: cargo run --example lifecycle_demo

use anyhow::Result;
use common::SignalEvent;
use signal_generation::{LogNotifier, SeededSource, SignalConfig, SignalService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut config = SignalConfig::rocket_timed();
    config.generation_delay_ms = 500;
    config.validity_secs = Some(3);
    config.cooldown_secs = Some(5);

    let handle = SignalService::start(&config, Box::new(SeededSource::from_seed(2024)), Arc::new(LogNotifier))?;
    let mut events = handle.subscribe();

    for round in 1..=3 {
        info!("=== Round {} ===", round);
        handle.request_signal().await?;

        // Rejected: still generating
        let outcome = handle.request_signal().await?;
        info!("Immediate re-request: {:?}", outcome);

        loop {
            match events.recv().await? {
                SignalEvent::Activated { signal } => {
                    info!("Active: {:?} at {}%", signal.value, signal.confidence)
                }
                SignalEvent::Expired { signal_id } => info!("Expired: {}", signal_id),
                SignalEvent::CooldownElapsed { .. } => break,
                other => info!("Event: {:?}", other),
            }
        }
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    let view = handle.view().await?;
    info!("History ({} entries):", view.ledger.len());
    for signal in &view.ledger {
        info!("  {:?} {:?}", signal.value, signal.status);
    }

    handle.shutdown().await?;
    Ok(())
}
