use anyhow::Result;
use common::{MultiplierBand, Signal, SignalEvent, SignalValue};
use signal_generation::{
    load_config, LogNotifier, RandomSource, RequestOutcome, SeededSource, SignalConfig,
    SignalService, SignalView,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn, Level};

fn describe(signal: &Signal) -> String {
    match &signal.value {
        SignalValue::Multiplier { multiplier } => format!(
            "{}x [{:?}] {}% @ {}",
            multiplier,
            MultiplierBand::classify(*multiplier),
            signal.confidence,
            signal.created_at.format("%H:%M:%S")
        ),
        SignalValue::Mines { risk_tier, coefficient, flagged_cells } => format!(
            "{:?} risk, {}x, cells {:?} {}% @ {}",
            risk_tier,
            coefficient,
            flagged_cells,
            signal.confidence,
            signal.created_at.format("%H:%M:%S")
        ),
    }
}

fn render(view: &SignalView) {
    info!(
        "State {:?} | validity {}s | cooldown {}s | generating {}",
        view.state, view.remaining_validity_secs, view.remaining_cooldown_secs, view.is_generating
    );
    if let Some(signal) = &view.current_signal {
        info!("Current: {} ({:?})", describe(signal), signal.status);
    }
    for (i, signal) in view.ledger.iter().enumerate() {
        info!("  #{:<2} {}", i + 1, describe(signal));
    }
}

fn resolve_config(arg: &str) -> Result<SignalConfig> {
    match SignalConfig::preset(arg) {
        Some(config) => Ok(config),
        None => load_config(arg),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let target = std::env::args().nth(1).unwrap_or_else(|| "rocket".to_string());
    let config = resolve_config(&target)?;

    let rng: Box<dyn RandomSource> = match std::env::var("SIGNAL_SEED") {
        Ok(seed) => Box::new(SeededSource::from_seed(seed.parse()?)),
        Err(_) => Box::new(SeededSource::from_entropy()),
    };

    let handle = SignalService::start(&config, rng, Arc::new(LogNotifier))?;
    let mut events = handle.subscribe();

    info!("🚀 Signal console ({:?}) - commands: [enter]/signal, view, json, quit", config.variant);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" | "s" | "signal" => match handle.request_signal().await? {
                        RequestOutcome::Accepted(_) => info!("Analysing..."),
                        RequestOutcome::Ignored(reason) => info!("Not available yet: {:?}", reason),
                    },
                    "v" | "view" => render(&handle.view().await?),
                    "json" => println!("{}", serde_json::to_string_pretty(&handle.view().await?)?),
                    "q" | "quit" => break,
                    other => warn!("Unknown command: {}", other),
                }
            }

            event = events.recv() => match event {
                Ok(SignalEvent::Activated { signal }) => info!("Signal: {}", describe(&signal)),
                Ok(SignalEvent::Expired { signal_id }) => info!("Signal {} expired", signal_id),
                Ok(SignalEvent::CooldownElapsed { .. }) => info!("Next signal available"),
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => warn!("Missed {} events", n),
                Err(RecvError::Closed) => break,
            },

            _ = tokio::signal::ctrl_c() => {
                info!("👋 Shutting down gracefully...");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}
