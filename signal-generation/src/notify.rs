// Activation Notifications
// Side channel invoked once per activation. Callers never wait on it and its
// failures never touch signal state.

use anyhow::Result;
use async_trait::async_trait;
use common::{NotificationCue, Signal};
use tokio::sync::mpsc;
use tracing::info;

/// Receiver of activation cues
#[async_trait]
pub trait ActivationNotifier: Send + Sync {
    async fn notify(&self, signal: &Signal, cue: &NotificationCue) -> Result<()>;
}

/// Writes the cue to the log
pub struct LogNotifier;

#[async_trait]
impl ActivationNotifier for LogNotifier {
    async fn notify(&self, signal: &Signal, cue: &NotificationCue) -> Result<()> {
        info!(
            "🔔 Signal {} activated ({} tones, {} ms)",
            signal.id,
            cue.tones.len(),
            cue.duration_ms()
        );
        Ok(())
    }
}

/// Does nothing
pub struct NoopNotifier;

#[async_trait]
impl ActivationNotifier for NoopNotifier {
    async fn notify(&self, _signal: &Signal, _cue: &NotificationCue) -> Result<()> {
        Ok(())
    }
}

/// Forwards activations to a channel, e.g. for a front end that plays the cue
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<(Signal, NotificationCue)>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Signal, NotificationCue)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ActivationNotifier for ChannelNotifier {
    async fn notify(&self, signal: &Signal, cue: &NotificationCue) -> Result<()> {
        self.tx
            .send((signal.clone(), cue.clone()))
            .map_err(|_| anyhow::anyhow!("Notification receiver dropped"))
    }
}
