// Scheduled Timers
// One-shot and periodic timers that deliver events into a channel.
// Each timer is owned through a handle; cancelling or dropping the handle
// stops the timer so no event is delivered afterwards.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Cancellable handle to a scheduled timer
#[derive(Debug)]
pub struct TimerHandle {
    label: &'static str,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Deliver `event` once after `delay`
    pub fn once<T>(label: &'static str, delay: Duration, tx: UnboundedSender<T>, event: T) -> Self
    where
        T: Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
        debug!("Armed {} timer ({:?})", label, delay);
        Self { label, task }
    }

    /// Deliver `event` every `period`, first delivery one period from now
    pub fn every<T>(label: &'static str, period: Duration, tx: UnboundedSender<T>, event: T) -> Self
    where
        T: Clone + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(event.clone()).is_err() {
                    break;
                }
            }
        });
        debug!("Armed {} ticker ({:?})", label, period);
        Self { label, task }
    }

    /// Stop the timer. Events already queued are not recalled.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            debug!("Cancelled {} timer", self.label);
        }
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
