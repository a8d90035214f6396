//! Signal Service - runs the lifecycle controller on a single task
//!
//! The service owns the controller and is its only mutator. Requests arrive
//! over a control channel, timer events over a second channel, and both are
//! handled one at a time in the same loop:
//! - a request that is admitted arms the generation-delay timer
//! - a completed generation arms a one-second countdown ticker
//! - superseding a signal cancels its ticker before the next one is armed
//! - shutdown, or dropping every handle, cancels all outstanding timers

use super::config::{ConfigError, SignalConfig};
use super::controller::{GenerationTicket, RequestOutcome, SignalController, SignalView};
use super::notify::ActivationNotifier;
use super::random::RandomSource;
use super::timer::TimerHandle;
use anyhow::Result;
use chrono::Utc;
use common::{NotificationCue, Signal, SignalEvent, SignalId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 64;
const COMMAND_CAPACITY: usize = 32;

/// Commands accepted by the service loop
enum Command {
    Request {
        respond_to: oneshot::Sender<RequestOutcome>,
    },
    View {
        respond_to: oneshot::Sender<SignalView>,
    },
    Shutdown,
}

/// Events delivered by armed timers
#[derive(Debug, Clone)]
enum TimerEvent {
    GenerationDue(GenerationTicket),
    Tick(SignalId),
}

/// Handle used by front ends to drive and observe the service
#[derive(Clone)]
pub struct SignalHandle {
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<SignalEvent>,
}

impl SignalHandle {
    /// Ask for a new signal. Ignored requests are reported, not errors.
    pub async fn request_signal(&self) -> Result<RequestOutcome> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(Command::Request { respond_to })
            .await
            .map_err(|_| anyhow::anyhow!("Signal service has shut down"))?;
        Ok(rx.await?)
    }

    /// Current state snapshot
    pub async fn view(&self) -> Result<SignalView> {
        let (respond_to, rx) = oneshot::channel();
        self.tx
            .send(Command::View { respond_to })
            .await
            .map_err(|_| anyhow::anyhow!("Signal service has shut down"))?;
        Ok(rx.await?)
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SignalEvent> {
        self.events.subscribe()
    }

    /// Stop the service and wait until every timer is cancelled
    pub async fn shutdown(&self) -> Result<()> {
        if self.tx.send(Command::Shutdown).await.is_err() {
            debug!("Signal service already stopped");
        }
        self.tx.closed().await;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct SignalService {
    controller: SignalController,
    generation_delay: Duration,
    notifier: Arc<dyn ActivationNotifier>,
    cue: NotificationCue,
    events: broadcast::Sender<SignalEvent>,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    generation_timer: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
}

impl SignalService {
    /// Build a controller from `config` and start the service
    pub fn start(
        config: &SignalConfig,
        rng: Box<dyn RandomSource>,
        notifier: Arc<dyn ActivationNotifier>,
    ) -> Result<SignalHandle, ConfigError> {
        let controller = SignalController::new(config, rng)?;
        Ok(Self::spawn(controller, config.generation_delay(), notifier))
    }

    /// Run an existing controller on a new task
    pub fn spawn(
        controller: SignalController,
        generation_delay: Duration,
        notifier: Arc<dyn ActivationNotifier>,
    ) -> SignalHandle {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let service = Self {
            controller,
            generation_delay,
            notifier,
            cue: NotificationCue::ascending_chime(),
            events: events.clone(),
            timer_tx,
            generation_timer: None,
            countdown: None,
        };

        tokio::spawn(service.run(commands, timer_rx));
        info!("Signal service started");

        SignalHandle { tx, events }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },

                Some(event) = timer_rx.recv() => self.handle_timer(event),
            }
        }

        self.teardown();
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Request { respond_to } => {
                let outcome = self.controller.request();
                match outcome {
                    RequestOutcome::Accepted(ticket) => {
                        self.generation_timer = Some(TimerHandle::once(
                            "generation",
                            self.generation_delay,
                            self.timer_tx.clone(),
                            TimerEvent::GenerationDue(ticket),
                        ));
                        self.publish(SignalEvent::GenerationStarted { at: Utc::now() });
                    }
                    RequestOutcome::Ignored(reason) => {
                        self.publish(SignalEvent::RequestIgnored { reason });
                    }
                }
                let _ = respond_to.send(outcome);
            }
            Command::View { respond_to } => {
                let _ = respond_to.send(self.controller.view());
            }
            Command::Shutdown => {}
        }
    }

    fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::GenerationDue(ticket) => {
                self.generation_timer = None;
                if let Some(signal) = self.controller.complete_generation(ticket) {
                    self.activate(signal);
                }
            }
            TimerEvent::Tick(signal_id) => {
                let outcome = self.controller.tick(signal_id);
                if outcome.stale {
                    return;
                }
                if outcome.expired {
                    self.publish(SignalEvent::Expired { signal_id });
                }
                if outcome.cooldown_elapsed {
                    self.publish(SignalEvent::CooldownElapsed { signal_id });
                }
                if outcome.finished {
                    if let Some(countdown) = self.countdown.take() {
                        countdown.cancel();
                    }
                }
            }
        }
    }

    fn activate(&mut self, signal: Signal) {
        if let Some(previous) = self.countdown.take() {
            previous.cancel();
        }
        if self.controller.countdown_running() {
            self.countdown = Some(TimerHandle::every(
                "countdown",
                TICK_PERIOD,
                self.timer_tx.clone(),
                TimerEvent::Tick(signal.id),
            ));
        }

        self.publish(SignalEvent::Activated {
            signal: signal.clone(),
        });

        let notifier = Arc::clone(&self.notifier);
        let cue = self.cue.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&signal, &cue).await {
                warn!("Activation notification for {} failed: {}", signal.id, e);
            }
        });
    }

    fn publish(&self, event: SignalEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn teardown(&mut self) {
        if let Some(timer) = self.generation_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = self.countdown.take() {
            timer.cancel();
        }
        info!("Signal service stopped");
    }
}
