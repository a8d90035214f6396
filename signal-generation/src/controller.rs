// Signal Lifecycle Controller
// Owns the current signal, its countdowns and the history ledger.
// All mutation goes through the named transitions below; timing is supplied
// from outside as generation completions and one-second ticks.

use super::config::{ConfigError, SignalConfig};
use super::draw::{build_draw, SignalDraw};
use super::ledger::HistoryLedger;
use super::random::RandomSource;
use common::{IgnoreReason, Signal, SignalId, SignalStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Coarse lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Generating,
    Active,
    Expired,
}

/// Identifies one admitted generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationTicket(u64);

/// Result of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Accepted(GenerationTicket),
    /// Guard violated; nothing changed
    Ignored(IgnoreReason),
}

impl RequestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RequestOutcome::Accepted(_))
    }
}

/// What a single tick changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Tick referred to a signal that is no longer current
    pub stale: bool,
    /// Current signal flipped to expired on this tick
    pub expired: bool,
    /// Cooldown reached zero on this tick
    pub cooldown_elapsed: bool,
    /// Both countdowns are at zero
    pub finished: bool,
}

/// Read-only state exposed to the presentation side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalView {
    pub current_signal: Option<Signal>,
    pub ledger: Vec<Signal>,
    pub remaining_validity_secs: u64,
    pub remaining_cooldown_secs: u64,
    pub is_generating: bool,
    pub state: LifecycleState,
}

pub struct SignalController {
    draw: Box<dyn SignalDraw>,
    rng: Box<dyn RandomSource>,
    ledger: HistoryLedger,
    validity_secs: Option<u64>,
    cooldown_secs: Option<u64>,

    state: LifecycleState,
    current: Option<Signal>,
    in_flight: Option<GenerationTicket>,
    next_ticket: u64,
    remaining_validity: u64,
    remaining_cooldown: u64,
}

impl SignalController {
    /// Build a controller; an invalid configuration is fatal
    pub fn new(config: &SignalConfig, rng: Box<dyn RandomSource>) -> Result<Self, ConfigError> {
        config.validate()?;
        let draw = build_draw(config)?;
        let ledger = HistoryLedger::new(config.ledger_capacity)?;

        info!(
            "Signal controller ready: {:?}, validity {:?}s, cooldown {:?}s, history {}",
            config.variant, config.validity_secs, config.cooldown_secs, config.ledger_capacity
        );

        Ok(Self {
            draw,
            rng,
            ledger,
            validity_secs: config.validity_secs,
            cooldown_secs: config.cooldown_secs,
            state: LifecycleState::Idle,
            current: None,
            in_flight: None,
            next_ticket: 0,
            remaining_validity: 0,
            remaining_cooldown: 0,
        })
    }

    /// Ask for a new signal.
    ///
    /// Admitted only when no generation is in flight and the cooldown has
    /// elapsed; otherwise the request is ignored without side effects.
    pub fn request(&mut self) -> RequestOutcome {
        if self.in_flight.is_some() {
            debug!("Request ignored: generation already in flight");
            return RequestOutcome::Ignored(IgnoreReason::Generating);
        }
        if self.remaining_cooldown > 0 {
            debug!("Request ignored: {}s of cooldown left", self.remaining_cooldown);
            return RequestOutcome::Ignored(IgnoreReason::CoolingDown {
                remaining_secs: self.remaining_cooldown,
            });
        }

        self.next_ticket += 1;
        let ticket = GenerationTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        self.state = LifecycleState::Generating;
        debug!("Generation {:?} started", ticket);
        RequestOutcome::Accepted(ticket)
    }

    /// Finish the generation identified by `ticket`.
    ///
    /// Returns the newly active signal, exactly once per admitted request.
    /// Unknown or already completed tickets are ignored.
    pub fn complete_generation(&mut self, ticket: GenerationTicket) -> Option<Signal> {
        if self.in_flight != Some(ticket) {
            debug!("Ignoring completion of stale generation {:?}", ticket);
            return None;
        }
        self.in_flight = None;

        let candidate = self.draw.draw(self.rng.as_mut());
        let signal = Signal::activate(candidate);

        self.ledger.append(signal.clone());
        self.current = Some(signal.clone());
        self.remaining_validity = self.validity_secs.unwrap_or(0);
        self.remaining_cooldown = self.cooldown_secs.unwrap_or(0);
        self.state = LifecycleState::Active;

        info!(
            "Signal {} active ({}% confidence), history {}/{}",
            signal.id,
            signal.confidence,
            self.ledger.len(),
            self.ledger.capacity()
        );
        Some(signal)
    }

    /// Advance both countdowns of `signal_id` by one second.
    ///
    /// Ticks for a signal that is no longer current are no-ops.
    pub fn tick(&mut self, signal_id: SignalId) -> TickOutcome {
        let Some(current) = self.current.as_mut() else {
            return TickOutcome { stale: true, ..Default::default() };
        };
        if current.id != signal_id {
            debug!("Ignoring tick for superseded signal {}", signal_id);
            return TickOutcome { stale: true, ..Default::default() };
        }

        let mut outcome = TickOutcome::default();

        if self.remaining_validity > 0 {
            self.remaining_validity -= 1;
            if self.remaining_validity == 0 && current.status == SignalStatus::Active {
                current.status = SignalStatus::Expired;
                outcome.expired = true;
                if self.state == LifecycleState::Active {
                    self.state = LifecycleState::Expired;
                }
                info!("Signal {} expired", signal_id);
            }
        }

        if self.remaining_cooldown > 0 {
            self.remaining_cooldown -= 1;
            if self.remaining_cooldown == 0 {
                outcome.cooldown_elapsed = true;
                debug!("Cooldown after signal {} elapsed", signal_id);
            }
        }

        outcome.finished = self.remaining_validity == 0 && self.remaining_cooldown == 0;
        if outcome.finished && self.cooldown_secs.is_some() && self.state == LifecycleState::Expired {
            self.state = LifecycleState::Idle;
        }

        outcome
    }

    pub fn view(&self) -> SignalView {
        SignalView {
            current_signal: self.current.clone(),
            ledger: self.ledger.snapshot(),
            remaining_validity_secs: self.remaining_validity,
            remaining_cooldown_secs: self.remaining_cooldown,
            is_generating: self.is_generating(),
            state: self.state,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current_signal(&self) -> Option<&Signal> {
        self.current.as_ref()
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn remaining_validity_secs(&self) -> u64 {
        self.remaining_validity
    }

    pub fn remaining_cooldown_secs(&self) -> u64 {
        self.remaining_cooldown
    }

    /// Whether either countdown still needs ticks
    pub fn countdown_running(&self) -> bool {
        self.remaining_validity > 0 || self.remaining_cooldown > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ConstantSource, SeededSource};
    use common::{RiskTier, SignalValue, MINES_GRID_CELLS};
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn controller(config: SignalConfig) -> SignalController {
        SignalController::new(&config, Box::new(SeededSource::from_seed(5))).unwrap()
    }

    fn generate(controller: &mut SignalController) -> Signal {
        match controller.request() {
            RequestOutcome::Accepted(ticket) => controller.complete_generation(ticket).unwrap(),
            RequestOutcome::Ignored(reason) => panic!("request ignored: {reason:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = SignalConfig::rocket();
        config.multipliers.clear();
        let result = SignalController::new(&config, Box::new(ConstantSource::first()));
        assert!(matches!(result, Err(ConfigError::EmptyPool)));
    }

    #[test]
    fn test_first_index_scenario() {
        let mut controller =
            SignalController::new(&SignalConfig::rocket_timed(), Box::new(ConstantSource::first())).unwrap();
        let mut basic =
            SignalController::new(&SignalConfig::rocket(), Box::new(ConstantSource::first())).unwrap();

        let signal = generate(&mut basic);
        assert_eq!(signal.value.multiplier(), Some(dec!(1.5)));
        assert!((85..=94).contains(&signal.confidence));
        assert_eq!(basic.ledger().len(), 1);

        let signal = generate(&mut controller);
        assert_eq!(signal.value.multiplier(), Some(dec!(1.2)));
        assert_eq!(controller.ledger().len(), 1);

        let second = controller.request();
        assert!(!second.is_accepted());
        assert_eq!(controller.ledger().len(), 1);
    }

    #[test]
    fn test_lifecycle_states() {
        let mut controller = controller(SignalConfig::rocket_timed());
        assert_eq!(controller.state(), LifecycleState::Idle);

        let RequestOutcome::Accepted(ticket) = controller.request() else {
            panic!("first request must be accepted");
        };
        assert_eq!(controller.state(), LifecycleState::Generating);
        assert!(controller.is_generating());

        let signal = controller.complete_generation(ticket).unwrap();
        assert_eq!(controller.state(), LifecycleState::Active);
        assert!(!controller.is_generating());
        assert_eq!(controller.remaining_validity_secs(), 60);
        assert_eq!(controller.remaining_cooldown_secs(), 180);

        for _ in 0..60 {
            controller.tick(signal.id);
        }
        assert_eq!(controller.state(), LifecycleState::Expired);

        for _ in 0..120 {
            controller.tick(signal.id);
        }
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(!controller.countdown_running());
        assert!(controller.request().is_accepted());
    }

    #[test]
    fn test_request_while_generating_is_noop() {
        let mut controller = controller(SignalConfig::rocket_timed());
        let RequestOutcome::Accepted(ticket) = controller.request() else {
            panic!("first request must be accepted");
        };
        let before = controller.view();

        assert_eq!(
            controller.request(),
            RequestOutcome::Ignored(IgnoreReason::Generating)
        );
        assert_eq!(controller.view(), before);

        // Only the original ticket completes
        assert!(controller.complete_generation(ticket).is_some());
        assert!(controller.complete_generation(ticket).is_none());
        assert_eq!(controller.ledger().len(), 1);
    }

    #[test]
    fn test_cooldown_enforcement() {
        let mut controller = controller(SignalConfig::rocket_timed());
        let signal = generate(&mut controller);

        for _ in 0..10 {
            controller.tick(signal.id);
        }
        let before = controller.view();
        assert_eq!(
            controller.request(),
            RequestOutcome::Ignored(IgnoreReason::CoolingDown { remaining_secs: 170 })
        );
        assert_eq!(controller.view(), before);
        assert_eq!(controller.remaining_cooldown_secs(), 170);
        assert_eq!(controller.ledger().len(), 1);
    }

    #[test]
    fn test_validity_countdown_monotonic() {
        let mut controller = controller(SignalConfig::rocket_timed());
        let signal = generate(&mut controller);

        let mut previous = controller.remaining_validity_secs();
        for _ in 0..59 {
            let outcome = controller.tick(signal.id);
            let remaining = controller.remaining_validity_secs();
            assert_eq!(remaining, previous - 1);
            assert!(!outcome.expired);
            assert_eq!(controller.current_signal().unwrap().status, SignalStatus::Active);
            previous = remaining;
        }

        let outcome = controller.tick(signal.id);
        assert!(outcome.expired);
        assert_eq!(controller.remaining_validity_secs(), 0);
        assert_eq!(controller.current_signal().unwrap().status, SignalStatus::Expired);

        // Clamped; expiry reported once
        let outcome = controller.tick(signal.id);
        assert!(!outcome.expired);
        assert_eq!(controller.remaining_validity_secs(), 0);
    }

    #[test]
    fn test_ledger_keeps_active_snapshot_after_expiry() {
        let mut controller = controller(SignalConfig::rocket_timed());
        let signal = generate(&mut controller);
        for _ in 0..60 {
            controller.tick(signal.id);
        }
        assert_eq!(controller.current_signal().unwrap().status, SignalStatus::Expired);
        assert_eq!(controller.ledger().latest().unwrap().status, SignalStatus::Active);
    }

    #[test]
    fn test_stale_tick_is_noop() {
        let mut config = SignalConfig::rocket_timed();
        config.cooldown_secs = Some(5);
        let mut controller = controller(config);

        let first = generate(&mut controller);
        for _ in 0..5 {
            controller.tick(first.id);
        }
        let second = generate(&mut controller);
        let before = controller.view();

        let outcome = controller.tick(first.id);
        assert!(outcome.stale);
        assert_eq!(controller.view(), before);
        assert_eq!(controller.current_signal().unwrap().id, second.id);
        assert_eq!(controller.current_signal().unwrap().status, SignalStatus::Active);
    }

    #[test]
    fn test_untimed_allows_immediate_rerequest() {
        let mut controller = controller(SignalConfig::rocket());
        for n in 1..=15 {
            let signal = generate(&mut controller);
            assert_eq!(controller.ledger().len(), n.min(10));
            assert_eq!(controller.ledger().latest().unwrap().id, signal.id);
            assert_eq!(controller.remaining_cooldown_secs(), 0);
            assert!(!controller.countdown_running());
        }
        assert_eq!(controller.state(), LifecycleState::Active);
    }

    #[test]
    fn test_timed_ledger_capacity() {
        let mut controller = controller(SignalConfig::rocket_timed());
        for n in 1..=25usize {
            let signal = generate(&mut controller);
            while controller.countdown_running() {
                controller.tick(signal.id);
            }
            assert_eq!(controller.ledger().len(), n.min(20));
        }
    }

    #[test]
    fn test_mines_signals() {
        let mut controller = controller(SignalConfig::mines());
        for _ in 0..50 {
            let signal = generate(&mut controller);
            let SignalValue::Mines { risk_tier, flagged_cells, .. } = &signal.value else {
                panic!("mines board produced a multiplier");
            };
            assert_eq!(flagged_cells.len(), risk_tier.mines_count());
            let unique: BTreeSet<_> = flagged_cells.iter().collect();
            assert_eq!(unique.len(), flagged_cells.len());
            assert!(flagged_cells.iter().all(|c| *c < MINES_GRID_CELLS));
            assert!((75..=89).contains(&signal.confidence));
            assert!(RiskTier::ALL.contains(risk_tier));
        }
    }
}
