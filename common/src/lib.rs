//! Shared domain types for the signal workspace
//!
//! Everything the lifecycle core and its front ends exchange lives here:
//! signals and their values, lifecycle status, the events published on each
//! transition, and the notification cue handed to the presentation side.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use uuid;

/// Unique signal identifier (unique within a session)
pub type SignalId = Uuid;

/// Number of cells on the mines grid
pub const MINES_GRID_CELLS: u8 = 25;

/// Game flavour a signal is produced for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Rocket,
    Mines,
}

/// Risk tier for the mines variant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Tiers in draw order
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Number of flagged cells for this tier
    pub fn mines_count(&self) -> usize {
        match self {
            RiskTier::Low => 3,
            RiskTier::Medium => 5,
            RiskTier::High => 7,
        }
    }

    /// Fixed payout coefficient for this tier
    pub fn coefficient(&self) -> Decimal {
        match self {
            RiskTier::Low => Decimal::new(18, 1),
            RiskTier::Medium => Decimal::new(25, 1),
            RiskTier::High => Decimal::new(38, 1),
        }
    }
}

/// Payload of a signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalValue {
    Multiplier {
        multiplier: Decimal,
    },
    Mines {
        risk_tier: RiskTier,
        coefficient: Decimal,
        /// Distinct cell indices in `[0, 25)`, ascending
        flagged_cells: Vec<u8>,
    },
}

impl SignalValue {
    pub fn multiplier(&self) -> Option<Decimal> {
        match self {
            SignalValue::Multiplier { multiplier } => Some(*multiplier),
            SignalValue::Mines { .. } => None,
        }
    }

    pub fn variant(&self) -> Variant {
        match self {
            SignalValue::Multiplier { .. } => Variant::Rocket,
            SignalValue::Mines { .. } => Variant::Mines,
        }
    }
}

/// Lifecycle status of a signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    Active,
    Expired,
}

/// Output of a single random draw, before it is stamped into a signal
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSignal {
    pub value: SignalValue,
    /// Integer percentage, cosmetic
    pub confidence: u8,
}

/// A generated signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub id: SignalId,
    pub value: SignalValue,
    pub confidence: u8,
    pub created_at: DateTime<Utc>,
    pub status: SignalStatus,
}

impl Signal {
    /// Stamp a candidate into an active signal
    pub fn activate(candidate: CandidateSignal) -> Self {
        Self {
            id: Uuid::new_v4(),
            value: candidate.value,
            confidence: candidate.confidence,
            created_at: Utc::now(),
            status: SignalStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SignalStatus::Active
    }
}

/// Display band of a multiplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierBand {
    Low,
    Elevated,
    High,
}

impl MultiplierBand {
    pub fn classify(multiplier: Decimal) -> Self {
        if multiplier >= Decimal::new(4, 0) {
            MultiplierBand::High
        } else if multiplier >= Decimal::new(25, 1) {
            MultiplierBand::Elevated
        } else {
            MultiplierBand::Low
        }
    }
}

/// One tone of a notification cue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub start_ms: u32,
    pub duration_ms: u32,
}

/// Audible cue played by the presentation side when a signal activates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationCue {
    pub tones: Vec<Tone>,
    pub peak_gain: f32,
}

impl NotificationCue {
    /// Three rising sine tones
    pub fn ascending_chime() -> Self {
        Self {
            tones: vec![
                Tone { frequency_hz: 600.0, start_ms: 0, duration_ms: 150 },
                Tone { frequency_hz: 800.0, start_ms: 150, duration_ms: 150 },
                Tone { frequency_hz: 1000.0, start_ms: 300, duration_ms: 200 },
            ],
            peak_gain: 0.3,
        }
    }

    /// Total cue length
    pub fn duration_ms(&self) -> u32 {
        self.tones
            .iter()
            .map(|t| t.start_ms + t.duration_ms)
            .max()
            .unwrap_or(0)
    }
}

/// Why a request was not admitted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum IgnoreReason {
    Generating,
    CoolingDown { remaining_secs: u64 },
}

/// Lifecycle events published to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SignalEvent {
    GenerationStarted { at: DateTime<Utc> },
    Activated { signal: Signal },
    Expired { signal_id: SignalId },
    CooldownElapsed { signal_id: SignalId },
    RequestIgnored { reason: IgnoreReason },
}

impl SignalEvent {
    /// Signal the event refers to, if any
    pub fn signal_id(&self) -> Option<SignalId> {
        match self {
            SignalEvent::Activated { signal } => Some(signal.id),
            SignalEvent::Expired { signal_id } | SignalEvent::CooldownElapsed { signal_id } => {
                Some(*signal_id)
            }
            SignalEvent::GenerationStarted { .. } | SignalEvent::RequestIgnored { .. } => None,
        }
    }
}
