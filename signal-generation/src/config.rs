//! Signal lifecycle configuration

use common::Variant;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Fatal configuration problems, detected once at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("multiplier pool is empty")]
    EmptyPool,

    #[error("multiplier {0} is not positive")]
    NonPositiveMultiplier(Decimal),

    #[error("ledger capacity must be at least 1")]
    ZeroCapacity,

    #[error("confidence range is empty")]
    EmptyConfidenceRange,

    #[error("confidence {0}% exceeds 100%")]
    ConfidenceOutOfRange(u16),

    #[error("{0} must be greater than zero when set")]
    ZeroTimer(&'static str),
}

/// How the per-signal confidence figure is produced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConfidenceModel {
    /// `floor(u * span) + min`, i.e. uniform over `[min, min + span)`
    Sampled { min: u8, span: u8 },
    /// Constant display figure, not part of the random model
    Fixed { value: u8 },
}

impl ConfidenceModel {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ConfidenceModel::Sampled { min, span } => {
                if span == 0 {
                    return Err(ConfigError::EmptyConfidenceRange);
                }
                let max = min as u16 + span as u16 - 1;
                if max > 100 {
                    return Err(ConfigError::ConfidenceOutOfRange(max));
                }
            }
            ConfidenceModel::Fixed { value } => {
                if value > 100 {
                    return Err(ConfigError::ConfidenceOutOfRange(value as u16));
                }
            }
        }
        Ok(())
    }
}

/// Full configuration of one signal board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalConfig {
    pub variant: Variant,

    /// Simulated analysis latency before a requested signal appears
    #[serde(default = "default_generation_delay_ms")]
    pub generation_delay_ms: u64,

    /// How long a signal stays active. `None` keeps it active until superseded.
    #[serde(default)]
    pub validity_secs: Option<u64>,

    /// Minimum gap between an activation and the next admitted request
    #[serde(default)]
    pub cooldown_secs: Option<u64>,

    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    /// Candidate multipliers (rocket variant only)
    #[serde(default = "default_multipliers")]
    pub multipliers: Vec<Decimal>,

    /// Confidence model. Falls back to the variant's default when absent.
    #[serde(default)]
    pub confidence: Option<ConfidenceModel>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self::rocket()
    }
}

fn default_generation_delay_ms() -> u64 {
    2000
}

fn default_ledger_capacity() -> usize {
    10
}

fn default_multipliers() -> Vec<Decimal> {
    base_multipliers()
}

/// Ten-element pool of the basic rocket board
pub fn base_multipliers() -> Vec<Decimal> {
    vec![
        dec!(1.5),
        dec!(1.8),
        dec!(2.0),
        dec!(2.3),
        dec!(2.5),
        dec!(2.8),
        dec!(3.0),
        dec!(3.5),
        dec!(4.0),
        dec!(5.0),
    ]
}

/// Longer pool of the timed rocket board, up to 10x
pub fn extended_multipliers() -> Vec<Decimal> {
    vec![
        dec!(1.2),
        dec!(1.5),
        dec!(1.8),
        dec!(2.0),
        dec!(2.3),
        dec!(2.5),
        dec!(2.8),
        dec!(3.0),
        dec!(3.5),
        dec!(4.0),
        dec!(5.0),
        dec!(6.0),
        dec!(7.5),
        dec!(10.0),
    ]
}

impl SignalConfig {
    /// Basic rocket board: no validity window, no cooldown
    pub fn rocket() -> Self {
        Self {
            variant: Variant::Rocket,
            generation_delay_ms: 2000,
            validity_secs: None,
            cooldown_secs: None,
            ledger_capacity: 10,
            multipliers: base_multipliers(),
            confidence: Some(ConfidenceModel::Sampled { min: 85, span: 10 }),
        }
    }

    /// Timed rocket board: 60 s validity, 180 s cooldown
    pub fn rocket_timed() -> Self {
        Self {
            variant: Variant::Rocket,
            generation_delay_ms: 3000,
            validity_secs: Some(60),
            cooldown_secs: Some(180),
            ledger_capacity: 20,
            multipliers: extended_multipliers(),
            confidence: Some(ConfidenceModel::Fixed { value: 94 }),
        }
    }

    /// Mines board: risk tier draw on a 5x5 grid
    pub fn mines() -> Self {
        Self {
            variant: Variant::Mines,
            generation_delay_ms: 2000,
            validity_secs: None,
            cooldown_secs: None,
            ledger_capacity: 10,
            multipliers: Vec::new(),
            confidence: Some(ConfidenceModel::Sampled { min: 75, span: 15 }),
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "rocket" => Some(Self::rocket()),
            "rocket_timed" => Some(Self::rocket_timed()),
            "mines" => Some(Self::mines()),
            _ => None,
        }
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }

    pub fn confidence_model(&self) -> ConfidenceModel {
        self.confidence.unwrap_or(match self.variant {
            Variant::Rocket => ConfidenceModel::Sampled { min: 85, span: 10 },
            Variant::Mines => ConfidenceModel::Sampled { min: 75, span: 15 },
        })
    }

    /// Whether any countdown runs after activation
    pub fn is_timed(&self) -> bool {
        self.validity_secs.is_some() || self.cooldown_secs.is_some()
    }

    /// Reject configurations the board cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.validity_secs == Some(0) {
            return Err(ConfigError::ZeroTimer("validity_secs"));
        }
        if self.cooldown_secs == Some(0) {
            return Err(ConfigError::ZeroTimer("cooldown_secs"));
        }
        if self.variant == Variant::Rocket {
            if self.multipliers.is_empty() {
                return Err(ConfigError::EmptyPool);
            }
            if let Some(bad) = self.multipliers.iter().find(|m| **m <= Decimal::ZERO) {
                return Err(ConfigError::NonPositiveMultiplier(*bad));
            }
        }
        self.confidence_model().validate()
    }
}

/// Load and validate configuration from a TOML file
pub fn load_config(path: &str) -> anyhow::Result<SignalConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: SignalConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file
pub fn save_config(config: &SignalConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write a commented configuration template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = r#"# Signal board configuration

# "rocket" or "mines"
variant = "rocket"

# Simulated analysis delay before a signal appears (milliseconds)
generation_delay_ms = 3000

# Seconds a signal stays active (omit to keep it active until replaced)
validity_secs = 60

# Seconds after activation before the next request is admitted (omit for none)
cooldown_secs = 180

# Number of past signals kept in the history
ledger_capacity = 20

# Candidate multipliers for the rocket variant
multipliers = ["1.2", "1.5", "1.8", "2.0", "2.3", "2.5", "2.8", "3.0", "3.5", "4.0", "5.0", "6.0", "7.5", "10.0"]

# Confidence figure: sampled over [min, min + span) or a fixed value
[confidence]
mode = "fixed"
value = 94
"#;

    std::fs::write(path, template)?;
    Ok(())
}
