// Random Draw Generator
// Produces candidate signals from fixed pools using an injected random source

use super::config::{ConfidenceModel, ConfigError, SignalConfig};
use super::random::RandomSource;
use common::{CandidateSignal, RiskTier, SignalValue, Variant, MINES_GRID_CELLS};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Draw attempts allowed per flagged cell before falling back to a fill
const CELL_ATTEMPTS_PER_MINE: usize = 64;

/// Generator of candidate signals
pub trait SignalDraw: Send + Sync {
    /// Produce one candidate. Pure with respect to `rng`.
    fn draw(&self, rng: &mut dyn RandomSource) -> CandidateSignal;

    fn variant(&self) -> Variant;
}

impl ConfidenceModel {
    /// Confidence figure for one draw. `Fixed` consumes no randomness.
    pub fn sample(&self, rng: &mut dyn RandomSource) -> u8 {
        match *self {
            ConfidenceModel::Sampled { min, span } => min + rng.pick_index(span as usize) as u8,
            ConfidenceModel::Fixed { value } => value,
        }
    }
}

/// Uniform pick from a multiplier pool
#[derive(Debug, Clone)]
pub struct RocketDraw {
    pool: Vec<Decimal>,
    confidence: ConfidenceModel,
}

impl RocketDraw {
    pub fn new(pool: Vec<Decimal>, confidence: ConfidenceModel) -> Result<Self, ConfigError> {
        if pool.is_empty() {
            return Err(ConfigError::EmptyPool);
        }
        if let Some(bad) = pool.iter().find(|m| **m <= Decimal::ZERO) {
            return Err(ConfigError::NonPositiveMultiplier(*bad));
        }
        confidence.validate()?;
        Ok(Self { pool, confidence })
    }

    pub fn pool(&self) -> &[Decimal] {
        &self.pool
    }
}

impl SignalDraw for RocketDraw {
    fn draw(&self, rng: &mut dyn RandomSource) -> CandidateSignal {
        let multiplier = self.pool[rng.pick_index(self.pool.len())];
        let confidence = self.confidence.sample(rng);
        debug!("Drew multiplier {}x at {}%", multiplier, confidence);

        CandidateSignal {
            value: SignalValue::Multiplier { multiplier },
            confidence,
        }
    }

    fn variant(&self) -> Variant {
        Variant::Rocket
    }
}

/// Risk tier plus a set of distinct flagged cells
#[derive(Debug, Clone)]
pub struct MinesDraw {
    confidence: ConfidenceModel,
}

impl MinesDraw {
    pub fn new(confidence: ConfidenceModel) -> Result<Self, ConfigError> {
        confidence.validate()?;
        Ok(Self { confidence })
    }

    /// Draw with the risk tier already decided
    pub fn draw_with_tier(&self, tier: RiskTier, rng: &mut dyn RandomSource) -> CandidateSignal {
        let flagged_cells = sample_cells(tier.mines_count(), rng);
        let confidence = self.confidence.sample(rng);
        debug!(
            "Drew {:?} tier with cells {:?} at {}%",
            tier, flagged_cells, confidence
        );

        CandidateSignal {
            value: SignalValue::Mines {
                risk_tier: tier,
                coefficient: tier.coefficient(),
                flagged_cells,
            },
            confidence,
        }
    }
}

impl SignalDraw for MinesDraw {
    fn draw(&self, rng: &mut dyn RandomSource) -> CandidateSignal {
        let tier = RiskTier::ALL[rng.pick_index(RiskTier::ALL.len())];
        self.draw_with_tier(tier, rng)
    }

    fn variant(&self) -> Variant {
        Variant::Mines
    }
}

/// Rejection-sample `count` distinct cells, returned ascending.
///
/// A source that keeps repeating itself exhausts the attempt budget; the
/// remaining cells are then taken from the lowest unused indices.
pub fn sample_cells(count: usize, rng: &mut dyn RandomSource) -> Vec<u8> {
    let count = count.min(MINES_GRID_CELLS as usize);
    let mut cells = BTreeSet::new();
    let mut attempts = 0;
    let budget = count * CELL_ATTEMPTS_PER_MINE;

    while cells.len() < count && attempts < budget {
        cells.insert(rng.pick_index(MINES_GRID_CELLS as usize) as u8);
        attempts += 1;
    }

    if cells.len() < count {
        warn!(
            "Random source repeated itself; filling {} of {} cells deterministically",
            count - cells.len(),
            count
        );
        for cell in 0..MINES_GRID_CELLS {
            if cells.len() == count {
                break;
            }
            cells.insert(cell);
        }
    }

    cells.into_iter().collect()
}

/// Build the generator a configuration asks for
pub fn build_draw(config: &SignalConfig) -> Result<Box<dyn SignalDraw>, ConfigError> {
    let confidence = config.confidence_model();
    match config.variant {
        Variant::Rocket => Ok(Box::new(RocketDraw::new(config.multipliers.clone(), confidence)?)),
        Variant::Mines => Ok(Box::new(MinesDraw::new(confidence)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::base_multipliers;
    use crate::random::{ConstantSource, ScriptedSource, SeededSource};
    use rust_decimal_macros::dec;

    fn rocket() -> RocketDraw {
        RocketDraw::new(
            base_multipliers(),
            ConfidenceModel::Sampled { min: 85, span: 10 },
        )
        .unwrap()
    }

    fn mines() -> MinesDraw {
        MinesDraw::new(ConfidenceModel::Sampled { min: 75, span: 15 }).unwrap()
    }

    #[test]
    fn test_first_index_draw() {
        let candidate = rocket().draw(&mut ConstantSource::first());
        assert_eq!(candidate.value.multiplier(), Some(dec!(1.5)));
        assert_eq!(candidate.confidence, 85);
    }

    #[test]
    fn test_last_index_draw() {
        let candidate = rocket().draw(&mut ConstantSource::last());
        assert_eq!(candidate.value.multiplier(), Some(dec!(5.0)));
        assert_eq!(candidate.confidence, 94);
    }

    #[test]
    fn test_rocket_draws_stay_in_pool() {
        let draw = rocket();
        let mut rng = SeededSource::from_seed(7);
        for _ in 0..500 {
            let candidate = draw.draw(&mut rng);
            let multiplier = candidate.value.multiplier().unwrap();
            assert!(draw.pool().contains(&multiplier));
            assert!((85..=94).contains(&candidate.confidence));
        }
    }

    #[test]
    fn test_every_pool_element_reachable() {
        let draw = rocket();
        let mut rng = SeededSource::from_seed(11);
        let mut seen = BTreeSet::new();
        for _ in 0..1000 {
            seen.insert(draw.draw(&mut rng).value.multiplier().unwrap());
        }
        assert_eq!(seen.len(), draw.pool().len());
    }

    #[test]
    fn test_fixed_confidence_consumes_no_randomness() {
        let draw = RocketDraw::new(base_multipliers(), ConfidenceModel::Fixed { value: 94 }).unwrap();
        // First value picks the multiplier; a second would only be used by a sampled model
        let mut rng = ScriptedSource::new(vec![0.95, 0.0]);
        let candidate = draw.draw(&mut rng);
        assert_eq!(candidate.value.multiplier(), Some(dec!(5.0)));
        assert_eq!(candidate.confidence, 94);
        assert_eq!(rng.next_unit(), 0.0);
    }

    #[test]
    fn test_empty_pool_is_fatal() {
        let err = RocketDraw::new(Vec::new(), ConfidenceModel::Fixed { value: 90 }).unwrap_err();
        assert_eq!(err, ConfigError::EmptyPool);
    }

    #[test]
    fn test_forced_high_tier() {
        let mut rng = SeededSource::from_seed(3);
        let candidate = mines().draw_with_tier(RiskTier::High, &mut rng);

        match candidate.value {
            SignalValue::Mines { risk_tier, coefficient, flagged_cells } => {
                assert_eq!(risk_tier, RiskTier::High);
                assert_eq!(coefficient, dec!(3.8));
                assert_eq!(flagged_cells.len(), 7);
                let unique: BTreeSet<_> = flagged_cells.iter().collect();
                assert_eq!(unique.len(), 7);
                assert!(flagged_cells.iter().all(|c| *c < MINES_GRID_CELLS));
            }
            other => panic!("unexpected value {other:?}"),
        }
        assert!((75..=89).contains(&candidate.confidence));
    }

    #[test]
    fn test_mines_cells_distinct_sorted_in_range() {
        let draw = mines();
        let mut rng = SeededSource::from_seed(99);
        for _ in 0..500 {
            let candidate = draw.draw(&mut rng);
            let SignalValue::Mines { risk_tier, coefficient, flagged_cells } = candidate.value else {
                panic!("mines draw produced a multiplier");
            };
            assert_eq!(flagged_cells.len(), risk_tier.mines_count());
            assert_eq!(coefficient, risk_tier.coefficient());
            assert!(flagged_cells.windows(2).all(|w| w[0] < w[1]));
            assert!(flagged_cells.iter().all(|c| *c < MINES_GRID_CELLS));
        }
    }

    #[test]
    fn test_tier_draw_from_first_index() {
        let candidate = mines().draw(&mut ConstantSource::first());
        let SignalValue::Mines { risk_tier, flagged_cells, .. } = candidate.value else {
            panic!("mines draw produced a multiplier");
        };
        assert_eq!(risk_tier, RiskTier::Low);
        // A constant source repeats cell 0 forever, so the fill kicks in
        assert_eq!(flagged_cells, vec![0, 1, 2]);
        assert_eq!(candidate.confidence, 75);
    }

    #[test]
    fn test_rejection_skips_duplicates() {
        // 0.0 -> cell 0, repeated 0.0 is rejected, 0.5 -> cell 12, 0.99 -> cell 24
        let mut rng = ScriptedSource::new(vec![0.0, 0.0, 0.5, 0.99]);
        assert_eq!(sample_cells(3, &mut rng), vec![0, 12, 24]);
    }

    #[test]
    fn test_build_draw_by_variant() {
        assert_eq!(build_draw(&SignalConfig::rocket()).unwrap().variant(), Variant::Rocket);
        assert_eq!(build_draw(&SignalConfig::mines()).unwrap().variant(), Variant::Mines);

        let mut broken = SignalConfig::rocket();
        broken.multipliers.clear();
        assert!(build_draw(&broken).is_err());
    }
}
