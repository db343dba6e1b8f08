use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{HeatError, Result};
use crate::market::{Method, PolicyKind};

/// Tunables shared by the utility model, the billing tiers and the solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct SolverConfig {
    /// Temperature of strategy 0 for every agent.
    pub min_temperature: f64,
    /// Upper end of the reduction-curve domain.
    pub max_temperature: f64,
    /// Higher means agents feel a gap to their ideal temperature less.
    pub thermal_tolerance: f64,
    /// Bill at which heating-cost utility falls to 1/e.
    pub wealth: f64,
    /// Steepness `k` of the transport-subsidy utility curve.
    pub subsidy_steepness: f64,
    /// Per-agent consumption above which the flat tier turns marginal.
    pub consumption_baseline: f64,
    /// Flat per-agent fee.
    pub minimum_fee: f64,
    /// Number of steps in a reduction curve.
    pub curve_steps: usize,
    /// Random increments drawn when generating a curve.
    pub curve_granularity: usize,
    pub best_response_budget: u64,
    pub lri_learning_rate: f64,
    /// Learning rate restored after the precision has been relaxed.
    pub lri_reset_rate: f64,
    pub lri_precision: f64,
    /// Total LRI rounds across all restarts; `None` runs until accepted.
    pub lri_max_rounds: Option<u64>,
    /// Largest joint strategy space exhaustive enumeration will tabulate.
    pub max_enumeration: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_temperature: 15.0,
            max_temperature: 25.0,
            thermal_tolerance: 0.05,
            wealth: 1.0,
            subsidy_steepness: 5.0,
            consumption_baseline: 3.0,
            minimum_fee: 2.0,
            curve_steps: 100,
            curve_granularity: 10,
            best_response_budget: 10_000,
            lri_learning_rate: 0.1,
            lri_reset_rate: 0.01,
            lri_precision: 0.001,
            lri_max_rounds: Some(5_000_000),
            max_enumeration: 2_000_000,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_temperature > self.min_temperature) {
            return Err(HeatError::invalid(
                "max_temperature must be above min_temperature",
            ));
        }
        for (name, value) in [
            ("thermal_tolerance", self.thermal_tolerance),
            ("wealth", self.wealth),
            ("subsidy_steepness", self.subsidy_steepness),
            ("lri_precision", self.lri_precision),
        ] {
            if !(value > 0.0) {
                return Err(HeatError::invalid(format!("{name} must be positive")));
            }
        }
        for (name, rate) in [
            ("lri_learning_rate", self.lri_learning_rate),
            ("lri_reset_rate", self.lri_reset_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(HeatError::invalid(format!("{name} must lie in (0, 1]")));
            }
        }
        // Above one half, two strategies could both count as dominant.
        if !(self.lri_precision < 0.5) {
            return Err(HeatError::invalid("lri_precision must be below 0.5"));
        }
        if self.curve_steps == 0 || self.curve_granularity == 0 {
            return Err(HeatError::invalid(
                "curve_steps and curve_granularity must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Signed head counts per archetype, as typed into the parameter form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct Composition {
    pub ecologists: i32,
    pub travellers: i32,
    pub polluters: i32,
    /// Agents with a randomly drawn profile.
    pub eccentrics: i32,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            ecologists: 10,
            travellers: 10,
            polluters: 10,
            eccentrics: 0,
        }
    }
}

impl Composition {
    pub fn new(ecologists: i32, travellers: i32, polluters: i32) -> Self {
        Self {
            ecologists,
            travellers,
            polluters,
            eccentrics: 0,
        }
    }

    /// Counts in construction order, rejecting negatives.
    pub(crate) fn counts(&self) -> Result<[usize; 4]> {
        let raw = [
            ("ecologists", self.ecologists),
            ("travellers", self.travellers),
            ("polluters", self.polluters),
            ("eccentrics", self.eccentrics),
        ];
        let mut counts = [0usize; 4];
        for (slot, (name, count)) in counts.iter_mut().zip(raw) {
            *slot = usize::try_from(count).map_err(|_| {
                HeatError::invalid(format!("{name} count cannot be negative (got {count})"))
            })?;
        }
        Ok(counts)
    }
}

/// Everything the parameter form hands to the core for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct MarketConfig {
    pub composition: Composition,
    pub strategy_count: i32,
    pub external_temperature: f64,
    pub policy: PolicyKind,
    pub method: Method,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            composition: Composition::default(),
            strategy_count: 10,
            external_temperature: 12.5,
            policy: PolicyKind::LearnedCurve,
            method: Method::BestResponse,
        }
    }
}

/// Grid over curve amplitude times random shapes per amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub max_value_samples: usize,
    pub trials_per_sample: usize,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            max_value_samples: 10,
            trials_per_sample: 10,
        }
    }
}
