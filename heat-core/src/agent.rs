//! Tenant preferences, the utility model and the per-agent strategy
//! distribution used by reinforcement learning.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::SolverConfig;
use crate::error::{HeatError, Result};

// === ARCHETYPES ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Archetype {
    /// Low ideal temperature, cares only about the heating bill.
    Ecologist,
    /// Warm ideal temperature, mostly cares about transport subsidies.
    Traveller,
    /// Warm ideal temperature, cares only about comfort.
    Polluter,
    /// Parameters given directly (or drawn at random).
    Custom,
}

impl Archetype {
    /// `(ideal_temperature, heating, transport, comfort)` before normalisation.
    pub fn parameters(self) -> Option<(f64, f64, f64, f64)> {
        match self {
            Archetype::Ecologist => Some((17.0, 1.0, 0.0, 0.0)),
            Archetype::Traveller => Some((22.0, 0.1, 0.6, 0.3)),
            Archetype::Polluter => Some((22.0, 0.0, 0.0, 1.0)),
            Archetype::Custom => None,
        }
    }
}

// === PROFILE & UTILITY ===

/// Fixed preferences of one agent. Weights always sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct AgentProfile {
    pub archetype: Archetype,
    pub ideal_temperature: f64,
    pub weight_heating: f64,
    pub weight_transport: f64,
    pub weight_comfort: f64,
}

impl AgentProfile {
    /// Profile of a named archetype. `Custom` has no preset parameters.
    pub fn archetype(archetype: Archetype) -> Result<Self> {
        let (ideal, heating, transport, comfort) = archetype.parameters().ok_or_else(|| {
            HeatError::invalid("custom profiles need explicit parameters")
        })?;
        let (weight_heating, weight_transport, weight_comfort) =
            normalise(heating, transport, comfort);
        Ok(Self {
            archetype,
            ideal_temperature: ideal,
            weight_heating,
            weight_transport,
            weight_comfort,
        })
    }

    /// Custom profile; weights are rescaled to sum to 1.
    pub fn custom(
        ideal_temperature: f64,
        heating: f64,
        transport: f64,
        comfort: f64,
    ) -> Result<Self> {
        if !ideal_temperature.is_finite() {
            return Err(HeatError::invalid("ideal temperature must be finite"));
        }
        let weights = [heating, transport, comfort];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(HeatError::invalid("weights must be finite and non-negative"));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(HeatError::invalid("at least one weight must be positive"));
        }
        let (weight_heating, weight_transport, weight_comfort) =
            normalise(heating, transport, comfort);
        Ok(Self {
            archetype: Archetype::Custom,
            ideal_temperature,
            weight_heating,
            weight_transport,
            weight_comfort,
        })
    }

    /// Custom profile with an ideal temperature uniform over the curve domain
    /// and three uniform raw weights.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, cfg: &SolverConfig) -> Self {
        let ideal = rng.random_range(cfg.min_temperature..=cfg.max_temperature);
        // Offset keeps the weight sum strictly positive.
        let heating = rng.random::<f64>() + f64::EPSILON;
        let transport = rng.random::<f64>();
        let comfort = rng.random::<f64>();
        let (weight_heating, weight_transport, weight_comfort) =
            normalise(heating, transport, comfort);
        Self {
            archetype: Archetype::Custom,
            ideal_temperature: ideal,
            weight_heating,
            weight_transport,
            weight_comfort,
        }
    }

    /// Map `[min_temperature, ideal]` onto `[0, 1]`.
    fn normalise_temperature(&self, temperature: f64, cfg: &SolverConfig) -> Option<f64> {
        let span = self.ideal_temperature - cfg.min_temperature;
        (span > 0.0).then(|| (temperature - cfg.min_temperature) / span)
    }

    /// Gaussian around the ideal temperature. An agent whose ideal is the
    /// minimum has a single reachable temperature and is always comfortable.
    pub fn comfort_utility(&self, temperature: f64, cfg: &SolverConfig) -> f64 {
        match self.normalise_temperature(temperature, cfg) {
            Some(actual) => (-(1.0 - actual).powi(2) / cfg.thermal_tolerance).exp(),
            None => 1.0,
        }
    }

    /// 1 when heating is free, 1/e when the bill equals `wealth`.
    pub fn heating_cost_utility(&self, bill: f64, cfg: &SolverConfig) -> f64 {
        (-bill / cfg.wealth).exp()
    }

    /// Rises from 0 to 1 as the subsidy fraction goes from 0 to 1.
    pub fn transport_utility(&self, subsidy_fraction: f64, cfg: &SolverConfig) -> f64 {
        let k = cfg.subsidy_steepness;
        (1.0 - (-subsidy_fraction * k).exp()) / (1.0 - (-k).exp())
    }

    pub fn utility(
        &self,
        temperature: f64,
        bill: f64,
        subsidy_fraction: f64,
        cfg: &SolverConfig,
    ) -> f64 {
        self.comfort_utility(temperature, cfg) * self.weight_comfort
            + self.heating_cost_utility(bill, cfg) * self.weight_heating
            + self.transport_utility(subsidy_fraction, cfg) * self.weight_transport
    }

    /// Temperature of `strategy` out of `strategy_count` evenly spaced levels.
    pub fn strategy_temperature(
        &self,
        strategy: usize,
        strategy_count: usize,
        cfg: &SolverConfig,
    ) -> f64 {
        let steps = strategy_count.saturating_sub(1).max(1) as f64;
        cfg.min_temperature
            + strategy as f64 * (self.ideal_temperature - cfg.min_temperature) / steps
    }
}

fn normalise(heating: f64, transport: f64, comfort: f64) -> (f64, f64, f64) {
    let sum = heating + transport + comfort;
    let heating = heating / sum;
    let transport = transport / sum;
    (heating, transport, 1.0 - heating - transport)
}

// === STRATEGY DISTRIBUTION ===

/// Probability vector over an agent's strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyDistribution {
    probabilities: Vec<f64>,
}

impl StrategyDistribution {
    pub fn uniform(strategy_count: usize) -> Self {
        Self {
            probabilities: vec![1.0 / strategy_count as f64; strategy_count],
        }
    }

    /// All mass on one strategy.
    pub fn one_hot(strategy: usize, strategy_count: usize) -> Self {
        let mut probabilities = vec![0.0; strategy_count];
        if let Some(p) = probabilities.get_mut(strategy) {
            *p = 1.0;
        }
        Self { probabilities }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    pub fn probability(&self, strategy: usize) -> f64 {
        self.probabilities.get(strategy).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Inverse-CDF sample for a uniform draw `p` in `[0, 1)`. Falls back to
    /// the last strategy when rounding leaves the cumulative sum below `p`.
    pub fn strategy_for_probability(&self, p: f64) -> usize {
        let mut cumulative = 0.0;
        for (i, prob) in self.probabilities.iter().enumerate() {
            cumulative += prob;
            if cumulative > p {
                return i;
            }
        }
        self.probabilities.len().saturating_sub(1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.strategy_for_probability(rng.random::<f64>())
    }

    /// Linear reward-inaction step; returns the new probability of `chosen`.
    ///
    /// A round that did worse than the previous one leaves the vector as is.
    /// Otherwise every other strategy loses the fraction
    /// `achieved * learning_rate` of its mass and `chosen` takes all of it.
    pub fn update(
        &mut self,
        chosen: usize,
        achieved_utility: f64,
        learning_rate: f64,
        previous_utility: f64,
    ) -> f64 {
        if achieved_utility < previous_utility || chosen >= self.probabilities.len() {
            return self.probability(chosen);
        }
        let gain = (achieved_utility * learning_rate).clamp(0.0, 1.0);
        let mut freed = 0.0;
        for (i, p) in self.probabilities.iter_mut().enumerate() {
            if i != chosen {
                let taken = gain * *p;
                *p -= taken;
                freed += taken;
            }
        }
        self.probabilities[chosen] += freed;
        self.probabilities[chosen]
    }

    /// The strategy whose probability exceeds `1 - tolerance`.
    pub fn dominant_strategy(&self, tolerance: f64) -> Result<usize> {
        self.probabilities
            .iter()
            .position(|p| *p > 1.0 - tolerance)
            .ok_or(HeatError::NoDominantStrategy { tolerance })
    }

    /// Expected value of `value(strategy)` under this distribution.
    pub fn expectation(&self, value: impl Fn(usize) -> f64) -> f64 {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(i, p)| value(i) * p)
            .sum()
    }
}

// === AGENT ===

/// A tenant: fixed profile plus the mutable learning state.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub profile: AgentProfile,
    pub distribution: StrategyDistribution,
}

impl Agent {
    pub fn new(profile: AgentProfile, strategy_count: usize) -> Self {
        Self {
            profile,
            distribution: StrategyDistribution::uniform(strategy_count),
        }
    }
}
