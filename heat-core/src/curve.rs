//! Monotone step curves mapping a chosen temperature to a transport subsidy.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::SolverConfig;
use crate::error::{HeatError, Result};

/// Step-function lookup table over `[min_temperature, max_temperature]`.
/// Values lie in `[0, max]` and never increase with the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ReductionCurve {
    steps: Vec<f64>,
}

impl ReductionCurve {
    /// Random decreasing staircase with `curve[0] == max_value`.
    ///
    /// `granularity` unit increments land on seeded random steps; a suffix
    /// sum then makes each step the mass at or to its right, and the result
    /// is rescaled from `granularity` down to `max_value`. The same
    /// `(max_value, seed)` always yields the same curve.
    pub fn generate(max_value: f64, seed: u64, step_count: usize, granularity: usize) -> Self {
        let mut steps = vec![0.0; step_count];
        if step_count == 0 || granularity == 0 {
            return Self { steps };
        }

        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..granularity {
            steps[rng.random_range(0..step_count)] += 1.0;
        }

        for i in (1..step_count).rev() {
            steps[i - 1] += steps[i];
        }

        let scale = max_value / granularity as f64;
        for value in &mut steps {
            *value *= scale;
        }
        Self { steps }
    }

    /// Curve generated with the configured length and granularity.
    pub fn generate_with(max_value: f64, seed: u64, cfg: &SolverConfig) -> Self {
        Self::generate(max_value, seed, cfg.curve_steps, cfg.curve_granularity)
    }

    /// Curve from explicit step values, checked for range and monotonicity.
    pub fn from_steps(steps: Vec<f64>) -> Result<Self> {
        if steps.is_empty() {
            return Err(HeatError::invalid("reduction curve needs at least one step"));
        }
        if steps.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(HeatError::invalid("reduction values must be finite and non-negative"));
        }
        if steps.windows(2).any(|w| w[1] > w[0]) {
            return Err(HeatError::invalid("reduction curve must be non-increasing"));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step index for a temperature, clamped into the table.
    pub fn index_for(&self, temperature: f64, cfg: &SolverConfig) -> usize {
        let last = self.steps.len().saturating_sub(1);
        let position = self.steps.len() as f64 * (temperature - cfg.min_temperature)
            / (cfg.max_temperature - cfg.min_temperature);
        if position.is_nan() || position <= 0.0 {
            0
        } else {
            (position.floor() as usize).min(last)
        }
    }

    pub fn subsidy_at(&self, temperature: f64, cfg: &SolverConfig) -> f64 {
        self.steps
            .get(self.index_for(temperature, cfg))
            .copied()
            .unwrap_or(0.0)
    }

    /// `(temperature, reduction)` pairs, temperature spread linearly over the
    /// domain, one per step.
    pub fn rows(&self, cfg: &SolverConfig) -> CurveRows {
        let n = self.steps.len() as f64;
        let span = cfg.max_temperature - cfg.min_temperature;
        CurveRows(
            self.steps
                .iter()
                .enumerate()
                .map(|(i, value)| (cfg.min_temperature + span * i as f64 / n, *value))
                .collect(),
        )
    }
}

/// Plot-ready rows of a reduction curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveRows(pub Vec<(f64, f64)>);

/// One `temperature reduction` pair per line.
impl fmt::Display for CurveRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (temperature, reduction) in &self.0 {
            writeln!(f, "{} {}", temperature, reduction)?;
        }
        Ok(())
    }
}
