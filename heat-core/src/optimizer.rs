//! Monte-Carlo search for the reduction curve that minimises the owner's cost.
//!
//! The outer loop walks `max_value_samples` evenly spaced amplitudes in
//! `(0, 1]`; the inner loop draws `trials_per_sample` curve shapes per
//! amplitude. Only `(max_value, seed)` of the best trial is retained and the
//! winning curve is regenerated from it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::billing::SubsidyPolicy;
use crate::config::{MonteCarloConfig, SolverConfig};
use crate::curve::ReductionCurve;
use crate::error::{HeatError, Result};
use crate::market::{Equilibrium, Market};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct CurveSearch {
    /// Owner cost with no subsidy at all.
    pub baseline_cost: f64,
    /// Lowest owner cost seen during the search.
    pub best_cost: f64,
    pub max_value: f64,
    pub seed: u64,
    pub curve: ReductionCurve,
    /// Analysis of the market under the regenerated winning curve.
    pub equilibrium: Equilibrium,
    pub trials: u64,
    /// Trials whose equilibrium search failed.
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsidyCurveOptimizer {
    pub config: MonteCarloConfig,
}

impl SubsidyCurveOptimizer {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    pub fn generate_curve(&self, max_value: f64, seed: u64, cfg: &SolverConfig) -> ReductionCurve {
        ReductionCurve::generate_with(max_value, seed, cfg)
    }

    /// Search curves for `market` using its configured method. On success the
    /// market holds the winning curve and its analysis; if no curve beats the
    /// baseline the winner is the all-zero curve `(0.0, 0)`.
    ///
    /// A failing baseline aborts the search and restores the previous policy.
    pub fn search<R: Rng + ?Sized>(&self, market: &mut Market, rng: &mut R) -> Result<CurveSearch> {
        let previous = market.policy().clone();
        market.set_policy(SubsidyPolicy::NoSubsidy);
        let baseline_cost = match market.analyse(rng) {
            Ok(eq) => eq.owner_cost,
            Err(err) => {
                market.set_policy(previous);
                return Err(err);
            }
        };

        let samples = self.config.max_value_samples;
        let mut best = (baseline_cost, 0.0, 0u64);
        let mut trials = 0u64;
        let mut skipped = 0u64;

        for k in 1..=samples {
            let max_value = k as f64 / samples as f64;
            for _ in 0..self.config.trials_per_sample {
                // 32-bit seeds survive the trip through JS numbers.
                let seed = u64::from(rng.random::<u32>());
                let curve = self.generate_curve(max_value, seed, market.config());
                market.set_policy(SubsidyPolicy::LearnedCurve(curve));

                match market.analyse(rng) {
                    Ok(eq) => {
                        trials += 1;
                        let improved = eq.owner_cost < best.0;
                        if improved {
                            best = (eq.owner_cost, max_value, seed);
                        }

                        #[cfg(feature = "instrument")]
                        tracing::info!(
                            target: "curve_trial",
                            max_value = max_value,
                            seed = seed,
                            owner_cost = eq.owner_cost,
                            improved = improved,
                        );
                    }
                    Err(
                        err @ (HeatError::ConvergenceExhausted { .. }
                        | HeatError::NoPureEquilibrium),
                    ) => {
                        skipped += 1;
                        #[cfg(feature = "instrument")]
                        tracing::warn!(
                            target: "curve_trial_skipped",
                            max_value = max_value,
                            seed = seed,
                            error = %err,
                        );
                        let _ = err;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        let (best_cost, max_value, seed) = best;
        let curve = self.generate_curve(max_value, seed, market.config());
        market.set_policy(SubsidyPolicy::LearnedCurve(curve.clone()));
        let equilibrium = market.analyse(rng)?;

        Ok(CurveSearch {
            baseline_cost,
            best_cost,
            max_value,
            seed,
            curve,
            equilibrium,
            trials,
            skipped,
        })
    }
}
