//! Collective heating tariff and the manager's subsidy policy.
//!
//! Everyone pays a flat fee while consumption stays under the baseline;
//! beyond it the excess is passed on at cost. Tenants see the tier applied
//! to the *average* consumption, the manager pays it on the *sum*.

use crate::config::SolverConfig;
use crate::curve::ReductionCurve;
use crate::market::PolicyKind;

/// Per-agent bill for an average consumption.
pub fn individual_bill(average_consumption: f64, cfg: &SolverConfig) -> f64 {
    if average_consumption < cfg.consumption_baseline {
        cfg.minimum_fee
    } else {
        cfg.minimum_fee + average_consumption - cfg.consumption_baseline
    }
}

/// The manager's share of the tariff for `agents` tenants consuming `total`.
pub fn collective_cost(total_consumption: f64, agents: usize, cfg: &SolverConfig) -> f64 {
    let n = agents as f64;
    let flat = cfg.minimum_fee * n;
    if total_consumption < cfg.consumption_baseline * n {
        flat
    } else {
        flat + total_consumption - cfg.consumption_baseline * n
    }
}

/// How the manager discounts transport for a chosen temperature.
#[derive(Debug, Clone, PartialEq)]
pub enum SubsidyPolicy {
    NoSubsidy,
    /// Step curve found by the Monte-Carlo search.
    LearnedCurve(ReductionCurve),
    /// `exp(min_temperature - temperature)`, a closed-form baseline.
    FixedTestCurve,
}

impl SubsidyPolicy {
    pub fn kind(&self) -> PolicyKind {
        match self {
            SubsidyPolicy::NoSubsidy => PolicyKind::NoSubsidy,
            SubsidyPolicy::LearnedCurve(_) => PolicyKind::LearnedCurve,
            SubsidyPolicy::FixedTestCurve => PolicyKind::FixedTestCurve,
        }
    }

    pub fn curve(&self) -> Option<&ReductionCurve> {
        match self {
            SubsidyPolicy::LearnedCurve(curve) => Some(curve),
            _ => None,
        }
    }

    /// Subsidy fraction in `[0, 1]` granted at `temperature`.
    pub fn subsidy(&self, temperature: f64, cfg: &SolverConfig) -> f64 {
        match self {
            SubsidyPolicy::NoSubsidy => 0.0,
            SubsidyPolicy::LearnedCurve(curve) => curve.subsidy_at(temperature, cfg),
            SubsidyPolicy::FixedTestCurve => (cfg.min_temperature - temperature).exp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_is_flat_below_baseline() {
        let cfg = SolverConfig::default();
        assert_eq!(individual_bill(0.0, &cfg), 2.0);
        assert_eq!(individual_bill(2.99, &cfg), 2.0);
        assert_eq!(individual_bill(3.0, &cfg), 2.0);
        assert_eq!(individual_bill(4.5, &cfg), 3.5);
    }

    #[test]
    fn collective_cost_scales_with_population() {
        let cfg = SolverConfig::default();
        assert_eq!(collective_cost(7.5, 3, &cfg), 6.0);
        assert_eq!(collective_cost(14.5, 3, &cfg), 11.5);
        // Same tier as the individual bill, times the head count.
        assert_eq!(collective_cost(13.5, 3, &cfg), 3.0 * individual_bill(4.5, &cfg));
    }

    #[test]
    fn policies_dispatch() {
        let cfg = SolverConfig::default();
        assert_eq!(SubsidyPolicy::NoSubsidy.subsidy(15.0, &cfg), 0.0);
        assert_eq!(SubsidyPolicy::FixedTestCurve.subsidy(15.0, &cfg), 1.0);
        let t = SubsidyPolicy::FixedTestCurve.subsidy(17.0, &cfg);
        assert!((t - (-2.0f64).exp()).abs() < 1e-15);

        let curve = ReductionCurve::from_steps(vec![0.9, 0.5, 0.2, 0.0]).unwrap();
        let learned = SubsidyPolicy::LearnedCurve(curve);
        assert_eq!(learned.subsidy(15.0, &cfg), 0.9);
        assert_eq!(learned.subsidy(18.0, &cfg), 0.5);
        assert_eq!(learned.subsidy(24.9, &cfg), 0.0);
        assert_eq!(learned.kind(), PolicyKind::LearnedCurve);
        assert!(SubsidyPolicy::NoSubsidy.curve().is_none());
    }
}
