//! Invariants of the agent model and the curve generator that must hold for
//! any seed or parameter choice.

use heat_core::{
    AgentProfile, Archetype, ReductionCurve, SolverConfig, StrategyDistribution,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// === AGENT MODEL ===

#[test]
fn weights_sum_to_one_for_every_profile() {
    let cfg = SolverConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    let mut profiles: Vec<AgentProfile> = [
        Archetype::Ecologist,
        Archetype::Traveller,
        Archetype::Polluter,
    ]
    .into_iter()
    .map(|a| AgentProfile::archetype(a).unwrap())
    .collect();
    profiles.extend((0..50).map(|_| AgentProfile::random(&mut rng, &cfg)));
    profiles.push(AgentProfile::custom(19.0, 3.0, 7.0, 11.0).unwrap());

    for p in &profiles {
        let sum = p.weight_heating + p.weight_transport + p.weight_comfort;
        assert!((sum - 1.0).abs() < 1e-12, "{p:?} sums to {sum}");
        assert!(p.weight_heating >= 0.0 && p.weight_transport >= 0.0 && p.weight_comfort >= 0.0);
    }
}

#[test]
fn utility_stays_in_unit_interval() {
    let cfg = SolverConfig::default();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let p = AgentProfile::random(&mut rng, &cfg);
        let t = rng.random_range(cfg.min_temperature..=cfg.max_temperature);
        let bill = rng.random_range(0.0..20.0);
        let sub = rng.random::<f64>();
        let u = p.utility(t, bill, sub, &cfg);
        assert!(u > 0.0 && u <= 1.0 + 1e-12, "utility {u} out of range");
    }
}

#[test]
fn distribution_mass_is_conserved_under_learning() {
    let mut rng = StdRng::seed_from_u64(1);
    for strategy_count in [2, 3, 10] {
        let mut d = StrategyDistribution::uniform(strategy_count);
        let mut previous = 0.0;
        for _ in 0..1_000 {
            let chosen = d.sample(&mut rng);
            let achieved = rng.random::<f64>();
            d.update(chosen, achieved, 0.1, previous);
            previous = achieved;
            let sum: f64 = d.probabilities().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn worse_rounds_never_change_the_distribution() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut d = StrategyDistribution::uniform(6);
    for _ in 0..100 {
        let chosen = d.sample(&mut rng);
        d.update(chosen, 0.9, 0.2, 0.1);
    }
    let before = d.clone();
    for chosen in 0..6 {
        d.update(chosen, 0.3, 0.2, 0.31);
    }
    assert_eq!(d, before);
}

// === CURVES ===

#[test]
fn generated_curves_are_deterministic_monotone_staircases() {
    let cfg = SolverConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..20 {
        let max_value = rng.random_range(0.05..=1.0);
        let seed = rng.random::<u64>();
        let curve = ReductionCurve::generate_with(max_value, seed, &cfg);

        assert_eq!(curve, ReductionCurve::generate_with(max_value, seed, &cfg));
        assert_eq!(curve.len(), cfg.curve_steps);
        assert!(curve.steps().windows(2).all(|w| w[0] >= w[1]));
        assert!((curve.steps()[0] - max_value).abs() < 1e-12);
        let last = curve.steps()[curve.len() - 1];
        assert!(last >= 0.0 && last <= max_value / 2.0);
    }
}

#[test]
fn curve_lookup_is_clamped_to_the_domain() {
    let cfg = SolverConfig::default();
    let curve = ReductionCurve::generate_with(0.8, 11, &cfg);
    assert_eq!(curve.subsidy_at(cfg.min_temperature - 5.0, &cfg), curve.steps()[0]);
    assert_eq!(
        curve.subsidy_at(cfg.max_temperature + 5.0, &cfg),
        curve.steps()[curve.len() - 1]
    );
}
