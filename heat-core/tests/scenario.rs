//! End-to-end runs of the reference market: two ecologists and one
//! traveller, ten strategies, 12.5 degrees outside.

use heat_core::{
    Archetype, Composition, HeatError, Market, MarketConfig, Method, MonteCarloConfig,
    PolicyKind, SolverConfig, SubsidyCurveOptimizer,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn reference_config(policy: PolicyKind, method: Method) -> MarketConfig {
    MarketConfig {
        composition: Composition::new(2, 1, 0),
        strategy_count: 10,
        external_temperature: 12.5,
        policy,
        method,
    }
}

fn reference_market(policy: PolicyKind, method: Method, seed: u64) -> (Market, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let market = Market::from_config(
        &reference_config(policy, method),
        SolverConfig::default(),
        &mut rng,
    )
    .unwrap();
    (market, rng)
}

#[test]
fn best_response_settles_ecologists_below_the_traveller() {
    let (mut market, mut rng) = reference_market(PolicyKind::NoSubsidy, Method::BestResponse, 0);
    let eq = market.analyse(&mut rng).unwrap();

    assert_eq!(eq.strategies, vec![0, 0, 9]);
    assert!(eq.strategies[0] < eq.strategies[2]);
    assert!(eq.strategies[1] < eq.strategies[2]);
    assert_eq!(eq.temperatures, vec![15.0, 15.0, 22.0]);
    assert_eq!(eq.owner_cost, 11.5);
    assert_eq!(market.owner_cost(), Ok(11.5));
}

#[test]
fn enumeration_finds_the_same_equilibrium() {
    let (mut market, mut rng) = reference_market(PolicyKind::NoSubsidy, Method::Exhaustive, 0);
    let eq = market.analyse(&mut rng).unwrap();
    assert_eq!(eq.strategies, vec![0, 0, 9]);
    assert_eq!(eq.owner_cost, 11.5);
}

#[test]
fn fixed_test_curve_keeps_everyone_at_the_minimum() {
    for method in [Method::BestResponse, Method::Exhaustive] {
        let (mut market, mut rng) = reference_market(PolicyKind::FixedTestCurve, method, 0);
        let eq = market.analyse(&mut rng).unwrap();
        assert_eq!(eq.strategies, vec![0, 0, 0], "{method:?}");
        // Flat tier for 7.5 units plus the traveller's full subsidy.
        let w = market.agents()[2].profile.weight_transport;
        assert!((eq.owner_cost - (6.0 + w)).abs() < 1e-12);
    }
}

#[test]
fn report_lists_bills_and_consumption() {
    let (mut market, mut rng) = reference_market(PolicyKind::NoSubsidy, Method::BestResponse, 0);
    market.analyse(&mut rng).unwrap();
    let snap = market.snapshot().unwrap();

    let consumption: Vec<f64> = snap.agents.iter().map(|a| a.consumption).collect();
    assert_eq!(consumption, vec![2.5, 2.5, 9.5]);
    assert!((snap.individual_bill - 3.8333333333333335).abs() < 1e-12);
    assert_eq!(snap.agents[0].archetype, Archetype::Ecologist);
    assert!(snap.agents.iter().all(|a| a.subsidy == 0.0));
}

#[test]
fn monte_carlo_search_beats_the_unsubsidised_baseline() {
    let (mut market, mut rng) = reference_market(PolicyKind::LearnedCurve, Method::BestResponse, 3);
    let optimizer = SubsidyCurveOptimizer::new(MonteCarloConfig {
        max_value_samples: 5,
        trials_per_sample: 5,
    });
    let result = optimizer.search(&mut market, &mut rng).unwrap();

    assert_eq!(result.baseline_cost, 11.5);
    assert_eq!(result.trials + result.skipped, 25);
    assert!(result.best_cost < result.baseline_cost);
    assert!(result.max_value > 0.0 && result.max_value <= 1.0);
    assert_eq!(
        result.curve,
        optimizer.generate_curve(result.max_value, result.seed, market.config())
    );
    assert_eq!(market.reduction_curve(), Some(&result.curve));
    assert_eq!(market.policy().kind(), PolicyKind::LearnedCurve);
    assert_eq!(result.equilibrium.owner_cost, result.best_cost);
}

#[test]
fn searches_are_reproducible_from_the_seed() {
    let run = |seed| {
        let (mut market, mut rng) =
            reference_market(PolicyKind::LearnedCurve, Method::BestResponse, seed);
        let optimizer = SubsidyCurveOptimizer::new(MonteCarloConfig {
            max_value_samples: 2,
            trials_per_sample: 3,
        });
        optimizer.search(&mut market, &mut rng).unwrap()
    };
    assert_eq!(run(17), run(17));
}

#[test]
fn learning_market_reports_expected_temperatures() {
    let config = MarketConfig {
        composition: Composition::new(0, 0, 3),
        strategy_count: 3,
        external_temperature: 12.5,
        policy: PolicyKind::NoSubsidy,
        method: Method::Lri,
    };
    let mut rng = StdRng::seed_from_u64(5);
    let mut market = Market::from_config(&config, SolverConfig::default(), &mut rng).unwrap();
    let eq = market.analyse(&mut rng).unwrap();
    assert_eq!(eq.strategies, vec![2, 2, 2]);
    assert_eq!(market.chosen_temperatures(), Some(eq.temperatures.as_slice()));
}

#[test]
fn policy_comparison_reports_the_saving() {
    let (mut market, mut rng) = reference_market(PolicyKind::FixedTestCurve, Method::BestResponse, 0);
    let cmp = market.compare_with_no_subsidy(&mut rng).unwrap();
    assert_eq!(cmp.no_subsidy_cost, 11.5);
    assert!(cmp.saving > 0.0);
}

#[test]
fn eccentric_agents_come_from_the_injected_source() {
    let config = MarketConfig {
        composition: Composition {
            ecologists: 1,
            travellers: 0,
            polluters: 0,
            eccentrics: 3,
        },
        strategy_count: 4,
        ..MarketConfig::default()
    };
    let build = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        Market::from_config(&config, SolverConfig::default(), &mut rng).unwrap()
    };
    let (a, b) = (build(9), build(9));
    assert_eq!(a.agents().len(), 4);
    assert_eq!(a.agents()[0].profile.archetype, Archetype::Ecologist);
    assert!(a.agents()[1..].iter().all(|x| x.profile.archetype == Archetype::Custom));
    assert_eq!(a.agents(), b.agents());
}

#[test]
fn small_round_cap_surfaces_exhaustion() {
    let cfg = SolverConfig {
        lri_max_rounds: Some(3),
        ..SolverConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let mut market = Market::from_config(
        &reference_config(PolicyKind::NoSubsidy, Method::Lri),
        cfg,
        &mut rng,
    )
    .unwrap();
    assert_eq!(
        market.analyse(&mut rng),
        Err(HeatError::ConvergenceExhausted {
            method: Method::Lri,
            rounds: 3
        })
    );
    assert_eq!(market.owner_cost(), Err(HeatError::NotAnalysed));
}
