//! Linear reward-inaction learning.
//!
//! Every player keeps a distribution over its strategies, samples from it
//! each round and reinforces the sampled strategy in proportion to the payoff
//! (unless the payoff fell since the previous round). Once every distribution
//! has concentrated, the dominant vector is checked with the single-deviation
//! test. A rejected candidate restarts learning from uniform with half the
//! learning rate; a rate that underflows to zero instead relaxes the
//! precision tenfold and restores `reset_rate`.

use rand::Rng;

use super::{Game, is_pure_equilibrium};
use crate::agent::StrategyDistribution;
use crate::config::SolverConfig;
use crate::error::{HeatError, Result};
use crate::market::Method;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LriParams {
    pub learning_rate: f64,
    pub reset_rate: f64,
    pub precision: f64,
    /// Rounds across all restarts; `None` means no cap.
    pub max_rounds: Option<u64>,
}

impl From<&SolverConfig> for LriParams {
    fn from(cfg: &SolverConfig) -> Self {
        Self {
            learning_rate: cfg.lri_learning_rate,
            reset_rate: cfg.lri_reset_rate,
            precision: cfg.lri_precision,
            max_rounds: cfg.lri_max_rounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LriOutcome {
    /// Validated dominant strategy per player.
    pub strategies: Vec<usize>,
    pub attempts: u64,
    pub rounds: u64,
    /// Precision and learning rate in force when the candidate was accepted.
    pub precision: f64,
    pub learning_rate: f64,
}

/// Learn a pure equilibrium. `distributions` holds one entry per player and
/// is left at the final learned state.
pub fn find_equilibrium_by_learning<G, R>(
    game: &G,
    distributions: &mut [StrategyDistribution],
    params: LriParams,
    rng: &mut R,
) -> Result<LriOutcome>
where
    G: Game + ?Sized,
    R: Rng + ?Sized,
{
    let players = game.player_count();
    let strategies = game.strategy_count();
    if distributions.len() != players {
        return Err(HeatError::invalid(format!(
            "{} distributions for {} players",
            distributions.len(),
            players
        )));
    }

    let mut learning_rate = params.learning_rate;
    let mut precision = params.precision;
    let mut rounds = 0u64;
    let mut attempts = 0u64;

    loop {
        attempts += 1;
        for d in distributions.iter_mut() {
            *d = StrategyDistribution::uniform(strategies);
        }
        let mut previous = vec![0.0; players];
        let attempt_start = rounds;

        // Converging
        loop {
            if params.max_rounds.is_some_and(|cap| rounds >= cap) {
                return Err(HeatError::ConvergenceExhausted {
                    method: Method::Lri,
                    rounds,
                });
            }
            rounds += 1;

            let profile: Vec<usize> = distributions.iter().map(|d| d.sample(rng)).collect();
            let payoffs = game.payoffs(&profile);
            for (player, d) in distributions.iter_mut().enumerate() {
                d.update(profile[player], payoffs[player], learning_rate, previous[player]);
                previous[player] = payoffs[player];
            }

            if distributions
                .iter()
                .all(|d| d.dominant_strategy(precision).is_ok())
            {
                break;
            }
        }

        // Validating
        let candidate = distributions
            .iter()
            .map(|d| d.dominant_strategy(precision))
            .collect::<Result<Vec<_>>>()?;
        let accepted = is_pure_equilibrium(game, &candidate);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "lri_attempt",
            attempt = attempts,
            learning_rate = learning_rate,
            precision = precision,
            rounds = rounds - attempt_start,
            accepted = accepted,
        );
        let _ = attempt_start;

        if accepted {
            return Ok(LriOutcome {
                strategies: candidate,
                attempts,
                rounds,
                precision,
                learning_rate,
            });
        }

        (learning_rate, precision) = relax(learning_rate, precision, params.reset_rate);
    }
}

/// Parameters for the attempt after a rejected candidate: half the learning
/// rate, or, once that underflows, `reset_rate` with a tenfold looser
/// precision.
fn relax(learning_rate: f64, precision: f64, reset_rate: f64) -> (f64, f64) {
    let halved = learning_rate / 2.0;
    if halved == 0.0 {
        (reset_rate, precision / 10.0)
    } else {
        (halved, precision)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::equilibrium::test_games::{Coordination, MatchingPennies};

    fn params(max_rounds: u64) -> LriParams {
        LriParams {
            learning_rate: 0.1,
            reset_rate: 0.01,
            precision: 0.001,
            max_rounds: Some(max_rounds),
        }
    }

    #[test]
    fn learns_a_validated_equilibrium() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut dists = vec![StrategyDistribution::default(); 2];
        let outcome =
            find_equilibrium_by_learning(&Coordination, &mut dists, params(1_000_000), &mut rng)
                .unwrap();
        assert!(is_pure_equilibrium(&Coordination, &outcome.strategies));
        for (d, s) in dists.iter().zip(&outcome.strategies) {
            assert!(d.probability(*s) > 1.0 - outcome.precision);
        }
    }

    #[test]
    fn round_cap_stops_games_without_pure_equilibrium() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut dists = vec![StrategyDistribution::default(); 2];
        let err =
            find_equilibrium_by_learning(&MatchingPennies, &mut dists, params(20_000), &mut rng)
                .unwrap_err();
        assert_eq!(
            err,
            HeatError::ConvergenceExhausted {
                method: Method::Lri,
                rounds: 20_000,
            }
        );
    }

    #[test]
    fn rejected_candidates_halve_the_rate() {
        assert_eq!(relax(0.1, 0.001, 0.01), (0.05, 0.001));
        assert_eq!(relax(0.05, 0.001, 0.01), (0.025, 0.001));
    }

    #[test]
    fn underflowing_rate_relaxes_precision() {
        let smallest = f64::from_bits(1);
        assert_eq!(smallest, 5e-324);
        let (rate, precision) = relax(smallest, 0.001, 0.01);
        assert_eq!(rate, 0.01);
        assert_eq!(precision, 0.001 / 10.0);
    }

    #[test]
    fn same_seed_same_outcome() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut dists = vec![StrategyDistribution::default(); 2];
            find_equilibrium_by_learning(&Coordination, &mut dists, params(1_000_000), &mut rng)
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn rejects_mismatched_distribution_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut dists = vec![StrategyDistribution::default(); 3];
        assert!(
            find_equilibrium_by_learning(&Coordination, &mut dists, params(10), &mut rng).is_err()
        );
    }
}
