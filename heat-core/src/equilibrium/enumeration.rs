//! Exhaustive search over all `strategy_count ^ player_count` joint vectors.
//!
//! The joint vector is a mixed-radix counter with player 0 as the least
//! significant digit, so vector index `i` has player `j` playing
//! `(i / S^j) % S`. Every payoff is tabulated first; the single-deviation
//! test then only reads the table. Intended for small populations and as an
//! oracle for the iterative methods.

use super::Game;
use crate::error::{HeatError, Result};

/// Number of joint vectors, `None` on overflow.
pub fn joint_space_size(strategy_count: usize, player_count: usize) -> Option<u128> {
    (strategy_count as u128).checked_pow(u32::try_from(player_count).ok()?)
}

/// First joint vector in counter order that survives the single-deviation
/// test, or `None` if no pure equilibrium exists.
///
/// Fails with `SearchSpaceTooLarge` when the joint space exceeds `limit`.
pub fn find_pure_equilibrium_brute_force<G: Game + ?Sized>(
    game: &G,
    limit: u64,
) -> Result<Option<Vec<usize>>> {
    let players = game.player_count();
    let strategies = game.strategy_count();
    let size = joint_space_size(strategies, players).unwrap_or(u128::MAX);
    if size > u128::from(limit) {
        return Err(HeatError::SearchSpaceTooLarge { size, limit });
    }
    let size = size as usize;

    // payoffs[i * players + j] = payoff of player j under vector i
    let mut payoffs = Vec::with_capacity(size * players);
    let mut profile = vec![0usize; players];
    for _ in 0..size {
        payoffs.extend(game.payoffs(&profile));
        increment(&mut profile, strategies);
    }

    let radix: Vec<usize> = (0..players).map(|j| strategies.pow(j as u32)).collect();

    for i in 0..size {
        let stable = (0..players).all(|j| {
            let own = (i / radix[j]) % strategies;
            let base = i - own * radix[j];
            let payoff = payoffs[i * players + j];
            (0..strategies).all(|k| payoffs[(base + k * radix[j]) * players + j] <= payoff)
        });
        if stable {
            return Ok(Some(decode(i, &radix, strategies)));
        }
    }
    Ok(None)
}

/// Advance a mixed-radix counter, wrapping to all zeros after the last vector.
fn increment(profile: &mut [usize], strategies: usize) {
    for digit in profile.iter_mut() {
        *digit += 1;
        if *digit < strategies {
            return;
        }
        *digit = 0;
    }
}

fn decode(index: usize, radix: &[usize], strategies: usize) -> Vec<usize> {
    radix.iter().map(|r| (index / r) % strategies).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equilibrium::test_games::{Coordination, MatchingPennies};

    #[test]
    fn counter_visits_vectors_in_order() {
        let mut p = vec![0, 0, 0];
        let mut seen = Vec::new();
        for _ in 0..8 {
            seen.push(p.clone());
            increment(&mut p, 2);
        }
        assert_eq!(seen[1], vec![1, 0, 0]);
        assert_eq!(seen[2], vec![0, 1, 0]);
        assert_eq!(seen[5], vec![1, 0, 1]);
        assert_eq!(p, vec![0, 0, 0]);
        let radix = [1, 2, 4];
        for (i, v) in seen.iter().enumerate() {
            assert_eq!(&decode(i, &radix, 2), v);
        }
    }

    #[test]
    fn returns_first_equilibrium_in_counter_order() {
        let found = find_pure_equilibrium_brute_force(&Coordination, 100).unwrap();
        assert_eq!(found, Some(vec![0, 0]));
    }

    #[test]
    fn reports_absence_of_pure_equilibrium() {
        let found = find_pure_equilibrium_brute_force(&MatchingPennies, 100).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn refuses_oversized_spaces() {
        let err = find_pure_equilibrium_brute_force(&MatchingPennies, 3).unwrap_err();
        assert_eq!(err, HeatError::SearchSpaceTooLarge { size: 4, limit: 3 });
        assert_eq!(joint_space_size(10, 3), Some(1000));
        assert_eq!(joint_space_size(10, 200), None);
    }
}
