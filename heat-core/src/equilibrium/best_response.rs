//! Simultaneous best-response dynamics.
//!
//! Starting from all zeros, every player replies to the previous round's
//! vector. A round in which nobody moves is a pure equilibrium. Dynamics can
//! cycle, so the loop is bounded by a round budget.

use super::{Game, best_responses};
use crate::error::{HeatError, Result};
use crate::market::Method;

pub fn find_pure_equilibrium_by_best_response<G: Game + ?Sized>(
    game: &G,
    budget: u64,
) -> Result<Vec<usize>> {
    let mut profile = vec![0usize; game.player_count()];
    let mut remaining = budget;

    while remaining > 0 {
        let next = best_responses(game, &profile);
        let switches = next
            .iter()
            .zip(&profile)
            .filter(|(a, b)| a != b)
            .count();

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "best_response",
            round = budget - remaining + 1,
            switches = switches as u64,
        );

        if switches == 0 {
            return Ok(profile);
        }
        profile = next;
        remaining -= 1;
    }

    Err(HeatError::ConvergenceExhausted {
        method: Method::BestResponse,
        rounds: budget,
    })
}
