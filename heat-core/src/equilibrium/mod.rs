// Equilibrium search over discrete joint strategies
//
// Module structure:
// - enumeration     Exhaustive mixed-radix scan with a tabulated payoff oracle
// - best_response   Simultaneous best-response rounds until a fixed point
// - lri             Linear reward-inaction learning with validated restarts
//
// All three search a `Game`; the market implements it, and so can any other
// payoff oracle (tests use games with no pure equilibrium).

pub mod best_response;
pub mod enumeration;
pub mod lri;

pub use best_response::find_pure_equilibrium_by_best_response;
pub use enumeration::find_pure_equilibrium_brute_force;
pub use lri::{LriOutcome, LriParams, find_equilibrium_by_learning};

/// A finite simultaneous game: every player picks one of `strategy_count`
/// strategies and receives a real payoff.
pub trait Game {
    fn player_count(&self) -> usize;

    fn strategy_count(&self) -> usize;

    /// Payoff of every player under the joint `profile`.
    fn payoffs(&self, profile: &[usize]) -> Vec<f64>;

    /// Payoff of `player` had it alone switched to `strategy`.
    fn deviation_payoff(&self, player: usize, profile: &[usize], strategy: usize) -> f64 {
        let mut deviated = profile.to_vec();
        deviated[player] = strategy;
        self.payoffs(&deviated)[player]
    }

    /// `table[player][strategy]`: every single deviation from `profile`,
    /// including staying put.
    fn deviation_table(&self, profile: &[usize]) -> Vec<Vec<f64>> {
        (0..self.player_count())
            .map(|player| {
                (0..self.strategy_count())
                    .map(|strategy| self.deviation_payoff(player, profile, strategy))
                    .collect()
            })
            .collect()
    }
}

/// Each player's best reply to everyone else's current choice.
///
/// A player only moves for a strict improvement; among strictly better
/// strategies the lowest index wins.
pub fn best_responses<G: Game + ?Sized>(game: &G, profile: &[usize]) -> Vec<usize> {
    let table = game.deviation_table(profile);
    profile
        .iter()
        .zip(&table)
        .map(|(&strategy, payoffs)| {
            let mut best = strategy;
            let mut best_payoff = payoffs[strategy];
            for (alternative, &payoff) in payoffs.iter().enumerate() {
                if payoff > best_payoff {
                    best = alternative;
                    best_payoff = payoff;
                }
            }
            best
        })
        .collect()
}

/// Single-deviation test: no player gains strictly by switching alone.
pub fn is_pure_equilibrium<G: Game + ?Sized>(game: &G, profile: &[usize]) -> bool {
    best_responses(game, profile) == profile
}
