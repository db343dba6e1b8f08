//! Error types for market construction and equilibrium search.

use crate::market::Method;

/// Result type for heat-core operations.
pub type Result<T> = std::result::Result<T, HeatError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HeatError {
    /// Rejected before any search runs: bad strategy count, negative or empty
    /// population, malformed profile or tunables.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An iterative search used up its round budget without a fixed point.
    #[error("{method:?} search exhausted after {rounds} rounds")]
    ConvergenceExhausted { method: Method, rounds: u64 },

    /// Exhaustive enumeration found no joint vector that survives the
    /// single-deviation test.
    #[error("no pure equilibrium exists")]
    NoPureEquilibrium,

    /// A distribution was asked for its dominant strategy before concentrating.
    #[error("no strategy has probability above 1 - {tolerance}")]
    NoDominantStrategy { tolerance: f64 },

    #[error("joint strategy space of {size} vectors exceeds the enumeration limit of {limit}")]
    SearchSpaceTooLarge { size: u128, limit: u64 },

    /// Costs were requested before a successful `analyse`.
    #[error("market has not been analysed yet")]
    NotAnalysed,
}

impl HeatError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        HeatError::InvalidConfiguration(msg.into())
    }
}
