use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::Archetype;
use crate::market::{Method, PolicyKind};

// ============================================================================
// Snapshot types for rendering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct MarketSnapshot {
    pub policy: PolicyKind,
    pub method: Method,
    pub external_temperature: f64,
    pub agents: Vec<AgentSnapshot>,
    pub total_consumption: f64,
    pub individual_bill: f64,
    pub owner_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentSnapshot {
    pub archetype: Archetype,
    pub ideal_temperature: f64,
    pub temperature: f64,
    pub consumption: f64,
    /// Transport subsidy fraction at `temperature`.
    pub subsidy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct PolicyComparison {
    pub policy: PolicyKind,
    pub policy_cost: f64,
    pub no_subsidy_cost: f64,
    /// Positive when the policy is cheaper for the owner.
    pub saving: f64,
}
