//! The shared-heating market: a population of tenants, the billing rules
//! that couple them, and the equilibrium search selected by `method`.

use std::mem;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agent::{Agent, AgentProfile, Archetype, StrategyDistribution};
use crate::billing::{self, SubsidyPolicy};
use crate::config::{MarketConfig, SolverConfig};
use crate::curve::ReductionCurve;
use crate::equilibrium::{
    Game, LriParams, find_equilibrium_by_learning, find_pure_equilibrium_brute_force,
    find_pure_equilibrium_by_best_response,
};
use crate::error::{HeatError, Result};
use crate::snapshot::{AgentSnapshot, MarketSnapshot, PolicyComparison};

// ============================================================================
// Policy & method selectors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum PolicyKind {
    NoSubsidy,
    LearnedCurve,
    FixedTestCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Method {
    Exhaustive,
    BestResponse,
    /// Linear reward-inaction learning.
    Lri,
}

/// Result of one successful `Market::analyse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Equilibrium {
    pub method: Method,
    /// Strategy index per agent (dominant strategy for LRI).
    pub strategies: Vec<usize>,
    /// Chosen temperature per agent.
    pub temperatures: Vec<f64>,
    pub owner_cost: f64,
}

// ============================================================================
// Market
// ============================================================================

#[derive(Debug, Clone)]
pub struct Market {
    agents: Vec<Agent>,
    strategy_count: usize,
    external_temperature: f64,
    policy: SubsidyPolicy,
    method: Method,
    cfg: SolverConfig,
    chosen_temperatures: Option<Vec<f64>>,
}

impl Market {
    /// Build the population from archetype counts. Agents are ordered
    /// ecologists, travellers, polluters, then eccentrics drawn from `rng`.
    pub fn from_config<R: Rng + ?Sized>(
        config: &MarketConfig,
        cfg: SolverConfig,
        rng: &mut R,
    ) -> Result<Self> {
        let strategy_count = usize::try_from(config.strategy_count).map_err(|_| {
            HeatError::invalid(format!(
                "strategy count must be at least 2 (got {})",
                config.strategy_count
            ))
        })?;
        let [ecologists, travellers, polluters, eccentrics] = config.composition.counts()?;
        cfg.validate()?;

        let mut profiles = Vec::with_capacity(ecologists + travellers + polluters + eccentrics);
        for (archetype, count) in [
            (Archetype::Ecologist, ecologists),
            (Archetype::Traveller, travellers),
            (Archetype::Polluter, polluters),
        ] {
            let profile = AgentProfile::archetype(archetype)?;
            profiles.extend(std::iter::repeat_n(profile, count));
        }
        for _ in 0..eccentrics {
            profiles.push(AgentProfile::random(rng, &cfg));
        }

        let policy = match config.policy {
            PolicyKind::NoSubsidy => SubsidyPolicy::NoSubsidy,
            // Replaced by the curve search; subsidises nothing until then.
            PolicyKind::LearnedCurve => {
                SubsidyPolicy::LearnedCurve(ReductionCurve::generate_with(0.0, 0, &cfg))
            }
            PolicyKind::FixedTestCurve => SubsidyPolicy::FixedTestCurve,
        };

        Self::with_profiles(
            profiles,
            strategy_count,
            config.external_temperature,
            policy,
            config.method,
            cfg,
        )
    }

    /// Market over explicit profiles, in the given order.
    pub fn with_profiles(
        profiles: Vec<AgentProfile>,
        strategy_count: usize,
        external_temperature: f64,
        policy: SubsidyPolicy,
        method: Method,
        cfg: SolverConfig,
    ) -> Result<Self> {
        if strategy_count < 2 {
            return Err(HeatError::invalid(format!(
                "strategy count must be at least 2 (got {strategy_count})"
            )));
        }
        if profiles.is_empty() {
            return Err(HeatError::invalid("market needs at least one agent"));
        }
        if !external_temperature.is_finite() {
            return Err(HeatError::invalid("external temperature must be finite"));
        }
        cfg.validate()?;
        if let Some(p) = profiles
            .iter()
            .find(|p| p.ideal_temperature < cfg.min_temperature)
        {
            return Err(HeatError::invalid(format!(
                "ideal temperature {} is below the minimum {}",
                p.ideal_temperature, cfg.min_temperature
            )));
        }

        let agents = profiles
            .into_iter()
            .map(|profile| Agent::new(profile, strategy_count))
            .collect();
        Ok(Self {
            agents,
            strategy_count,
            external_temperature,
            policy,
            method,
            cfg,
            chosen_temperatures: None,
        })
    }

    // === Accessors ===

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn strategy_count(&self) -> usize {
        self.strategy_count
    }

    pub fn external_temperature(&self) -> f64 {
        self.external_temperature
    }

    pub fn config(&self) -> &SolverConfig {
        &self.cfg
    }

    pub fn policy(&self) -> &SubsidyPolicy {
        &self.policy
    }

    /// Swapping the policy invalidates the last analysis.
    pub fn set_policy(&mut self, policy: SubsidyPolicy) {
        self.policy = policy;
        self.chosen_temperatures = None;
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn reduction_curve(&self) -> Option<&ReductionCurve> {
        self.policy.curve()
    }

    /// Temperatures from the most recent successful analysis.
    pub fn chosen_temperatures(&self) -> Option<&[f64]> {
        self.chosen_temperatures.as_deref()
    }

    // === Billing ===

    pub fn individual_consumption(&self, temperature: f64) -> f64 {
        temperature - self.external_temperature
    }

    pub fn strategy_temperature(&self, agent: usize, strategy: usize) -> f64 {
        self.agents[agent]
            .profile
            .strategy_temperature(strategy, self.strategy_count, &self.cfg)
    }

    pub fn temperatures(&self, profile: &[usize]) -> Vec<f64> {
        profile
            .iter()
            .enumerate()
            .map(|(agent, &strategy)| self.strategy_temperature(agent, strategy))
            .collect()
    }

    pub fn total_consumption(&self, temperatures: &[f64]) -> f64 {
        temperatures
            .iter()
            .map(|t| self.individual_consumption(*t))
            .sum()
    }

    /// Bill every tenant pays under the given temperatures.
    pub fn individual_bill(&self, temperatures: &[f64]) -> f64 {
        self.bill_for_total(self.total_consumption(temperatures))
    }

    fn bill_for_total(&self, total_consumption: f64) -> f64 {
        billing::individual_bill(total_consumption / self.agents.len() as f64, &self.cfg)
    }

    pub fn subsidy(&self, temperature: f64) -> f64 {
        self.policy.subsidy(temperature, &self.cfg)
    }

    /// Collective tariff on the summed consumption plus every tenant's
    /// transport-weighted subsidy.
    pub fn owner_cost_for(&self, temperatures: &[f64]) -> f64 {
        let tariff = billing::collective_cost(
            self.total_consumption(temperatures),
            self.agents.len(),
            &self.cfg,
        );
        let subsidies: f64 = self
            .agents
            .iter()
            .zip(temperatures)
            .map(|(agent, t)| agent.profile.weight_transport * self.subsidy(*t))
            .sum();
        tariff + subsidies
    }

    /// Owner cost at the chosen temperatures of the last analysis.
    pub fn owner_cost(&self) -> Result<f64> {
        self.chosen_temperatures
            .as_deref()
            .map(|t| self.owner_cost_for(t))
            .ok_or(HeatError::NotAnalysed)
    }

    fn agent_utility(&self, agent: usize, temperature: f64, bill: f64) -> f64 {
        self.agents[agent]
            .profile
            .utility(temperature, bill, self.subsidy(temperature), &self.cfg)
    }

    // === Analysis ===

    /// Run the configured equilibrium search and record the chosen
    /// temperatures.
    pub fn analyse<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Equilibrium> {
        let (strategies, temperatures) = match self.method {
            Method::Exhaustive => {
                let strategies = find_pure_equilibrium_brute_force(&*self, self.cfg.max_enumeration)?
                    .ok_or(HeatError::NoPureEquilibrium)?;
                self.settle_on(&strategies);
                let temperatures = self.temperatures(&strategies);
                (strategies, temperatures)
            }
            Method::BestResponse => {
                let strategies =
                    find_pure_equilibrium_by_best_response(&*self, self.cfg.best_response_budget)?;
                self.settle_on(&strategies);
                let temperatures = self.temperatures(&strategies);
                (strategies, temperatures)
            }
            Method::Lri => {
                let mut distributions: Vec<StrategyDistribution> = self
                    .agents
                    .iter_mut()
                    .map(|a| mem::take(&mut a.distribution))
                    .collect();
                let outcome = find_equilibrium_by_learning(
                    &*self,
                    &mut distributions,
                    LriParams::from(&self.cfg),
                    rng,
                );
                for (agent, d) in self.agents.iter_mut().zip(distributions) {
                    agent.distribution = d;
                }
                let outcome = outcome?;
                let temperatures: Vec<f64> = self
                    .agents
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        a.distribution
                            .expectation(|s| self.strategy_temperature(i, s))
                    })
                    .collect();
                (outcome.strategies, temperatures)
            }
        };

        let owner_cost = self.owner_cost_for(&temperatures);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "equilibrium",
            method = ?self.method,
            agents = self.agents.len() as u64,
            owner_cost = owner_cost,
        );

        self.chosen_temperatures = Some(temperatures.clone());
        Ok(Equilibrium {
            method: self.method,
            strategies,
            temperatures,
            owner_cost,
        })
    }

    /// Deterministic methods leave every agent one-hot on its strategy.
    fn settle_on(&mut self, strategies: &[usize]) {
        let count = self.strategy_count;
        for (agent, &s) in self.agents.iter_mut().zip(strategies) {
            agent.distribution = StrategyDistribution::one_hot(s, count);
        }
    }

    /// Analyse under the current policy and under no subsidy. The market is
    /// left with the current policy and its analysis.
    pub fn compare_with_no_subsidy<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<PolicyComparison> {
        let policy = self.policy.clone();
        let kind = policy.kind();

        self.set_policy(SubsidyPolicy::NoSubsidy);
        let baseline = self.analyse(rng);
        self.set_policy(policy);
        let baseline = baseline?;

        let current = self.analyse(rng)?;
        Ok(PolicyComparison {
            policy: kind,
            policy_cost: current.owner_cost,
            no_subsidy_cost: baseline.owner_cost,
            saving: baseline.owner_cost - current.owner_cost,
        })
    }

    /// Per-agent consumption report for the last analysis.
    pub fn snapshot(&self) -> Result<MarketSnapshot> {
        let temperatures = self
            .chosen_temperatures
            .as_deref()
            .ok_or(HeatError::NotAnalysed)?;
        let agents = self
            .agents
            .iter()
            .zip(temperatures)
            .map(|(agent, &temperature)| AgentSnapshot {
                archetype: agent.profile.archetype,
                ideal_temperature: agent.profile.ideal_temperature,
                temperature,
                consumption: self.individual_consumption(temperature),
                subsidy: self.subsidy(temperature),
            })
            .collect();

        Ok(MarketSnapshot {
            policy: self.policy.kind(),
            method: self.method,
            external_temperature: self.external_temperature,
            agents,
            total_consumption: self.total_consumption(temperatures),
            individual_bill: self.individual_bill(temperatures),
            owner_cost: self.owner_cost_for(temperatures),
        })
    }
}

impl Game for Market {
    fn player_count(&self) -> usize {
        self.agents.len()
    }

    fn strategy_count(&self) -> usize {
        self.strategy_count
    }

    fn payoffs(&self, profile: &[usize]) -> Vec<f64> {
        let temperatures = self.temperatures(profile);
        let bill = self.individual_bill(&temperatures);
        temperatures
            .iter()
            .enumerate()
            .map(|(agent, t)| self.agent_utility(agent, *t, bill))
            .collect()
    }

    /// Only the deviating agent's consumption changes in the shared bill.
    fn deviation_payoff(&self, player: usize, profile: &[usize], strategy: usize) -> f64 {
        let total = self.total_consumption(&self.temperatures(profile));
        self.payoff_if_switched(player, profile[player], strategy, total)
    }

    /// Shares one summed consumption across every player and strategy.
    fn deviation_table(&self, profile: &[usize]) -> Vec<Vec<f64>> {
        let total = self.total_consumption(&self.temperatures(profile));
        profile
            .iter()
            .enumerate()
            .map(|(player, &current)| {
                (0..self.strategy_count)
                    .map(|strategy| self.payoff_if_switched(player, current, strategy, total))
                    .collect()
            })
            .collect()
    }
}

impl Market {
    fn payoff_if_switched(
        &self,
        player: usize,
        current: usize,
        strategy: usize,
        total_consumption: f64,
    ) -> f64 {
        let from = self.strategy_temperature(player, current);
        let to = self.strategy_temperature(player, strategy);
        let bill = self.bill_for_total(
            total_consumption - self.individual_consumption(from)
                + self.individual_consumption(to),
        );
        self.agent_utility(player, to, bill)
    }
}
