use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

mod agent;
mod billing;
mod config;
mod curve;
pub mod equilibrium;
mod error;
mod market;
mod optimizer;
mod snapshot;

pub use agent::*;
pub use billing::*;
pub use config::*;
pub use curve::*;
pub use error::*;
pub use market::*;
pub use optimizer::*;
pub use snapshot::*;

type JsResult<T> = std::result::Result<T, JsError>;

// ============================================================================
// WASM API - HeatingSimulation
// ============================================================================

#[wasm_bindgen]
pub struct HeatingSimulation {
    market: Market,
    rng: StdRng,
    last_search: Option<CurveSearch>,
}

#[wasm_bindgen]
impl HeatingSimulation {
    /// Market from the parameter form, with default solver tunables.
    #[wasm_bindgen(constructor)]
    pub fn new(config: MarketConfig, seed: u64) -> JsResult<HeatingSimulation> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();
        Self::build(&config, SolverConfig::default(), seed).map_err(JsError::from)
    }

    /// Same as `new`, with solver tunables overridden from a plain object.
    #[wasm_bindgen]
    pub fn with_solver_config(
        config: MarketConfig,
        solver: JsValue,
        seed: u64,
    ) -> JsResult<HeatingSimulation> {
        console_error_panic_hook::set_once();
        let solver: SolverConfig = serde_wasm_bindgen::from_value(solver)?;
        Self::build(&config, solver, seed).map_err(JsError::from)
    }

    /// Run the configured equilibrium search.
    #[wasm_bindgen]
    pub fn analyse(&mut self) -> JsResult<Equilibrium> {
        Ok(self.market.analyse(&mut self.rng)?)
    }

    /// Monte-Carlo search for the cheapest reduction curve; leaves the
    /// winning curve installed.
    #[wasm_bindgen]
    pub fn search_curve(&mut self, config: MonteCarloConfig) -> JsResult<CurveSearch> {
        let search = SubsidyCurveOptimizer::new(config).search(&mut self.market, &mut self.rng)?;
        self.last_search = Some(search.clone());
        Ok(search)
    }

    #[wasm_bindgen]
    pub fn compare_with_no_subsidy(&mut self) -> JsResult<PolicyComparison> {
        Ok(self.market.compare_with_no_subsidy(&mut self.rng)?)
    }

    /// Get a snapshot of the last analysis for rendering
    #[wasm_bindgen]
    pub fn snapshot(&self) -> JsResult<MarketSnapshot> {
        Ok(self.market.snapshot()?)
    }

    /// Chosen temperature per agent, empty before the first analysis.
    #[wasm_bindgen]
    pub fn temperatures(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(self.market.chosen_temperatures().unwrap_or_default())
    }

    /// Step values of the installed curve, empty unless the policy is learned.
    #[wasm_bindgen]
    pub fn reduction_curve(&self) -> js_sys::Float64Array {
        let steps = self.market.reduction_curve().map(|c| c.steps()).unwrap_or_default();
        js_sys::Float64Array::from(steps)
    }

    /// Whitespace-separated `(temperature, reduction)` rows of the installed
    /// curve, ready to be saved.
    #[wasm_bindgen]
    pub fn curve_rows(&self) -> String {
        self.market
            .reduction_curve()
            .map(|c| c.rows(self.market.config()).to_string())
            .unwrap_or_default()
    }

    /// Last curve search as JSON, for the report download.
    #[wasm_bindgen]
    pub fn report_json(&self) -> JsResult<String> {
        Ok(serde_json::to_string_pretty(&self.last_search)?)
    }
}

impl HeatingSimulation {
    fn build(config: &MarketConfig, solver: SolverConfig, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let market = Market::from_config(config, solver, &mut rng)?;
        Ok(Self {
            market,
            rng,
            last_search: None,
        })
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn last_search(&self) -> Option<&CurveSearch> {
        self.last_search.as_ref()
    }
}
