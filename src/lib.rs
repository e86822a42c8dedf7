pub mod error;
pub mod experiment;
pub mod matchmaker;
pub mod outcome;
pub mod population;
pub mod simulation;
pub mod sink;
pub mod stats;
pub mod types;

pub use error::LadderError;
pub use simulation::Simulation;
pub use types::*;

use sink::{ConsoleSink, MemorySink, TeeSink};
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: LadderError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// WASM-exposed ladder simulation wrapper
#[wasm_bindgen]
pub struct LadderEngine {
    sim: Simulation,
    reports: MemorySink,
    console_output: bool,
}

#[wasm_bindgen]
impl LadderEngine {
    /// Create a new simulation with default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<LadderEngine, JsValue> {
        Self::from_config(LadderConfig::default(), seed)
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<LadderEngine, JsValue> {
        let config = LadderConfig::from_json(config_json).map_err(to_js)?;
        Self::from_config(config, seed)
    }

    /// Create with a seed drawn from the browser's RNG
    pub fn new_unseeded(config_json: &str) -> Result<LadderEngine, JsValue> {
        let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
        Self::new_with_config(seed, config_json)
    }

    /// Mirror every season report to the browser console
    pub fn set_console_output(&mut self, enabled: bool) {
        self.console_output = enabled;
    }

    /// Play the next season and return its report as JSON
    pub fn run_season(&mut self) -> Result<String, JsValue> {
        let result = if self.console_output {
            let mut sink = TeeSink::new(&mut self.reports, ConsoleSink);
            self.sim.run_season(&mut sink)
        } else {
            self.sim.run_season(&mut self.reports)
        };
        result.map_err(to_js)?;

        let report = self.reports.last();
        serde_json::to_string(&report).map_err(|e| to_js(e.into()))
    }

    /// Play all remaining configured seasons
    pub fn run(&mut self) -> Result<(), JsValue> {
        while self.sim.current_season < self.sim.config.seasons {
            self.run_season()?;
        }
        Ok(())
    }

    /// Index of the next season to play
    pub fn get_current_season(&self) -> usize {
        self.sim.current_season
    }

    /// Get total players
    pub fn get_total_players(&self) -> usize {
        self.sim.pool.len()
    }

    /// Player counts per rank as JSON
    pub fn get_rank_distribution(&self) -> String {
        serde_json::to_string(&self.sim.rank_distribution()).unwrap_or_default()
    }

    /// Every season report so far as JSON
    pub fn get_reports(&self) -> String {
        serde_json::to_string(&self.reports.reports).unwrap_or_default()
    }

    /// Per-season bookkeeping as JSON
    pub fn get_summaries(&self) -> String {
        serde_json::to_string(&self.sim.summaries).unwrap_or_default()
    }

    /// Get a single player as JSON
    pub fn get_player(&self, id: usize) -> String {
        self.sim
            .pool
            .players()
            .get(id)
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_default()
    }

    /// Get the active config as JSON
    pub fn get_config(&self) -> String {
        serde_json::to_string(&self.sim.config).unwrap_or_default()
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&LadderConfig::default()).unwrap_or_default()
    }
}

impl LadderEngine {
    fn from_config(config: LadderConfig, seed: u64) -> Result<LadderEngine, JsValue> {
        let sim = Simulation::new(config, seed).map_err(to_js)?;
        Ok(LadderEngine {
            sim,
            reports: MemorySink::new(),
            console_output: false,
        })
    }
}

/// Run a parameter sweep experiment
#[wasm_bindgen]
pub fn run_experiment(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    seed: u64,
) -> Result<String, JsValue> {
    let base_config = LadderConfig::from_json(base_config_json).map_err(to_js)?;
    let values: Vec<f64> = serde_json::from_str(values_json)
        .map_err(|e| JsValue::from_str(&format!("Values parse error: {}", e)))?;

    let results =
        experiment::run_experiment(&base_config, parameter, &values, seed).map_err(to_js)?;

    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Compare two configs
#[wasm_bindgen]
pub fn compare_configs(
    config_a_json: &str,
    config_b_json: &str,
    seed: u64,
) -> Result<String, JsValue> {
    let config_a = LadderConfig::from_json(config_a_json)
        .map_err(|e| JsValue::from_str(&format!("Config A: {}", e)))?;
    let config_b = LadderConfig::from_json(config_b_json)
        .map_err(|e| JsValue::from_str(&format!("Config B: {}", e)))?;

    let comparison = experiment::compare_configs(config_a, config_b, seed).map_err(to_js)?;

    serde_json::to_string(&comparison)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
