use crate::error::LadderError;
use crate::simulation::Simulation;
use crate::sink::MemorySink;
use crate::types::*;
use log::info;
use serde::{Deserialize, Serialize};

/// Headline numbers of one complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunOutcome {
    pub final_report: Option<SeasonReport>,
    pub summaries: Vec<SeasonSummary>,
    pub rank_distribution: Vec<usize>,
    pub pro_players: usize,
    pub entry_players: usize,
    pub mean_rank: f64,
}

/// One point of a parameter sweep
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub parameter_value: f64,
    pub outcome: RunOutcome,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigComparison {
    pub config_a: RunOutcome,
    pub config_b: RunOutcome,
}

/// Overwrite the named numeric parameter of `config`
pub fn apply_parameter(
    config: &mut LadderConfig,
    parameter: &str,
    value: f64,
) -> Result<(), LadderError> {
    match parameter {
        "skill_win_weight" => config.skill_win_weight = value,
        "learn_factor" => config.learn_factor = value,
        "learn_scale" => config.learn_scale = value,
        "games_per_season" => config.games_per_season = value as u32,
        "seasonal_variance" => config.seasonal_variance = value as u32,
        "skill_offset_scale" => config.skill_offset_scale = value as u32,
        "failed_matchmaking_limit" => config.failed_matchmaking_limit = value as u32,
        "players_per_season" => config.players_per_season = value as usize,
        "seasons" => config.seasons = value as usize,
        _ => return Err(LadderError::UnknownParameter(parameter.to_string())),
    }
    Ok(())
}

/// Play every season of `config` and keep the final state
pub fn run_once(config: LadderConfig, seed: u64) -> Result<RunOutcome, LadderError> {
    let mut sim = Simulation::new(config, seed)?;
    let mut sink = MemorySink::new();
    sim.run(&mut sink)?;

    let rank_distribution = sim.rank_distribution();
    let population: usize = rank_distribution.iter().sum();
    let mean_rank = if population > 0 {
        rank_distribution
            .iter()
            .enumerate()
            .map(|(rank, &count)| (rank * count) as f64)
            .sum::<f64>()
            / population as f64
    } else {
        0.0
    };

    Ok(RunOutcome {
        final_report: sink.reports.pop(),
        summaries: sim.summaries,
        pro_players: rank_distribution[PRO_RANK],
        entry_players: rank_distribution[BOTTOM_RANK],
        rank_distribution,
        mean_rank,
    })
}

/// Run `base` once per value of `parameter`, seeding run `i` with `seed + i`
pub fn run_experiment(
    base: &LadderConfig,
    parameter: &str,
    values: &[f64],
    seed: u64,
) -> Result<Vec<ExperimentResult>, LadderError> {
    let mut results = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let mut config = base.clone();
        apply_parameter(&mut config, parameter, value)?;
        info!("Experiment run {}: {} = {}", i, parameter, value);

        results.push(ExperimentResult {
            parameter_value: value,
            outcome: run_once(config, seed + i as u64)?,
        });
    }

    Ok(results)
}

/// Run two configs under the same seed
pub fn compare_configs(
    config_a: LadderConfig,
    config_b: LadderConfig,
    seed: u64,
) -> Result<ConfigComparison, LadderError> {
    Ok(ConfigComparison {
        config_a: run_once(config_a, seed)?,
        config_b: run_once(config_b, seed)?,
    })
}
