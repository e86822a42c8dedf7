//! Ladder season simulator CLI
//!
//! Runs every configured season and writes the per-rank statistics to a CSV
//! file while logging them to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use ladder_season_sim::sink::{CsvSink, LogSink, TeeSink};
use ladder_season_sim::{LadderConfig, Simulation, SkillCurve};
use log::info;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "ladder_sim")]
#[command(
    about = "Simulate ranked ladder seasons and report per-rank statistics",
    long_about = None
)]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// RNG seed; a time-based seed is used (and logged) when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Output CSV path (defaults to a name describing the model variant)
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    seasons: Option<usize>,

    #[arg(long)]
    players_per_season: Option<usize>,

    #[arg(long)]
    games_per_season: Option<u32>,

    #[arg(long)]
    seasonal_variance: Option<u32>,

    /// flat, growth or decay
    #[arg(long, value_parser = parse_curve)]
    skill_curve: Option<SkillCurve>,

    #[arg(long)]
    skill_win_weight: Option<f64>,

    #[arg(long)]
    failed_matchmaking_limit: Option<u32>,

    /// Allow demotion on losses
    #[arg(long)]
    derank: bool,

    /// Keep ranks between seasons
    #[arg(long)]
    no_season_decay: bool,
}

fn parse_curve(value: &str) -> Result<SkillCurve, String> {
    match value {
        "flat" => Ok(SkillCurve::Flat),
        "growth" => Ok(SkillCurve::Growth),
        "decay" => Ok(SkillCurve::Decay),
        other => Err(format!("unknown skill curve '{}'", other)),
    }
}

fn load_config(cli: &Cli) -> Result<LadderConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => LadderConfig::default(),
    };

    if let Some(v) = cli.seasons {
        config.seasons = v;
    }
    if let Some(v) = cli.players_per_season {
        config.players_per_season = v;
    }
    if let Some(v) = cli.games_per_season {
        config.games_per_season = v;
    }
    if let Some(v) = cli.seasonal_variance {
        config.seasonal_variance = v;
    }
    if let Some(v) = cli.skill_curve {
        config.skill_curve = v;
    }
    if let Some(v) = cli.skill_win_weight {
        config.skill_win_weight = v;
    }
    if let Some(v) = cli.failed_matchmaking_limit {
        config.failed_matchmaking_limit = v;
    }
    if cli.derank {
        config.derank = true;
    }
    if cli.no_season_decay {
        config.season_rank_decay = false;
    }

    config.validate()?;
    Ok(config)
}

fn default_output(config: &LadderConfig) -> PathBuf {
    let derank = if config.derank { "Derank" } else { "NoDerank" };
    let learn = match config.skill_curve {
        SkillCurve::Flat => "NoLearn",
        SkillCurve::Growth => "Learn",
        SkillCurve::Decay => "InverseLearn",
    };
    PathBuf::from(format!("{}{}.csv", derank, learn))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let seed = match cli.seed {
        Some(seed) => seed,
        None => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default(),
    };
    info!("Using seed {}", seed);

    let output = cli.output.clone().unwrap_or_else(|| default_output(&config));
    let csv = CsvSink::create(&output)
        .with_context(|| format!("Cannot create file: {}", output.display()))?;
    let mut sink = TeeSink::new(LogSink, csv);

    let mut sim = Simulation::new(config, seed)?;
    sim.run(&mut sink).context("Cannot write season report")?;

    info!("Wrote {}", output.display());
    Ok(())
}
