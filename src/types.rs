use crate::error::LadderError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Top ("pro") tier.
pub const PRO_RANK: usize = 0;
/// Entry tier every new player starts in.
pub const BOTTOM_RANK: usize = 30;
/// Number of distinct ranks, 0..=30.
pub const NUM_RANKS: usize = BOTTOM_RANK + 1;
/// Sub-rank progress needed before a promotion can trigger.
pub const MAX_PIECES: u32 = 5;

/// Stable handle into the player arena. Assigned monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shape of a player's skill over their lifetime games
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCurve {
    /// Skill never changes
    #[default]
    Flat,
    /// Players improve with games played, saturating toward their ceiling
    Growth,
    /// Players lose skill with every game (not a real-world model)
    Decay,
}

/// Per-player skill-evaluation parameters.
///
/// Construction is the only place a rate is checked; once built, evaluation
/// is a pure function of games played.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SkillParams")]
pub struct Skill {
    max: f64,
    offset: i64,
    rate: f64,
    curve: SkillCurve,
}

/// Unchecked wire form of `Skill`
#[derive(Deserialize)]
struct SkillParams {
    max: f64,
    offset: i64,
    rate: f64,
    curve: SkillCurve,
}

impl TryFrom<SkillParams> for Skill {
    type Error = LadderError;

    fn try_from(params: SkillParams) -> Result<Self, Self::Error> {
        Skill::new(params.max, params.offset, params.rate, params.curve)
    }
}

impl Skill {
    pub fn new(max: f64, offset: i64, rate: f64, curve: SkillCurve) -> Result<Self, LadderError> {
        if !(rate > 0.0) || !rate.is_finite() {
            return Err(LadderError::NonPositiveRate(rate));
        }
        Ok(Self { max, offset, rate, curve })
    }

    /// Skill that ignores games played entirely
    pub fn flat(max: f64) -> Self {
        Self { max, offset: 0, rate: 1.0, curve: SkillCurve::Flat }
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn curve(&self) -> SkillCurve {
        self.curve
    }

    /// Current skill after `games_played` lifetime games
    pub fn evaluate(&self, games_played: u32) -> f64 {
        let arc = || ((games_played as f64 + self.offset as f64) / self.rate).atan() / PI;
        match self.curve {
            SkillCurve::Flat => self.max,
            SkillCurve::Growth => self.max * (0.5 + arc()),
            SkillCurve::Decay => self.max * (0.5 - arc()),
        }
    }
}

/// Snapshot taken the first time a player reaches a new best rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankProgression {
    pub rank: usize,
    pub games_played: u32,
}

/// Match outcome as seen from one participant's rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankChange {
    None,
    Promoted,
    Demoted,
}

/// A ladder participant
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// 0 (pro) through 30 (entry)
    pub rank: usize,
    /// Positive for a win streak, negative for a loss streak
    pub streak: i32,
    /// Sub-rank progress, 0..=5 after every resolved match
    pub pieces: u32,
    /// Remaining quota for the current season
    pub games_left: u32,
    /// Lifetime games
    pub games_played: u32,
    /// Average seasonal quota drawn at creation
    pub games_per_season: u32,
    /// Width of the per-season quota jitter drawn at creation
    pub seasonal_variance: u32,
    /// Consecutive matchmaking failures
    pub failed_matchmaking: u32,
    /// Best ranks reached, in order. Starts with (30, 0).
    pub rank_progression: Vec<RankProgression>,
    pub skill: Skill,
}

impl Player {
    pub fn new(id: PlayerId, skill: Skill, games_per_season: u32, seasonal_variance: u32) -> Self {
        Self {
            id,
            rank: BOTTOM_RANK,
            streak: 0,
            pieces: 0,
            games_left: 0,
            games_played: 0,
            games_per_season,
            seasonal_variance,
            failed_matchmaking: 0,
            rank_progression: vec![RankProgression {
                rank: BOTTOM_RANK,
                games_played: 0,
            }],
            skill,
        }
    }

    pub fn current_skill(&self) -> f64 {
        self.skill.evaluate(self.games_played)
    }

    pub fn is_active(&self) -> bool {
        self.games_left > 0
    }

    /// Best (lowest-numbered) rank ever reached
    pub fn best_rank(&self) -> usize {
        self.rank_progression
            .last()
            .map(|entry| entry.rank)
            .unwrap_or(BOTTOM_RANK)
    }

    /// Append a progression entry if the current rank is a new best
    pub fn record_rank_reached(&mut self) {
        if self.rank < self.best_rank() {
            self.rank_progression.push(RankProgression {
                rank: self.rank,
                games_played: self.games_played,
            });
        }
    }

    /// Progression snapshot recorded when `rank` was first reached
    pub fn progression_at(&self, rank: usize) -> Option<&RankProgression> {
        self.rank_progression.iter().find(|entry| entry.rank == rank)
    }

    /// Credit the rest of the season's quota without simulating matches
    pub fn fast_forward(&mut self) {
        self.games_played += self.games_left;
        self.games_left = 0;
    }
}

/// Ladder simulation parameters, fixed for the whole run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// New players joining every season
    pub players_per_season: usize,
    /// Seasons to simulate
    pub seasons: usize,
    /// Upper bound of a player's average quota draw
    pub games_per_season: u32,
    /// Upper bound of a player's quota jitter; jitter spans [-v/2, v/2]
    pub seasonal_variance: u32,

    /// Skill curve shared by every player
    pub skill_curve: SkillCurve,
    /// Scales every player's curve rate
    pub learn_factor: f64,
    /// Spread of curve rates between players
    pub learn_scale: f64,
    /// Games over which the average player learns most of the game
    pub skill_offset_scale: u32,

    /// 0 = win chance a/(a+b); 1 = outcomes no longer depend on skill draws
    pub skill_win_weight: f64,
    /// NoMatch outcomes tolerated before a player ragequits the season
    pub failed_matchmaking_limit: u32,
    /// Allow demotion on losses within a season
    pub derank: bool,
    /// Drop players three ranks between seasons
    pub season_rank_decay: bool,
    /// Pro players protected from decay by the skill cutoff
    pub pro_cutoff_size: usize,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            players_per_season: 1000,
            seasons: 12,
            games_per_season: 360,
            seasonal_variance: 360,
            skill_curve: SkillCurve::Flat,
            learn_factor: 1.0,
            learn_scale: 2.0,
            skill_offset_scale: 100,
            skill_win_weight: 0.0,
            failed_matchmaking_limit: 10,
            derank: false,
            season_rank_decay: true,
            pro_cutoff_size: 500,
        }
    }
}

impl LadderConfig {
    /// Reject parameter sets that would produce a degenerate skill curve or outcome draw
    pub fn validate(&self) -> Result<(), LadderError> {
        if self.skill_offset_scale == 0 {
            return Err(LadderError::InvalidConfig(
                "skill_offset_scale must be positive".to_string(),
            ));
        }
        if !(self.learn_factor > 0.0) {
            return Err(LadderError::InvalidConfig(format!(
                "learn_factor must be positive, got {}",
                self.learn_factor
            )));
        }
        if !(self.learn_scale > 0.0) {
            return Err(LadderError::InvalidConfig(format!(
                "learn_scale must be positive, got {}",
                self.learn_scale
            )));
        }
        if !(0.0..=1.0).contains(&self.skill_win_weight) {
            return Err(LadderError::InvalidConfig(format!(
                "skill_win_weight must be within [0, 1], got {}",
                self.skill_win_weight
            )));
        }
        if self.pro_cutoff_size == 0 {
            return Err(LadderError::InvalidConfig(
                "pro_cutoff_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON config, falling back to defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, LadderError> {
        let config: LadderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// One row of the end-of-season report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankRow {
    pub rank: usize,
    pub count: usize,
    pub mean_games_played: f64,
    /// Absent when the rank is empty
    pub mean_skill: Option<f64>,
    /// Population standard deviation; absent when the rank is empty
    pub std_dev_skill: Option<f64>,
    /// Estimated games needed to get past this rank; never set for rank 0
    pub mean_games_to_progress: Option<f64>,
}

/// Per-rank statistics for a fully drained season
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonReport {
    pub season: usize,
    pub rows: Vec<RankRow>,
}

impl SeasonReport {
    pub fn total_players(&self) -> usize {
        self.rows.iter().map(|row| row.count).sum()
    }

    pub fn row(&self, rank: usize) -> Option<&RankRow> {
        self.rows.iter().find(|row| row.rank == rank)
    }
}

/// Bookkeeping for a single season loop
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season: usize,
    pub population: usize,
    pub sitting_out: usize,
    pub fast_forwarded: usize,
    pub ragequits: usize,
    pub matches_played: usize,
    pub promotions: usize,
    pub demotions: usize,
    pub pro_cutoff: f64,
}
