use crate::error::LadderError;
use crate::matchmaker::MatchmakingIndex;
use crate::outcome::MatchEngine;
use crate::population::PlayerPool;
use crate::sink::ReportSink;
use crate::stats::compute_season_report;
use crate::types::*;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A season that has been bootstrapped but not yet fully drained
#[derive(Debug)]
pub struct SeasonInProgress {
    pub index: MatchmakingIndex,
    pub summary: SeasonSummary,
}

impl SeasonInProgress {
    /// The loop stops once nobody is left to pair with
    pub fn is_drained(&self) -> bool {
        self.index.active_len() <= 1
    }
}

/// Main simulation state and controller
pub struct Simulation {
    /// Simulation parameters, fixed for the run
    pub config: LadderConfig,
    /// Every player ever created
    pub pool: PlayerPool,
    /// Next season to play
    pub current_season: usize,
    /// Bookkeeping for every completed season
    pub summaries: Vec<SeasonSummary>,
    engine: MatchEngine,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: LadderConfig, seed: u64) -> Result<Self, LadderError> {
        config.validate()?;
        Ok(Self {
            engine: MatchEngine::new(&config),
            config,
            pool: PlayerPool::new(),
            current_season: 0,
            summaries: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Run every configured season, reporting each one to `sink`
    pub fn run(&mut self, sink: &mut impl ReportSink) -> Result<(), LadderError> {
        info!(
            "Playing {} season(s), adding {} players each season with an average {} games played per season.",
            self.config.seasons,
            self.config.players_per_season,
            self.config.games_per_season / 2
        );

        for _ in 0..self.config.seasons {
            self.run_season(sink)?;
        }
        Ok(())
    }

    /// Grow the population, reset it, play until drained, then report
    pub fn run_season(&mut self, sink: &mut impl ReportSink) -> Result<SeasonSummary, LadderError> {
        let mut season = self.begin_season()?;
        while self.step(&mut season) {}
        self.finish_season(season, sink)
    }

    /// Add the new cohort, reset quotas and ranks, and index everyone with
    /// games to play
    pub fn begin_season(&mut self) -> Result<SeasonInProgress, LadderError> {
        let season = self.current_season;
        self.pool
            .spawn_cohort(self.config.players_per_season, &self.config, &mut self.rng)?;
        let bootstrap = self.pool.prepare_season(season, &self.config, &mut self.rng);

        let index = MatchmakingIndex::build(self.pool.players());
        let sitting_out = self.pool.len() - index.active_len();
        debug!("{} players are sitting out season {}.", sitting_out, season);

        Ok(SeasonInProgress {
            summary: SeasonSummary {
                season,
                population: self.pool.len(),
                sitting_out,
                fast_forwarded: bootstrap.fast_forwarded,
                pro_cutoff: bootstrap.pro_cutoff,
                ..SeasonSummary::default()
            },
            index,
        })
    }

    /// Play one matchmaking attempt. Returns `false` once the season is
    /// drained and there is nothing left to do.
    pub fn step(&mut self, season: &mut SeasonInProgress) -> bool {
        if season.is_drained() {
            return false;
        }
        let seeker = match season.index.random_active(&mut self.rng) {
            Some(id) => id,
            None => return false,
        };

        match season.index.find_opponent(seeker, &mut self.rng) {
            Some(opponent) => {
                let (a, b) = self.pool.pair_mut(seeker, opponent);
                let (a_change, b_change) = self.engine.resolve_match(a, b, &mut self.rng);
                season.summary.matches_played += 1;

                self.settle(season, seeker, a_change);
                self.settle(season, opponent, b_change);
            }
            None => {
                let player = self.pool.get_mut(seeker);
                player.failed_matchmaking += 1;
                if player.failed_matchmaking > self.config.failed_matchmaking_limit {
                    debug!(
                        "Player {} failed matchmaking, rank {}",
                        seeker.index(),
                        player.rank
                    );
                    player.games_left = 0;
                    season.index.remove(seeker);
                    season.summary.ragequits += 1;
                }
            }
        }

        #[cfg(feature = "debug")]
        self.audit(season);

        !season.is_drained()
    }

    /// Compute and emit the season's report
    pub fn finish_season(
        &mut self,
        season: SeasonInProgress,
        sink: &mut impl ReportSink,
    ) -> Result<SeasonSummary, LadderError> {
        let summary = season.summary;
        let report = compute_season_report(summary.season, self.pool.players());
        sink.write_season_report(&report)?;

        info!(
            "Season {} complete: {} players, {} matches, {} promotions, {} demotions, {} ragequits",
            summary.season,
            summary.population,
            summary.matches_played,
            summary.promotions,
            summary.demotions,
            summary.ragequits
        );

        self.summaries.push(summary.clone());
        self.current_season += 1;
        Ok(summary)
    }

    /// Player counts per rank, 0 through 30
    pub fn rank_distribution(&self) -> Vec<usize> {
        let mut counts = vec![0; NUM_RANKS];
        for player in self.pool.players() {
            counts[player.rank] += 1;
        }
        counts
    }

    #[cfg(feature = "debug")]
    fn audit(&self, season: &SeasonInProgress) {
        if let Err(e) = season.index.check_consistency(self.pool.players()) {
            panic!("matchmaking index out of sync: {}", e);
        }
    }

    /// Keep the index in step with a player after a match
    fn settle(&mut self, season: &mut SeasonInProgress, id: PlayerId, change: RankChange) {
        match change {
            RankChange::Promoted => season.summary.promotions += 1,
            RankChange::Demoted => season.summary.demotions += 1,
            RankChange::None => {}
        }

        let player = self.pool.get_mut(id);
        if !player.is_active() {
            season.index.remove(id);
            return;
        }

        match change {
            RankChange::None => {}
            RankChange::Promoted if player.rank == PRO_RANK => {
                // Pro players don't progress any further this season
                player.fast_forward();
                season.index.remove(id);
            }
            RankChange::Promoted | RankChange::Demoted => season.index.reinsert(id, player.rank),
        }
    }
}
