use crate::error::LadderError;
use crate::types::*;
use log::debug;
use rand::Rng;

/// Ranks lost between seasons when decay is on
const SEASON_DECAY_RANKS: usize = 3;

/// Outcome of preparing the population for a new season
#[derive(Clone, Debug, Default)]
pub struct SeasonBootstrap {
    pub pro_cutoff: f64,
    pub fast_forwarded: usize,
}

/// Arena owning every player ever created. Players are never removed, so a
/// `PlayerId` stays valid for the whole run.
#[derive(Clone, Debug, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
}

impl PlayerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn get_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    /// Borrow two distinct players mutably at once
    pub fn pair_mut(&mut self, a: PlayerId, b: PlayerId) -> (&mut Player, &mut Player) {
        assert_ne!(a, b, "a player cannot be paired with themselves");
        let (ai, bi) = (a.index(), b.index());
        if ai < bi {
            let (left, right) = self.players.split_at_mut(bi);
            (&mut left[ai], &mut right[0])
        } else {
            let (left, right) = self.players.split_at_mut(ai);
            (&mut right[0], &mut left[bi])
        }
    }

    /// Add `count` fresh players at the bottom rank, each with their own skill
    /// curve and seasonal quota parameters
    pub fn spawn_cohort(
        &mut self,
        count: usize,
        config: &LadderConfig,
        rng: &mut impl Rng,
    ) -> Result<Vec<PlayerId>, LadderError> {
        let offset_scale = config.skill_offset_scale as f64;
        let mut spawned = Vec::with_capacity(count);
        self.players.reserve(count);

        for _ in 0..count {
            let id = PlayerId(self.players.len());

            let max: f64 = rng.gen();
            let offset = ((rng.gen::<f64>() - 0.5) * offset_scale) as i64;
            // Rate is pinned to the offset scale so curves stay comparable across players
            let rate = offset_scale * config.learn_factor
                / (1.0 + rng.gen::<f64>() * (config.learn_scale - 1.0));
            let skill = Skill::new(max, offset, rate, config.skill_curve)?;

            let games = (rng.gen::<f64>() * config.games_per_season as f64) as u32;
            let variance = (rng.gen::<f64>() * config.seasonal_variance as f64) as u32;

            let mut player = Player::new(id, skill, games, variance);
            Self::reset_for_season(&mut player, false, config, rng);
            self.players.push(player);
            spawned.push(id);
        }

        Ok(spawned)
    }

    /// Roll a fresh quota for the season and, if asked and enabled, apply
    /// inter-season rank decay
    pub fn reset_for_season(
        player: &mut Player,
        reset_rank: bool,
        config: &LadderConfig,
        rng: &mut impl Rng,
    ) {
        if reset_rank && config.season_rank_decay {
            player.rank = (player.rank + SEASON_DECAY_RANKS).min(BOTTOM_RANK);
        }

        let jitter = ((rng.gen::<f64>() - 0.5) * player.seasonal_variance as f64) as i64;
        player.games_left = (player.games_per_season as i64 + jitter).max(0) as u32;
    }

    /// Skill of the `cutoff_size`-th best pro player, or 0 when the pro tier
    /// is no larger than that
    pub fn compute_pro_cutoff(&self, cutoff_size: usize) -> f64 {
        let mut pro_skills: Vec<f64> = self
            .players
            .iter()
            .filter(|p| p.rank == PRO_RANK)
            .map(|p| p.current_skill())
            .collect();

        if pro_skills.len() <= cutoff_size {
            return 0.0;
        }

        pro_skills.sort_by(|a, b| b.total_cmp(a));
        pro_skills[cutoff_size - 1]
    }

    /// Reset every player for `season`. Pro players above the cutoff keep
    /// their rank and have their quota credited without playing.
    pub fn prepare_season(
        &mut self,
        season: usize,
        config: &LadderConfig,
        rng: &mut impl Rng,
    ) -> SeasonBootstrap {
        let pro_cutoff = self.compute_pro_cutoff(config.pro_cutoff_size);
        debug!("Season {} pro rank skill cutoff: {:.4}", season, pro_cutoff);

        let mut fast_forwarded = 0;
        // Season 0 players already rolled their quota at creation
        if season > 0 {
            for player in &mut self.players {
                if player.rank == PRO_RANK && pro_cutoff < player.current_skill() {
                    Self::reset_for_season(player, false, config, rng);
                    player.fast_forward();
                    fast_forwarded += 1;
                } else {
                    Self::reset_for_season(player, true, config, rng);
                }
            }
        }

        if fast_forwarded > 0 {
            debug!("Season {}: {} pro players fast-forwarded", season, fast_forwarded);
        }

        SeasonBootstrap {
            pro_cutoff,
            fast_forwarded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool_with(count: usize, config: &LadderConfig) -> PlayerPool {
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = PlayerPool::new();
        pool.spawn_cohort(count, config, &mut rng).unwrap();
        pool
    }

    #[test]
    fn test_spawn_cohort_assigns_monotonic_ids() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = PlayerPool::new();

        let first = pool.spawn_cohort(10, &config, &mut rng).unwrap();
        let second = pool.spawn_cohort(5, &config, &mut rng).unwrap();

        assert_eq!(first, (0..10).map(PlayerId).collect::<Vec<_>>());
        assert_eq!(second, (10..15).map(PlayerId).collect::<Vec<_>>());
        assert_eq!(pool.len(), 15);
        for (i, player) in pool.players().iter().enumerate() {
            assert_eq!(player.id, PlayerId(i));
        }
    }

    #[test]
    fn test_spawned_players_respect_parameter_bounds() {
        let config = LadderConfig::default();
        let pool = pool_with(500, &config);
        let half_variance = config.seasonal_variance / 2;

        for player in pool.players() {
            assert_eq!(player.rank, BOTTOM_RANK);
            assert!(player.games_per_season < config.games_per_season);
            assert!(player.seasonal_variance < config.seasonal_variance);
            assert!(player.games_left <= player.games_per_season + half_variance);
            assert!((0.0..1.0).contains(&player.skill.max()));
            assert!(player.skill.offset().abs() <= config.skill_offset_scale as i64 / 2);
            assert!(player.skill.rate() > 0.0);
            assert_eq!(player.skill.curve(), config.skill_curve);
        }
    }

    #[test]
    fn test_spawned_rate_tracks_learn_scale() {
        let mut config = LadderConfig::default();
        config.learn_scale = 2.0;
        config.learn_factor = 1.0;
        let pool = pool_with(200, &config);

        // rate = 100 / (1 + u) with u in [0, 1)
        for player in pool.players() {
            let rate = player.skill.rate();
            assert!(rate > 50.0 && rate <= 100.0, "rate {} out of range", rate);
        }
    }

    #[test]
    fn test_reset_for_season_floors_quota_at_zero() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut player = Player::new(PlayerId(0), Skill::flat(0.5), 0, 300);

        for _ in 0..200 {
            PlayerPool::reset_for_season(&mut player, false, &config, &mut rng);
            assert!(player.games_left <= 150);
        }
    }

    #[test]
    fn test_reset_for_season_rank_decay() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut player = Player::new(PlayerId(0), Skill::flat(0.5), 100, 0);

        for (from, to) in [(0, 3), (10, 13), (27, 30), (28, 30), (29, 30), (30, 30)] {
            player.rank = from;
            PlayerPool::reset_for_season(&mut player, true, &config, &mut rng);
            assert_eq!(player.rank, to, "decay from {}", from);
            assert_eq!(player.games_left, 100);
        }

        player.rank = 10;
        PlayerPool::reset_for_season(&mut player, false, &config, &mut rng);
        assert_eq!(player.rank, 10);
    }

    #[test]
    fn test_reset_without_decay_toggle_keeps_rank() {
        let mut config = LadderConfig::default();
        config.season_rank_decay = false;
        let mut rng = StdRng::seed_from_u64(3);
        let mut player = Player::new(PlayerId(0), Skill::flat(0.5), 100, 0);
        player.rank = 12;
        player.failed_matchmaking = 11;

        PlayerPool::reset_for_season(&mut player, true, &config, &mut rng);
        assert_eq!(player.rank, 12);
        // Only a played match clears the counter
        assert_eq!(player.failed_matchmaking, 11);
    }

    #[test]
    fn test_ragequit_counter_carries_into_next_season() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut pool = pool_with(3, &config);
        {
            let player = pool.get_mut(PlayerId(0));
            player.rank = 12;
            player.failed_matchmaking = config.failed_matchmaking_limit + 1;
            player.games_left = 0;
            player.games_per_season = 80;
            player.seasonal_variance = 0;
        }

        pool.prepare_season(1, &config, &mut rng);

        let player = pool.get(PlayerId(0));
        assert_eq!(player.games_left, 80);
        assert_eq!(player.rank, 15);
        assert_eq!(player.failed_matchmaking, config.failed_matchmaking_limit + 1);
    }

    #[test]
    fn test_pro_cutoff_takes_nth_best_skill() {
        let config = LadderConfig::default();
        let mut pool = pool_with(600, &config);
        for (i, id) in pool.ids().collect::<Vec<_>>().into_iter().enumerate() {
            let player = pool.get_mut(id);
            player.rank = PRO_RANK;
            player.skill = Skill::flat(i as f64 / 1000.0);
        }

        // Skills are 0.000..0.599; the 500th best is 0.100
        let cutoff = pool.compute_pro_cutoff(500);
        assert!((cutoff - 0.100).abs() < 1e-12);
    }

    #[test]
    fn test_pro_cutoff_zero_for_small_pro_tier() {
        let config = LadderConfig::default();
        let mut pool = pool_with(50, &config);
        for id in pool.ids().collect::<Vec<_>>() {
            pool.get_mut(id).rank = PRO_RANK;
        }
        assert_eq!(pool.compute_pro_cutoff(500), 0.0);
        assert_eq!(pool.compute_pro_cutoff(50), 0.0);
        assert!(pool.compute_pro_cutoff(49) > 0.0);
    }

    #[test]
    fn test_prepare_season_fast_forwards_pros_above_cutoff() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = pool_with(20, &config);

        let pro = PlayerId(0);
        {
            let player = pool.get_mut(pro);
            player.rank = PRO_RANK;
            player.skill = Skill::flat(0.9);
            player.games_per_season = 100;
            player.seasonal_variance = 0;
            player.games_played = 40;
        }
        pool.get_mut(PlayerId(1)).rank = 10;

        let bootstrap = pool.prepare_season(1, &config, &mut rng);

        assert_eq!(bootstrap.pro_cutoff, 0.0);
        assert_eq!(bootstrap.fast_forwarded, 1);
        let player = pool.get(pro);
        assert_eq!(player.rank, PRO_RANK);
        assert_eq!(player.games_left, 0);
        assert_eq!(player.games_played, 140);
        assert_eq!(pool.get(PlayerId(1)).rank, 13);
    }

    #[test]
    fn test_prepare_first_season_keeps_creation_quota() {
        let config = LadderConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = pool_with(30, &config);
        let before: Vec<u32> = pool.players().iter().map(|p| p.games_left).collect();

        pool.prepare_season(0, &config, &mut rng);

        let after: Vec<u32> = pool.players().iter().map(|p| p.games_left).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_pair_mut_returns_requested_order() {
        let config = LadderConfig::default();
        let mut pool = pool_with(5, &config);

        let (a, b) = pool.pair_mut(PlayerId(3), PlayerId(1));
        assert_eq!(a.id, PlayerId(3));
        assert_eq!(b.id, PlayerId(1));

        let (a, b) = pool.pair_mut(PlayerId(0), PlayerId(4));
        assert_eq!(a.id, PlayerId(0));
        assert_eq!(b.id, PlayerId(4));
    }
}
