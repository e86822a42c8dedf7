use crate::types::*;
use rand::Rng;

/// Ranks above this one (numerically) are shielded from piece loss
const NEWCOMER_RANK: usize = 25;
/// Ranks at or below this one lose progress on every loss
const HIGH_PRESSURE_RANK: usize = 14;
/// Win streak length that starts awarding double pieces
const STREAK_BONUS_LENGTH: i32 = 3;
/// Double pieces are only awarded below this rank
const STREAK_BONUS_MIN_RANK: usize = 7;

/// Which side the outcome draw favoured
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    FirstWins,
    SecondWins,
    /// The draw landed exactly on the first player's skill
    BothLose,
}

/// Resolves single matches and applies ladder progression rules
#[derive(Clone, Debug)]
pub struct MatchEngine {
    skill_win_weight: f64,
    derank: bool,
}

impl MatchEngine {
    pub fn new(config: &LadderConfig) -> Self {
        Self {
            skill_win_weight: config.skill_win_weight,
            derank: config.derank,
        }
    }

    /// Draw the outcome of a match between skills `a` and `b`.
    ///
    /// The sample is only compared against `a`'s skill; the asymmetry is
    /// part of the model's outcome distribution and is kept as-is.
    pub fn draw_outcome(&self, skill_a: f64, skill_b: f64, rng: &mut impl Rng) -> Outcome {
        let sample = self.skill_win_weight * 0.5
            + (1.0 - self.skill_win_weight) * rng.gen::<f64>() * (skill_a + skill_b);

        if sample < skill_a {
            Outcome::FirstWins
        } else if sample > skill_a {
            Outcome::SecondWins
        } else {
            Outcome::BothLose
        }
    }

    /// Play one match. Both players consume a game and receive exactly one
    /// win or loss.
    pub fn resolve_match(
        &self,
        a: &mut Player,
        b: &mut Player,
        rng: &mut impl Rng,
    ) -> (RankChange, RankChange) {
        let outcome = self.draw_outcome(a.current_skill(), b.current_skill(), rng);

        match outcome {
            Outcome::FirstWins => (self.apply_win(a), self.apply_loss(b)),
            Outcome::SecondWins => (self.apply_loss(a), self.apply_win(b)),
            Outcome::BothLose => (self.apply_loss(a), self.apply_loss(b)),
        }
    }

    pub fn apply_win(&self, player: &mut Player) -> RankChange {
        Self::consume_game(player);

        player.streak = if player.streak < 0 { 1 } else { player.streak + 1 };

        if player.streak >= STREAK_BONUS_LENGTH && player.rank > STREAK_BONUS_MIN_RANK {
            player.pieces += 2;
        } else {
            player.pieces += 1;
        }

        if player.pieces <= MAX_PIECES {
            return RankChange::None;
        }

        if player.rank == PRO_RANK {
            // Nowhere left to climb
            player.pieces = MAX_PIECES;
            return RankChange::None;
        }

        // Promotion carries the excess pieces into the new rank
        player.rank -= 1;
        player.pieces -= MAX_PIECES;
        player.record_rank_reached();
        RankChange::Promoted
    }

    pub fn apply_loss(&self, player: &mut Player) -> RankChange {
        Self::consume_game(player);

        player.streak = if player.streak > 0 { -1 } else { player.streak - 1 };

        if player.rank > NEWCOMER_RANK {
            player.streak = 0;
            return RankChange::None;
        }

        let pressure = player.rank <= HIGH_PRESSURE_RANK || player.streak <= -2;
        if !pressure {
            return RankChange::None;
        }

        player.streak = 0;
        if player.pieces > 0 {
            player.pieces -= 1;
            RankChange::None
        } else if self.derank && player.rank != PRO_RANK {
            player.rank += 1;
            player.pieces = MAX_PIECES;
            RankChange::Demoted
        } else {
            RankChange::None
        }
    }

    fn consume_game(player: &mut Player) {
        player.games_left = player.games_left.saturating_sub(1);
        player.games_played += 1;
        player.failed_matchmaking = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(derank: bool) -> MatchEngine {
        let config = LadderConfig {
            derank,
            ..LadderConfig::default()
        };
        MatchEngine::new(&config)
    }

    fn player_at(rank: usize, skill: f64) -> Player {
        let mut player = Player::new(PlayerId(0), Skill::flat(skill), 100, 0);
        player.rank = rank;
        player.games_left = 100;
        player
    }

    #[test]
    fn test_resolve_match_consumes_one_game_each() {
        let engine = engine(true);
        let mut rng = StdRng::seed_from_u64(42);
        let mut a = player_at(20, 0.6);
        let mut b = player_at(20, 0.4);
        b.id = PlayerId(1);

        let mut a_wins = 0;
        for round in 1..=50u32 {
            engine.resolve_match(&mut a, &mut b, &mut rng);
            assert_eq!(a.games_left, 100 - round);
            assert_eq!(b.games_left, 100 - round);
            assert_eq!(a.games_played, round);
            assert_eq!(b.games_played, round);
            assert!(a.pieces <= MAX_PIECES && b.pieces <= MAX_PIECES);
            // Only a win leaves a positive streak at this rank
            if a.streak > 0 {
                a_wins += 1;
            }
        }
        assert!(a_wins > 0);
    }

    #[test]
    fn test_draw_outcome_follows_skill_ratio() {
        let engine = engine(false);
        let mut rng = StdRng::seed_from_u64(11);

        let trials = 20_000;
        let wins = (0..trials)
            .filter(|_| engine.draw_outcome(0.75, 0.25, &mut rng) == Outcome::FirstWins)
            .count();
        let rate = wins as f64 / trials as f64;
        assert!((rate - 0.75).abs() < 0.02, "win rate {}", rate);
    }

    #[test]
    fn test_full_skill_weight_is_deterministic() {
        let config = LadderConfig {
            skill_win_weight: 1.0,
            ..LadderConfig::default()
        };
        let engine = MatchEngine::new(&config);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            assert_eq!(engine.draw_outcome(0.6, 0.1, &mut rng), Outcome::FirstWins);
            assert_eq!(engine.draw_outcome(0.4, 0.9, &mut rng), Outcome::SecondWins);
            assert_eq!(engine.draw_outcome(0.5, 0.2, &mut rng), Outcome::BothLose);
        }
    }

    #[test]
    fn test_zero_skill_pair_both_lose() {
        let engine = engine(false);
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = player_at(20, 0.0);
        let mut b = player_at(20, 0.0);

        engine.resolve_match(&mut a, &mut b, &mut rng);
        assert_eq!(a.streak, -1);
        assert_eq!(b.streak, -1);
    }

    #[test]
    fn test_win_streak_bonus_pieces() {
        let engine = engine(false);
        let mut player = player_at(20, 0.5);

        engine.apply_win(&mut player);
        engine.apply_win(&mut player);
        assert_eq!(player.pieces, 2);

        // Third straight win is worth two pieces
        engine.apply_win(&mut player);
        assert_eq!(player.streak, 3);
        assert_eq!(player.pieces, 4);
    }

    #[test]
    fn test_no_streak_bonus_in_top_ranks() {
        let engine = engine(false);
        let mut player = player_at(7, 0.5);
        player.streak = 5;

        engine.apply_win(&mut player);
        assert_eq!(player.pieces, 1);
    }

    #[test]
    fn test_win_resets_losing_streak() {
        let engine = engine(false);
        let mut player = player_at(20, 0.5);
        player.streak = -4;

        engine.apply_win(&mut player);
        assert_eq!(player.streak, 1);
    }

    #[test]
    fn test_promotion_carries_excess_pieces() {
        let engine = engine(false);
        let mut player = player_at(20, 0.5);
        player.pieces = 5;
        player.streak = 2;
        player.games_played = 33;

        let change = engine.apply_win(&mut player);

        assert_eq!(change, RankChange::Promoted);
        assert_eq!(player.rank, 19);
        assert_eq!(player.pieces, 2);
        assert_eq!(
            player.rank_progression.last(),
            Some(&RankProgression { rank: 19, games_played: 34 })
        );
    }

    #[test]
    fn test_repromotion_does_not_record_twice() {
        let engine = engine(true);
        let mut player = player_at(20, 0.5);
        player.pieces = 5;
        engine.apply_win(&mut player);
        let entries = player.rank_progression.len();

        // Demote back to 20, then climb to 19 again
        player.pieces = 0;
        player.streak = -1;
        assert_eq!(engine.apply_loss(&mut player), RankChange::Demoted);
        assert_eq!(player.rank, 20);
        player.pieces = 5;
        assert_eq!(engine.apply_win(&mut player), RankChange::Promoted);

        assert_eq!(player.rank_progression.len(), entries);
    }

    #[test]
    fn test_pro_pieces_are_capped() {
        let engine = engine(false);
        let mut player = player_at(PRO_RANK, 0.9);
        player.pieces = 5;

        for _ in 0..5 {
            assert_eq!(engine.apply_win(&mut player), RankChange::None);
            assert_eq!(player.rank, PRO_RANK);
            assert_eq!(player.pieces, MAX_PIECES);
        }
    }

    #[test]
    fn test_newcomer_ranks_never_lose_pieces() {
        let engine = engine(true);
        let mut player = player_at(26, 0.5);
        player.pieces = 3;
        player.streak = 2;

        for _ in 0..10 {
            assert_eq!(engine.apply_loss(&mut player), RankChange::None);
            assert_eq!(player.streak, 0);
            assert_eq!(player.pieces, 3);
        }
    }

    #[test]
    fn test_mid_ranks_need_two_straight_losses() {
        let engine = engine(false);
        let mut player = player_at(20, 0.5);
        player.pieces = 3;
        player.streak = 4;

        engine.apply_loss(&mut player);
        assert_eq!(player.streak, -1);
        assert_eq!(player.pieces, 3);

        engine.apply_loss(&mut player);
        assert_eq!(player.streak, 0);
        assert_eq!(player.pieces, 2);

        // Streak was cleared, so the pressure cycle starts over
        engine.apply_loss(&mut player);
        assert_eq!(player.pieces, 2);
    }

    #[test]
    fn test_high_ranks_lose_pieces_every_loss() {
        let engine = engine(false);
        let mut player = player_at(14, 0.5);
        player.pieces = 2;

        engine.apply_loss(&mut player);
        engine.apply_loss(&mut player);
        assert_eq!(player.pieces, 0);

        // Without derank, an empty rank just absorbs further losses
        assert_eq!(engine.apply_loss(&mut player), RankChange::None);
        assert_eq!(player.rank, 14);
        assert_eq!(player.pieces, 0);
    }

    #[test]
    fn test_derank_demotes_with_full_pieces() {
        let engine = engine(true);
        let mut player = player_at(10, 0.5);

        assert_eq!(engine.apply_loss(&mut player), RankChange::Demoted);
        assert_eq!(player.rank, 11);
        assert_eq!(player.pieces, MAX_PIECES);
    }

    #[test]
    fn test_pro_rank_cannot_be_demoted() {
        let engine = engine(true);
        let mut player = player_at(PRO_RANK, 0.5);

        assert_eq!(engine.apply_loss(&mut player), RankChange::None);
        assert_eq!(player.rank, PRO_RANK);
    }

    #[test]
    fn test_match_resets_failed_matchmaking() {
        let engine = engine(false);
        let mut player = player_at(20, 0.5);
        player.failed_matchmaking = 7;

        engine.apply_loss(&mut player);
        assert_eq!(player.failed_matchmaking, 0);
    }

    #[test]
    fn test_pieces_stay_bounded_over_long_runs() {
        let engine = engine(true);
        let mut rng = StdRng::seed_from_u64(77);

        for seed_rank in [30, 22, 15, 8, 1] {
            let mut a = player_at(seed_rank, 0.55);
            let mut b = player_at(seed_rank, 0.45);
            a.games_left = 5000;
            b.games_left = 5000;
            for _ in 0..5000 {
                engine.resolve_match(&mut a, &mut b, &mut rng);
                for player in [&a, &b] {
                    assert!(player.pieces <= MAX_PIECES);
                    assert!(player.rank <= BOTTOM_RANK);
                }
            }
            for player in [&a, &b] {
                for pair in player.rank_progression.windows(2) {
                    assert!(pair[1].rank < pair[0].rank);
                    assert!(pair[1].games_played >= pair[0].games_played);
                }
            }
        }
    }
}
