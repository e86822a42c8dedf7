use crate::types::*;

/// Aggregate the final population state of a season into per-rank rows.
///
/// The games-to-progress estimate for rank `r` pools the lifetime games of
/// everyone still in `r` with, for every player ranked above `r`, the games
/// they had played when they first left `r` (minus the promoting game).
pub fn compute_season_report(season: usize, players: &[Player]) -> SeasonReport {
    let mut by_rank: Vec<Vec<&Player>> = vec![Vec::new(); NUM_RANKS];
    for player in players {
        by_rank[player.rank].push(player);
    }

    let rows = (0..NUM_RANKS)
        .map(|rank| rank_row(rank, &by_rank))
        .collect();

    SeasonReport { season, rows }
}

fn rank_row(rank: usize, by_rank: &[Vec<&Player>]) -> RankRow {
    let members = &by_rank[rank];
    let count = members.len();

    let games_played: u64 = members.iter().map(|p| p.games_played as u64).sum();
    let skills: Vec<f64> = members.iter().map(|p| p.current_skill()).collect();

    let (mean_games_played, mean_skill, std_dev_skill) = if count > 0 {
        let mean = skills.iter().sum::<f64>() / count as f64;
        let variance = skills.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;
        (games_played as f64 / count as f64, Some(mean), Some(variance.sqrt()))
    } else {
        (0.0, None, None)
    };

    let mean_games_to_progress = if rank > PRO_RANK {
        let (passed_games, passed_count) = by_rank[..rank]
            .iter()
            .flatten()
            .filter_map(|p| p.progression_at(rank - 1))
            .fold((0.0, 0usize), |(sum, n), entry| {
                (sum + entry.games_played as f64 - 1.0, n + 1)
            });

        let total = count + passed_count;
        (total > 0).then(|| (games_played as f64 + passed_games) / total as f64)
    } else {
        None
    };

    RankRow {
        rank,
        count,
        mean_games_played,
        mean_skill,
        std_dev_skill,
        mean_games_to_progress,
    }
}
