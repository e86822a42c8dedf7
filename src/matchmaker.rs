use crate::types::*;
use rand::Rng;

/// Where an indexed player currently sits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    rank: usize,
    bucket_pos: usize,
    active_pos: usize,
}

/// Rank-partitioned pool of players who still have games left this season.
///
/// Every indexed player lives in exactly one bucket and in the active list.
/// A side table keyed by `PlayerId` remembers both positions, so removal is a
/// swap-with-last on each list without searching. Bucket order carries no
/// meaning.
#[derive(Clone, Debug)]
pub struct MatchmakingIndex {
    buckets: Vec<Vec<PlayerId>>,
    active: Vec<PlayerId>,
    slots: Vec<Option<Slot>>,
}

impl Default for MatchmakingIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchmakingIndex {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); NUM_RANKS],
            active: Vec::new(),
            slots: Vec::new(),
        }
    }

    /// Index every player with quota left, in arena order
    pub fn build(players: &[Player]) -> Self {
        let mut index = Self::new();
        index.slots.resize(players.len(), None);
        for player in players.iter().filter(|p| p.is_active()) {
            index.insert(player.id, player.rank);
        }
        index
    }

    /// Add a player to `rank`'s bucket and to the active list
    pub fn insert(&mut self, id: PlayerId, rank: usize) {
        assert!(rank < NUM_RANKS, "rank {} out of range", rank);
        if id.index() >= self.slots.len() {
            self.slots.resize(id.index() + 1, None);
        }
        assert!(self.slots[id.index()].is_none(), "{:?} is already indexed", id);

        let bucket = &mut self.buckets[rank];
        bucket.push(id);
        self.active.push(id);
        self.slots[id.index()] = Some(Slot {
            rank,
            bucket_pos: bucket.len() - 1,
            active_pos: self.active.len() - 1,
        });
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.slot(id).is_some()
    }

    /// Bucket the player is filed under, if indexed
    pub fn rank_of(&self, id: PlayerId) -> Option<usize> {
        self.slot(id).map(|slot| slot.rank)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn active(&self) -> &[PlayerId] {
        &self.active
    }

    pub fn bucket(&self, rank: usize) -> &[PlayerId] {
        &self.buckets[rank]
    }

    /// Uniformly pick a player who still has games left
    pub fn random_active(&self, rng: &mut impl Rng) -> Option<PlayerId> {
        if self.active.is_empty() {
            return None;
        }
        Some(self.active[rng.gen_range(0..self.active.len())])
    }

    /// Find an opponent for `seeker`.
    ///
    /// Same-rank players are preferred. Only when the seeker is alone in its
    /// rank does the search widen, and then by exactly one tier in each
    /// direction (lower-numbered bucket first, then higher-numbered). Returns
    /// `None` when even the widened pool is empty or the seeker isn't indexed.
    pub fn find_opponent(&self, seeker: PlayerId, rng: &mut impl Rng) -> Option<PlayerId> {
        let slot = self.slot(seeker)?;
        let rank = slot.rank;

        let same = &self.buckets[rank];
        if same.len() > 1 {
            // Draw from every position but the seeker's
            let mut pick = rng.gen_range(0..same.len() - 1);
            if pick >= slot.bucket_pos {
                pick += 1;
            }
            return Some(same[pick]);
        }

        let above: &[PlayerId] = if rank > PRO_RANK { &self.buckets[rank - 1] } else { &[] };
        let below: &[PlayerId] = if rank < BOTTOM_RANK { &self.buckets[rank + 1] } else { &[] };
        let total = above.len() + below.len();
        if total == 0 {
            return None;
        }

        let pick = rng.gen_range(0..total);
        if pick < above.len() {
            Some(above[pick])
        } else {
            Some(below[pick - above.len()])
        }
    }

    /// Drop a player from its bucket and the active list. Returns the rank it
    /// was filed under, or `None` if it wasn't indexed.
    pub fn remove(&mut self, id: PlayerId) -> Option<usize> {
        let slot = self.slots.get_mut(id.index())?.take()?;
        self.detach_from_bucket(slot);

        self.active.swap_remove(slot.active_pos);
        if let Some(&moved) = self.active.get(slot.active_pos) {
            if let Some(moved_slot) = self.slots[moved.index()].as_mut() {
                moved_slot.active_pos = slot.active_pos;
            }
        }

        Some(slot.rank)
    }

    /// Move an indexed player to `new_rank`'s bucket. Active-list membership
    /// is untouched; only running out of games removes a player from it.
    pub fn reinsert(&mut self, id: PlayerId, new_rank: usize) {
        assert!(new_rank < NUM_RANKS, "rank {} out of range", new_rank);
        let slot = match self.slot(id) {
            Some(slot) => slot,
            None => panic!("{:?} must be indexed before it can change rank", id),
        };
        if slot.rank == new_rank {
            return;
        }

        self.detach_from_bucket(slot);
        let bucket = &mut self.buckets[new_rank];
        bucket.push(id);
        self.slots[id.index()] = Some(Slot {
            rank: new_rank,
            bucket_pos: bucket.len() - 1,
            active_pos: slot.active_pos,
        });
    }

    /// Full membership audit against the player arena: a player is indexed
    /// iff it has games left, and then under its current rank. Linear in the
    /// population, meant for tests and the `debug` feature.
    pub fn check_consistency(&self, players: &[Player]) -> Result<(), String> {
        let mut indexed = 0;
        for player in players {
            match (self.slot(player.id), player.is_active()) {
                (Some(slot), true) => {
                    if slot.rank != player.rank {
                        return Err(format!(
                            "{:?} filed under rank {} but has rank {}",
                            player.id, slot.rank, player.rank
                        ));
                    }
                    if self.buckets[slot.rank].get(slot.bucket_pos) != Some(&player.id) {
                        return Err(format!("{:?} bucket position is stale", player.id));
                    }
                    if self.active.get(slot.active_pos) != Some(&player.id) {
                        return Err(format!("{:?} active position is stale", player.id));
                    }
                    indexed += 1;
                }
                (None, false) => {}
                (Some(_), false) => {
                    return Err(format!("{:?} is indexed with no games left", player.id));
                }
                (None, true) => {
                    return Err(format!("{:?} has games left but is not indexed", player.id));
                }
            }
        }

        let bucketed: usize = self.buckets.iter().map(Vec::len).sum();
        if bucketed != indexed || self.active.len() != indexed {
            return Err(format!(
                "index holds {} bucketed and {} active entries for {} active players",
                bucketed,
                self.active.len(),
                indexed
            ));
        }
        Ok(())
    }

    fn slot(&self, id: PlayerId) -> Option<Slot> {
        self.slots.get(id.index()).copied().flatten()
    }

    fn detach_from_bucket(&mut self, slot: Slot) {
        let bucket = &mut self.buckets[slot.rank];
        bucket.swap_remove(slot.bucket_pos);
        if let Some(&moved) = bucket.get(slot.bucket_pos) {
            if let Some(moved_slot) = self.slots[moved.index()].as_mut() {
                moved_slot.bucket_pos = slot.bucket_pos;
            }
        }
    }
}
