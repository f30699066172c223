// Ranked draft board: per-position lists, full-pool views, and the purge list.
//
// The board stores player ids only; ordering keys are looked up in the
// `PlayerPool` under the current `BoardSettings`. Every list is sorted with a
// stable sort, so players with equal (or missing) keys keep insertion order.

use std::collections::BTreeMap;

use tracing::debug;

use super::metrics::{get_player_metrics, BoardSettings, SortMetric};
use super::player::{Player, PlayerId, PlayerPool, Position, RANKABLE_POSITIONS};

/// The board state consumed by ranked views and the pick predictor.
///
/// A player id is in at most one of {its position list, purge list}, and is
/// in the two full-pool views exactly when it is available (neither purged
/// nor drafted).
#[derive(Debug, Clone)]
pub struct PlayerRanks {
    by_position: BTreeMap<Position, Vec<PlayerId>>,
    purged: Vec<PlayerId>,
    by_overall: Vec<PlayerId>,
    by_adp: Vec<PlayerId>,
    /// Order applied to the position lists.
    active_metric: SortMetric,
    /// Bumped on every mutation.
    version: u64,
}

impl Default for PlayerRanks {
    fn default() -> Self {
        PlayerRanks {
            by_position: RANKABLE_POSITIONS.iter().map(|&p| (p, Vec::new())).collect(),
            purged: Vec::new(),
            by_overall: Vec::new(),
            by_adp: Vec::new(),
            active_metric: SortMetric::PosRank,
            version: 0,
        }
    }
}

/// Stable-sort `ids` ascending by `metric`. Ids missing from the pool sort last.
fn sort_ids(ids: &mut [PlayerId], pool: &PlayerPool, settings: &BoardSettings, metric: SortMetric) {
    let key = |id: &PlayerId| -> f64 {
        pool.get(*id)
            .map(|p| get_player_metrics(p, settings).sort_value(metric))
            .unwrap_or(f64::INFINITY)
    };
    ids.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

fn remove_id(list: &mut Vec<PlayerId>, id: PlayerId) -> bool {
    let before = list.len();
    list.retain(|&x| x != id);
    list.len() != before
}

impl PlayerRanks {
    /// Build a board from every player in `pool`.
    pub fn create(pool: &PlayerPool, settings: &BoardSettings) -> Self {
        let mut ranks = PlayerRanks::default();
        for player in pool.iter() {
            ranks.insert_unsorted(player);
        }
        ranks.sort_all(pool, settings);
        ranks.version = 1;
        debug!(
            "Built board: {} players, {} in full-pool views",
            pool.len(),
            ranks.by_overall.len()
        );
        ranks
    }

    fn insert_unsorted(&mut self, player: &Player) {
        if let Some(list) = self.by_position.get_mut(&player.position) {
            if !list.contains(&player.id) {
                list.push(player.id);
            }
        }
        if !self.by_overall.contains(&player.id) {
            self.by_overall.push(player.id);
        }
        if !self.by_adp.contains(&player.id) {
            self.by_adp.push(player.id);
        }
    }

    fn sort_all(&mut self, pool: &PlayerPool, settings: &BoardSettings) {
        let metric = self.active_metric;
        for list in self.by_position.values_mut() {
            sort_ids(list, pool, settings, metric);
        }
        self.sort_full_pool_views(pool, settings);
    }

    fn sort_full_pool_views(&mut self, pool: &PlayerPool, settings: &BoardSettings) {
        sort_ids(&mut self.by_overall, pool, settings, SortMetric::OverallRank);
        sort_ids(&mut self.by_adp, pool, settings, SortMetric::Adp);
    }

    /// Put a player back on the board (or add a new one), re-sorting only the
    /// lists the player lands in. Adding a player already present is a no-op
    /// apart from the re-sort.
    pub fn add_avail_player(&mut self, player: &Player, pool: &PlayerPool, settings: &BoardSettings) {
        self.insert_unsorted(player);
        let metric = self.active_metric;
        if let Some(list) = self.by_position.get_mut(&player.position) {
            sort_ids(list, pool, settings, metric);
        }
        self.sort_full_pool_views(pool, settings);
        self.version += 1;
    }

    /// Take a player off every list, including the purge list. Removing an
    /// absent id does nothing.
    pub fn remove_player_from_board(&mut self, player: &Player) {
        let mut removed = false;
        for list in self.by_position.values_mut() {
            removed |= remove_id(list, player.id);
        }
        removed |= remove_id(&mut self.by_overall, player.id);
        removed |= remove_id(&mut self.by_adp, player.id);
        removed |= remove_id(&mut self.purged, player.id);
        if removed {
            self.version += 1;
        }
    }

    /// Toggle a player's purged state.
    ///
    /// An active player leaves every view and joins the purge list; a purged
    /// player leaves the purge list and is re-added in sorted position.
    pub fn purge_player(&mut self, player: &Player, pool: &PlayerPool, settings: &BoardSettings) {
        if self.is_purged(player.id) {
            remove_id(&mut self.purged, player.id);
            self.add_avail_player(player, pool, settings);
            debug!("Restored purged player {} ({})", player.name, player.id);
        } else {
            self.remove_player_from_board(player);
            self.purged.push(player.id);
            self.version += 1;
            debug!("Purged player {} ({})", player.name, player.id);
        }
    }

    /// Re-sort every position list by `metric` (which becomes the active
    /// metric), and both full-pool views by their own keys.
    pub fn sort_by_metric(&mut self, pool: &PlayerPool, settings: &BoardSettings, metric: SortMetric) {
        self.active_metric = metric;
        self.sort_all(pool, settings);
        self.version += 1;
    }

    /// Re-sort with the current metric, e.g. after the board settings change.
    pub fn resort(&mut self, pool: &PlayerPool, settings: &BoardSettings) {
        self.sort_all(pool, settings);
        self.version += 1;
    }

    // -- read access --

    pub fn position_list(&self, position: Position) -> &[PlayerId] {
        self.by_position
            .get(&position)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn by_overall(&self) -> &[PlayerId] {
        &self.by_overall
    }

    pub fn by_adp(&self) -> &[PlayerId] {
        &self.by_adp
    }

    pub fn purged(&self) -> &[PlayerId] {
        &self.purged
    }

    pub fn is_purged(&self, id: PlayerId) -> bool {
        self.purged.contains(&id)
    }

    pub fn is_available(&self, id: PlayerId) -> bool {
        self.by_adp.contains(&id)
    }

    /// Available players at `position`, in ADP order.
    pub fn available_at<'a>(
        &'a self,
        position: Position,
        pool: &'a PlayerPool,
    ) -> impl Iterator<Item = PlayerId> + 'a {
        self.by_adp
            .iter()
            .copied()
            .filter(move |&id| pool.get(id).is_some_and(|p| p.position == position))
    }

    pub fn active_metric(&self) -> SortMetric {
        self.active_metric
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}
