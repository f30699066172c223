// Draft session: owns the board, rosters and forecast, and routes draft
// events through them.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::draft::roster::{get_roster_idx_from_pick, Rosters};
use crate::draft::sequence::{get_my_next_pick, get_picks_until, is_my_pick, round_for_pick};
use crate::forecast::predictor::{Forecast, PredictedPicks, SimulationContext};
use crate::forecast::runs::{RunAlert, RunDetector};
use crate::rankings::board::PlayerRanks;
use crate::rankings::metrics::{BoardSettings, SortMetric};
use crate::rankings::player::{PlayerId, PlayerPool, RankingRecord, RankingSource};

/// League sizes the draft math is tuned for.
pub const SUPPORTED_TEAM_COUNTS: [u32; 3] = [10, 12, 14];

/// Errors raised by draft configuration and draft events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),

    #[error("pick {pick} is outside the draft (1..={last_pick})")]
    PickOutOfRange { pick: u32, last_pick: u32 },

    #[error("invalid draft config: {field}: {message}")]
    InvalidConfig { field: &'static str, message: String },
}

/// Validated league shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftConfig {
    num_teams: u32,
    my_pick: u32,
    rounds: u32,
}

impl DraftConfig {
    pub fn new(num_teams: u32, my_pick: u32, rounds: u32) -> Result<Self, DraftError> {
        if !SUPPORTED_TEAM_COUNTS.contains(&num_teams) {
            return Err(DraftError::InvalidConfig {
                field: "num_teams",
                message: format!("must be one of 10, 12 or 14, got {}", num_teams),
            });
        }
        if my_pick < 1 || my_pick > num_teams {
            return Err(DraftError::InvalidConfig {
                field: "my_pick",
                message: format!("must be between 1 and {}, got {}", num_teams, my_pick),
            });
        }
        if rounds < 1 {
            return Err(DraftError::InvalidConfig {
                field: "rounds",
                message: "must be at least 1".into(),
            });
        }
        Ok(DraftConfig {
            num_teams,
            my_pick,
            rounds,
        })
    }

    pub fn num_teams(&self) -> u32 {
        self.num_teams
    }

    pub fn my_pick(&self) -> u32 {
        self.my_pick
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Last pick number of the draft.
    pub fn last_pick(&self) -> u32 {
        self.rounds * self.num_teams
    }

    /// Roster index of the user's team.
    pub fn my_roster_idx(&self) -> usize {
        (self.my_pick - 1) as usize
    }
}

/// A live draft.
#[derive(Debug, Clone)]
pub struct DraftSession {
    pool: PlayerPool,
    config: DraftConfig,
    settings: BoardSettings,
    ranks: PlayerRanks,
    rosters: Rosters,
    /// Pick number -> drafted player.
    picks: BTreeMap<u32, PlayerId>,
    forecast: Forecast,
    detector: RunDetector,
    /// Alerts raised by the most recent simulation.
    alerts: Vec<RunAlert>,
}

impl DraftSession {
    /// Build the board and empty rosters and run the first forecast.
    pub fn new(pool: PlayerPool, config: DraftConfig, settings: BoardSettings) -> Self {
        let ranks = PlayerRanks::create(&pool, &settings);
        let rosters = Rosters::new(config.num_teams as usize);
        info!(
            "Draft session: {} teams, pick {}, {} rounds, {} players",
            config.num_teams,
            config.my_pick,
            config.rounds,
            pool.len()
        );
        let mut session = DraftSession {
            pool,
            config,
            settings,
            ranks,
            rosters,
            picks: BTreeMap::new(),
            forecast: Forecast::default(),
            detector: RunDetector::default(),
            alerts: Vec::new(),
        };
        session.refresh(false);
        session
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Record `id` as taken at `pick`.
    ///
    /// Returns `Ok(false)` without changing anything when the player is
    /// already drafted or the pick is already filled.
    pub fn draft_player(&mut self, id: PlayerId, pick: u32) -> Result<bool, DraftError> {
        // Filling a gap left by an undo does not move the clock.
        let fills_gap = pick < self.current_pick();
        let applied = self.apply_pick(id, pick)?;
        if applied {
            self.refresh(fills_gap);
        }
        Ok(applied)
    }

    /// Replay stored picks, then run a single forecast. Returns how many
    /// picks were applied; entries that fail are logged and skipped.
    pub fn replay_picks(&mut self, picks: &[(u32, PlayerId)]) -> usize {
        let mut applied = 0;
        for &(pick, id) in picks {
            match self.apply_pick(id, pick) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => warn!("Skipping stored pick {}: {}", pick, e),
            }
        }
        self.refresh(true);
        info!("Replayed {} of {} stored picks", applied, picks.len());
        applied
    }

    fn apply_pick(&mut self, id: PlayerId, pick: u32) -> Result<bool, DraftError> {
        self.check_pick(pick)?;
        let player = self.pool.get(id).ok_or(DraftError::UnknownPlayer(id))?;

        if let Some(existing) = self.pick_of(id) {
            warn!(
                "{} ({}) already drafted at pick {}; ignoring pick {}",
                player.name, id, existing, pick
            );
            return Ok(false);
        }
        if let Some(&other) = self.picks.get(&pick) {
            warn!("Pick {} already holds player {}; ignoring {}", pick, other, id);
            return Ok(false);
        }

        let roster_idx = get_roster_idx_from_pick(pick, self.config.num_teams);
        self.ranks.remove_player_from_board(player);
        self.rosters = self.rosters.add_to_roster(player, roster_idx);
        self.picks.insert(pick, id);
        info!(
            "Pick {}: {} ({}) to team {}",
            pick,
            player.name,
            player.position,
            roster_idx + 1
        );
        Ok(true)
    }

    /// Undo the pick at `pick`, returning the player back to the board.
    pub fn undraft_pick(&mut self, pick: u32) -> Result<Option<PlayerId>, DraftError> {
        self.check_pick(pick)?;
        let Some(id) = self.picks.remove(&pick) else {
            debug!("Undo of empty pick {}", pick);
            return Ok(None);
        };
        let roster_idx = get_roster_idx_from_pick(pick, self.config.num_teams);
        if let Some(player) = self.pool.get(id) {
            self.rosters = self.rosters.remove_from_roster(player, roster_idx);
            self.ranks.add_avail_player(player, &self.pool, &self.settings);
            info!("Undid pick {}: {} ({})", pick, player.name, id);
        }
        self.refresh(true);
        Ok(Some(id))
    }

    /// Toggle whether `id` is hidden from the board. Drafted players cannot
    /// be purged. Returns whether the board changed.
    pub fn purge_player(&mut self, id: PlayerId) -> Result<bool, DraftError> {
        let player = self.pool.get(id).ok_or(DraftError::UnknownPlayer(id))?;
        if let Some(pick) = self.pick_of(id) {
            warn!("{} ({}) was drafted at pick {}; not purging", player.name, id, pick);
            return Ok(false);
        }
        self.ranks.purge_player(player, &self.pool, &self.settings);
        info!(
            "{} {} ({})",
            if self.ranks.is_purged(id) { "Purged" } else { "Restored" },
            player.name,
            id
        );
        self.refresh(true);
        Ok(true)
    }

    /// Purge a batch of players with a single forecast afterwards. Ids that
    /// are unknown, drafted or already purged are skipped. Returns how many
    /// were purged.
    pub fn restore_purges(&mut self, ids: &[PlayerId]) -> usize {
        let mut purged = 0;
        for &id in ids {
            let Some(player) = self.pool.get(id) else {
                warn!("Skipping stored purge of unknown player {}", id);
                continue;
            };
            if self.ranks.is_purged(id) || self.pick_of(id).is_some() {
                continue;
            }
            self.ranks.purge_player(player, &self.pool, &self.settings);
            purged += 1;
        }
        if purged > 0 {
            self.refresh(true);
        }
        info!("Restored {} of {} stored purges", purged, ids.len());
        purged
    }

    /// Switch scoring format, ranking source or ADP source.
    pub fn set_board_settings(&mut self, settings: BoardSettings) {
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        self.ranks.resort(&self.pool, &self.settings);
        info!(
            "Board settings: {:?}, rankings {}, ADP {}",
            settings.format,
            settings.ranking_source.display_str(),
            settings.adp_source.display_str()
        );
        self.refresh(true);
    }

    /// Store a user-edited ranking for `id` as its `Custom` record.
    pub fn set_custom_rank(&mut self, id: PlayerId, record: RankingRecord) -> Result<(), DraftError> {
        let player = self.pool.get_mut(id).ok_or(DraftError::UnknownPlayer(id))?;
        player.ranks.insert(RankingSource::Custom, record);
        debug!("Custom ranking set for {} ({})", player.name, id);
        if self.settings.ranking_source == RankingSource::Custom {
            self.ranks.resort(&self.pool, &self.settings);
            self.refresh(true);
        }
        Ok(())
    }

    /// Start the draft over: every pick and purge is dropped. Pool, settings
    /// and the active sort metric are kept.
    pub fn reset(&mut self) {
        let metric = self.ranks.active_metric();
        self.ranks = PlayerRanks::create(&self.pool, &self.settings);
        if metric != self.ranks.active_metric() {
            self.ranks.sort_by_metric(&self.pool, &self.settings, metric);
        }
        self.rosters = Rosters::new(self.config.num_teams as usize);
        self.picks.clear();
        self.forecast = Forecast::default();
        self.detector = RunDetector::default();
        self.alerts.clear();
        info!("Draft reset");
        self.refresh(false);
    }

    /// Re-order the position lists by `metric`.
    pub fn sort_by(&mut self, metric: SortMetric) {
        self.ranks.sort_by_metric(&self.pool, &self.settings, metric);
        debug!("Position lists sorted by {:?}", metric);
    }

    /// Re-run the simulation regardless of the high-water mark.
    pub fn resimulate(&mut self) {
        self.refresh(true);
    }

    fn refresh(&mut self, force: bool) {
        let ctx = self.simulation_context();
        if self
            .forecast
            .refresh(&self.ranks, &self.pool, &self.rosters, &ctx, force)
        {
            self.alerts = self.detector.evaluate(
                &self.ranks,
                &self.pool,
                &self.settings,
                self.forecast.predicted(),
            );
        }
    }

    fn check_pick(&self, pick: u32) -> Result<(), DraftError> {
        let last_pick = self.config.last_pick();
        if pick < 1 || pick > last_pick {
            return Err(DraftError::PickOutOfRange { pick, last_pick });
        }
        Ok(())
    }

    fn pick_of(&self, id: PlayerId) -> Option<u32> {
        self.picks
            .iter()
            .find_map(|(&pick, &drafted)| (drafted == id).then_some(pick))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Pick on the clock: one past the highest recorded pick.
    pub fn current_pick(&self) -> u32 {
        self.picks.keys().next_back().map_or(1, |&p| p + 1)
    }

    pub fn current_round(&self) -> u32 {
        round_for_pick(self.current_pick(), self.config.num_teams)
    }

    pub fn is_complete(&self) -> bool {
        self.current_pick() > self.config.last_pick()
    }

    /// Whether the pick on the clock belongs to the user.
    pub fn is_my_turn(&self) -> bool {
        is_my_pick(self.current_pick(), self.config.my_pick, self.config.num_teams)
    }

    /// Picks before the user's next turn and the turn after it.
    pub fn picks_until(&self) -> [u32; 2] {
        get_picks_until(self.config.my_pick, self.current_pick(), self.config.num_teams)
    }

    /// The user's next pick, counting the current one.
    pub fn my_next_pick(&self) -> u32 {
        get_my_next_pick(
            self.current_pick().saturating_sub(1),
            self.config.my_pick,
            self.config.num_teams,
        )
    }

    pub fn simulation_context(&self) -> SimulationContext {
        SimulationContext {
            num_teams: self.config.num_teams,
            my_pick: self.config.my_pick,
            curr_pick: self.current_pick(),
            last_pick: self.config.last_pick(),
        }
    }

    pub fn pool(&self) -> &PlayerPool {
        &self.pool
    }

    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn ranks(&self) -> &PlayerRanks {
        &self.ranks
    }

    pub fn rosters(&self) -> &Rosters {
        &self.rosters
    }

    pub fn predicted(&self) -> &PredictedPicks {
        self.forecast.predicted()
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn alerts(&self) -> &[RunAlert] {
        &self.alerts
    }

    pub fn drafted_at(&self, pick: u32) -> Option<PlayerId> {
        self.picks.get(&pick).copied()
    }

    /// Recorded picks in pick order.
    pub fn pick_log(&self) -> impl Iterator<Item = (u32, PlayerId)> + '_ {
        self.picks.iter().map(|(&pick, &id)| (pick, id))
    }
}
