// Positional run detection.
//
// A "run" is a burst of picks at one position that drops the next available
// player at that position into a much worse tier. Alerts fire only when the
// second-best available player's tier moves past the worst tier seen so far
// for the position, so a plateau never alerts twice.

use std::collections::HashMap;
use std::fmt;

use tracing::info;

use super::predictor::PredictedPicks;
use crate::rankings::board::PlayerRanks;
use crate::rankings::metrics::{get_player_metrics, BoardSettings};
use crate::rankings::player::{PlayerId, PlayerPool, Position, RANKABLE_POSITIONS};

/// Players predicted gone within this many of the user's turns are skipped
/// when looking for where the user will land.
pub const RUN_LOOKAHEAD: u32 = 2;

/// Tier drop between the best available player and the landing spot that
/// counts as a run.
pub const RUN_TIER_DROP: u32 = 2;

/// A run warning for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAlert {
    pub position: Position,
    /// Tier of the best tiered player expected to survive the lookahead, or
    /// `None` when no player at the position is expected to survive.
    pub landing_tier: Option<u32>,
    /// Players at the position predicted gone within the lookahead.
    pub taken: usize,
}

impl fmt::Display for RunAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.landing_tier {
            Some(tier) => write!(
                f,
                "{} run: {} projected gone, next {} lands in tier {}",
                self.position, self.taken, self.position, tier
            ),
            None => write!(
                f,
                "{} run: {} projected gone, none left after the run",
                self.position, self.taken
            ),
        }
    }
}

/// Remembers the worst second-best tier seen per position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDetector {
    pred_run_tiers: HashMap<Position, u32>,
}

impl RunDetector {
    pub fn recorded_tier(&self, position: Position) -> u32 {
        self.pred_run_tiers.get(&position).copied().unwrap_or(0)
    }

    /// Check every rankable position and return alerts for new runs.
    pub fn evaluate(
        &mut self,
        ranks: &PlayerRanks,
        pool: &PlayerPool,
        settings: &BoardSettings,
        predicted: &PredictedPicks,
    ) -> Vec<RunAlert> {
        RANKABLE_POSITIONS
            .iter()
            .filter_map(|&pos| self.evaluate_position(pos, ranks, pool, settings, predicted))
            .collect()
    }

    fn evaluate_position(
        &mut self,
        position: Position,
        ranks: &PlayerRanks,
        pool: &PlayerPool,
        settings: &BoardSettings,
        predicted: &PredictedPicks,
    ) -> Option<RunAlert> {
        // Players without a tier under the active settings carry no signal.
        let tier_of = |id: PlayerId| -> Option<u32> {
            pool.get(id).and_then(|p| get_player_metrics(p, settings).tier)
        };

        let available: Vec<PlayerId> = ranks.available_at(position, pool).collect();
        let &[best, second, ..] = available.as_slice() else {
            return None;
        };

        let second_tier = tier_of(second)?;
        if second_tier <= self.recorded_tier(position) {
            return None;
        }
        self.pred_run_tiers.insert(position, second_tier);
        let current_tier = tier_of(best)?;

        let mut survivors = available
            .iter()
            .copied()
            .filter(|&id| !predicted.taken_within(id, RUN_LOOKAHEAD))
            .peekable();
        let landing_tier = if survivors.peek().is_none() {
            None
        } else {
            Some(survivors.find_map(tier_of)?)
        };
        let is_run = match landing_tier {
            Some(tier) => tier >= current_tier.saturating_add(RUN_TIER_DROP),
            None => true,
        };
        if !is_run {
            return None;
        }

        let taken = available
            .iter()
            .filter(|&&id| predicted.taken_within(id, RUN_LOOKAHEAD))
            .count();
        let alert = RunAlert {
            position,
            landing_tier,
            taken,
        };
        info!("Run alert: {}", alert);
        Some(alert)
    }
}
