// Pick prediction: simulates upcoming picks to estimate which players will be
// gone before the user's next turns.
//
// Each simulated pick takes the best-ADP available player at a position the
// picking team still "needs", where need comes from round-dependent roster
// caps. The result is rebuilt from scratch on every run.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::draft::roster::{get_roster_idx_from_pick, PositionCounts, Roster, Rosters};
use crate::draft::sequence::{picks_since_curr_pick, round_for_pick};
use crate::rankings::board::PlayerRanks;
use crate::rankings::player::{PlayerId, PlayerPool, Position, RANKABLE_POSITIONS};

/// Simulated rounds per run.
pub const SIMULATED_ROUNDS: u32 = 5;

// ---------------------------------------------------------------------------
// Roster-need heuristic
// ---------------------------------------------------------------------------

/// Per-team position caps in effect through `through_round`.
struct RoundCaps {
    through_round: u32,
    caps: &'static [(Position, usize)],
}

/// The first entry whose `through_round` covers the current round applies.
/// Past the last entry no caps apply.
const ROUND_CAPS: &[RoundCaps] = &[
    RoundCaps {
        through_round: 3,
        caps: &[(Position::Quarterback, 1), (Position::TightEnd, 1)],
    },
    RoundCaps {
        through_round: 6,
        caps: &[
            (Position::Quarterback, 1),
            (Position::TightEnd, 1),
            (Position::RunningBack, 3),
            (Position::WideReceiver, 3),
        ],
    },
    RoundCaps {
        through_round: 16,
        caps: &[
            (Position::Quarterback, 2),
            (Position::TightEnd, 2),
            (Position::RunningBack, 5),
            (Position::WideReceiver, 5),
        ],
    },
];

/// Through this round a QB or TE is off the table league-wide once anyone
/// has taken one.
const EARLY_ROUND_LIMIT: u32 = 2;
const EARLY_ROUND_SCARCE: [Position; 2] = [Position::Quarterback, Position::TightEnd];

/// Positions a team with `team_counts` rostered players is still expected to
/// draft in `round_num`.
pub fn next_position_picked(
    team_counts: &PositionCounts,
    round_num: u32,
    league_counts: &PositionCounts,
) -> BTreeSet<Position> {
    let mut eligible: BTreeSet<Position> = RANKABLE_POSITIONS.iter().copied().collect();

    if let Some(rule) = ROUND_CAPS.iter().find(|r| round_num <= r.through_round) {
        for &(pos, max) in rule.caps {
            if team_counts.get(&pos).copied().unwrap_or(0) >= max {
                eligible.remove(&pos);
            }
        }
    }

    if round_num <= EARLY_ROUND_LIMIT {
        for pos in EARLY_ROUND_SCARCE {
            if league_counts.get(&pos).copied().unwrap_or(0) > 0 {
                eligible.remove(&pos);
            }
        }
    }

    eligible
}

/// Rankable-position counts for a single roster.
pub fn roster_counts(roster: &Roster) -> PositionCounts {
    RANKABLE_POSITIONS.iter().map(|&p| (p, roster.count(p))).collect()
}

// ---------------------------------------------------------------------------
// Predicted picks
// ---------------------------------------------------------------------------

/// Player id -> how many of the user's turns away the player is predicted to
/// be drafted (see [`picks_since_curr_pick`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictedPicks(HashMap<PlayerId, u32>);

impl PredictedPicks {
    pub fn get(&self, id: PlayerId) -> Option<u32> {
        self.0.get(&id).copied()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn insert(&mut self, id: PlayerId, picks_away: u32) {
        self.0.insert(id, picks_away);
    }

    /// Whether `id` is predicted gone within `turns` of the user's turns.
    pub fn taken_within(&self, id: PlayerId, turns: u32) -> bool {
        self.get(id).is_some_and(|v| v <= turns)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, u32)> + '_ {
        self.0.iter().map(|(&id, &v)| (id, v))
    }
}

/// Draft position context for a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationContext {
    pub num_teams: u32,
    pub my_pick: u32,
    /// Pick currently on the clock.
    pub curr_pick: u32,
    /// Last pick number of the draft.
    pub last_pick: u32,
}

/// Predict the player taken at `simulated_pick`.
///
/// Scans `avail_by_adp` for the first player not already predicted whose
/// position is in `candidates`. On a hit the player is recorded in
/// `predicted` and the position's league count is incremented; on a miss
/// nothing changes and `None` is returned.
pub fn predict_next_pick(
    avail_by_adp: &[PlayerId],
    pool: &PlayerPool,
    candidates: &BTreeSet<Position>,
    predicted: &mut PredictedPicks,
    league_counts: &mut PositionCounts,
    ctx: &SimulationContext,
    simulated_pick: u32,
) -> Option<PlayerId> {
    let (id, position) = avail_by_adp
        .iter()
        .filter(|&&id| !predicted.contains(id))
        .find_map(|&id| {
            pool.get(id)
                .filter(|p| candidates.contains(&p.position))
                .map(|p| (id, p.position))
        })?;

    let picks_away = picks_since_curr_pick(ctx.curr_pick, simulated_pick, ctx.my_pick, ctx.num_teams);
    predicted.insert(id, picks_away);
    *league_counts.entry(position).or_insert(0) += 1;
    Some(id)
}

/// Simulate `SIMULATED_ROUNDS * num_teams` picks from the current pick.
pub fn simulate_picks(
    ranks: &PlayerRanks,
    pool: &PlayerPool,
    rosters: &Rosters,
    ctx: &SimulationContext,
) -> PredictedPicks {
    let mut predicted = PredictedPicks::default();
    let mut league_counts = rosters.position_counts();
    let mut team_counts: Vec<PositionCounts> = rosters.iter().map(roster_counts).collect();

    let horizon_end = (ctx.curr_pick + SIMULATED_ROUNDS * ctx.num_teams).min(ctx.last_pick + 1);
    for simulated_pick in ctx.curr_pick..horizon_end {
        let roster_idx = get_roster_idx_from_pick(simulated_pick, ctx.num_teams);
        let Some(counts) = team_counts.get_mut(roster_idx) else {
            continue;
        };
        let round = round_for_pick(simulated_pick, ctx.num_teams);
        let candidates = next_position_picked(counts, round, &league_counts);

        let picked = predict_next_pick(
            ranks.by_adp(),
            pool,
            &candidates,
            &mut predicted,
            &mut league_counts,
            ctx,
            simulated_pick,
        );
        match picked.and_then(|id| pool.get(id)) {
            Some(player) => *counts.entry(player.position).or_insert(0) += 1,
            None => debug!("No prediction for pick {}", simulated_pick),
        }
    }

    info!(
        "Simulated picks {}..{}: {} predicted",
        ctx.curr_pick,
        horizon_end,
        predicted.len()
    );
    predicted
}

// ---------------------------------------------------------------------------
// Forecast with explicit high-water mark
// ---------------------------------------------------------------------------

/// Holds the latest predictions and the pick they were simulated from.
#[derive(Debug, Clone, Default)]
pub struct Forecast {
    last_simulated: Option<u32>,
    predicted: PredictedPicks,
}

impl Forecast {
    /// Whether a refresh at `curr_pick` would run the simulation.
    pub fn needs_simulation(&self, curr_pick: u32, force: bool) -> bool {
        force || self.last_simulated.map_or(true, |last| curr_pick > last)
    }

    /// Re-simulate if `ctx.curr_pick` is past the last simulated pick, or
    /// unconditionally when `force` is set. Returns whether it ran.
    pub fn refresh(
        &mut self,
        ranks: &PlayerRanks,
        pool: &PlayerPool,
        rosters: &Rosters,
        ctx: &SimulationContext,
        force: bool,
    ) -> bool {
        if !self.needs_simulation(ctx.curr_pick, force) {
            return false;
        }
        self.predicted = simulate_picks(ranks, pool, rosters, ctx);
        self.last_simulated = Some(ctx.curr_pick);
        true
    }

    pub fn predicted(&self) -> &PredictedPicks {
        &self.predicted
    }

    pub fn last_simulated(&self) -> Option<u32> {
        self.last_simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::metrics::BoardSettings;
    use crate::rankings::player::{AdpSource, Player, RankingRecord, RankingSource};

    fn counts(pairs: &[(Position, usize)]) -> PositionCounts {
        pairs.iter().copied().collect()
    }

    fn player(id: PlayerId, pos: Position, adp: f64) -> Player {
        Player::new(id, &format!("P{id}"), pos, "FA")
            .with_ranks(
                RankingSource::FantasyPros,
                RankingRecord {
                    pos_rank: Some(id),
                    ..Default::default()
                },
            )
            .with_adp(AdpSource::Espn, adp)
    }

    fn ctx(num_teams: u32, my_pick: u32, curr_pick: u32) -> SimulationContext {
        SimulationContext {
            num_teams,
            my_pick,
            curr_pick,
            last_pick: num_teams * 16,
        }
    }

    #[test]
    fn early_rounds_cap_qb_and_te() {
        let team = counts(&[(Position::Quarterback, 1)]);
        let eligible = next_position_picked(&team, 3, &PositionCounts::new());
        assert!(!eligible.contains(&Position::Quarterback));
        assert!(eligible.contains(&Position::RunningBack));
        assert!(eligible.contains(&Position::TightEnd));
    }

    #[test]
    fn middle_rounds_cap_rb_and_wr() {
        let team = counts(&[(Position::RunningBack, 3), (Position::WideReceiver, 2)]);
        let eligible = next_position_picked(&team, 5, &PositionCounts::new());
        assert!(!eligible.contains(&Position::RunningBack));
        assert!(eligible.contains(&Position::WideReceiver));

        // Three RBs are fine in round 3.
        let eligible = next_position_picked(&team, 3, &PositionCounts::new());
        assert!(eligible.contains(&Position::RunningBack));
    }

    #[test]
    fn late_rounds_allow_backups() {
        let team = counts(&[(Position::Quarterback, 1), (Position::TightEnd, 2)]);
        let eligible = next_position_picked(&team, 10, &PositionCounts::new());
        assert!(eligible.contains(&Position::Quarterback));
        assert!(!eligible.contains(&Position::TightEnd));
    }

    #[test]
    fn no_caps_after_last_rule() {
        let team = counts(&[(Position::Quarterback, 4), (Position::RunningBack, 9)]);
        let eligible = next_position_picked(&team, 17, &PositionCounts::new());
        assert_eq!(eligible.len(), 4);
    }

    #[test]
    fn first_two_rounds_skip_qb_te_once_any_taken() {
        let league = counts(&[(Position::TightEnd, 1)]);
        let eligible = next_position_picked(&PositionCounts::new(), 2, &league);
        assert!(!eligible.contains(&Position::TightEnd));
        assert!(eligible.contains(&Position::Quarterback));

        let eligible = next_position_picked(&PositionCounts::new(), 3, &league);
        assert!(eligible.contains(&Position::TightEnd));
    }

    #[test]
    fn predict_next_pick_takes_best_adp_candidate() {
        let pool = PlayerPool::new(vec![
            player(1, Position::Quarterback, 1.0),
            player(2, Position::RunningBack, 2.0),
            player(3, Position::RunningBack, 3.0),
        ]);
        let by_adp = [1, 2, 3];
        let candidates: BTreeSet<Position> = [Position::RunningBack].into_iter().collect();
        let mut predicted = PredictedPicks::default();
        let mut league = PositionCounts::new();
        let c = ctx(10, 10, 1);

        assert_eq!(
            predict_next_pick(&by_adp, &pool, &candidates, &mut predicted, &mut league, &c, 1),
            Some(2)
        );
        assert_eq!(predicted.get(2), Some(1));
        assert_eq!(league[&Position::RunningBack], 1);

        // The pick at 10 is the user's: RB 3 is one user-turn further out.
        assert_eq!(
            predict_next_pick(&by_adp, &pool, &candidates, &mut predicted, &mut league, &c, 10),
            Some(3)
        );
        assert_eq!(predicted.get(3), Some(2));

        // Nothing left at RB.
        assert_eq!(
            predict_next_pick(&by_adp, &pool, &candidates, &mut predicted, &mut league, &c, 11),
            None
        );
        assert_eq!(predicted.len(), 2);
        assert_eq!(league[&Position::RunningBack], 2);
    }

    fn deep_pool(per_position: u32) -> PlayerPool {
        let mut players = Vec::new();
        let mut id = 1;
        for i in 0..per_position {
            for pos in RANKABLE_POSITIONS {
                players.push(player(id, pos, f64::from(i * 4 + id % 4 + 1)));
                id += 1;
            }
        }
        PlayerPool::new(players)
    }

    #[test]
    fn simulation_covers_five_rounds() {
        let pool = deep_pool(40);
        let ranks = PlayerRanks::create(&pool, &BoardSettings::default());
        let rosters = Rosters::new(10);
        let predicted = simulate_picks(&ranks, &pool, &rosters, &ctx(10, 3, 1));
        assert_eq!(predicted.len(), 50);

        // Values up to 2 are all in rounds 1-2, where only one QB can go.
        let early_qbs = predicted
            .iter()
            .filter(|&(id, v)| v <= 2 && pool.get(id).unwrap().position == Position::Quarterback)
            .count();
        assert!(early_qbs <= 1);
    }

    #[test]
    fn simulation_stops_at_end_of_draft() {
        let pool = deep_pool(40);
        let ranks = PlayerRanks::create(&pool, &BoardSettings::default());
        let rosters = Rosters::new(10);
        let c = SimulationContext {
            num_teams: 10,
            my_pick: 1,
            curr_pick: 156,
            last_pick: 160,
        };
        let predicted = simulate_picks(&ranks, &pool, &rosters, &c);
        assert_eq!(predicted.len(), 5);
    }

    #[test]
    fn simulated_team_needs_include_simulated_picks() {
        // Only QBs on the board. Round 2 allows one QB league-wide, then each
        // team is capped at one through round 6.
        let pool = PlayerPool::new(vec![
            player(1, Position::Quarterback, 1.0),
            player(2, Position::Quarterback, 2.0),
            player(3, Position::Quarterback, 3.0),
            player(4, Position::Quarterback, 4.0),
        ]);
        let ranks = PlayerRanks::create(&pool, &BoardSettings::default());
        let rosters = Rosters::new(2);
        let c = SimulationContext {
            num_teams: 2,
            my_pick: 1,
            curr_pick: 3,
            last_pick: 32,
        };
        let predicted = simulate_picks(&ranks, &pool, &rosters, &c);
        assert_eq!(predicted.len(), 2);
        assert!(predicted.contains(1));
        assert!(predicted.contains(2));
    }

    #[test]
    fn forecast_refreshes_only_past_high_water_mark() {
        let pool = deep_pool(10);
        let ranks = PlayerRanks::create(&pool, &BoardSettings::default());
        let rosters = Rosters::new(10);
        let mut forecast = Forecast::default();

        assert!(forecast.refresh(&ranks, &pool, &rosters, &ctx(10, 1, 5), false));
        assert_eq!(forecast.last_simulated(), Some(5));
        assert!(!forecast.refresh(&ranks, &pool, &rosters, &ctx(10, 1, 5), false));
        assert!(!forecast.refresh(&ranks, &pool, &rosters, &ctx(10, 1, 4), false));
        assert!(forecast.refresh(&ranks, &pool, &rosters, &ctx(10, 1, 4), true));
        assert_eq!(forecast.last_simulated(), Some(4));
        assert!(forecast.refresh(&ranks, &pool, &rosters, &ctx(10, 1, 6), false));
    }
}
