// Per-team rosters of drafted player ids.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::sequence::{is_even_round, pick_in_round, round_for_pick};
use crate::rankings::player::{Player, PlayerId, Position, RANKABLE_POSITIONS};

/// League-wide count of drafted players per position.
pub type PositionCounts = HashMap<Position, usize>;

/// One team's drafted players.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    /// Player ids in the order they were drafted.
    pub picks: Vec<PlayerId>,
    /// The same ids split by rankable position.
    pub by_position: BTreeMap<Position, Vec<PlayerId>>,
}

impl Default for Roster {
    fn default() -> Self {
        Roster {
            picks: Vec::new(),
            by_position: RANKABLE_POSITIONS.iter().map(|&p| (p, Vec::new())).collect(),
        }
    }
}

impl Roster {
    pub fn contains(&self, id: PlayerId) -> bool {
        self.picks.contains(&id)
    }

    /// Number of rostered players at a rankable position.
    pub fn count(&self, position: Position) -> usize {
        self.by_position.get(&position).map_or(0, Vec::len)
    }
}

/// Team index (0-based) that owns `pick_num` in a snake draft.
pub fn get_roster_idx_from_pick(pick_num: u32, num_teams: u32) -> usize {
    let slot = pick_in_round(pick_num, num_teams);
    if is_even_round(round_for_pick(pick_num, num_teams)) {
        (num_teams - slot) as usize
    } else {
        (slot - 1) as usize
    }
}

/// All rosters in the league, indexed by draft slot.
///
/// Rosters are shared behind `Rc`, so an update produces a new collection in
/// which only the touched roster is a fresh allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Rosters {
    teams: Vec<Rc<Roster>>,
}

impl Rosters {
    /// `num_teams` independent, empty rosters.
    pub fn new(num_teams: usize) -> Self {
        Rosters {
            teams: (0..num_teams).map(|_| Rc::new(Roster::default())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn roster(&self, idx: usize) -> Option<&Roster> {
        self.teams.get(idx).map(Rc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roster> {
        self.teams.iter().map(Rc::as_ref)
    }

    /// Rosters with `player` added to team `roster_idx`. Adding a player the
    /// roster already holds, or targeting a missing team, returns an
    /// unchanged copy.
    pub fn add_to_roster(&self, player: &Player, roster_idx: usize) -> Rosters {
        let Some(current) = self.teams.get(roster_idx) else {
            return self.clone();
        };
        if current.contains(player.id) {
            return self.clone();
        }
        let mut roster = Roster::clone(current);
        roster.picks.push(player.id);
        if let Some(list) = roster.by_position.get_mut(&player.position) {
            list.push(player.id);
        }
        self.replaced(roster_idx, roster)
    }

    /// Rosters with `player` removed from team `roster_idx`.
    pub fn remove_from_roster(&self, player: &Player, roster_idx: usize) -> Rosters {
        let Some(current) = self.teams.get(roster_idx) else {
            return self.clone();
        };
        if !current.contains(player.id) {
            return self.clone();
        }
        let mut roster = Roster::clone(current);
        roster.picks.retain(|&id| id != player.id);
        for list in roster.by_position.values_mut() {
            list.retain(|&id| id != player.id);
        }
        self.replaced(roster_idx, roster)
    }

    fn replaced(&self, roster_idx: usize, roster: Roster) -> Rosters {
        let mut teams = self.teams.clone();
        teams[roster_idx] = Rc::new(roster);
        Rosters { teams }
    }

    /// Drafted players per rankable position across every roster.
    pub fn position_counts(&self) -> PositionCounts {
        let mut counts: PositionCounts = RANKABLE_POSITIONS.iter().map(|&p| (p, 0)).collect();
        for roster in self.iter() {
            for (&pos, ids) in &roster.by_position {
                *counts.entry(pos).or_insert(0) += ids.len();
            }
        }
        counts
    }

    /// Whether `roster_idx` still shares its allocation with `other`.
    pub fn shares_roster(&self, other: &Rosters, roster_idx: usize) -> bool {
        match (self.teams.get(roster_idx), other.teams.get(roster_idx)) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
