// Player records, positions, ranking sources, and tiers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable player identifier. Always an integer, whatever the upstream feed
/// used as its key.
pub type PlayerId = u32;

/// Sentinel used wherever a rank, ADP, or tier is missing, so unranked
/// players sort after every ranked one.
pub const UNRANKED: u32 = 9999;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Football positions known to the draft board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Defense,
    Kicker,
}

/// Positions that get their own ranked list and count toward roster needs.
pub const RANKABLE_POSITIONS: [Position; 4] = [
    Position::Quarterback,
    Position::RunningBack,
    Position::WideReceiver,
    Position::TightEnd,
];

impl Position {
    /// Parse a position abbreviation, case-insensitively.
    ///
    /// Accepts `DST`, `DEF`, `D/ST` and `D` for team defenses.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "DST" | "DEF" | "D/ST" | "D" => Some(Position::Defense),
            "K" | "PK" => Some(Position::Kicker),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Defense => "DST",
            Position::Kicker => "K",
        }
    }

    /// Whether this position has a ranked list on the board.
    pub fn is_rankable(&self) -> bool {
        RANKABLE_POSITIONS.contains(self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Sources and formats
// ---------------------------------------------------------------------------

/// Where a ranking record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingSource {
    FantasyPros,
    Espn,
    /// Ranks edited by the user.
    Custom,
}

impl RankingSource {
    pub fn from_str_source(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "fantasy_pros" | "fantasypros" | "fp" => Some(RankingSource::FantasyPros),
            "espn" => Some(RankingSource::Espn),
            "custom" => Some(RankingSource::Custom),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            RankingSource::FantasyPros => "fantasy_pros",
            RankingSource::Espn => "espn",
            RankingSource::Custom => "custom",
        }
    }
}

/// Which provider's average draft position the board uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdpSource {
    Espn,
    Sleeper,
    Consensus,
}

impl AdpSource {
    pub fn from_str_source(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "espn" => Some(AdpSource::Espn),
            "sleeper" => Some(AdpSource::Sleeper),
            "consensus" => Some(AdpSource::Consensus),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            AdpSource::Espn => "espn",
            AdpSource::Sleeper => "sleeper",
            AdpSource::Consensus => "consensus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFormat {
    #[default]
    Standard,
    Ppr,
}

impl ScoringFormat {
    pub fn from_str_format(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "std" => Some(ScoringFormat::Standard),
            "ppr" => Some(ScoringFormat::Ppr),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tiers and ranking records
// ---------------------------------------------------------------------------

/// A band of players judged roughly interchangeable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    /// Tier number; 1 is the best tier.
    pub tier: u32,
    /// Numeric value band (low, high) that defines the tier.
    pub value_range: (f64, f64),
    /// Position-rank indexes (first, last) covered by the tier, inclusive.
    pub index_range: (u32, u32),
}

impl Tier {
    pub fn contains_index(&self, pos_rank: u32) -> bool {
        (self.index_range.0..=self.index_range.1).contains(&pos_rank)
    }
}

/// One ranking provider's view of a player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingRecord {
    pub overall_rank: Option<u32>,
    pub ppr_overall_rank: Option<u32>,
    pub pos_rank: Option<u32>,
    pub ppr_pos_rank: Option<u32>,
    pub tier: Option<Tier>,
    pub ppr_tier: Option<Tier>,
}

/// A position rank that lies outside the index range of its tier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("position rank {pos_rank} is outside tier {tier} ({first}..={last})")]
pub struct TierMismatch {
    pub pos_rank: u32,
    pub tier: u32,
    pub first: u32,
    pub last: u32,
}

impl RankingRecord {
    pub fn overall_rank_for(&self, format: ScoringFormat) -> Option<u32> {
        match format {
            ScoringFormat::Standard => self.overall_rank,
            ScoringFormat::Ppr => self.ppr_overall_rank,
        }
    }

    pub fn pos_rank_for(&self, format: ScoringFormat) -> Option<u32> {
        match format {
            ScoringFormat::Standard => self.pos_rank,
            ScoringFormat::Ppr => self.ppr_pos_rank,
        }
    }

    pub fn tier_for(&self, format: ScoringFormat) -> Option<&Tier> {
        match format {
            ScoringFormat::Standard => self.tier.as_ref(),
            ScoringFormat::Ppr => self.ppr_tier.as_ref(),
        }
    }

    /// Check that the position rank for `format` sits inside its tier.
    ///
    /// Records missing either value have nothing to check.
    pub fn check_tier_consistency(&self, format: ScoringFormat) -> Result<(), TierMismatch> {
        match (self.pos_rank_for(format), self.tier_for(format)) {
            (Some(rank), Some(tier)) if !tier.contains_index(rank) => Err(TierMismatch {
                pos_rank: rank,
                tier: tier.tier,
                first: tier.index_range.0,
                last: tier.index_range.1,
            }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// NFL team abbreviation; empty for free agents.
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub ranks: HashMap<RankingSource, RankingRecord>,
    #[serde(default)]
    pub adp: HashMap<AdpSource, f64>,
}

impl Player {
    pub fn new(id: PlayerId, name: &str, position: Position, team: &str) -> Self {
        Player {
            id,
            name: name.to_string(),
            position,
            team: team.to_string(),
            ranks: HashMap::new(),
            adp: HashMap::new(),
        }
    }

    pub fn with_ranks(mut self, source: RankingSource, record: RankingRecord) -> Self {
        self.ranks.insert(source, record);
        self
    }

    pub fn with_adp(mut self, source: AdpSource, adp: f64) -> Self {
        self.adp.insert(source, adp);
        self
    }
}

/// Arena of every player known to the board, addressed by stable id.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl PlayerPool {
    /// Build a pool. A later player with a duplicate id replaces the earlier
    /// one in place, keeping the original slot.
    pub fn new(players: Vec<Player>) -> Self {
        let mut pool = PlayerPool::default();
        for player in players {
            pool.upsert(player);
        }
        pool
    }

    pub fn upsert(&mut self, player: Player) {
        match self.index.get(&player.id) {
            Some(&slot) => self.players[slot] = player,
            None => {
                self.index.insert(player.id, self.players.len());
                self.players.push(player);
            }
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.index.get(&id).map(|&slot| &self.players[slot])
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.index.get(&id).map(|&slot| &mut self.players[slot])
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.index.contains_key(&id)
    }

    /// Players in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
