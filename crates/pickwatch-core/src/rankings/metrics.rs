// Per-player metric derivation for the active board settings.

use serde::{Deserialize, Serialize};

use super::player::{AdpSource, Player, RankingSource, ScoringFormat, UNRANKED};

/// Scoring format plus which ranking and ADP providers drive the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSettings {
    pub format: ScoringFormat,
    pub ranking_source: RankingSource,
    pub adp_source: AdpSource,
}

impl Default for BoardSettings {
    fn default() -> Self {
        BoardSettings {
            format: ScoringFormat::Standard,
            ranking_source: RankingSource::FantasyPros,
            adp_source: AdpSource::Espn,
        }
    }
}

/// Key a ranked list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMetric {
    #[default]
    PosRank,
    OverallRank,
    /// Overall rank, falling back to position rank when a provider only
    /// ranks within positions.
    OverallOrPosRank,
    Adp,
}

impl SortMetric {
    pub fn from_str_metric(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "pos_rank" | "position" | "pos" => Some(SortMetric::PosRank),
            "overall_rank" | "overall" => Some(SortMetric::OverallRank),
            "overall_or_pos_rank" | "rank" => Some(SortMetric::OverallOrPosRank),
            "adp" => Some(SortMetric::Adp),
            _ => None,
        }
    }
}

/// Ranking numbers for one player under one set of board settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerMetrics {
    pub overall_rank: Option<u32>,
    pub pos_rank: Option<u32>,
    pub tier: Option<u32>,
    /// ADP rounded to one decimal place.
    pub adp: Option<f64>,
    pub overall_or_pos_rank: Option<u32>,
}

impl PlayerMetrics {
    /// Record returned when the selected source has never ranked the player.
    pub fn unranked() -> Self {
        PlayerMetrics {
            pos_rank: Some(UNRANKED),
            ..Default::default()
        }
    }

    /// Sort key for `metric`; missing values sort last.
    pub fn sort_value(&self, metric: SortMetric) -> f64 {
        let value = match metric {
            SortMetric::PosRank => self.pos_rank.map(f64::from),
            SortMetric::OverallRank => self.overall_rank.map(f64::from),
            SortMetric::OverallOrPosRank => self.overall_or_pos_rank.map(f64::from),
            SortMetric::Adp => self.adp,
        };
        value.unwrap_or(UNRANKED as f64)
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive a player's metrics for the given settings.
pub fn get_player_metrics(player: &Player, settings: &BoardSettings) -> PlayerMetrics {
    let Some(record) = player.ranks.get(&settings.ranking_source) else {
        return PlayerMetrics::unranked();
    };

    let overall_rank = record.overall_rank_for(settings.format);
    let pos_rank = record.pos_rank_for(settings.format);
    PlayerMetrics {
        overall_rank,
        pos_rank,
        tier: record.tier_for(settings.format).map(|t| t.tier),
        adp: player
            .adp
            .get(&settings.adp_source)
            .copied()
            .filter(|v| v.is_finite())
            .map(round_one_decimal),
        overall_or_pos_rank: overall_rank.or(pos_rank),
    }
}
