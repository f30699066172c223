// Player pool import from CSV.
//
// One row per (player, ranking source). Rows sharing an id merge into a
// single player; ADP columns from any row fill that player's ADP map.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use pickwatch_core::rankings::player::{
    AdpSource, Player, PlayerId, PlayerPool, Position, RankingRecord, RankingSource,
    ScoringFormat, Tier,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV row
// ---------------------------------------------------------------------------

/// Unknown extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: PlayerId,
    name: String,
    position: String,
    #[serde(default)]
    team: String,
    source: String,
    overall_rank: Option<u32>,
    ppr_overall_rank: Option<u32>,
    pos_rank: Option<u32>,
    ppr_pos_rank: Option<u32>,
    tier: Option<u32>,
    tier_low: Option<f64>,
    tier_high: Option<f64>,
    tier_first: Option<u32>,
    tier_last: Option<u32>,
    ppr_tier: Option<u32>,
    ppr_tier_low: Option<f64>,
    ppr_tier_high: Option<f64>,
    ppr_tier_first: Option<u32>,
    ppr_tier_last: Option<u32>,
    adp_espn: Option<f64>,
    adp_sleeper: Option<f64>,
    adp_consensus: Option<f64>,
}

/// Tier from its CSV columns. Missing bounds collapse to the player's own
/// position rank.
fn build_tier(
    tier: Option<u32>,
    low: Option<f64>,
    high: Option<f64>,
    first: Option<u32>,
    last: Option<u32>,
    pos_rank: Option<u32>,
) -> Option<Tier> {
    let tier = tier?;
    let fallback = pos_rank.unwrap_or(0);
    Some(Tier {
        tier,
        value_range: (low.unwrap_or(0.0), high.unwrap_or(0.0)),
        index_range: (first.unwrap_or(fallback), last.unwrap_or(fallback)),
    })
}

impl RawPlayerRow {
    fn record(&self) -> RankingRecord {
        RankingRecord {
            overall_rank: self.overall_rank,
            ppr_overall_rank: self.ppr_overall_rank,
            pos_rank: self.pos_rank,
            ppr_pos_rank: self.ppr_pos_rank,
            tier: build_tier(
                self.tier,
                self.tier_low,
                self.tier_high,
                self.tier_first,
                self.tier_last,
                self.pos_rank,
            ),
            ppr_tier: build_tier(
                self.ppr_tier,
                self.ppr_tier_low,
                self.ppr_tier_high,
                self.ppr_tier_first,
                self.ppr_tier_last,
                self.ppr_pos_rank,
            ),
        }
    }

    fn adp(&self) -> [(AdpSource, Option<f64>); 3] {
        [
            (AdpSource::Espn, self.adp_espn),
            (AdpSource::Sleeper, self.adp_sleeper),
            (AdpSource::Consensus, self.adp_consensus),
        ]
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<PlayerPool, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut pool = PlayerPool::default();

    for result in reader.deserialize::<RawPlayerRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let name = raw.name.trim();
        if name.is_empty() {
            warn!("skipping player {}: empty name", raw.id);
            continue;
        }
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping player '{}': unknown position '{}'", name, raw.position);
            continue;
        };
        let Some(source) = RankingSource::from_str_source(&raw.source) else {
            warn!("skipping player '{}': unknown ranking source '{}'", name, raw.source);
            continue;
        };

        if !pool.contains(raw.id) {
            pool.upsert(Player::new(raw.id, name, position, raw.team.trim()));
        }
        let Some(player) = pool.get_mut(raw.id) else {
            continue;
        };
        if player.position != position {
            warn!(
                "skipping {} row for '{}': position {} conflicts with {}",
                source.display_str(),
                name,
                position,
                player.position
            );
            continue;
        }
        if player.ranks.insert(source, raw.record()).is_some() {
            warn!(
                "duplicate {} ranking for '{}', using latest row",
                source.display_str(),
                name
            );
        }
        for (adp_source, value) in raw.adp() {
            match value {
                Some(v) if v.is_finite() => {
                    player.adp.insert(adp_source, v);
                }
                Some(_) => warn!(
                    "ignoring non-finite {} ADP for '{}'",
                    adp_source.display_str(),
                    name
                ),
                None => {}
            }
        }
    }

    Ok(pool)
}

/// Log every ranking whose position rank falls outside its tier.
fn warn_tier_mismatches(pool: &PlayerPool) -> usize {
    let mut mismatches = 0;
    for player in pool.iter() {
        for (source, record) in &player.ranks {
            for format in [ScoringFormat::Standard, ScoringFormat::Ppr] {
                if let Err(e) = record.check_tier_consistency(format) {
                    warn!(
                        "{} ({}) {} {:?}: {}",
                        player.name,
                        player.id,
                        source.display_str(),
                        format,
                        e
                    );
                    mismatches += 1;
                }
            }
        }
    }
    mismatches
}

/// Load the player pool from a CSV file.
pub fn load_players(path: &Path) -> Result<PlayerPool, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let pool = load_players_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if pool.is_empty() {
        return Err(ImportError::Validation(format!(
            "{} produced zero valid players",
            path.display()
        )));
    }
    let mismatches = warn_tier_mismatches(&pool);
    info!(
        "Loaded {} players from {} ({} tier mismatches)",
        pool.len(),
        path.display(),
        mismatches
    );
    Ok(pool)
}

/// Attach saved custom rankings as the `Custom` source. Returns how many
/// players received one; ids not in the pool are skipped.
pub fn apply_custom_ranks(pool: &mut PlayerPool, ranks: &HashMap<PlayerId, RankingRecord>) -> usize {
    let mut applied = 0;
    for (&id, record) in ranks {
        match pool.get_mut(id) {
            Some(player) => {
                player.ranks.insert(RankingSource::Custom, record.clone());
                applied += 1;
            }
            None => warn!("custom ranking for unknown player id {}", id),
        }
    }
    applied
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,name,position,team,source,overall_rank,ppr_overall_rank,pos_rank,ppr_pos_rank,\
tier,tier_low,tier_high,tier_first,tier_last,ppr_tier,ppr_tier_low,ppr_tier_high,ppr_tier_first,ppr_tier_last,\
adp_espn,adp_sleeper,adp_consensus";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn rows_for_one_player_merge() {
        let data = csv_with(&[
            "1,Christian McCaffrey,RB,SF,fantasypros,1,1,1,1,1,90,100,1,3,1,92,100,1,2,1.2,,",
            "1,Christian McCaffrey,RB,SF,espn,2,1,1,1,,,,,,,,,,,,1.5,1.3",
        ]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 1);

        let cmc = pool.get(1).unwrap();
        assert_eq!(cmc.position, Position::RunningBack);
        assert_eq!(cmc.team, "SF");
        assert_eq!(cmc.ranks.len(), 2);
        assert_eq!(cmc.ranks[&RankingSource::Espn].overall_rank, Some(2));
        let tier = cmc.ranks[&RankingSource::FantasyPros].tier.as_ref().unwrap();
        assert_eq!(tier.index_range, (1, 3));
        assert_eq!(tier.value_range, (90.0, 100.0));
        assert_eq!(cmc.adp[&AdpSource::Espn], 1.2);
        assert_eq!(cmc.adp[&AdpSource::Sleeper], 1.5);
        assert_eq!(cmc.adp[&AdpSource::Consensus], 1.3);
    }

    #[test]
    fn malformed_rows_skipped() {
        let data = csv_with(&[
            "1,Josh Allen,QB,BUF,fantasypros,20,22,1,1,1,,,,,,,,,,20.5,,",
            "x,Bad Id,QB,BUF,fantasypros,,,,,,,,,,,,,,,,,",
            "2,Mystery Man,LB,FA,fantasypros,,,,,,,,,,,,,,,,,",
            "3,Wrong Source,WR,FA,yahoo,,,,,,,,,,,,,,,,,",
            "4,Travis Kelce,TE,KC,fantasypros,30,25,1,1,,,,,,,,,,,28.1,,",
        ]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        let ids: Vec<PlayerId> = pool.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn conflicting_position_row_is_ignored() {
        let data = csv_with(&[
            "7,Taysom Hill,TE,NO,fantasypros,,,20,20,,,,,,,,,,,,,",
            "7,Taysom Hill,QB,NO,espn,,,40,40,,,,,,,,,,,,,",
        ]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        let hill = pool.get(7).unwrap();
        assert_eq!(hill.position, Position::TightEnd);
        assert!(!hill.ranks.contains_key(&RankingSource::Espn));
    }

    #[test]
    fn non_finite_adp_ignored() {
        let data = csv_with(&["5,Ja'Marr Chase,WR,CIN,fantasypros,2,2,1,1,,,,,,,,,,,NaN,3.0,"]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        let chase = pool.get(5).unwrap();
        assert!(!chase.adp.contains_key(&AdpSource::Espn));
        assert_eq!(chase.adp[&AdpSource::Sleeper], 3.0);
    }

    #[test]
    fn defenses_and_kickers_import() {
        let data = csv_with(&[
            "300,49ers D/ST,DST,SF,espn,150,150,1,1,,,,,,,,,,,120.0,,",
            "301,Justin Tucker,K,BAL,espn,160,160,1,1,,,,,,,,,,,130.0,,",
        ]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        assert_eq!(pool.get(300).unwrap().position, Position::Defense);
        assert_eq!(pool.get(301).unwrap().position, Position::Kicker);
    }

    #[test]
    fn missing_tier_bounds_use_pos_rank() {
        let data = csv_with(&["9,Puka Nacua,WR,LAR,fantasypros,12,9,6,4,2,,,,,3,,,,,14.0,,"]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        let record = &pool.get(9).unwrap().ranks[&RankingSource::FantasyPros];
        assert_eq!(record.tier.as_ref().unwrap().index_range, (6, 6));
        assert_eq!(record.ppr_tier.as_ref().unwrap().index_range, (4, 4));
        assert_eq!(warn_tier_mismatches(&pool), 0);
    }

    #[test]
    fn tier_mismatch_counted() {
        let data = csv_with(&["9,Puka Nacua,WR,LAR,fantasypros,12,9,6,4,2,,,1,3,,,,,,14.0,,"]);
        let pool = load_players_from_reader(data.as_bytes()).unwrap();
        assert_eq!(warn_tier_mismatches(&pool), 1);
    }

    #[test]
    fn custom_ranks_overlay() {
        let data = csv_with(&["1,Josh Allen,QB,BUF,fantasypros,20,22,1,1,,,,,,,,,,,20.5,,"]);
        let mut pool = load_players_from_reader(data.as_bytes()).unwrap();
        let mut custom = HashMap::new();
        custom.insert(
            1,
            RankingRecord {
                pos_rank: Some(2),
                ..Default::default()
            },
        );
        custom.insert(999, RankingRecord::default());

        assert_eq!(apply_custom_ranks(&mut pool, &custom), 1);
        let allen = pool.get(1).unwrap();
        assert_eq!(allen.ranks[&RankingSource::Custom].pos_rank, Some(2));
        assert!(allen.ranks.contains_key(&RankingSource::FantasyPros));
    }

    #[test]
    fn empty_csv_returns_empty_pool() {
        let pool = load_players_from_reader(HEADER.as_bytes()).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_players(Path::new("/nonexistent/players.csv")).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
