// Configuration loading and parsing (league.toml, board.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use pickwatch_core::rankings::metrics::{BoardSettings, SortMetric};
use pickwatch_core::rankings::player::{AdpSource, RankingSource, ScoringFormat};
use pickwatch_core::session::{DraftConfig, DraftError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub draft: DraftConfig,
    pub board: BoardSettings,
    pub sort_metric: SortMetric,
    pub db_path: String,
    pub data_paths: DataPaths,
}

impl Config {
    /// Database location. An empty `[database] path` resolves to the
    /// platform data directory.
    pub fn resolved_db_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.db_path.trim().is_empty() {
            return Ok(PathBuf::from(&self.db_path));
        }
        let dirs = directories::ProjectDirs::from("", "", "pickwatch").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "database.path".into(),
                message: "empty, and no platform data directory is available".into(),
            }
        })?;
        Ok(dirs.data_dir().join("pickwatch.db"))
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: u32,
    /// The user's first-round draft slot.
    pub my_pick: u32,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    /// "standard" or "ppr".
    pub scoring: String,
}

fn default_rounds() -> u32 {
    16
}

// ---------------------------------------------------------------------------
// board.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct BoardFile {
    board: BoardSection,
    database: DatabaseSection,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct BoardSection {
    ranking_source: String,
    adp_source: String,
    #[serde(default = "default_sort_metric")]
    sort_metric: String,
}

fn default_sort_metric() -> String {
    "pos_rank".into()
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/board.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let league_path = config_dir.join("league.toml");
    let league_file: LeagueFile = parse_file(&league_path)?;
    let league = league_file.league;

    let board_path = config_dir.join("board.toml");
    let board_file: BoardFile = parse_file(&board_path)?;

    let board = validate_board(&league, &board_file.board)?;
    let sort_metric = SortMetric::from_str_metric(&board_file.board.sort_metric).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "board.sort_metric".into(),
            message: format!("unknown metric '{}'", board_file.board.sort_metric),
        }
    })?;
    let draft = DraftConfig::new(league.num_teams, league.my_pick, league.rounds)
        .map_err(draft_validation_error)?;

    if board_file.data_paths.players.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.players".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(Config {
        league,
        draft,
        board,
        sort_metric,
        db_path: board_file.database.path,
        data_paths: board_file.data_paths,
    })
}

/// Copy each `defaults/*.toml` template into `config/` unless a file of the
/// same name is already there. Returns the files written.
///
/// A checkout with `config/` but no `defaults/` is left alone.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        if config_dir.is_dir() {
            return Ok(Vec::new());
        }
        return Err(copy_error(format!(
            "no defaults/ or config/ directory in {}",
            base_dir.display()
        )));
    }

    let mut templates: Vec<PathBuf> = std::fs::read_dir(&defaults_dir)
        .map_err(|e| copy_error(format!("cannot list {}: {e}", defaults_dir.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    templates.sort();

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| copy_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let mut written = Vec::new();
    for template in templates {
        let Some(name) = template.file_name() else {
            continue;
        };
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&template, &target).map_err(|e| {
            copy_error(format!("cannot copy {}: {e}", template.display()))
        })?;
        info!("Created {} from defaults", target.display());
        written.push(target);
    }
    Ok(written)
}

/// Load config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn copy_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_board(league: &LeagueConfig, board: &BoardSection) -> Result<BoardSettings, ConfigError> {
    let format = ScoringFormat::from_str_format(&league.scoring).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "league.scoring".into(),
            message: format!("expected \"standard\" or \"ppr\", got '{}'", league.scoring),
        }
    })?;
    let ranking_source = RankingSource::from_str_source(&board.ranking_source).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "board.ranking_source".into(),
            message: format!("unknown ranking source '{}'", board.ranking_source),
        }
    })?;
    let adp_source = AdpSource::from_str_source(&board.adp_source).ok_or_else(|| {
        ConfigError::ValidationError {
            field: "board.adp_source".into(),
            message: format!("unknown ADP source '{}'", board.adp_source),
        }
    })?;
    Ok(BoardSettings {
        format,
        ranking_source,
        adp_source,
    })
}

fn draft_validation_error(err: DraftError) -> ConfigError {
    match err {
        DraftError::InvalidConfig { field, message } => ConfigError::ValidationError {
            field: format!("league.{field}"),
            message,
        },
        other => ConfigError::ValidationError {
            field: "league".into(),
            message: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
