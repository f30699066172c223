// Application state and the interactive command loop.
//
// Reads one command per line, applies it to the draft session, persists the
// result and writes a text reply. Parsing is kept separate from execution so
// both can be tested without a terminal.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use pickwatch_core::forecast::runs::RUN_LOOKAHEAD;
use pickwatch_core::rankings::metrics::{get_player_metrics, SortMetric};
use pickwatch_core::rankings::player::{
    AdpSource, PlayerId, Position, RankingRecord, RankingSource, ScoringFormat, Tier,
    RANKABLE_POSITIONS,
};
use pickwatch_core::session::DraftSession;

use crate::db::Database;

/// Rows shown by `board`.
pub const BOARD_ROWS: usize = 15;

const PURGED_KEY: &str = "purged_players";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Which part of the board settings `set` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    Scoring(ScoringFormat),
    Rankings(RankingSource),
    Adp(AdpSource),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Record a pick; defaults to the pick on the clock.
    Draft { player: PlayerId, pick: Option<u32> },
    /// Undo a pick; defaults to the latest recorded pick.
    Undo { pick: Option<u32> },
    Purge { player: PlayerId },
    Sort(SortMetric),
    /// Show one position list, or the overall view.
    Board(Option<Position>),
    Predict,
    Alerts,
    /// 1-based team number; defaults to the user's team.
    Roster(Option<usize>),
    Target(PlayerId),
    Targets,
    /// Save a custom position rank, and optionally a tier, for a player.
    Rank {
        player: PlayerId,
        pos_rank: u32,
        tier: Option<u32>,
    },
    Set(SettingChange),
    Resimulate,
    /// Abandon the current draft and start a new one.
    NewDraft,
    Status,
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<T, String> {
    let arg = arg.ok_or_else(|| format!("missing {what}"))?;
    arg.parse()
        .map_err(|_| format!("'{arg}' is not a valid {what}"))
}

fn parse_optional<T: std::str::FromStr>(arg: Option<&str>, what: &str) -> Result<Option<T>, String> {
    match arg {
        None => Ok(None),
        some => parse_number(some, what).map(Some),
    }
}

/// Parse one input line. Blank input is an error; the loop skips it first.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".into());
    };
    let args: Vec<&str> = words.collect();
    if args.len() > 3 {
        return Err(format!("too many arguments for '{verb}'"));
    }
    let first = args.first().copied();
    let second = args.get(1).copied();
    let third = args.get(2).copied();

    let command = match verb.to_lowercase().as_str() {
        "draft" | "d" => Command::Draft {
            player: parse_number(first, "player id")?,
            pick: parse_optional(second, "pick number")?,
        },
        "undo" | "u" => Command::Undo {
            pick: parse_optional(first, "pick number")?,
        },
        "purge" | "p" => Command::Purge {
            player: parse_number(first, "player id")?,
        },
        "sort" => {
            let arg = first.ok_or("missing sort metric")?;
            Command::Sort(
                SortMetric::from_str_metric(arg).ok_or_else(|| format!("unknown metric '{arg}'"))?,
            )
        }
        "board" | "b" => match first {
            None => Command::Board(None),
            Some(arg) => Command::Board(Some(
                Position::from_str_pos(arg).ok_or_else(|| format!("unknown position '{arg}'"))?,
            )),
        },
        "predict" => Command::Predict,
        "alerts" => Command::Alerts,
        "roster" | "r" => Command::Roster(parse_optional(first, "team number")?),
        "target" | "t" => Command::Target(parse_number(first, "player id")?),
        "targets" => Command::Targets,
        "rank" => Command::Rank {
            player: parse_number(first, "player id")?,
            pos_rank: parse_number(second, "position rank")?,
            tier: parse_optional(third, "tier")?,
        },
        "set" => {
            let key = first.ok_or("usage: set <scoring|rankings|adp> <value>")?;
            let value = second.ok_or_else(|| format!("missing value for '{key}'"))?;
            let change = match key.to_lowercase().as_str() {
                "scoring" => ScoringFormat::from_str_format(value).map(SettingChange::Scoring),
                "rankings" | "ranking" => {
                    RankingSource::from_str_source(value).map(SettingChange::Rankings)
                }
                "adp" => AdpSource::from_str_source(value).map(SettingChange::Adp),
                _ => return Err(format!("unknown setting '{key}'")),
            };
            Command::Set(change.ok_or_else(|| format!("unknown {key} value '{value}'"))?)
        }
        "resim" => Command::Resimulate,
        "new" => Command::NewDraft,
        "status" | "s" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };

    let takes_args = matches!(
        command,
        Command::Draft { .. }
            | Command::Undo { .. }
            | Command::Purge { .. }
            | Command::Sort(_)
            | Command::Board(_)
            | Command::Roster(_)
            | Command::Target(_)
            | Command::Rank { .. }
            | Command::Set(_)
    );
    if !takes_args && !args.is_empty() {
        return Err(format!("'{verb}' takes no arguments"));
    }
    let max_args = match command {
        Command::Rank { .. } => 3,
        Command::Draft { .. } | Command::Set(_) => 2,
        _ => 1,
    };
    if args.len() > max_args {
        return Err(format!("too many arguments for '{verb}'"));
    }
    Ok(command)
}

pub const HELP: &str = "\
commands:
  draft <id> [pick]     record a pick (default: pick on the clock)
  undo [pick]           undo a pick (default: latest)
  purge <id>            hide or restore a player
  sort <metric>         pos_rank | overall_rank | overall_or_pos_rank | adp
  board [pos]           ranked list (QB, RB, WR, TE) or overall
  predict               players projected gone before your next picks
  alerts                positional run alerts
  roster [team]         a team's roster (default: yours)
  target <id>           add or remove a target
  targets               saved targets
  rank <id> <n> [tier]  save a custom ranking (used by 'set rankings custom')
  set <key> <value>     scoring standard|ppr, rankings <source>, adp <source>
  resim                 re-run the pick simulation
  new                   abandon this draft and start a new one
  status                draft position
  quit";

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the loop does after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

pub struct AppState {
    pub league_name: String,
    pub session: DraftSession,
    pub db: Database,
    pub draft_id: String,
    pub targets: Vec<PlayerId>,
}

impl AppState {
    /// Attach to the draft id stored in `db`, or start a new one.
    pub fn new(league_name: &str, session: DraftSession, db: Database) -> Result<Self> {
        let draft_id = match db.get_draft_id()? {
            Some(id) => id,
            None => {
                let id = Database::generate_draft_id();
                db.set_draft_id(&id)?;
                info!("Started new draft {}", id);
                id
            }
        };
        let targets = db.load_targets(&draft_id)?;
        Ok(AppState {
            league_name: league_name.to_string(),
            session,
            db,
            draft_id,
            targets,
        })
    }

    /// Apply a command. Draft rule violations become replies; storage
    /// failures are errors.
    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        debug!("Command: {:?}", command);
        let reply = match command {
            Command::Draft { player, pick } => self.draft(player, pick)?,
            Command::Undo { pick } => self.undo(pick)?,
            Command::Purge { player } => self.purge(player)?,
            Command::Sort(metric) => {
                self.session.sort_by(metric);
                format!("sorted by {:?}", metric)
            }
            Command::Board(position) => self.board(position),
            Command::Predict => self.predictions(),
            Command::Alerts => self.alerts(),
            Command::Roster(team) => self.roster(team),
            Command::Target(player) => self.toggle_target(player)?,
            Command::Targets => self.targets(),
            Command::Rank {
                player,
                pos_rank,
                tier,
            } => self.rank(player, pos_rank, tier)?,
            Command::Set(change) => self.change_setting(change),
            Command::Resimulate => {
                self.session.resimulate();
                format!("re-simulated from pick {}", self.session.current_pick())
            }
            Command::NewDraft => self.new_draft()?,
            Command::Status => self.status(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Flow::Quit),
        };
        Ok(Flow::Continue(reply))
    }

    fn player_label(&self, id: PlayerId) -> String {
        match self.session.pool().get(id) {
            Some(p) => format!("{} ({} {})", p.name, p.position, p.team),
            None => format!("player {id}"),
        }
    }

    fn with_alerts(&self, mut reply: String) -> String {
        for alert in self.session.alerts() {
            let _ = write!(reply, "\n  ! {alert}");
        }
        reply
    }

    fn draft(&mut self, player: PlayerId, pick: Option<u32>) -> Result<String> {
        let pick = pick.unwrap_or_else(|| self.session.current_pick());
        let was_purged = self.session.ranks().is_purged(player);
        match self.session.draft_player(player, pick) {
            Ok(true) => {
                self.db
                    .record_pick(pick, player, &self.draft_id)
                    .context("failed to persist pick")?;
                // Drafting clears a purge.
                if was_purged {
                    self.save_purged()?;
                }
                let reply = format!("pick {}: {}", pick, self.player_label(player));
                Ok(self.with_alerts(reply))
            }
            Ok(false) => Ok(format!("pick {pick} not recorded: already drafted or filled")),
            Err(e) => Ok(format!("error: {e}")),
        }
    }

    fn undo(&mut self, pick: Option<u32>) -> Result<String> {
        let Some(pick) = pick.or_else(|| self.session.pick_log().last().map(|(p, _)| p)) else {
            return Ok("nothing to undo".into());
        };
        match self.session.undraft_pick(pick) {
            Ok(Some(player)) => {
                self.db
                    .delete_pick(pick, &self.draft_id)
                    .context("failed to delete pick")?;
                Ok(format!("undid pick {}: {}", pick, self.player_label(player)))
            }
            Ok(None) => Ok(format!("pick {pick} is empty")),
            Err(e) => Ok(format!("error: {e}")),
        }
    }

    fn purge(&mut self, player: PlayerId) -> Result<String> {
        match self.session.purge_player(player) {
            Ok(true) => {
                self.save_purged()?;
                let verb = if self.session.ranks().is_purged(player) {
                    "purged"
                } else {
                    "restored"
                };
                Ok(format!("{verb} {}", self.player_label(player)))
            }
            Ok(false) => Ok(format!("{} is drafted", self.player_label(player))),
            Err(e) => Ok(format!("error: {e}")),
        }
    }

    fn save_purged(&self) -> Result<()> {
        let value = serde_json::to_value(self.session.ranks().purged())
            .context("failed to serialize purge list")?;
        self.db.save_state(PURGED_KEY, &value)
    }

    fn toggle_target(&mut self, player: PlayerId) -> Result<String> {
        if !self.session.pool().contains(player) {
            return Ok(format!("error: unknown player id {player}"));
        }
        let reply = if let Some(idx) = self.targets.iter().position(|&t| t == player) {
            self.targets.remove(idx);
            format!("untargeted {}", self.player_label(player))
        } else {
            self.targets.push(player);
            format!("targeted {}", self.player_label(player))
        };
        self.db
            .save_targets(&self.draft_id, &self.targets)
            .context("failed to save targets")?;
        Ok(reply)
    }

    fn rank(&mut self, player: PlayerId, pos_rank: u32, tier: Option<u32>) -> Result<String> {
        if pos_rank == 0 || tier == Some(0) {
            return Ok("error: ranks and tiers start at 1".into());
        }
        let tier = tier.map(|t| Tier {
            tier: t,
            value_range: (0.0, 0.0),
            index_range: (pos_rank, pos_rank),
        });
        // One custom board serves both scoring formats.
        let record = RankingRecord {
            pos_rank: Some(pos_rank),
            ppr_pos_rank: Some(pos_rank),
            tier: tier.clone(),
            ppr_tier: tier,
            ..Default::default()
        };
        if let Err(e) = self.session.set_custom_rank(player, record.clone()) {
            return Ok(format!("error: {e}"));
        }
        let mut custom = self.db.load_custom_ranks()?;
        custom.insert(player, record);
        self.db
            .save_custom_ranks(&custom)
            .context("failed to save custom rankings")?;
        Ok(format!(
            "custom rank {} for {}",
            pos_rank,
            self.player_label(player)
        ))
    }

    fn new_draft(&mut self) -> Result<String> {
        self.db.clear_draft().context("failed to clear draft")?;
        let id = Database::generate_draft_id();
        self.db.set_draft_id(&id)?;
        info!("Abandoned draft {}, started {}", self.draft_id, id);
        self.draft_id = id;
        self.targets.clear();
        self.session.reset();
        Ok(format!("started new draft {}", self.draft_id))
    }

    fn change_setting(&mut self, change: SettingChange) -> String {
        let mut settings = *self.session.settings();
        match change {
            SettingChange::Scoring(format) => settings.format = format,
            SettingChange::Rankings(source) => settings.ranking_source = source,
            SettingChange::Adp(source) => settings.adp_source = source,
        }
        self.session.set_board_settings(settings);
        format!(
            "scoring {:?}, rankings {}, ADP {}",
            settings.format,
            settings.ranking_source.display_str(),
            settings.adp_source.display_str()
        )
    }

    // -- views --

    fn board_line(&self, rank: usize, id: PlayerId) -> String {
        let Some(player) = self.session.pool().get(id) else {
            return format!("{rank:>3}. player {id}");
        };
        let metrics = get_player_metrics(player, self.session.settings());
        let tier = metrics.tier.map_or("-".to_string(), |t| t.to_string());
        let adp = metrics.adp.map_or("-".to_string(), |a| format!("{a:.1}"));
        let mut line = format!(
            "{rank:>3}. {:<4} {:<26} {:<4} tier {:>2}  adp {:>5}",
            id,
            player.name,
            player.position.display_str(),
            tier,
            adp
        );
        if let Some(turns) = self.session.predicted().get(id) {
            let _ = write!(line, "  gone~{turns}");
        }
        if self.targets.contains(&id) {
            line.push_str("  *");
        }
        line
    }

    fn board(&self, position: Option<Position>) -> String {
        let ids = match position {
            Some(pos) if pos.is_rankable() => self.session.ranks().position_list(pos),
            Some(pos) => return format!("{pos} has no ranked list"),
            None => self.session.ranks().by_overall(),
        };
        let heading = match position {
            Some(pos) => format!("{pos} by {:?}", self.session.ranks().active_metric()),
            None => "overall".to_string(),
        };
        let mut out = heading;
        for (i, &id) in ids.iter().take(BOARD_ROWS).enumerate() {
            out.push('\n');
            out.push_str(&self.board_line(i + 1, id));
        }
        if ids.is_empty() {
            out.push_str("\n  (empty)");
        }
        out
    }

    fn predictions(&self) -> String {
        let mut by_turn: BTreeMap<u32, Vec<PlayerId>> = BTreeMap::new();
        for (id, turns) in self.session.predicted().iter() {
            if turns <= RUN_LOOKAHEAD {
                by_turn.entry(turns).or_default().push(id);
            }
        }
        let order = self.session.ranks().by_adp();
        let mut out = format!(
            "from pick {} (your next: {})",
            self.session.current_pick(),
            self.session.my_next_pick()
        );
        for (turns, ids) in &mut by_turn {
            ids.sort_by_key(|id| order.iter().position(|x| x == id).unwrap_or(usize::MAX));
            let label = match turns {
                0 => "your pick now".to_string(),
                1 => "gone before your next pick".to_string(),
                n => format!("gone before your pick {n} turns out"),
            };
            let names: Vec<String> = ids.iter().map(|&id| self.player_label(id)).collect();
            let _ = write!(out, "\n{label}:\n  {}", names.join("\n  "));
        }
        out
    }

    fn alerts(&self) -> String {
        if self.session.alerts().is_empty() {
            return "no run alerts".into();
        }
        self.session
            .alerts()
            .iter()
            .map(|a| format!("! {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn roster(&self, team: Option<usize>) -> String {
        let idx = match team {
            Some(n) if n >= 1 => n - 1,
            Some(_) => return "team numbers start at 1".into(),
            None => self.session.config().my_roster_idx(),
        };
        let Some(roster) = self.session.rosters().roster(idx) else {
            return format!("no team {}", idx + 1);
        };
        let mut out = format!("team {} ({} players)", idx + 1, roster.picks.len());
        for pos in RANKABLE_POSITIONS {
            let names: Vec<String> = roster
                .by_position
                .get(&pos)
                .map(|ids| ids.iter().map(|&id| self.player_label(id)).collect())
                .unwrap_or_default();
            let _ = write!(out, "\n  {pos}: {}", names.join(", "));
        }
        let others: Vec<String> = roster
            .picks
            .iter()
            .filter(|&&id| {
                self.session
                    .pool()
                    .get(id)
                    .is_some_and(|p| !p.position.is_rankable())
            })
            .map(|&id| self.player_label(id))
            .collect();
        if !others.is_empty() {
            let _ = write!(out, "\n  other: {}", others.join(", "));
        }
        out
    }

    fn targets(&self) -> String {
        if self.targets.is_empty() {
            return "no targets".into();
        }
        let lines: Vec<String> = self
            .targets
            .iter()
            .map(|&id| {
                let state = if self.session.ranks().is_available(id) {
                    match self.session.predicted().get(id) {
                        Some(turns) => format!("projected gone in {turns}"),
                        None => "available".to_string(),
                    }
                } else {
                    "off the board".to_string()
                };
                format!("{} - {state}", self.player_label(id))
            })
            .collect();
        lines.join("\n")
    }

    fn status(&self) -> String {
        let s = &self.session;
        if s.is_complete() {
            return format!("{}: draft complete ({} picks)", self.league_name, s.pick_log().count());
        }
        let [next, after] = s.picks_until();
        format!(
            "{}: pick {} (round {}){}\nyour next pick: {} ({} picks away, then {})",
            self.league_name,
            s.current_pick(),
            s.current_round(),
            if s.is_my_turn() { " - you are on the clock" } else { "" },
            s.my_next_pick(),
            next,
            after
        )
    }
}

// ---------------------------------------------------------------------------
// Recovery and the loop
// ---------------------------------------------------------------------------

/// Restore purges and picks saved for the current draft. Returns whether any
/// picks were replayed.
pub fn recover_from_db(state: &mut AppState) -> Result<bool> {
    if let Some(value) = state.db.load_state(PURGED_KEY)? {
        let purged: Vec<PlayerId> =
            serde_json::from_value(value).context("failed to read purge list")?;
        state.session.restore_purges(&purged);
    }

    if !state.db.has_draft_in_progress(&state.draft_id)? {
        info!("No draft in progress for draft_id={}, starting fresh", state.draft_id);
        return Ok(false);
    }

    let picks: Vec<(u32, PlayerId)> = state
        .db
        .load_picks(&state.draft_id)?
        .into_iter()
        .map(|p| (p.pick_number, p.player_id))
        .collect();
    let applied = state.session.replay_picks(&picks);
    info!(
        "Crash recovery complete: {} of {} picks restored for draft_id={}",
        applied,
        picks.len(),
        state.draft_id
    );
    Ok(true)
}

/// Read commands from `input` until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(state: &mut AppState, input: R, mut out: W) -> Result<()> {
    writeln!(out, "{}", state.status())?;
    for alert in state.session.alerts() {
        writeln!(out, "! {alert}")?;
    }
    write!(out, "pick {}> ", state.session.current_pick())?;
    out.flush()?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        if !line.trim().is_empty() {
            match parse_command(&line) {
                Ok(command) => match state.execute(command)? {
                    Flow::Continue(reply) => writeln!(out, "{reply}")?,
                    Flow::Quit => break,
                },
                Err(message) => writeln!(out, "{message}")?,
            }
        }
        write!(out, "pick {}> ", state.session.current_pick())?;
        out.flush()?;
    }
    info!("Command loop finished at pick {}", state.session.current_pick());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pickwatch_core::rankings::metrics::BoardSettings;
    use pickwatch_core::rankings::player::{Player, PlayerPool, RankingRecord};
    use pickwatch_core::session::DraftConfig;

    fn player(id: PlayerId, pos: Position, adp: f64) -> Player {
        Player::new(id, &format!("Player {id}"), pos, "FA")
            .with_ranks(
                RankingSource::FantasyPros,
                RankingRecord {
                    overall_rank: Some(id),
                    pos_rank: Some(id),
                    ..Default::default()
                },
            )
            .with_adp(AdpSource::Espn, adp)
    }

    fn pool() -> PlayerPool {
        let mut players: Vec<Player> = (1..=30)
            .map(|i| player(i, Position::RunningBack, i as f64))
            .chain((31..=60).map(|i| player(i, Position::WideReceiver, (i - 30) as f64 + 0.5)))
            .collect();
        players.push(player(90, Position::Defense, 150.0));
        PlayerPool::new(players)
    }

    fn app_with(db: Database) -> AppState {
        let config = DraftConfig::new(10, 2, 6).unwrap();
        let session = DraftSession::new(pool(), config, BoardSettings::default());
        AppState::new("Test League", session, db).unwrap()
    }

    fn app() -> AppState {
        app_with(Database::open(":memory:").unwrap())
    }

    fn reply(state: &mut AppState, line: &str) -> String {
        match state.execute(parse_command(line).unwrap()).unwrap() {
            Flow::Continue(text) => text,
            Flow::Quit => panic!("unexpected quit"),
        }
    }

    #[test]
    fn parse_basic_commands() {
        assert_eq!(
            parse_command("draft 12"),
            Ok(Command::Draft { player: 12, pick: None })
        );
        assert_eq!(
            parse_command("  D 12 7 "),
            Ok(Command::Draft { player: 12, pick: Some(7) })
        );
        assert_eq!(parse_command("undo"), Ok(Command::Undo { pick: None }));
        assert_eq!(parse_command("undo 4"), Ok(Command::Undo { pick: Some(4) }));
        assert_eq!(parse_command("sort adp"), Ok(Command::Sort(SortMetric::Adp)));
        assert_eq!(
            parse_command("board te"),
            Ok(Command::Board(Some(Position::TightEnd)))
        );
        assert_eq!(parse_command("roster 3"), Ok(Command::Roster(Some(3))));
        assert_eq!(
            parse_command("set scoring ppr"),
            Ok(Command::Set(SettingChange::Scoring(ScoringFormat::Ppr)))
        );
        assert_eq!(
            parse_command("set adp sleeper"),
            Ok(Command::Set(SettingChange::Adp(AdpSource::Sleeper)))
        );
        assert_eq!(
            parse_command("rank 12 3 2"),
            Ok(Command::Rank { player: 12, pos_rank: 3, tier: Some(2) })
        );
        assert_eq!(
            parse_command("rank 12 3"),
            Ok(Command::Rank { player: 12, pos_rank: 3, tier: None })
        );
        assert_eq!(parse_command("new"), Ok(Command::NewDraft));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
    }

    #[test]
    fn parse_errors_are_messages() {
        assert!(parse_command("").is_err());
        assert!(parse_command("draft").unwrap_err().contains("missing player id"));
        assert!(parse_command("draft abc").unwrap_err().contains("not a valid"));
        assert!(parse_command("board LB").unwrap_err().contains("unknown position"));
        assert!(parse_command("sort vibes").unwrap_err().contains("unknown metric"));
        assert!(parse_command("status now").unwrap_err().contains("takes no arguments"));
        assert!(parse_command("purge 1 2").unwrap_err().contains("too many"));
        assert!(parse_command("draft 1 2 3").unwrap_err().contains("too many"));
        assert!(parse_command("rank 1 2 3 4").unwrap_err().contains("too many"));
        assert!(parse_command("rank 1").unwrap_err().contains("missing position rank"));
        assert!(parse_command("new now").unwrap_err().contains("takes no arguments"));
        assert!(parse_command("set color red").unwrap_err().contains("unknown setting"));
        assert!(parse_command("dance").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn draft_persists_and_undo_deletes() {
        let mut state = app();
        let text = reply(&mut state, "draft 1");
        assert!(text.starts_with("pick 1: Player 1"));
        assert_eq!(state.db.pick_count(&state.draft_id).unwrap(), 1);

        let text = reply(&mut state, "undo");
        assert!(text.starts_with("undid pick 1"));
        assert_eq!(state.db.pick_count(&state.draft_id).unwrap(), 0);
        assert_eq!(reply(&mut state, "undo"), "nothing to undo");
    }

    #[test]
    fn draft_errors_are_replies_not_failures() {
        let mut state = app();
        assert!(reply(&mut state, "draft 999").starts_with("error: unknown player"));
        assert!(reply(&mut state, "draft 1 61").starts_with("error: pick 61"));
        reply(&mut state, "draft 1");
        assert!(reply(&mut state, "draft 1").contains("not recorded"));
        assert_eq!(state.db.pick_count(&state.draft_id).unwrap(), 1);
    }

    #[test]
    fn targets_toggle_and_persist() {
        let mut state = app();
        assert!(reply(&mut state, "target 5").starts_with("targeted"));
        assert!(reply(&mut state, "target 7").starts_with("targeted"));
        assert!(reply(&mut state, "target 5").starts_with("untargeted"));
        assert_eq!(state.db.load_targets(&state.draft_id).unwrap(), vec![7]);
        assert!(reply(&mut state, "targets").contains("Player 7"));
    }

    #[test]
    fn board_shows_predictions_and_hides_purged() {
        let mut state = app();
        let board = reply(&mut state, "board rb");
        assert!(board.starts_with("RB by PosRank"));
        assert!(board.contains("Player 1 "));
        assert!(board.contains("gone~"));

        reply(&mut state, "purge 1");
        let board = reply(&mut state, "board rb");
        assert!(!board.contains("Player 1 "));
        assert_eq!(reply(&mut state, "board dst"), "DST has no ranked list");
    }

    #[test]
    fn roster_lists_non_rankable_players() {
        let mut state = app();
        reply(&mut state, "draft 90 2");
        let roster = reply(&mut state, "roster");
        assert!(roster.starts_with("team 2 (1 players)"));
        assert!(roster.contains("other: Player 90"));
        assert_eq!(reply(&mut state, "roster 11"), "no team 11");
    }

    #[test]
    fn status_reports_turn() {
        let mut state = app();
        reply(&mut state, "draft 1");
        let status = reply(&mut state, "status");
        assert!(status.contains("pick 2 (round 1) - you are on the clock"));
        assert!(status.contains("your next pick: 2 (0 picks away, then 17)"));
    }

    #[test]
    fn recovery_replays_picks_and_purges() {
        let db = Database::open(":memory:").unwrap();
        db.set_draft_id("draft_test").unwrap();
        db.record_pick(1, 3, "draft_test").unwrap();
        db.record_pick(2, 31, "draft_test").unwrap();
        db.save_state(PURGED_KEY, &serde_json::json!([4])).unwrap();

        let mut state = app_with(db);
        assert_eq!(state.draft_id, "draft_test");
        assert!(recover_from_db(&mut state).unwrap());
        assert_eq!(state.session.current_pick(), 3);
        assert_eq!(state.session.drafted_at(2), Some(31));
        assert!(state.session.ranks().is_purged(4));
    }

    #[test]
    fn recovery_without_picks_starts_fresh() {
        let mut state = app();
        assert!(!recover_from_db(&mut state).unwrap());
        assert!(state.draft_id.starts_with("draft_"));
    }

    #[test]
    fn run_loop_reads_until_quit() {
        let mut state = app();
        let input = "draft 1\n\nbogus\nstatus\nquit\ndraft 2\n";
        let mut out = Vec::new();
        run(&mut state, input.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("pick 1: Player 1"));
        assert!(text.contains("unknown command 'bogus'"));
        // Nothing after quit is applied.
        assert_eq!(state.session.current_pick(), 2);
    }

    #[test]
    fn drafting_a_purged_player_updates_stored_purges() {
        let mut state = app();
        reply(&mut state, "purge 5");
        reply(&mut state, "draft 5 1");
        reply(&mut state, "undo 1");
        assert!(state.session.ranks().is_available(5));
        assert_eq!(
            state.db.load_state(PURGED_KEY).unwrap(),
            Some(serde_json::json!([]))
        );

        let AppState { db, .. } = state;
        let mut recovered = app_with(db);
        recover_from_db(&mut recovered).unwrap();
        assert!(!recovered.session.ranks().is_purged(5));
        assert!(recovered.session.ranks().is_available(5));
    }

    #[test]
    fn rank_saves_custom_rankings() {
        let mut state = app();
        assert!(reply(&mut state, "rank 12 1 1").starts_with("custom rank 1 for Player 12"));
        assert!(reply(&mut state, "rank 999 1").starts_with("error: unknown player"));
        assert!(reply(&mut state, "rank 12 0").starts_with("error: ranks and tiers"));

        let saved = state.db.load_custom_ranks().unwrap();
        assert_eq!(saved[&12].pos_rank, Some(1));
        assert_eq!(saved[&12].ppr_tier.as_ref().map(|t| t.tier), Some(1));

        reply(&mut state, "set rankings custom");
        assert_eq!(
            state.session.ranks().position_list(Position::RunningBack)[0],
            12
        );
    }

    #[test]
    fn new_draft_starts_fresh_and_keeps_custom_ranks() {
        let db = Database::open(":memory:").unwrap();
        db.set_draft_id("draft_old").unwrap();
        let mut state = app_with(db);
        reply(&mut state, "draft 1");
        reply(&mut state, "target 7");
        reply(&mut state, "purge 9");
        reply(&mut state, "rank 3 1");

        assert!(reply(&mut state, "new").starts_with("started new draft draft_"));
        assert_ne!(state.draft_id, "draft_old");
        assert_eq!(
            state.db.get_draft_id().unwrap().as_deref(),
            Some(state.draft_id.as_str())
        );
        assert_eq!(state.db.pick_count("draft_old").unwrap(), 0);
        assert!(state.db.load_state(PURGED_KEY).unwrap().is_none());
        assert!(state.db.load_custom_ranks().unwrap().contains_key(&3));
        assert!(state.targets.is_empty());
        assert_eq!(state.session.current_pick(), 1);
        assert!(!state.session.ranks().is_purged(9));
        assert!(!recover_from_db(&mut state).unwrap());
    }
}
