// Pickwatch entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Load the player pool and overlay saved custom rankings
// 5. Build the draft session and restore any draft in progress
// 6. Run the command loop on stdin/stdout

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};

use pickwatch::app;
use pickwatch::config;
use pickwatch::db;
use pickwatch::players;
use pickwatch_core::session::DraftSession;

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Pickwatch starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, pick {}, {} rounds",
        config.league.name,
        config.draft.num_teams(),
        config.draft.my_pick(),
        config.draft.rounds()
    );

    let db_path = config.resolved_db_path()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path = db_path.to_string_lossy().into_owned();
    let db = db::Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    let mut pool = players::load_players(Path::new(&config.data_paths.players))
        .context("failed to load players")?;
    let custom = db.load_custom_ranks()?;
    let applied = players::apply_custom_ranks(&mut pool, &custom);
    info!("Applied {} custom rankings", applied);

    let mut session = DraftSession::new(pool, config.draft, config.board);
    session.sort_by(config.sort_metric);

    let mut state = app::AppState::new(&config.league.name, session, db)?;
    match app::recover_from_db(&mut state) {
        Ok(true) => info!("Draft state restored from previous session"),
        Ok(false) => info!("Starting fresh draft session"),
        Err(e) => {
            error!("Crash recovery failed: {}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    app::run(&mut state, stdin.lock(), stdout.lock())?;

    info!("Pickwatch shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (the terminal is the command prompt).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickwatch.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickwatch=info,pickwatch_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
