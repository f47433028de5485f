//! Binary entry point: resolve the data directory, start file logging, open
//! the SQLite store and hand everything to the TUI until the user exits.
use school_records::config::{log_level, AppPaths};
use school_records::logging::init_logging;
use school_records::{open, run_app, App};

/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable data directory) to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let paths = AppPaths::resolve()?;
    paths.ensure()?;
    let _logger = init_logging(&log_level(), &paths.log_dir())?;

    let conn = open(&paths.database())?;
    let mut app = App::new(conn, paths)?;
    let result = run_app(&mut app);

    if let Err(err) = &result {
        log::error!("event=app_exit status=error error={err:#}");
    } else {
        log::info!("event=app_exit status=ok");
    }
    result
}
