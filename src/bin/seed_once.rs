// Small ops utility: run a single catalog maintenance pass (prune + seed window) and exit.
//
// Usage:
//   cargo run --bin seed_once -- [db_path] [today as YYYY-MM-DD]
//
// Without a date, "today" is taken from the configured reference time zone.

use chrono::NaiveDate;
use run_catalog::app::{get_default_db_path, AppState};
use run_catalog::engine::PassOutcome;
use run_catalog::{logging, PassTrigger};

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let today = args
        .next()
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d"))
        .transpose()?;

    let state = AppState::new(db_path)?;
    let outcome = match today {
        Some(today) => state.orchestrator.run_pass_on(today, PassTrigger::Manual),
        None => state.orchestrator.run_pass(PassTrigger::Manual),
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    match outcome {
        PassOutcome::Completed(report) if !report.is_clean() => {
            anyhow::bail!("maintenance pass finished with failures: {:?}", report.failed_dates())
        }
        _ => Ok(()),
    }
}
