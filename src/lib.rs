pub mod types;
pub mod error;
pub mod config;
pub mod locator;
pub mod builder;
pub mod advance;
pub mod undo;
pub mod bracket;
pub mod roster;
pub mod store;
pub mod desk;

#[cfg(test)]
mod test_support;

use std::fs;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub use bracket::{
    build_bracket, build_bracket_in_order, build_bracket_with_rng, extract_completed_matches,
    rename_participant, report_result, report_result_by_name, undo_result,
};
pub use config::{load_config, load_env_file, save_config, TournamentConfig};
pub use desk::{with_desk, TournamentDesk};
pub use error::{BracketError, StoreError};
pub use roster::{Roster, RosterEntry};
pub use store::{ArchiveEntry, TournamentStore};
pub use types::{
    Bracket, CompletedMatch, Match, RenamePolicy, SharedDesk, Side, Slot, BYE, FINALS_ID,
};

/// Install the global subscriber: a daily rolling file in the configured log
/// directory, filtered by `RUST_LOG` or else the configured filter. Keep the
/// returned guard alive for as long as logs should be flushed.
pub fn init_tracing(config: &TournamentConfig) -> WorkerGuard {
    let logs_dir = &config.log_dir;
    let dir_error = fs::create_dir_all(logs_dir).err();
    let file_appender = tracing_appender::rolling::daily(logs_dir, "bracket.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    if let Some(e) = dir_error {
        warn!(dir = %logs_dir.display(), "create log dir: {e}");
    }
    info!(data_dir = %config.data_dir.display(), key = %config.bracket_key, "bracket desk starting");
    guard
}
