//! Tracing subscriber setup for the command-line tool

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install a global formatter, at DEBUG when `verbose` is set and INFO otherwise.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
