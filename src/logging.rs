//! Log output for the CLI.
//!
//! The library only emits `tracing` events; nothing is printed unless a
//! subscriber is installed here.

use tracing::Level;
use tracing_subscriber::fmt;

/// Install a stderr subscriber. `verbose` lowers the level from `WARN` to
/// `DEBUG`. A second call is a no-op.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
