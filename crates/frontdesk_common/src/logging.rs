// --- File: crates/frontdesk_common/src/logging.rs ---
//! Logging setup shared by every Frontdesk binary.

use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with the default level (INFO).
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
///
/// Formats log lines with target, file and line information; the level can
/// still be overridden per target through `RUST_LOG`.
pub fn init_with_level(level: Level) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("frontdesk={}", level).parse().unwrap());

    // try_init so tests that set up their own subscriber are not clobbered
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}
