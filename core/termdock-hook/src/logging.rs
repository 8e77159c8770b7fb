//! File logging for the hook binary.
//!
//! Hook stdout/stderr belong to the assistant, so diagnostics go to a daily
//! rolling file under ~/.termdock/logs. The worker guard must stay alive for
//! the whole process or buffered lines are lost.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub fn init() -> Option<WorkerGuard> {
    let logs_dir = termdock_core::paths::logs_dir().ok()?;

    let appender = tracing_appender::rolling::daily(logs_dir, "termdock-hook.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env("TERMDOCK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    if result.is_err() {
        // A subscriber is already installed (tests); keep going without one.
        return None;
    }
    Some(guard)
}
