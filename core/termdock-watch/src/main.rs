//! termdock-watch: the long-lived watcher process.
//!
//! Single-threaded cooperative loop interleaving three duties:
//!
//! 1. the poll-scan tick — enumerate external CLI processes and reconcile
//!    them into the store,
//! 2. the storage-change bridge — when any process (usually a hook
//!    invocation) changes the store file, re-run the snapshot producer,
//! 3. snapshot broadcast — push the resulting array to every attached sink.
//!
//! Transient OS failures never take this process down; the worst visible
//! symptom is a degraded snapshot for one tick.

mod broadcast;
mod scan;
mod tabs;
mod watch;

use std::time::{Duration, Instant};

use termdock_core::{
    paths, reconcile, CommandTtyProbe, LivenessCache, SessionStore, Settings, SnapshotProducer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use broadcast::{JsonLinesSink, SnapshotSink};
use scan::{ProcessScanner, SysinfoScanner};
use watch::StoreWatcher;

/// Loop granularity; bounds how stale a broadcast can be after a change.
const TICK: Duration = Duration::from_millis(200);

fn main() {
    init_logging();

    let settings = Settings::load();
    let store_path = match paths::store_path() {
        Ok(path) => path,
        Err(err) => {
            error!(error = %err, "Failed to resolve store path");
            std::process::exit(1);
        }
    };

    let store = SessionStore::open(&store_path, settings.debounce());
    let liveness = LivenessCache::with_limits(
        CommandTtyProbe::default(),
        settings.liveness_ttl(),
        settings.liveness_cache_capacity,
    );
    let tab_names = tabs::ForegroundCommandTabs;
    let mut scanner = SysinfoScanner::new();

    let watcher = match StoreWatcher::new(&store_path) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            // Degrade to poll-only; scan ticks still refresh the snapshot.
            warn!(error = %err, "Store watcher unavailable, running poll-only");
            None
        }
    };

    let mut sinks: Vec<Box<dyn SnapshotSink>> = vec![Box::new(JsonLinesSink::stdout())];

    info!(
        store = %store_path.display(),
        targets = ?settings.scan_targets,
        interval_secs = settings.poll_interval_secs,
        "termdock-watch started"
    );

    let producer = SnapshotProducer::new(&store, &liveness, &tab_names);
    broadcast::broadcast(&mut sinks, &producer.sessions());

    let mut last_scan: Option<Instant> = None;
    loop {
        let mut changed = false;

        let scan_due = last_scan.map_or(true, |t| t.elapsed() >= settings.poll_interval());
        if scan_due {
            for target in &settings.scan_targets {
                let batch = scanner.scan(target);
                reconcile(&store, target, &batch);
            }
            last_scan = Some(Instant::now());
            changed = true;
        }

        if watcher.as_ref().is_some_and(StoreWatcher::take_changed) {
            changed = true;
        }

        if changed {
            broadcast::broadcast(&mut sinks, &producer.sessions());
        }

        std::thread::sleep(TICK);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TERMDOCK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
