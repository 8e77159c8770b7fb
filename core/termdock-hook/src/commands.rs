//! `list` and `clear` utility subcommands.

use termdock_core::{
    paths, CommandTtyProbe, LivenessCache, NoTabNames, SessionStatus, SessionStore, Settings,
    SnapshotProducer, TermdockError,
};

pub fn list(json: bool) -> Result<(), TermdockError> {
    let settings = Settings::load();
    let store = SessionStore::open(&paths::store_path()?, settings.debounce());
    let liveness = LivenessCache::with_limits(
        CommandTtyProbe::default(),
        settings.liveness_ttl(),
        settings.liveness_cache_capacity,
    );
    let producer = SnapshotProducer::new(&store, &liveness, &NoTabNames);
    let sessions = producer.sessions();
    // Pruning may have mutated the store; make it durable before exit.
    store.flush_now();

    if json {
        match serde_json::to_string_pretty(&sessions) {
            Ok(out) => println!("{}", out),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize snapshot"),
        }
        return Ok(());
    }

    if sessions.is_empty() {
        println!("no tracked sessions");
        return Ok(());
    }

    println!(
        "{:<14} {:<13} {:<13} {:<20} {}",
        "SESSION", "STATUS", "SOURCE", "TTY", "CWD"
    );
    for s in &sessions {
        let status = match s.status {
            SessionStatus::Running => "running",
            SessionStatus::WaitingInput => "waiting_input",
            SessionStatus::Stopped => "stopped",
        };
        let source = match s.source {
            termdock_core::SessionSource::Hook => "hook",
            termdock_core::SessionSource::ProcessScan => "process-scan",
        };
        println!(
            "{:<14} {:<13} {:<13} {:<20} {}",
            shorten(&s.session_id),
            status,
            source,
            s.tty.as_deref().unwrap_or("-"),
            s.cwd
        );
    }
    Ok(())
}

pub fn clear(session_id: Option<&str>, stopped_only: bool) -> Result<(), TermdockError> {
    let settings = Settings::load();
    let store = SessionStore::open(&paths::store_path()?, settings.debounce());

    let removed = store.mutate(|data| {
        let before = data.sessions.len();
        data.sessions.retain(|_, s| {
            if let Some(id) = session_id {
                return s.session_id != id;
            }
            if stopped_only {
                return s.status != SessionStatus::Stopped;
            }
            false
        });
        before - data.sessions.len()
    });
    store.flush_now();

    println!("removed {} session(s)", removed);
    Ok(())
}

fn shorten(id: &str) -> String {
    if id.chars().count() <= 12 {
        id.to_string()
    } else {
        let cut: String = id.chars().take(11).collect();
        format!("{}…", cut)
    }
}
