//! Snapshot producer: the read path every consumer goes through.
//!
//! Prunes dead-TTY sessions, sorts deterministically, and enriches with
//! best-effort display metadata. Consumers (TUI tick, WebSocket push,
//! `list`) get an owned array and can never reach store internals through it.

use tracing::debug;

use crate::liveness::{LivenessCache, TtyProbe};
use crate::session::Session;
use crate::store::SessionStore;

/// Best-effort human label for a terminal (tab name). Variants per terminal
/// app chain behind [`ChainedTabNames`]; a failing variant returns `None`
/// and never aborts the chain.
pub trait TabNameLookup {
    fn tab_name(&self, tty: &str) -> Option<String>;
}

/// No enrichment. Default for contexts without a terminal integration.
pub struct NoTabNames;

impl TabNameLookup for NoTabNames {
    fn tab_name(&self, _tty: &str) -> Option<String> {
        None
    }
}

/// Tries each backend in priority order, first hit wins.
pub struct ChainedTabNames {
    backends: Vec<Box<dyn TabNameLookup>>,
}

impl ChainedTabNames {
    pub fn new(backends: Vec<Box<dyn TabNameLookup>>) -> Self {
        ChainedTabNames { backends }
    }
}

impl TabNameLookup for ChainedTabNames {
    fn tab_name(&self, tty: &str) -> Option<String> {
        self.backends.iter().find_map(|b| b.tab_name(tty))
    }
}

pub struct SnapshotProducer<'a, P, T> {
    store: &'a SessionStore,
    liveness: &'a LivenessCache<P>,
    tab_names: &'a T,
}

impl<'a, P: TtyProbe, T: TabNameLookup> SnapshotProducer<'a, P, T> {
    pub fn new(store: &'a SessionStore, liveness: &'a LivenessCache<P>, tab_names: &'a T) -> Self {
        SnapshotProducer {
            store,
            liveness,
            tab_names,
        }
    }

    /// Current sessions, dead TTYs pruned, ascending by `created_at` with
    /// store key order as the stable tie-break.
    pub fn sessions(&self) -> Vec<Session> {
        let data = self.store.read();

        let dead: Vec<String> = data
            .sessions
            .iter()
            .filter(|(_, s)| !self.liveness.is_alive(s.tty.as_deref()))
            .map(|(key, _)| key.clone())
            .collect();

        // One persisted write for the whole batch of prunes.
        if !dead.is_empty() {
            debug!(pruned = dead.len(), "Pruning dead-tty sessions");
            self.store.mutate(|data| {
                for key in &dead {
                    data.sessions.remove(key);
                }
            });
        }

        let data = self.store.read();
        let mut sessions: Vec<Session> = data.sessions.into_values().collect();
        sessions.sort_by_key(|s| s.created_at);

        for session in &mut sessions {
            if let Some(tty) = session.tty.as_deref() {
                session.tab_name = self.tab_names.tab_name(tty);
            }
        }
        sessions
    }
}
