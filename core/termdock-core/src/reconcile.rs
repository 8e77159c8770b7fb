//! Merges a process-scan batch into the store.
//!
//! Process-sourced sessions exist only as long as their backing pid shows up
//! in the scan: a pid missing from the latest batch removes the record
//! outright, it is never marked stopped. Hook-sourced sessions are invisible
//! to this reconciler. A failed enumeration upstream is delivered here as an
//! empty batch; the reconciler does not distinguish the two.

use std::collections::HashSet;

use chrono::Utc;
use tracing::debug;

use crate::session::{
    composite_key, evict_tty_claims, process_session_id, Session, SessionSource, SessionStatus,
};
use crate::store::SessionStore;

/// One externally detected CLI process, as produced by the scan boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedProcess {
    pub pid: u32,
    pub tty: Option<String>,
    pub cwd: String,
    /// Scan source tag, e.g. `codex`. Becomes the session id prefix.
    pub source: String,
}

/// Reconciles one scan tick for `source` into the store as a single write.
pub fn reconcile(store: &SessionStore, source: &str, detected: &[DetectedProcess]) {
    store.mutate(|data| {
        let now = Utc::now();

        for process in detected {
            let session_id = process_session_id(&process.source, process.pid);
            let tty = process.tty.as_deref().filter(|t| !t.is_empty());
            let key = composite_key(&session_id, tty);

            if let Some(tty) = tty {
                // A live process claims its TTY exclusively, same as a hook event.
                evict_tty_claims(&mut data.sessions, tty, &session_id);
            }

            let existing = data.sessions.get(&key);
            let session = Session {
                session_id,
                cwd: process.cwd.clone(),
                tty: tty.map(|t| t.to_string()),
                status: SessionStatus::Running,
                source: SessionSource::ProcessScan,
                created_at: existing.map_or(now, |s| s.created_at),
                updated_at: now,
                last_message: existing.and_then(|s| s.last_message.clone()),
                tab_name: None,
            };
            data.sessions.insert(key, session);
        }

        // Sweep: drop records of this source whose pid vanished from the batch.
        let live_pids: HashSet<u32> = detected.iter().map(|p| p.pid).collect();
        let dead: Vec<String> = data
            .sessions
            .iter()
            .filter(|(_, s)| {
                s.source == SessionSource::ProcessScan
                    && s.session_id.starts_with(&format!("{}-", source))
                    && !crate::session::pid_from_session_id(&s.session_id)
                        .is_some_and(|pid| live_pids.contains(&pid))
            })
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dead {
            data.sessions.remove(key);
        }
        if !dead.is_empty() {
            debug!(source = %source, removed = dead.len(), "Swept vanished processes");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HookEvent;
    use crate::reducer::{apply_hook_event, HookUpdate};

    fn detected(pid: u32, tty: Option<&str>) -> DetectedProcess {
        DetectedProcess {
            pid,
            tty: tty.map(|t| t.to_string()),
            cwd: "/a".to_string(),
            source: "codex".to_string(),
        }
    }

    #[test]
    fn test_detection_creates_running_session() {
        let store = SessionStore::in_memory();
        reconcile(&store, "codex", &[detected(100, Some("/dev/ttys2"))]);

        let data = store.read();
        let session = &data.sessions["codex-100:/dev/ttys2"];
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.source, SessionSource::ProcessScan);
        assert_eq!(session.cwd, "/a");
    }

    #[test]
    fn test_empty_batch_removes_previous_detections() {
        let store = SessionStore::in_memory();
        reconcile(&store, "codex", &[detected(100, Some("/dev/ttys2"))]);
        reconcile(&store, "codex", &[]);
        assert!(store.read().sessions.is_empty());
    }

    #[test]
    fn test_sweep_never_touches_hook_sessions() {
        let store = SessionStore::in_memory();
        apply_hook_event(
            &store,
            &HookUpdate {
                session_id: "s1".to_string(),
                cwd: "/tmp".to_string(),
                tty: Some("/dev/ttys1".to_string()),
                event: HookEvent::PreToolUse,
                last_message: None,
            },
        );

        reconcile(&store, "codex", &[detected(1, Some("/dev/ttys2"))]);
        reconcile(&store, "codex", &[]);

        let data = store.read();
        assert_eq!(data.sessions.len(), 1);
        assert!(data.sessions.contains_key("s1:/dev/ttys1"));
    }

    #[test]
    fn test_sweep_ignores_other_scan_sources() {
        let store = SessionStore::in_memory();
        reconcile(&store, "codex", &[detected(100, None)]);
        reconcile(
            &store,
            "aider",
            &[DetectedProcess {
                pid: 200,
                tty: None,
                cwd: "/b".to_string(),
                source: "aider".to_string(),
            }],
        );

        // An empty codex tick must not sweep aider's record.
        reconcile(&store, "codex", &[]);
        let data = store.read();
        assert!(!data.sessions.contains_key("codex-100"));
        assert!(data.sessions.contains_key("aider-200"));
    }

    #[test]
    fn test_redetection_preserves_created_at() {
        let store = SessionStore::in_memory();
        reconcile(&store, "codex", &[detected(100, None)]);
        let first = store.read().sessions["codex-100"].clone();

        std::thread::sleep(std::time::Duration::from_millis(5));
        reconcile(&store, "codex", &[detected(100, None)]);
        let second = store.read().sessions["codex-100"].clone();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[test]
    fn test_detected_process_supersedes_hook_session_on_same_tty() {
        let store = SessionStore::in_memory();
        apply_hook_event(
            &store,
            &HookUpdate {
                session_id: "s1".to_string(),
                cwd: "/tmp".to_string(),
                tty: Some("/dev/ttys3".to_string()),
                event: HookEvent::PreToolUse,
                last_message: None,
            },
        );

        reconcile(&store, "codex", &[detected(300, Some("/dev/ttys3"))]);

        let data = store.read();
        assert_eq!(data.sessions.len(), 1);
        assert!(data.sessions.contains_key("codex-300:/dev/ttys3"));
    }
}
