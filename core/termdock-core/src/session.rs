//! Serialized session types shared by the store, reducers, and snapshot producer.
//!
//! The on-disk aggregate is a single JSON document (`StoreData`) keyed by
//! composite key. Two sessions with the same assistant-provided id but
//! different terminals get distinct keys, which is what lets the supersession
//! rule detect and evict a stale claim on a reused TTY.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a tracked session.
///
/// Process-sourced sessions only ever occupy `Running`; when their backing
/// process disappears they are removed outright rather than marked stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    WaitingInput,
    Stopped,
}

/// Which reconciler owns this record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionSource {
    Hook,
    ProcessScan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    /// Display-only; never participates in identity.
    pub cwd: String,
    #[serde(default)]
    pub tty: Option<String>,
    pub status: SessionStatus,
    pub source: SessionSource,
    /// Immutable once set.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every reconciling write.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message: Option<String>,
    /// Display label added by the snapshot producer. Travels on outbound
    /// snapshots but never round-trips through the store file: the flush
    /// path clears it and deserialization ignores it.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub tab_name: Option<String>,
}

/// The persisted aggregate: composite key → session.
///
/// `BTreeMap` gives deterministic iteration order, which the snapshot
/// producer relies on as the tie-break for equal `created_at` timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub sessions: BTreeMap<String, Session>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Builds the store key for a session: `session_id` alone when no TTY is
/// known, else `session_id:tty`.
pub fn composite_key(session_id: &str, tty: Option<&str>) -> String {
    match tty {
        Some(tty) if !tty.is_empty() => format!("{}:{}", session_id, tty),
        _ => session_id.to_string(),
    }
}

/// Synthesized id for a process-sourced session, e.g. `codex-4242`.
///
/// The pid is recoverable from the id (see [`pid_from_session_id`]) so the
/// sweep step needs no extra bookkeeping.
pub fn process_session_id(source: &str, pid: u32) -> String {
    format!("{}-{}", source, pid)
}

/// Recovers the pid from a process-sourced session id.
pub fn pid_from_session_id(session_id: &str) -> Option<u32> {
    session_id.rsplit('-').next()?.parse().ok()
}

/// Removes every session claiming `tty` under a different session id.
///
/// This is the supersession rule: at most one session may occupy a non-empty
/// TTY in committed state, regardless of source. Returns the evicted keys.
pub fn evict_tty_claims(
    sessions: &mut BTreeMap<String, Session>,
    tty: &str,
    keep_session_id: &str,
) -> Vec<String> {
    let evicted: Vec<String> = sessions
        .iter()
        .filter(|(_, s)| s.tty.as_deref() == Some(tty) && s.session_id != keep_session_id)
        .map(|(key, _)| key.clone())
        .collect();
    for key in &evicted {
        sessions.remove(key);
    }
    evicted
}
