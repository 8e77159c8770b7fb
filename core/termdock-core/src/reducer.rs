//! Maps hook lifecycle events to session state.
//!
//! ## Status state machine
//!
//! ```text
//! Stop                               → stopped   (from anywhere)
//! UserPromptSubmit                   → running   (even from stopped)
//! anything else while stopped        → stopped   (sticky)
//! PreToolUse                         → running
//! Notification (permission prompt)   → waiting_input
//! anything else                      → running
//! ```
//!
//! The table is a strict priority chain, evaluated top to bottom. Sticky
//! stop is intentional: a finished session must not silently resume on
//! unrelated background events, only an explicit new prompt revives it.

use chrono::Utc;
use tracing::debug;

use crate::event::HookEvent;
use crate::session::{composite_key, evict_tty_claims, Session, SessionSource, SessionStatus};
use crate::store::SessionStore;

/// A validated hook event plus the externally resolved context it arrived
/// with (TTY from the ancestor walk, last message from the transcript).
#[derive(Debug, Clone)]
pub struct HookUpdate {
    pub session_id: String,
    pub cwd: String,
    pub tty: Option<String>,
    pub event: HookEvent,
    pub last_message: Option<String>,
}

/// Pure status transition. First match in the priority chain wins.
pub fn next_status(event: &HookEvent, current: Option<SessionStatus>) -> SessionStatus {
    match event {
        HookEvent::Stop => SessionStatus::Stopped,
        HookEvent::UserPromptSubmit => SessionStatus::Running,
        _ if current == Some(SessionStatus::Stopped) => SessionStatus::Stopped,
        HookEvent::PreToolUse => SessionStatus::Running,
        event if event.is_permission_prompt() => SessionStatus::WaitingInput,
        _ => SessionStatus::Running,
    }
}

/// Reduces one hook event into the store and returns the committed session.
///
/// The store re-reads the map immediately before this mutation runs, so the
/// supersession scan operates on the freshest committed state rather than a
/// stale snapshot.
pub fn apply_hook_event(store: &SessionStore, update: &HookUpdate) -> Session {
    store.mutate(|data| {
        let tty = update.tty.as_deref().filter(|t| !t.is_empty());
        let key = composite_key(&update.session_id, tty);

        if let Some(tty) = tty {
            let evicted = evict_tty_claims(&mut data.sessions, tty, &update.session_id);
            if !evicted.is_empty() {
                debug!(tty = %tty, session = %update.session_id, ?evicted, "Superseded sessions on tty");
            }
        }

        let now = Utc::now();
        let existing = data.sessions.get(&key);
        let status = next_status(&update.event, existing.map(|s| s.status));

        let session = Session {
            session_id: update.session_id.clone(),
            cwd: update.cwd.clone(),
            tty: tty
                .map(|t| t.to_string())
                .or_else(|| existing.and_then(|s| s.tty.clone())),
            status,
            source: SessionSource::Hook,
            created_at: existing.map_or(now, |s| s.created_at),
            updated_at: now,
            last_message: update
                .last_message
                .clone()
                .or_else(|| existing.and_then(|s| s.last_message.clone())),
            tab_name: None,
        };
        data.sessions.insert(key, session.clone());
        session
    })
}
