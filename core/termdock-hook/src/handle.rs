//! Event handler pipeline for one hook invocation.
//!
//! stdin JSON → validate → resolve TTY (ancestor walk) → derive last
//! assistant message (transcript, best-effort) → reduce into the store →
//! synchronous flush → heartbeat.
//!
//! Storage problems never fail the invocation; aborting a hook mid-write is
//! worse for every other session than quietly dropping one update.

use std::io::{self, Read};
use std::path::Path;

use chrono::Utc;
use termdock_core::{
    apply_hook_event, paths, transcript, HookInput, HookUpdate, SessionStore, Settings,
    TermdockError,
};

use crate::tty;

pub fn run() -> Result<(), TermdockError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(TermdockError::InputRead)?;

    // Empty stdin is malformed input like any other; from_json rejects it.
    let hook_input = HookInput::from_json(&input)?;
    let event = hook_input.to_event()?;

    // Validated above; session_id is present and non-empty.
    let session_id = hook_input.session_id.clone().unwrap_or_default();
    let cwd = hook_input.cwd.clone().unwrap_or_default();

    let tty = tty::resolve();
    let last_message = hook_input
        .transcript_path
        .as_deref()
        .and_then(|p| transcript::last_assistant_message(Path::new(p)));

    let settings = Settings::load();
    let store = SessionStore::open(&paths::store_path()?, settings.debounce());

    let session = apply_hook_event(
        &store,
        &HookUpdate {
            session_id,
            cwd,
            tty,
            event,
            last_message,
        },
    );
    // This process exits immediately; don't leave the write in the debounce window.
    store.flush_now();

    tracing::debug!(
        session = %session.session_id,
        status = ?session.status,
        tty = session.tty.as_deref().unwrap_or("-"),
        "Hook event applied"
    );

    touch_heartbeat();
    Ok(())
}

fn touch_heartbeat() {
    let Ok(path) = paths::heartbeat_path() else {
        return;
    };

    use fs_err::OpenOptions;
    use std::io::Write as _;

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        let _ = writeln!(file, "{}", Utc::now().timestamp());
    }
}
