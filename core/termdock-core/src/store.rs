//! File-backed session store with debounced, coalesced writes.
//!
//! One JSON document holds the full [`StoreData`] aggregate. The store is the
//! only component allowed to touch that file; reducers and the snapshot
//! producer always go through [`SessionStore::read`] / [`SessionStore::mutate`].
//!
//! # Write path
//!
//! `write`/`mutate` replace the in-memory cache and (re)arm a short debounce
//! deadline. A background flusher thread wakes at the deadline and persists
//! the cache once, so a burst of writes collapses to a single durable write
//! holding the last state. The deadline is an explicit, cancelable piece of
//! state: `flush_now` forces it, `reset_cache` cancels it.
//!
//! # Defensive design
//!
//! Several short-lived hook processes can race on this file, and any of them
//! may die mid-invocation. Reads therefore degrade to an empty aggregate on a
//! missing, empty, or corrupt file, and all durable I/O errors are swallowed
//! (logged, never propagated) — session data is disposable and the next event
//! rebuilds it. Flushes go through temp file + rename so a reader never
//! observes a half-written document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::Utc;
use fs_err as fs;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::session::StoreData;

/// Default debounce window for coalescing writes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

struct StoreState {
    cache: Option<StoreData>,
    /// Bumped on every `write`/`mutate`.
    dirty_generation: u64,
    /// Last generation made durable (or abandoned after an I/O error).
    flushed_generation: u64,
    /// When the pending debounced flush should fire. `None` = nothing pending.
    deadline: Option<Instant>,
    shutdown: bool,
    flush_count: u64,
}

struct StoreInner {
    file_path: Option<PathBuf>,
    state: Mutex<StoreState>,
    wake: Condvar,
}

/// Owned store handle. Create one per process with [`SessionStore::open`];
/// tests use [`SessionStore::in_memory`] for isolated instances.
pub struct SessionStore {
    inner: Arc<StoreInner>,
    debounce: Duration,
    flusher: Option<JoinHandle<()>>,
}

impl SessionStore {
    pub fn open(file_path: &Path, debounce: Duration) -> Self {
        Self::new(Some(file_path.to_path_buf()), debounce)
    }

    /// Store with no backing file; flushes are no-ops. For tests and
    /// read-only tooling.
    pub fn in_memory() -> Self {
        Self::new(None, DEFAULT_DEBOUNCE)
    }

    fn new(file_path: Option<PathBuf>, debounce: Duration) -> Self {
        let inner = Arc::new(StoreInner {
            file_path,
            state: Mutex::new(StoreState {
                cache: None,
                dirty_generation: 0,
                flushed_generation: 0,
                deadline: None,
                shutdown: false,
                flush_count: 0,
            }),
            wake: Condvar::new(),
        });
        let flusher = {
            let inner = Arc::clone(&inner);
            std::thread::spawn(move || flusher_loop(&inner))
        };
        SessionStore {
            inner,
            debounce,
            flusher: Some(flusher),
        }
    }

    /// Returns the current aggregate: the cached value when present,
    /// otherwise whatever can be recovered from disk (empty on any failure).
    pub fn read(&self) -> StoreData {
        let mut state = self.lock();
        if state.cache.is_none() {
            state.cache = Some(load_from_disk(self.inner.file_path.as_deref()));
        }
        state.cache.clone().unwrap_or_default()
    }

    /// Replaces the cache and (re)schedules the debounced flush. A new write
    /// before the deadline fires reschedules rather than stacking flushes.
    pub fn write(&self, data: StoreData) {
        let mut state = self.lock();
        state.cache = Some(data);
        self.mark_dirty(&mut state);
    }

    /// Read-modify-write under one lock acquisition.
    ///
    /// Loads from disk immediately before applying `f` when no cache is
    /// present, which is what keeps the cross-process race window small for
    /// mutations that scan the whole map (the TTY supersession step).
    pub fn mutate<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> R {
        let mut state = self.lock();
        if state.cache.is_none() {
            state.cache = Some(load_from_disk(self.inner.file_path.as_deref()));
        }
        // Cache is always Some here; fall back to default defensively.
        let data = state.cache.get_or_insert_with(StoreData::default);
        let result = f(data);
        self.mark_dirty(&mut state);
        result
    }

    /// Synchronously forces any pending flush to complete. Called before a
    /// hook process exits so its write outlives the debounce window.
    pub fn flush_now(&self) {
        let mut state = self.lock();
        state.deadline = None;
        if state.dirty_generation > state.flushed_generation {
            persist_locked(&mut state, self.inner.file_path.as_deref());
        }
    }

    /// Drops the in-memory cache and cancels any pending flush without
    /// persisting. Testing/utility hook.
    pub fn reset_cache(&self) {
        let mut state = self.lock();
        state.cache = None;
        state.deadline = None;
        state.flushed_generation = state.dirty_generation;
        self.inner.wake.notify_all();
    }

    fn mark_dirty(&self, state: &mut MutexGuard<'_, StoreState>) {
        state.dirty_generation += 1;
        state.deadline = Some(Instant::now() + self.debounce);
        self.inner.wake.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn flush_count(&self) -> u64 {
        self.lock().flush_count
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        {
            let mut state = self.lock();
            state.shutdown = true;
            self.inner.wake.notify_all();
        }
        if let Some(handle) = self.flusher.take() {
            let _ = handle.join();
        }
    }
}

fn flusher_loop(inner: &StoreInner) {
    let mut state = inner
        .state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    loop {
        if state.shutdown {
            return;
        }
        match state.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    state.deadline = None;
                    if state.dirty_generation > state.flushed_generation {
                        persist_locked(&mut state, inner.file_path.as_deref());
                    }
                } else {
                    let wait = deadline - now;
                    state = match inner.wake.wait_timeout(state, wait) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
            }
            None => {
                state = match inner.wake.wait(state) {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
            }
        }
    }
}

/// Persists the cache. Must hold the state lock, which also serializes this
/// against concurrent in-process flushes. Errors are logged and the
/// generation is abandoned — the next natural write is the retry.
fn persist_locked(state: &mut StoreState, file_path: Option<&Path>) {
    let generation = state.dirty_generation;
    // Either way, do not re-attempt this generation in a loop.
    state.flushed_generation = generation;

    let Some(path) = file_path else {
        return;
    };
    let Some(data) = state.cache.as_mut() else {
        return;
    };
    data.updated_at = Utc::now();
    // Tab names are snapshot enrichment, not session state.
    for session in data.sessions.values_mut() {
        session.tab_name = None;
    }

    match write_atomic(path, data) {
        Ok(()) => {
            state.flush_count += 1;
            debug!(path = %path.display(), generation, "Flushed session store");
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to flush session store");
        }
    }
}

fn write_atomic(path: &Path, data: &StoreData) -> Result<(), String> {
    let content =
        serde_json::to_string_pretty(data).map_err(|e| format!("serialize failed: {}", e))?;

    let parent = path
        .parent()
        .ok_or_else(|| "store path has no parent directory".to_string())?;
    fs::create_dir_all(parent).map_err(|e| format!("create dir failed: {}", e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| format!("temp file error: {}", e))?;
    temp.write_all(content.as_bytes())
        .map_err(|e| format!("temp write failed: {}", e))?;
    temp.flush().map_err(|e| format!("temp flush failed: {}", e))?;
    temp.persist(path)
        .map_err(|e| format!("rename failed: {}", e.error))?;

    // Session data is per-user; keep the file owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }

    Ok(())
}

fn load_from_disk(file_path: Option<&Path>) -> StoreData {
    let Some(path) = file_path else {
        return StoreData::default();
    };
    if !path.exists() {
        return StoreData::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to read session store");
            return StoreData::default();
        }
    };

    if content.trim().is_empty() {
        return StoreData::default();
    }

    match serde_json::from_str::<StoreData>(&content) {
        Ok(data) => data,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Corrupt session store, starting empty");
            StoreData::default()
        }
    }
}
