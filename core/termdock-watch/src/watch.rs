//! Storage-change notification bridge.
//!
//! Watches the directory holding the store file (the flush is a rename, so
//! watching the file itself would drop the handle on every write) and
//! coalesces the resulting event burst into a single "changed" answer per
//! poll of the loop.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::warn;

pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
}

impl StoreWatcher {
    pub fn new(store_path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let file_name = store_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let watch_dir: PathBuf = store_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let is_store_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == file_name));
                    if is_store_file && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(err) => warn!(error = %err, "Store watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drains all pending change events; true if at least one arrived.
    pub fn take_changed(&self) -> bool {
        let mut changed = false;
        while self.rx.try_recv().is_ok() {
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn wait_for_change(watcher: &StoreWatcher) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if watcher.take_changed() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        false
    }

    #[test]
    fn test_detects_store_file_writes() {
        let temp = tempdir().unwrap();
        let store_path = temp.path().join("sessions.json");
        let watcher = StoreWatcher::new(&store_path).unwrap();

        std::fs::write(&store_path, "{}").unwrap();
        assert!(wait_for_change(&watcher));
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let temp = tempdir().unwrap();
        let store_path = temp.path().join("sessions.json");
        let watcher = StoreWatcher::new(&store_path).unwrap();

        std::fs::write(temp.path().join("other.json"), "{}").unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert!(!watcher.take_changed());
    }

    #[test]
    fn test_burst_coalesces_to_one_answer() {
        let temp = tempdir().unwrap();
        let store_path = temp.path().join("sessions.json");
        let watcher = StoreWatcher::new(&store_path).unwrap();

        for i in 0..5 {
            std::fs::write(&store_path, format!("{{\"n\":{}}}", i)).unwrap();
        }
        assert!(wait_for_change(&watcher));
        // Already drained; no residual events should linger long after.
        std::thread::sleep(Duration::from_millis(300));
        let _ = watcher.take_changed();
        std::thread::sleep(Duration::from_millis(100));
        assert!(!watcher.take_changed());
    }
}
