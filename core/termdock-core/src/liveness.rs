//! TTY liveness oracle.
//!
//! Answers "does this terminal device still have anyone behind it". Probes
//! are tri-state: `Some(true)` / `Some(false)` are confirmed OS answers,
//! `None` means the check itself failed. The cache fails open on `None`:
//! pruning a live session on an OS hiccup is worse than letting a dead row
//! linger for one TTL window.

use std::collections::VecDeque;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_CAPACITY: usize = 128;

/// OS-level TTY existence check. `None` = could not determine.
pub trait TtyProbe {
    fn probe(&self, tty: &str) -> Option<bool>;
}

/// Probe backed by the device node plus `ps -t`.
///
/// A missing `/dev/ttysNNN` node is a confirmed death (macOS removes the
/// node when the tab closes). A present node with no attached process group
/// is also dead. Spawn failures and timeouts yield `None`.
#[derive(Debug, Clone)]
pub struct CommandTtyProbe {
    timeout: Duration,
}

impl Default for CommandTtyProbe {
    fn default() -> Self {
        CommandTtyProbe {
            timeout: Duration::from_secs(3),
        }
    }
}

impl TtyProbe for CommandTtyProbe {
    fn probe(&self, tty: &str) -> Option<bool> {
        if !Path::new(tty).exists() {
            return Some(false);
        }

        // `ps -t` wants the name without the /dev/ prefix.
        let name = tty.strip_prefix("/dev/").unwrap_or(tty);
        let mut child = Command::new("ps")
            .args(["-o", "pid=", "-t", name])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .ok()?;

        // Bounded wait so a wedged ps cannot block a snapshot call.
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut stdout = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        use std::io::Read;
                        let _ = out.read_to_string(&mut stdout);
                    }
                    return interpret_ps_exit(&status, &stdout);
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        debug!(tty = %tty, "TTY probe timed out");
                        return None;
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(_) => return None,
            }
        }
    }
}

/// Classifies a finished `ps -t` invocation.
///
/// Exit 0 with rows means someone is attached; exit 1 with no rows is ps's
/// "no processes match", the confirmed-dead signal. Any other exit (resource
/// trouble, killed by signal) is an indeterminate check, not a death.
fn interpret_ps_exit(status: &std::process::ExitStatus, stdout: &str) -> Option<bool> {
    let has_rows = !stdout.trim().is_empty();
    if status.success() {
        return Some(has_rows);
    }
    if status.code() == Some(1) && !has_rows {
        return Some(false);
    }
    None
}

struct CacheEntry {
    tty: String,
    alive: bool,
    checked_at: Instant,
}

/// Bounded, TTL'd cache in front of a [`TtyProbe`].
///
/// Oldest entry is evicted on overflow. Entries older than the TTL are
/// re-probed. Interior mutability so the snapshot producer can share it
/// immutably.
pub struct LivenessCache<P> {
    probe: P,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<VecDeque<CacheEntry>>,
}

impl<P: TtyProbe> LivenessCache<P> {
    pub fn new(probe: P) -> Self {
        Self::with_limits(probe, DEFAULT_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(probe: P, ttl: Duration, capacity: usize) -> Self {
        LivenessCache {
            probe,
            ttl,
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Sessions without a TTY are vacuously alive; this path never prunes.
    pub fn is_alive(&self, tty: Option<&str>) -> bool {
        let Some(tty) = tty.filter(|t| !t.is_empty()) else {
            return true;
        };

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(entry) = entries.iter().find(|e| e.tty == tty) {
            if entry.checked_at.elapsed() < self.ttl {
                return entry.alive;
            }
        }
        entries.retain(|e| e.tty != tty);

        // Fail open: an indeterminate probe counts as alive.
        let alive = self.probe.probe(tty).unwrap_or(true);

        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(CacheEntry {
            tty: tty.to_string(),
            alive,
            checked_at: Instant::now(),
        });
        alive
    }
}
