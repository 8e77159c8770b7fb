//! Process-scan boundary: OS enumeration → `DetectedProcess` batches.
//!
//! Scans for the external CLI tools named in settings (tools that have no
//! lifecycle hooks, e.g. codex) and reports one batch per target per tick.
//! Every failure path resolves to "detected nothing this tick" — the
//! reconciler deliberately cannot tell a failed scan from an empty one.

use std::process::Command;

use sysinfo::{ProcessRefreshKind, System, UpdateKind};
use termdock_core::DetectedProcess;
use tracing::debug;

/// One scan per tick per source tag.
pub trait ProcessScanner {
    fn scan(&mut self, source: &str) -> Vec<DetectedProcess>;
}

/// Scanner backed by sysinfo process enumeration plus `ps` TTY lookup.
pub struct SysinfoScanner {
    system: System,
}

impl SysinfoScanner {
    pub fn new() -> Self {
        SysinfoScanner {
            system: System::new(),
        }
    }
}

impl Default for SysinfoScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessScanner for SysinfoScanner {
    fn scan(&mut self, source: &str) -> Vec<DetectedProcess> {
        self.system.refresh_processes_specifics(
            ProcessRefreshKind::new()
                .with_cmd(UpdateKind::Always)
                .with_cwd(UpdateKind::Always),
        );

        let own_pid = std::process::id();
        let mut detected = Vec::new();
        for (pid, process) in self.system.processes() {
            if process.name() != source {
                continue;
            }
            let pid = pid.as_u32();
            if pid == own_pid {
                continue;
            }
            let cwd = process
                .cwd()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            detected.push(DetectedProcess {
                pid,
                tty: tty_of_pid(pid),
                cwd,
                source: source.to_string(),
            });
        }
        debug!(source = %source, count = detected.len(), "Process scan tick");
        detected
    }
}

fn tty_of_pid(pid: u32) -> Option<String> {
    let output = Command::new("ps")
        .args(["-o", "tty=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if name.is_empty() || name == "??" || name == "?" {
        return None;
    }
    Some(format!("/dev/{}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use termdock_core::{reconcile, SessionStore};

    struct FakeScanner {
        batches: HashMap<String, Vec<DetectedProcess>>,
    }

    impl ProcessScanner for FakeScanner {
        fn scan(&mut self, source: &str) -> Vec<DetectedProcess> {
            self.batches.get(source).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn test_scan_batches_flow_through_reconciler() {
        let store = SessionStore::in_memory();
        let mut scanner = FakeScanner {
            batches: HashMap::from([(
                "codex".to_string(),
                vec![DetectedProcess {
                    pid: 77,
                    tty: Some("/dev/ttys5".to_string()),
                    cwd: "/repo".to_string(),
                    source: "codex".to_string(),
                }],
            )]),
        };

        let batch = scanner.scan("codex");
        reconcile(&store, "codex", &batch);
        assert!(store.read().sessions.contains_key("codex-77:/dev/ttys5"));

        // A source with nothing running yields an empty batch, and the
        // follow-up tick sweeps the record.
        scanner.batches.clear();
        let batch = scanner.scan("codex");
        reconcile(&store, "codex", &batch);
        assert!(store.read().sessions.is_empty());
    }
}
