//! Controlling-terminal resolution for hook invocations.
//!
//! The hook process is spawned by the assistant, which was itself launched
//! from some terminal tab. We walk the ancestor chain (parent pid upward)
//! and ask the OS for each ancestor's controlling terminal; the first hit
//! wins. Best-effort — a session without a TTY is legal and simply skips
//! TTY-based identity and liveness.

use std::process::Command;

use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

/// How far up the process tree to look before giving up.
const MAX_ANCESTORS: usize = 10;

/// Resolves the controlling TTY device path (e.g. `/dev/ttys003`) for this
/// hook invocation, or `None` if no ancestor has one.
pub fn resolve() -> Option<String> {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessRefreshKind::new().with_cmd(UpdateKind::Always));

    let mut pid = get_ppid()?;
    for _ in 0..MAX_ANCESTORS {
        if let Some(tty) = tty_of_pid(pid) {
            return Some(tty);
        }
        let parent = sys
            .process(Pid::from_u32(pid))
            .and_then(|p| p.parent())
            .map(|p| p.as_u32())?;
        if parent == pid || parent <= 1 {
            return None;
        }
        pid = parent;
    }
    None
}

/// Asks `ps` for the controlling terminal of one pid. `??` means none.
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

fn get_ppid() -> Option<u32> {
    #[cfg(unix)]
    {
        // SAFETY: getppid() is a simple syscall that returns the parent
        // process ID. It has no failure modes.
        #[allow(unsafe_code)]
        Some(unsafe { libc::getppid() } as u32)
    }
    #[cfg(not(unix))]
    {
        None
    }
}
