//! Tab-name enrichment backend.
//!
//! The real terminal integrations (per-app scripting) live outside this
//! process; what we can always do is label a TTY with the command running on
//! it, which is what this backend provides. It slots into the core's
//! [`TabNameLookup`] chain ahead of nothing-at-all.

use std::process::Command;

use termdock_core::TabNameLookup;

/// Labels a TTY with the foreground-most command attached to it.
#[derive(Debug, Clone, Default)]
pub struct ForegroundCommandTabs;

impl TabNameLookup for ForegroundCommandTabs {
    fn tab_name(&self, tty: &str) -> Option<String> {
        let name = tty.strip_prefix("/dev/").unwrap_or(tty);
        let output = Command::new("ps")
            .args(["-o", "comm=", "-t", name])
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        // Last row is the most recently started process on the tty, which is
        // a better label than the login shell on row one.
        let command = stdout.lines().rev().find_map(|line| {
            let line = line.trim();
            (!line.is_empty()).then(|| line.to_string())
        })?;
        // Strip a path prefix if ps reported one.
        Some(
            command
                .rsplit('/')
                .next()
                .unwrap_or(command.as_str())
                .to_string(),
        )
    }
}
