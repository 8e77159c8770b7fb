//! Per-user data paths (~/.termdock).

use std::path::PathBuf;

use crate::error::TermdockError;

/// Returns the termdock data directory, creating it (owner-only) if needed.
pub fn data_dir() -> Result<PathBuf, TermdockError> {
    let home = dirs::home_dir().ok_or(TermdockError::HomeDirUnavailable)?;
    let dir = home.join(".termdock");
    if !dir.exists() {
        fs_err::create_dir_all(&dir).map_err(|e| TermdockError::DataDir {
            path: dir.clone(),
            source: e,
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs_err::set_permissions(&dir, std::fs::Permissions::from_mode(0o700));
        }
    }
    Ok(dir)
}

/// The persisted session store document.
pub fn store_path() -> Result<PathBuf, TermdockError> {
    Ok(data_dir()?.join("sessions.json"))
}

/// User display preferences / tuning knobs.
pub fn settings_path() -> Result<PathBuf, TermdockError> {
    Ok(data_dir()?.join("settings.json"))
}

/// Hook binary log directory.
pub fn logs_dir() -> Result<PathBuf, TermdockError> {
    Ok(data_dir()?.join("logs"))
}

/// Touched by the hook binary on every successful invocation so the watcher
/// can tell that hooks are installed and firing.
pub fn heartbeat_path() -> Result<PathBuf, TermdockError> {
    Ok(data_dir()?.join("hook-heartbeat"))
}
