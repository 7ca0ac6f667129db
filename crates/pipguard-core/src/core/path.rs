use crate::core::error::{PipguardError, PipguardResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the pipguard home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\pipguard
/// - Linux: ~/.config/pipguard
/// - macOS: ~/Library/Application Support/pipguard
pub fn pipguard_home() -> PipguardResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| PipguardError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("pipguard"))
}

/// Get the config file path (`<pipguard home>/config.yaml`)
pub fn config_file() -> PipguardResult<PathBuf> {
    Ok(pipguard_home()?.join("config.yaml"))
}

/// Python interpreter inside a virtual environment
pub fn venv_python(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> PipguardResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
