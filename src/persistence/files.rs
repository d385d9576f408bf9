use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Get the tally data directory - honors TALLY_DATA_DIR, then falls back to
/// the platform data dir, then the current directory.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("TALLY_DATA_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::data_dir() {
        Some(base) => base.join("tally"),
        None => PathBuf::from("."),
    }
}

/// Ensure the data directory exists
pub fn ensure_data_dir() -> Result<PathBuf> {
    let dir = get_data_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir)
}

/// Get path to the persisted task list
pub fn tasks_file() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join("tasks.json"))
}

/// Get path to the per-day time history
pub fn history_file() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join("history.json"))
}

/// Get path to the reward ledger state
pub fn cards_state_file() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join("cards_state.json"))
}

/// Get path to the optional encouragement lines
pub fn encouragements_file() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join("encouragements.json"))
}

/// Get path to meta.json (goal latch and other app metadata)
pub fn meta_file() -> Result<PathBuf> {
    Ok(ensure_data_dir()?.join("meta.json"))
}

/// Get the reward card pool directory, creating it if needed so users have
/// a place to drop images.
pub fn cards_dir() -> Result<PathBuf> {
    let dir = ensure_data_dir()?.join("card_pool");
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir)
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .context("File path has no parent directory")?;

    // Create temp file in the same directory
    let mut temp_file = NamedTempFile::new_in(dir)
        .context("Failed to create temporary file")?;

    // Write content
    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    // Sync to disk
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    // Atomically rename temp file to target
    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Read file content, return empty string if file doesn't exist
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}
