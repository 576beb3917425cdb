use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

// Subdirectories below the configured data directory
pub const EDGAR_DIR: &str = "edgar";
pub const EDGAR_ITEMS_DIR: &str = "edgar/items";

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

pub fn items_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(EDGAR_ITEMS_DIR)
}

pub fn ensure_edgar_dirs(data_dir: &Path) -> Result<()> {
    ensure_dir(data_dir)?;
    ensure_dir(data_dir.join(EDGAR_DIR))?;
    ensure_dir(items_dir(data_dir))?;
    Ok(())
}
