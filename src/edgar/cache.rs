use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::parsing::ExtractedItems;
use super::report::ReportType;
use crate::utils::dirs::ensure_dir;

/// Extracted items persisted as JSON, one file per ticker and form type.
#[derive(Debug, Clone)]
pub struct ItemsCache {
    dir: PathBuf,
}

impl ItemsCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, ticker: &str, form: &ReportType) -> PathBuf {
        let form = form.to_string().replace(['/', ' '], "_");
        self.dir
            .join(format!("{}_{}.json", ticker.trim().to_uppercase(), form))
    }

    pub fn load(&self, ticker: &str, form: &ReportType) -> Result<Option<ExtractedItems>> {
        let path = self.path_for(ticker, form);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let items = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse cached items {:?}: {}", path, e))?;
        log::debug!("Loaded cached items from {:?}", path);
        Ok(Some(items))
    }

    pub fn store(&self, ticker: &str, form: &ReportType, items: &ExtractedItems) -> Result<PathBuf> {
        ensure_dir(&self.dir)?;
        let path = self.path_for(ticker, form);
        fs::write(&path, serde_json::to_string_pretty(items)?)?;
        log::debug!("Saved {} item(s) to {:?}", items.len(), path);
        Ok(path)
    }
}
