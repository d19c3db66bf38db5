//! File layout of one search scope.

use crate::error::{HarvestError, Result};
use annuaire_core::{GeneralConfig, SearchScope};
use std::path::{Path, PathBuf};

/// The four files belonging to a `(keyword, location)` scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePaths {
    /// Append-only record store (`.jsonl`)
    pub store: PathBuf,
    /// Aggregated JSON array (`.json`)
    pub json: PathBuf,
    /// Aggregated table (`.csv`)
    pub csv: PathBuf,
    /// Done-set (`.txt`)
    pub done: PathBuf,
}

impl ScopePaths {
    /// Paths for `scope` under the given output and done directories.
    #[must_use]
    pub fn new(output_dir: &Path, done_dir: &Path, scope: &SearchScope) -> Self {
        let stem = scope.file_stem();
        Self {
            store: output_dir.join(format!("{stem}.jsonl")),
            json: output_dir.join(format!("{stem}.json")),
            csv: output_dir.join(format!("{stem}.csv")),
            done: done_dir.join(format!("{stem}.txt")),
        }
    }

    /// Paths for `scope` under the configured directories.
    #[must_use]
    pub fn from_config(config: &GeneralConfig, scope: &SearchScope) -> Self {
        Self::new(&config.output_dir, &config.done_dir, scope)
    }

    /// Create the parent directories of every file.
    pub fn ensure_dirs(&self) -> Result<()> {
        for path in [&self.store, &self.done] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| HarvestError::io(parent, e))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_the_scope_stem() {
        let scope = SearchScope::new("Médecin", "bordeaux").unwrap();
        let paths = ScopePaths::from_config(&GeneralConfig::default(), &scope);

        assert_eq!(paths.store, Path::new("scraped_data/Médecin_bordeaux.jsonl"));
        assert_eq!(paths.json, Path::new("scraped_data/Médecin_bordeaux.json"));
        assert_eq!(paths.csv, Path::new("scraped_data/Médecin_bordeaux.csv"));
        assert_eq!(paths.done, Path::new("done/Médecin_bordeaux.txt"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let scope = SearchScope::new("Infirmier", "Pessac").unwrap();
        let paths = ScopePaths::new(&dir.path().join("out"), &dir.path().join("done"), &scope);

        paths.ensure_dirs().unwrap();
        assert!(dir.path().join("out").is_dir());
        assert!(dir.path().join("done").is_dir());
    }
}
