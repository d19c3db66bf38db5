//! Persistent set of identifiers already harvested for a scope.
//!
//! The file holds one identifier per line and is only ever appended to.
//! Each mark is synced to disk before returning, so a crash never loses an
//! identifier whose record was already stored.

use crate::error::{HarvestError, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Done-set backed by an append-only text file.
#[derive(Debug)]
pub struct DoneSet {
    path: PathBuf,
    ids: HashSet<String>,
    file: Option<File>,
}

impl DoneSet {
    /// Load the set from `path`. A missing file is an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(HarvestError::io(&path, e)),
        };

        tracing::info!(
            path = %path.display(),
            "Loaded {} already processed identifiers",
            ids.len()
        );

        Ok(Self {
            path,
            ids,
            file: None,
        })
    }

    /// Whether `id` has been marked.
    #[must_use]
    pub fn is_done(&self, id: &str) -> bool {
        self.ids.contains(id.trim())
    }

    /// The first done identifier embedded in `url`, if any.
    ///
    /// Profile URLs carry the national identifier with a one-digit type
    /// prefix, so this is a substring test rather than an exact match.
    #[must_use]
    pub fn matches_url(&self, url: &str) -> Option<&str> {
        self.ids
            .iter()
            .map(String::as_str)
            .find(|id| url.contains(id))
    }

    /// Append `id` and sync it to disk. Returns `false` if it was already present.
    pub fn mark_done(&mut self, id: &str) -> Result<bool> {
        let id = id.trim();
        if id.is_empty() || self.ids.contains(id) {
            return Ok(false);
        }

        let file = match &mut self.file {
            Some(file) => file,
            slot => slot.insert(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| HarvestError::io(&self.path, e))?,
            ),
        };

        file.write_all(format!("{id}\n").as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| HarvestError::io(&self.path, e))?;

        self.ids.insert(id.to_string());
        Ok(true)
    }

    /// Number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no identifier has been marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = DoneSet::load(dir.path().join("done.txt")).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_done("10101234567"));
    }

    #[test]
    fn test_mark_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");

        let mut set = DoneSet::load(&path).unwrap();
        assert!(set.mark_done("10101234567").unwrap());
        assert!(set.mark_done(" 10107654321 ").unwrap());
        assert!(!set.mark_done("10101234567").unwrap());
        assert!(!set.mark_done("  ").unwrap());
        drop(set);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "10101234567\n10107654321\n");

        let set = DoneSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_done("10107654321"));
    }

    #[test]
    fn test_load_ignores_blank_lines_and_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.txt");
        std::fs::write(&path, "10101234567\n\n  10107654321  \r\n").unwrap();

        let set = DoneSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.is_done("10107654321"));
    }

    #[test]
    fn test_matches_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = DoneSet::load(dir.path().join("done.txt")).unwrap();
        set.mark_done("10101234567").unwrap();

        let url = "https://annuaire.sante.fr/web/site-pro/information-detaillees?idNat=810101234567";
        assert_eq!(set.matches_url(url), Some("10101234567"));
        assert_eq!(
            set.matches_url("https://annuaire.sante.fr/web/site-pro/information-detaillees?idNat=810109999999"),
            None
        );
    }
}
