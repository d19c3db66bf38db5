//! Append-only JSONL record store.

use crate::error::{HarvestError, Result};
use annuaire_core::StructuredRecord;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One structured record per line, synced on every append.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    file: File,
    appended: usize,
}

impl RecordStore {
    /// Open `path` for appending, creating it if needed.
    ///
    /// A last line left without its newline by an interrupted write is
    /// terminated first, so the next record starts on a line of its own.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| HarvestError::io(&path, e))?;

        if ends_with_partial_line(&mut file).map_err(|e| HarvestError::io(&path, e))? {
            tracing::warn!(
                "Record store {} ends with an incomplete line; starting a new one",
                path.display()
            );
            file.write_all(b"\n")
                .and_then(|()| file.sync_data())
                .map_err(|e| HarvestError::io(&path, e))?;
        }

        Ok(Self {
            path,
            file,
            appended: 0,
        })
    }

    /// Append one record. The line is on disk when this returns.
    pub fn append(&mut self, record: &StructuredRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.sync_data())
            .map_err(|e| HarvestError::io(&self.path, e))?;

        self.appended += 1;
        Ok(())
    }

    /// Flush and sync any pending data.
    pub fn flush(&mut self) -> Result<()> {
        self.file
            .flush()
            .and_then(|()| self.file.sync_all())
            .map_err(|e| HarvestError::io(&self.path, e))
    }

    /// Records appended through this handle.
    #[must_use]
    pub fn appended(&self) -> usize {
        self.appended
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ends_with_partial_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
