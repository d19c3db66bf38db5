//! Final JSON and CSV outputs built from the record store.

use crate::error::{HarvestError, Result};
use crate::scope::ScopePaths;
use annuaire_core::{Field, ProfileRecord, StructuredRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// UTF-8 byte order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = "\u{FEFF}".as_bytes();

/// What an aggregation pass produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutputs {
    /// Pretty-printed JSON array
    pub json_path: PathBuf,
    /// BOM-prefixed CSV
    pub csv_path: PathBuf,
    /// Records written to both files
    pub records: usize,
    /// Store lines that could not be parsed
    pub malformed_lines: usize,
}

/// Rebuild the JSON and CSV outputs of a scope from its store.
///
/// Malformed store lines are logged with their line number and skipped. A
/// missing store produces an empty array and a header-only table.
pub fn aggregate(paths: &ScopePaths) -> Result<AggregateOutputs> {
    let (records, malformed_lines) = read_store(&paths.store)?;

    write_json(&paths.json, &records)?;

    let flat: Vec<ProfileRecord> = records.iter().map(StructuredRecord::to_flat).collect();
    write_csv(&paths.csv, &flat)?;

    tracing::info!(
        json = %paths.json.display(),
        csv = %paths.csv.display(),
        "Wrote aggregated outputs ({} records, {} malformed lines skipped)",
        records.len(),
        malformed_lines
    );

    Ok(AggregateOutputs {
        json_path: paths.json.clone(),
        csv_path: paths.csv.clone(),
        records: records.len(),
        malformed_lines,
    })
}

fn read_store(path: &Path) -> Result<(Vec<StructuredRecord>, usize)> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(
                "Record store {} not found; writing empty outputs",
                path.display()
            );
            return Ok((Vec::new(), 0));
        }
        Err(e) => return Err(HarvestError::io(path, e)),
    };

    let mut records = Vec::new();
    let mut malformed = 0;

    // Split on raw bytes: a torn write can leave a line that is not UTF-8.
    for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
        let line = line.map_err(|e| HarvestError::io(path, e))?;
        let parsed = match String::from_utf8(line) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => StructuredRecord::from_json_line(text.trim()).map_err(|e| e.to_string()),
            Err(e) => Err(format!("not valid UTF-8: {e}")),
        };

        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed += 1;
                tracing::warn!(
                    "Skipping malformed line {} of {}: {}",
                    index + 1,
                    path.display(),
                    e
                );
            }
        }
    }

    Ok((records, malformed))
}

fn write_json(path: &Path, records: &[StructuredRecord]) -> Result<()> {
    let file = File::create(path).map_err(|e| HarvestError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| HarvestError::io(path, e))
}

/// CSV columns: known fields in descriptor order, then any other key in
/// first-seen order. An empty input yields the full descriptor list.
#[must_use]
pub fn csv_columns(records: &[ProfileRecord]) -> Vec<String> {
    if records.is_empty() {
        return Field::ALL.iter().map(|f| f.key().to_string()).collect();
    }

    let mut columns: Vec<String> = Field::ALL
        .iter()
        .map(|f| f.key())
        .filter(|key| records.iter().any(|r| r.contains_key(key)))
        .map(str::to_string)
        .collect();

    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.to_string());
            }
        }
    }

    columns
}

fn write_csv(path: &Path, records: &[ProfileRecord]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| HarvestError::io(path, e))?;
    file.write_all(UTF8_BOM)
        .map_err(|e| HarvestError::io(path, e))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(BufWriter::new(file));

    let columns = csv_columns(records);
    writer.write_record(&columns)?;

    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }

    writer.flush().map_err(|e| HarvestError::io(path, e))
}
