use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::StoreError;
use crate::records::{FocusRecord, RecordStore};
use crate::store::KeyValueStore;

/// Point-in-time dump of the flight log
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot<'a> {
    pub export_time: String,
    pub total_focus_time: u64,
    pub total_records: usize,
    pub focus_history: &'a [FocusRecord],
}

impl<'a> ExportSnapshot<'a> {
    pub fn new<S: KeyValueStore>(records: &'a RecordStore<S>, at: DateTime<Utc>) -> Self {
        Self {
            export_time: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_focus_time: records.total_minutes(),
            total_records: records.history().len(),
            focus_history: records.history(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick the format from a file extension, JSON unless it says `.csv`
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

pub fn write_json<W: Write>(snapshot: &ExportSnapshot, writer: W) -> Result<(), StoreError> {
    serde_json::to_writer_pretty(writer, snapshot)?;
    Ok(())
}

/// One row per record, header taken from the record's field names
pub fn write_csv<W: Write>(history: &[FocusRecord], writer: W) -> Result<(), StoreError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in history {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path<S: KeyValueStore>(
    records: &RecordStore<S>,
    path: &Path,
    at: DateTime<Utc>,
) -> Result<ExportFormat, StoreError> {
    let format = ExportFormat::from_path(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;

    match format {
        ExportFormat::Json => write_json(&ExportSnapshot::new(records, at), file)?,
        ExportFormat::Csv => write_csv(records.history(), file)?,
    }

    log::info!(
        "exported {} records to {} as {format:?}",
        records.history().len(),
        path.display()
    );
    Ok(format)
}
