//! Write functions - load and persist the CSV dataset
//!
//! The file is always rewritten in full: rows go to a sibling `.tmp` file
//! which is then renamed over the target.

use crate::ingestion::error::PersistenceError;
use crate::ingestion::types::{Dataset, Record};
use crate::ingestion::utils::ensure_parent_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// CSV header, in column order
pub const COLUMNS: [&str; 12] = [
    "timestamp", "lat", "lon", "aqi", "co", "no", "no2", "o3", "so2", "pm2_5", "pm10", "nh3",
];

/// Load the stored dataset; a missing or empty file is an empty dataset
pub fn read_dataset(path: &Path) -> Result<Dataset, PersistenceError> {
    if !path.exists() {
        info!("No existing dataset at {:?}, starting empty", path);
        return Ok(Dataset::new());
    }

    let metadata = fs::metadata(path).map_err(|source| io_error(path, source))?;
    if metadata.len() == 0 {
        warn!("Dataset file {:?} is empty, starting empty", path);
        return Ok(Dataset::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| read_error(path, source))?;

    // A bad row aborts the run; rewriting without it would lose data
    let records = reader
        .deserialize::<Record>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| read_error(path, source))?;

    info!("Loaded {} existing records from {:?}", records.len(), path);

    Ok(Dataset::from(records))
}

/// Replace the stored dataset with `dataset`
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), PersistenceError> {
    ensure_parent_dir(path)?;

    let tmp_path = temp_path_for(path);
    if let Err(e) = write_rows(&tmp_path, dataset) {
        // Best effort; the write error is what gets reported
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|source| io_error(path, source))?;
    info!("Data has been saved to {:?} ({} records)", path, dataset.len());

    Ok(())
}

fn write_rows(tmp_path: &Path, dataset: &Dataset) -> Result<(), PersistenceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp_path)
        .map_err(|source| write_error(tmp_path, source))?;

    // Written by hand so an empty dataset still gets a header
    writer
        .write_record(COLUMNS)
        .map_err(|source| write_error(tmp_path, source))?;

    for record in dataset {
        writer
            .serialize(record)
            .map_err(|source| write_error(tmp_path, source))?;
    }

    writer.flush().map_err(|source| io_error(tmp_path, source))?;
    debug!("Wrote {} rows to {:?}", dataset.len(), tmp_path);

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_error(path: &Path, source: csv::Error) -> PersistenceError {
    PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path, source: csv::Error) -> PersistenceError {
    PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    }
}
