//! Core data types for the ingestion pipeline
//! Pure data structures with no behavior

use crate::ingestion::utils::timestamp_format;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A place to poll, identified by name for logging
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Location {
            name: name.into(),
            lat,
            lon,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.lat, self.lon)
    }
}

/// Raw provider response for one location, not yet normalized
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub location: Location,
    pub body: serde_json::Value,
}

/// One measurement at one location at one instant
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
    pub aqi: u8,

    // Pollutant concentrations (μg/m³), absent when the provider omits them
    pub co: Option<f64>,
    pub no: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub nh3: Option<f64>,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            timestamp: self.timestamp,
            lat_bits: coord_bits(self.lat),
            lon_bits: coord_bits(self.lon),
        }
    }
}

/// Identity of a record slot: (timestamp, lat, lon) under exact equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    timestamp: NaiveDateTime,
    lat_bits: u64,
    lon_bits: u64,
}

// -0.0 and 0.0 compare equal as floats, so they must share a key
fn coord_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Ordered collection of records, ascending by timestamp once merged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl From<Vec<Record>> for Dataset {
    fn from(records: Vec<Record>) -> Self {
        Dataset { records }
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Dataset {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Fetch phase statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CollectStats {
    pub locations_ok: usize,
    pub locations_failed: usize,
    pub records_fetched: usize,
}

impl std::fmt::Display for CollectStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "locations ok: {}, locations failed: {}, records fetched: {}",
            self.locations_ok, self.locations_failed, self.records_fetched
        )
    }
}

/// Merge operation statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeStats {
    pub existing: usize,
    pub incoming: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub total: usize,
}

impl std::fmt::Display for MergeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "existing: {}, incoming: {}, inserted: {}, replaced: {}, total: {}",
            self.existing, self.incoming, self.inserted, self.replaced, self.total
        )
    }
}

/// Outcome of one collection run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub collect: CollectStats,
    /// `None` when nothing was fetched and the dataset was left untouched
    pub merge: Option<MergeStats>,
}
