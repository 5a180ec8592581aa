//! Utility functions for common operations

use crate::ingestion::error::{FetchError, PersistenceError};
use chrono::{DateTime, NaiveDateTime};
use reqwest::Client;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Canonical on-disk timestamp layout (sortable as text)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Accepted on read, in order of preference
const TIMESTAMP_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Max bytes of an error body kept in `FetchError::Status`
const ERROR_BODY_LIMIT: usize = 200;

/// Build the HTTP client shared by all fetches in a run
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// GET a JSON document
pub async fn http_get_json(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<serde_json::Value, FetchError> {
    // The query carries the credential, so only the base URL is logged
    debug!("Requesting {}", url);

    let response = client.get(url).query(query).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            status,
            body: truncate(&body, ERROR_BODY_LIMIT),
        });
    }

    let bytes = response.bytes().await?;
    debug!("Received {} bytes", bytes.len());
    Ok(serde_json::from_slice(&bytes)?)
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Convert provider unix seconds into a naive UTC timestamp
pub fn timestamp_from_unix(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Parse a stored timestamp, tolerating the common textual variants
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Create the directory that will hold `path`, if any
pub fn ensure_parent_dir(path: &Path) -> Result<(), PersistenceError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            info!("Created directory {:?}", dir);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Serde adapter writing timestamps in [`TIMESTAMP_FORMAT`]
pub mod timestamp_format {
    use super::{parse_timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
    }
}
