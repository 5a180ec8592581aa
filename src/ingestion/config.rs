//! Run configuration - explicit values, loaded from the environment once

use crate::ingestion::types::Location;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org/data/2.5/air_pollution";
pub const DEFAULT_OUTPUT_PATH: &str = "data/Air_Quality_Data.csv";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for one collection run
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider credential, sent as `appid`
    pub api_key: String,
    pub base_url: String,
    pub output_path: PathBuf,
    pub request_timeout: Duration,
    pub locations: Vec<Location>,
}

impl Config {
    pub fn new(api_key: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Config {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_path: output_path.into(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            locations: default_locations(),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = get("OPENWEATHER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("OPENWEATHER_API_KEY must be set")?;

        let request_timeout = match get("AQI_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("AQI_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let locations = match get("AQI_LOCATIONS") {
            Some(raw) => parse_locations(&raw).context("AQI_LOCATIONS is invalid")?,
            None => default_locations(),
        };

        Ok(Config {
            api_key,
            base_url: get("OPENWEATHER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            output_path: get("AQI_OUTPUT_PATH")
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string())
                .into(),
            request_timeout,
            locations,
        })
    }
}

/// Cities polled when no list is configured
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Mumbai", 19.0760, 72.8777),
        Location::new("Delhi", 28.6139, 77.2090),
        Location::new("Kolkata", 22.5726, 88.3639),
        Location::new("Chennai", 13.0827, 80.2707),
    ]
}

/// Parse `Name:lat:lon;Name:lat:lon`
pub fn parse_locations(raw: &str) -> Result<Vec<Location>> {
    let locations = raw
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_location)
        .collect::<Result<Vec<_>>>()?;

    if locations.is_empty() {
        bail!("no locations given");
    }

    Ok(locations)
}

fn parse_location(entry: &str) -> Result<Location> {
    let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
    let [name, lat, lon] = parts.as_slice() else {
        return Err(anyhow!("expected Name:lat:lon, got {:?}", entry));
    };

    if name.is_empty() {
        bail!("location name is empty in {:?}", entry);
    }

    let lat: f64 = lat
        .parse()
        .with_context(|| format!("invalid latitude for {}", name))?;
    let lon: f64 = lon
        .parse()
        .with_context(|| format!("invalid longitude for {}", name))?;

    if !(-90.0..=90.0).contains(&lat) {
        bail!("latitude {} for {} is out of range", lat, name);
    }
    if !(-180.0..=180.0).contains(&lon) {
        bail!("longitude {} for {} is out of range", lon, name);
    }

    Ok(Location::new(*name, lat, lon))
}

/// Narrow `all` to the named locations (case-insensitive)
/// An empty name list selects everything
pub fn select_locations(all: &[Location], names: &[String]) -> Vec<Location> {
    if names.is_empty() {
        return all.to_vec();
    }

    for name in names {
        if !all.iter().any(|loc| loc.name.eq_ignore_ascii_case(name)) {
            warn!("Unknown location: {}", name);
        }
    }

    all.iter()
        .filter(|loc| names.iter().any(|name| loc.name.eq_ignore_ascii_case(name)))
        .cloned()
        .collect()
}
