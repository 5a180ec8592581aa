//! Parse functions - transform raw provider JSON into Record structs

use crate::aqi_category;
use crate::ingestion::error::FetchError;
use crate::ingestion::types::{RawResponse, Record};
use crate::ingestion::utils::timestamp_from_unix;
use serde::Deserialize;
use tracing::{debug, warn};

/// Air pollution response envelope
#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    coord: Coord,
    list: Vec<AirPollutionItem>,
}

#[derive(Debug, Deserialize)]
struct Coord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct AirPollutionItem {
    dt: i64, // unix seconds, UTC
    main: MainIndex,
    #[serde(default)]
    components: Components,
}

#[derive(Debug, Deserialize)]
struct MainIndex {
    aqi: u8,
}

/// Pollutant concentrations; the provider may omit any of them
#[derive(Debug, Default, Deserialize)]
struct Components {
    co: Option<f64>,
    no: Option<f64>,
    no2: Option<f64>,
    o3: Option<f64>,
    so2: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    nh3: Option<f64>,
}

/// Normalize one provider response into flat records
pub fn parse_air_pollution(raw: &RawResponse) -> Result<Vec<Record>, FetchError> {
    let has_items = raw
        .body
        .get("list")
        .and_then(|list| list.as_array())
        .is_some_and(|list| !list.is_empty());

    if !has_items {
        warn!("No measurements in response for {}", raw.location);
        return Ok(Vec::new());
    }

    let response = AirPollutionResponse::deserialize(&raw.body)?;

    let records = response
        .list
        .into_iter()
        .map(|item| parse_item(item, &response.coord))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} records for {}", records.len(), raw.location);

    Ok(records)
}

fn parse_item(item: AirPollutionItem, coord: &Coord) -> Result<Record, FetchError> {
    let timestamp = timestamp_from_unix(item.dt).ok_or(FetchError::InvalidTimestamp(item.dt))?;

    debug!(
        "{} @ ({}, {}): aqi {} ({})",
        timestamp,
        coord.lat,
        coord.lon,
        item.main.aqi,
        aqi_category(item.main.aqi).unwrap_or("unknown")
    );

    let c = item.components;
    Ok(Record {
        timestamp,
        lat: coord.lat,
        lon: coord.lon,
        aqi: item.main.aqi,
        co: c.co,
        no: c.no,
        no2: c.no2,
        o3: c.o3,
        so2: c.so2,
        pm2_5: c.pm2_5,
        pm10: c.pm10,
        nh3: c.nh3,
    })
}
