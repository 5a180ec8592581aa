//! Fetch functions - retrieve raw data from the air-quality provider

use crate::ingestion::error::FetchError;
use crate::ingestion::types::{Location, RawResponse};
use crate::ingestion::utils::http_get_json;
use reqwest::Client;
use tracing::info;

/// Fetch current air pollution for one location (OpenWeather JSON)
pub async fn fetch_air_pollution(
    client: &Client,
    base_url: &str,
    api_key: &str,
    location: &Location,
) -> Result<RawResponse, FetchError> {
    let query = [
        ("lat", location.lat.to_string()),
        ("lon", location.lon.to_string()),
        ("appid", api_key.to_string()),
    ];

    let body = http_get_json(client, base_url, &query).await?;
    info!(
        "Successfully fetched data for coordinates: {}, {}",
        location.lat, location.lon
    );

    Ok(RawResponse {
        location: location.clone(),
        body,
    })
}
