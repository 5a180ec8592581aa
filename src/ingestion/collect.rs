//! Run driver - fetch every location, merge, persist

use crate::ingestion::config::Config;
use crate::ingestion::error::FetchError;
use crate::ingestion::fetch::fetch_air_pollution;
use crate::ingestion::merge::merge_with_stats;
use crate::ingestion::parse::parse_air_pollution;
use crate::ingestion::types::{CollectStats, Location, Record, RunSummary};
use crate::ingestion::utils::build_http_client;
use crate::ingestion::write::{read_dataset, write_dataset};
use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{error, info, warn};

/// Fetch and normalize records for a single location
pub async fn fetch_location(
    client: &Client,
    config: &Config,
    location: &Location,
) -> Result<Vec<Record>, FetchError> {
    let raw = fetch_air_pollution(client, &config.base_url, &config.api_key, location).await?;
    parse_air_pollution(&raw)
}

/// Poll every configured location in order
/// A failing location is logged and skipped
pub async fn collect_all(client: &Client, config: &Config) -> (Vec<Record>, CollectStats) {
    let mut records = Vec::new();
    let mut stats = CollectStats::default();

    for location in &config.locations {
        match fetch_location(client, config, location).await {
            Ok(fetched) => {
                info!("Processing data for {} ({} records)", location.name, fetched.len());
                stats.locations_ok += 1;
                stats.records_fetched += fetched.len();
                records.extend(fetched);
            }
            Err(e) => {
                error!("Error fetching data for {}: {}", location, e);
                stats.locations_failed += 1;
            }
        }
    }

    (records, stats)
}

/// Run one collection pass against the dataset at `config.output_path`
pub async fn run(config: &Config) -> Result<RunSummary> {
    info!("Step 1/3: Loading existing dataset...");
    let existing = read_dataset(&config.output_path)?;

    info!("Step 2/3: Fetching {} locations...", config.locations.len());
    let client =
        build_http_client(config.request_timeout).context("Failed to build HTTP client")?;
    let (incoming, collect) = collect_all(&client, config).await;
    info!("✓ Fetch complete: {}", collect);

    if incoming.is_empty() {
        warn!("No records fetched, leaving {:?} untouched", config.output_path);
        return Ok(RunSummary {
            collect,
            merge: None,
        });
    }

    info!("Step 3/3: Merging and writing dataset...");
    let (merged, merge) = merge_with_stats(existing, incoming);
    write_dataset(&config.output_path, &merged)?;
    info!("✓ Merge complete: {}", merge);

    Ok(RunSummary {
        collect,
        merge: Some(merge),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::types::Dataset;
    use chrono::NaiveDate;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const DT_0000: i64 = 1_704_067_200; // 2024-01-01 00:00:00 UTC

    fn query_param<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        let target = request.lines().next()?.split_whitespace().nth(1)?;
        let query = target.split_once('?')?.1;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Minimal HTTP/1.1 stub: echoes the requested coordinates back as one
    /// reading, or 500s for latitudes listed in `failing_lats`
    async fn spawn_provider(failing_lats: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let lat = query_param(&request, "lat").unwrap_or("0").to_string();
                let lon = query_param(&request, "lon").unwrap_or("0").to_string();

                let (status, body) = if failing_lats.contains(&lat) {
                    ("500 Internal Server Error", "{\"message\":\"boom\"}".to_string())
                } else {
                    (
                        "200 OK",
                        format!(
                            "{{\"coord\":{{\"lon\":{lon},\"lat\":{lat}}},\"list\":[{{\"main\":{{\"aqi\":3}},\"components\":{{\"pm2_5\":40.2}},\"dt\":{DT_0000}}}]}}"
                        ),
                    )
                };

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/data/2.5/air_pollution", addr)
    }

    fn test_config(base_url: String, output: std::path::PathBuf) -> Config {
        Config {
            api_key: "test-key".to_string(),
            base_url,
            output_path: output,
            request_timeout: Duration::from_secs(5),
            locations: vec![
                Location::new("Mumbai", 19.076, 72.8777),
                Location::new("Delhi", 28.6139, 77.209),
            ],
        }
    }

    fn stored_record() -> Record {
        Record {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            lat: 19.076,
            lon: 72.8777,
            aqi: 2,
            co: None,
            no: None,
            no2: None,
            o3: None,
            so2: None,
            pm2_5: Some(35.1),
            pm10: None,
            nh3: None,
        }
    }

    #[tokio::test]
    async fn test_run_unreachable_provider_leaves_file_untouched() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Air_Quality_Data.csv");
        write_dataset(&path, &Dataset::from(vec![stored_record()])).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let config = test_config("http://127.0.0.1:9/air_pollution".to_string(), path.clone());
        let summary = run(&config).await.unwrap();

        assert_eq!(summary.collect.locations_failed, 2);
        assert_eq!(summary.collect.records_fetched, 0);
        assert!(summary.merge.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_no_data_creates_no_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("data").join("Air_Quality_Data.csv");

        let config = test_config("http://127.0.0.1:9/air_pollution".to_string(), path.clone());
        run(&config).await.unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_run_merges_into_existing() {
        let base_url = spawn_provider(Vec::new()).await;
        let temp = tempdir().unwrap();
        let path = temp.path().join("data").join("Air_Quality_Data.csv");
        write_dataset(&path, &Dataset::from(vec![stored_record()])).unwrap();

        let summary = run(&test_config(base_url, path.clone())).await.unwrap();

        let merge = summary.merge.unwrap();
        assert_eq!(summary.collect.locations_ok, 2);
        assert_eq!(merge.replaced, 1);
        assert_eq!(merge.inserted, 1);

        let stored = read_dataset(&path).unwrap();
        assert_eq!(stored.len(), 2);
        let mumbai = stored.iter().find(|r| r.lat == 19.076).unwrap();
        assert_eq!(mumbai.aqi, 3);
        assert_eq!(mumbai.pm2_5, Some(40.2));
    }

    #[tokio::test]
    async fn test_run_is_stable_across_repeats() {
        let base_url = spawn_provider(Vec::new()).await;
        let temp = tempdir().unwrap();
        let path = temp.path().join("Air_Quality_Data.csv");
        let config = test_config(base_url, path.clone());

        run(&config).await.unwrap();
        let first = fs::read_to_string(&path).unwrap();
        run(&config).await.unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_collect_all_skips_failed_location() {
        let base_url = spawn_provider(vec!["28.6139".to_string()]).await;
        let temp = tempdir().unwrap();
        let config = test_config(base_url, temp.path().join("unused.csv"));
        let client = build_http_client(config.request_timeout).unwrap();

        let (records, stats) = collect_all(&client, &config).await;

        assert_eq!(stats.locations_ok, 1);
        assert_eq!(stats.locations_failed, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lat, 19.076);
    }

    #[tokio::test]
    async fn test_fetch_location_status_error() {
        let base_url = spawn_provider(vec!["19.076".to_string()]).await;
        let temp = tempdir().unwrap();
        let config = test_config(base_url, temp.path().join("unused.csv"));
        let client = build_http_client(config.request_timeout).unwrap();

        let result = fetch_location(&client, &config, &config.locations[0]).await;

        match result {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("boom"));
            }
            other => panic!("Expected Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_corrupt_dataset_is_fatal() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("Air_Quality_Data.csv");
        fs::write(&path, "timestamp,lat,lon,aqi\ngarbage,1,2,3\n").unwrap();

        let config = test_config("http://127.0.0.1:9/air_pollution".to_string(), path);

        assert!(run(&config).await.is_err());
    }
}
