// Library module for testable functions

pub mod ingestion;

/// Human-readable label for the provider's AQI scale
/// Scale: 1 = Good ... 5 = Very Poor
pub fn aqi_category(aqi: u8) -> Option<&'static str> {
    match aqi {
        1 => Some("Good"),
        2 => Some("Fair"),
        3 => Some("Moderate"),
        4 => Some("Poor"),
        5 => Some("Very Poor"),
        _ => None,
    }
}
