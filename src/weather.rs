use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_URL: &str = "https://api.open-meteo.com";

/// The destinations the site offers weather for, keyed by name.
const DESTINATIONS: &[(&str, f64, f64)] = &[
    ("colombo", 6.9271, 79.8612),
    ("kandy", 7.2906, 80.6337),
    ("galle", 6.0535, 80.2210),
    ("mirissa", 5.9485, 80.4718),
    ("ella", 6.8667, 81.0466),
    ("sigiriya", 7.9570, 80.7603),
    ("nuwara eliya", 6.9497, 80.7891),
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Sunny,
    Cloudy,
    Foggy,
    Rainy,
    Snowy,
    Stormy,
}

/// WMO weather codes collapsed into the site's six conditions. Bands are
/// inclusive; anything unmapped reads as cloudy.
pub fn condition_for_code(code: i64) -> Condition {
    match code {
        0..=1 => Condition::Sunny,
        2..=3 => Condition::Cloudy,
        45..=48 => Condition::Foggy,
        51..=67 => Condition::Rainy,
        71..=77 => Condition::Snowy,
        80..=82 => Condition::Rainy,
        85..=86 => Condition::Snowy,
        95..=99 => Condition::Stormy,
        _ => Condition::Cloudy,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherReport {
    pub destination: String,
    pub latitude: f64,
    pub longitude: f64,
    pub condition: Condition,
    pub temperature_c: Option<f64>,
    pub source: &'static str,
}

fn lookup(destination: &str) -> Option<(&'static str, f64, f64)> {
    let wanted = destination.trim().to_ascii_lowercase();
    DESTINATIONS
        .iter()
        .find(|(name, _, _)| *name == wanted)
        .copied()
}

fn fallback_report(name: &'static str, latitude: f64, longitude: f64) -> WeatherReport {
    // The hill country reads cloudy when the feed is down, the coast sunny.
    let condition = match name {
        "ella" | "nuwara eliya" | "kandy" => Condition::Cloudy,
        _ => Condition::Sunny,
    };
    WeatherReport {
        destination: name.to_string(),
        latitude,
        longitude,
        condition,
        temperature_c: None,
        source: "fallback",
    }
}

#[derive(Debug, Deserialize)]
struct Forecast {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    weathercode: i64,
}

async fn fetch_live(
    client: &reqwest::Client,
    base_url: &str,
    name: &'static str,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<WeatherReport> {
    let url = format!(
        "{}/v1/forecast?latitude={latitude}&longitude={longitude}&current_weather=true",
        base_url.trim_end_matches('/')
    );

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("weather feed returned {status}");
    }

    let forecast: Forecast = response.json().await.context("parse weather feed")?;
    Ok(WeatherReport {
        destination: name.to_string(),
        latitude,
        longitude,
        condition: condition_for_code(forecast.current_weather.weathercode),
        temperature_c: Some(forecast.current_weather.temperature),
        source: "live",
    })
}

/// Looks up the destination's coordinates and fetches the current weather.
/// Returns None for destinations the site does not cover; feed failures fall
/// back to the static per-destination table.
pub async fn report(
    client: &reqwest::Client,
    base_url: &str,
    destination: &str,
) -> Option<WeatherReport> {
    let (name, latitude, longitude) = lookup(destination)?;

    match fetch_live(client, base_url, name, latitude, longitude).await {
        Ok(report) => Some(report),
        Err(err) => {
            tracing::warn!(
                destination = name,
                error = %format!("{err:#}"),
                "weather feed failed, serving fallback"
            );
            Some(fallback_report(name, latitude, longitude))
        }
    }
}
