//! Hourly forecast providers.
//!
//! `WeatherProvider` is the seam the enricher depends on; `OpenMeteoProvider`
//! is the production implementation backed by the free Open-Meteo API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinates, HourlySample, WeatherCondition, WeatherError};

const HOURLY_VARIABLES: &str = "temperature_2m,cloud_cover,precipitation_probability,weather_code";
const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";
const USER_AGENT: &str = "T-Minus/0.1.0";

/// Source of hourly forecast samples for a point and time window.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Hourly samples covering `[start, end]`, in ascending time order.
    async fn hourly_forecast(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    cloud_cover: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: String,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoProvider {
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self), level = "debug")]
    async fn hourly_forecast(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let start_hour = floor_hour(start).format(HOUR_FORMAT).to_string();
        let end_hour = ceil_hour(end).format(HOUR_FORMAT).to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", at.latitude.to_string()),
                ("longitude", at.longitude.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("start_hour", start_hour),
                ("end_hour", end_hour),
                ("timezone", "GMT".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.reason)
                .unwrap_or(text);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))?;

        let samples = body.hourly.map(parse_hourly).transpose()?.unwrap_or_default();
        tracing::debug!("Open-Meteo returned {} hourly samples", samples.len());
        Ok(samples)
    }
}

/// Zip Open-Meteo's column arrays into samples. Hours with a missing value are dropped.
fn parse_hourly(block: HourlyBlock) -> Result<Vec<HourlySample>, WeatherError> {
    let mut samples = Vec::with_capacity(block.time.len());

    for (i, raw_time) in block.time.iter().enumerate() {
        let time = NaiveDateTime::parse_from_str(raw_time, HOUR_FORMAT)
            .map_err(|e| WeatherError::Parse(format!("Invalid hour '{}': {}", raw_time, e)))?
            .and_utc();

        let column = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(temperature), Some(cloud), Some(precipitation), Some(code)) = (
            column(&block.temperature_2m),
            column(&block.cloud_cover),
            column(&block.precipitation_probability),
            block.weather_code.get(i).copied().flatten(),
        ) else {
            tracing::trace!("Skipping incomplete hourly sample at {}", raw_time);
            continue;
        };

        samples.push(HourlySample {
            time,
            temperature_celsius: temperature,
            cloud_cover: percent_to_fraction(cloud),
            precipitation_chance: percent_to_fraction(precipitation),
            condition: WeatherCondition::from_wmo_code(code),
        });
    }

    Ok(samples)
}

fn percent_to_fraction(percent: f64) -> f64 {
    (percent / 100.0).clamp(0.0, 1.0)
}

fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

fn ceil_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let floored = floor_hour(t);
    if floored == t {
        t
    } else {
        floored + Duration::hours(1)
    }
}
