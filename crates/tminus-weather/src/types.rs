use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    /// Symbol name stored on the launch and rendered by the list row.
    pub fn symbol_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun.max",
            Self::PartlyCloudy => "cloud.sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud.fog",
            Self::Drizzle => "cloud.drizzle",
            Self::Rain => "cloud.rain",
            Self::HeavyRain => "cloud.heavyrain",
            Self::Snow => "cloud.snow",
            Self::Sleet => "cloud.sleet",
            Self::Thunderstorm => "cloud.bolt.rain",
        }
    }
}

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One hourly forecast sample from a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub time: DateTime<Utc>,
    pub temperature_celsius: f64,
    /// Fraction of sky covered, 0.0 to 1.0
    pub cloud_cover: f64,
    /// Probability of precipitation, 0.0 to 1.0
    pub precipitation_chance: f64,
    pub condition: WeatherCondition,
}

/// Weather at the pad for the launch hour, as persisted on a launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadWeather {
    pub cloud_cover: f64,
    pub symbol_name: String,
    pub precipitation_chance: f64,
    pub temperature_celsius: f64,
}

impl From<&HourlySample> for PadWeather {
    fn from(sample: &HourlySample) -> Self {
        Self {
            cloud_cover: sample.cloud_cover,
            symbol_name: sample.condition.symbol_name().to_string(),
            precipitation_chance: sample.precipitation_chance,
            temperature_celsius: sample.temperature_celsius,
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Why a pad weather lookup produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Weather provider failed: {0}")]
    Provider(#[from] WeatherError),
    #[error("No hourly sample between {start} and {end}")]
    NoSample {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
