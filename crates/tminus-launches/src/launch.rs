//! The locally persisted launch record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tminus_weather::{Coordinates, PadWeather};

/// Named launch pad position. Owned by its launch and stored inline with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// False when both coordinates are the `0.0` parse fallback.
    pub fn has_coordinates(&self) -> bool {
        self.longitude != 0.0 || self.latitude != 0.0
    }
}

/// A rocket launch and its pad context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    /// Provider identifier; unique in the store.
    pub code: String,
    /// "No earlier than" launch time.
    pub net: DateTime<Utc>,
    pub vehicle: String,
    pub mission: String,
    pub details: String,
    pub orbit: String,
    pub pad: String,
    pub country_code: String,
    pub location: Location,
    pub timezone_name: String,
    /// Pad weather for the launch hour, when enrichment succeeded.
    pub weather: Option<PadWeather>,
}

impl Launch {
    /// Creates a launch without weather. The location is named after the pad.
    pub fn new(
        code: impl Into<String>,
        net: DateTime<Utc>,
        vehicle: impl Into<String>,
        mission: impl Into<String>,
        details: impl Into<String>,
        orbit: impl Into<String>,
        pad: impl Into<String>,
        country_code: impl Into<String>,
        longitude: f64,
        latitude: f64,
        timezone_name: impl Into<String>,
    ) -> Self {
        let pad = pad.into();
        Self {
            code: code.into(),
            net,
            vehicle: vehicle.into(),
            mission: mission.into(),
            details: details.into(),
            orbit: orbit.into(),
            location: Location {
                name: pad.clone(),
                longitude,
                latitude,
            },
            pad,
            country_code: country_code.into(),
            timezone_name: timezone_name.into(),
            weather: None,
        }
    }
}

impl std::fmt::Display for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.code, self.mission, self.vehicle, self.pad)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Launch {
        Launch::new(
            "a1",
            Utc.with_ymd_and_hms(2024, 7, 12, 2, 35, 0).unwrap(),
            "Falcon 9",
            "Starlink Group 10-3",
            "Starlink batch",
            "LEO",
            "SLC-40",
            "USA",
            -80.577,
            28.561,
            "America/New_York",
        )
    }

    #[test]
    fn test_location_named_after_pad() {
        let launch = sample();
        assert_eq!(launch.location.name, "SLC-40");
        assert_eq!(launch.location.coordinates().latitude, 28.561);
        assert!(launch.weather.is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "a1 Starlink Group 10-3 Falcon 9 SLC-40");
    }

    #[test]
    fn test_has_coordinates() {
        let mut launch = sample();
        assert!(launch.location.has_coordinates());
        launch.location.longitude = 0.0;
        assert!(launch.location.has_coordinates());
        launch.location.latitude = 0.0;
        assert!(!launch.location.has_coordinates());
    }
}
