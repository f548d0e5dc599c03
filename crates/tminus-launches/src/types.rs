//! Launch Library 2 result collection, as returned by the remote provider.
//!
//! Only the fields the local launch record needs are declared; serde ignores the rest.
//! Decoding is per result: one record the provider got wrong is set aside in
//! `rejected` and the rest of the page still comes through.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One page of launch results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawCollection")]
pub struct ResultCollection {
    pub count: u64,
    pub next: Option<String>,
    pub results: Vec<LaunchResult>,
    /// Results in the page that could not be decoded
    pub rejected: Vec<RejectedResult>,
}

/// A result that did not decode, with the provider id when one was readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedResult {
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    next: Option<String>,
    results: Vec<serde_json::Value>,
}

impl From<RawCollection> for ResultCollection {
    fn from(raw: RawCollection) -> Self {
        let mut results = Vec::with_capacity(raw.results.len());
        let mut rejected = Vec::new();

        for value in raw.results {
            let id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);
            match serde_json::from_value::<LaunchResult>(value) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!("Skipping undecodable launch {:?}: {}", id, e);
                    rejected.push(RejectedResult {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Self {
            count: raw.count,
            next: raw.next,
            results,
            rejected,
        }
    }
}

/// A launch as described by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchResult {
    pub id: String,
    pub net: DateTime<Utc>,
    pub rocket: Rocket,
    #[serde(default)]
    pub mission: Option<Mission>,
    pub pad: Pad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rocket {
    pub configuration: RocketConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocketConfiguration {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub orbit: Option<Orbit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub abbrev: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country_code: String,
    /// Decimal degrees. Usually a string; numbers are kept as text and null is empty.
    #[serde(default, deserialize_with = "coordinate_text")]
    pub longitude: String,
    #[serde(default, deserialize_with = "coordinate_text")]
    pub latitude: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: PadLocation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PadLocation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub timezone_name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CoordinateValue {
    Text(String),
    Number(f64),
    Other(IgnoredAny),
}

/// Coordinate as text for `mapper::parse_coordinate`; anything unusable becomes empty.
fn coordinate_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<CoordinateValue>::deserialize(deserializer)? {
        Some(CoordinateValue::Text(text)) => text,
        Some(CoordinateValue::Number(value)) => value.to_string(),
        Some(CoordinateValue::Other(_)) | None => String::new(),
    })
}
