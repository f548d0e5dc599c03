//! Remote result → local launch record.

use crate::launch::Launch;
use crate::types::LaunchResult;

/// Map a provider result into a launch record.
///
/// Total: a malformed coordinate becomes `0.0` and a missing mission or orbit
/// becomes empty text, so one sloppy field never blocks ingestion.
pub fn to_launch(result: &LaunchResult) -> Launch {
    let (mission, details, orbit) = match &result.mission {
        Some(m) => (
            m.name.as_str(),
            m.description.as_str(),
            m.orbit.as_ref().map(|o| o.abbrev.as_str()).unwrap_or_default(),
        ),
        None => ("", "", ""),
    };

    Launch::new(
        result.id.as_str(),
        result.net,
        result.rocket.configuration.name.as_str(),
        mission,
        details,
        orbit,
        result.pad.name.as_str(),
        result.pad.country_code.as_str(),
        parse_coordinate(&result.pad.longitude),
        parse_coordinate(&result.pad.latitude),
        result.pad.location.timezone_name.as_str(),
    )
}

/// Decimal degrees from provider text; anything unparseable or non-finite is `0.0`.
pub fn parse_coordinate(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::debug!("Unparseable coordinate {:?}, using 0.0", raw);
            0.0
        }
    }
}

impl From<&LaunchResult> for Launch {
    fn from(result: &LaunchResult) -> Self {
        to_launch(result)
    }
}
