//! Best-effort pad weather lookup for a launch window.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::provider::WeatherProvider;
use crate::types::{Coordinates, EnrichmentError, PadWeather};

/// Length of the window after NET that a sample may fall in.
pub const LAUNCH_WINDOW_SECS: i64 = 3600;

pub fn launch_window() -> Duration {
    Duration::seconds(LAUNCH_WINDOW_SECS)
}

/// Wraps an injected provider and reduces its hourly forecast to the single
/// sample describing the launch hour.
#[derive(Clone)]
pub struct WeatherEnricher {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherEnricher {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Weather for the first hourly sample in `[window_start, window_start + 1h]`,
    /// further bounded by `window_end` when that is earlier.
    ///
    /// # Errors
    /// `EnrichmentError::Provider` when the provider call fails and
    /// `EnrichmentError::NoSample` when it returns nothing inside the window.
    pub async fn lookup(
        &self,
        at: Coordinates,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<PadWeather, EnrichmentError> {
        let end = window_end.min(window_start + launch_window()).max(window_start);

        let samples = self.provider.hourly_forecast(at, window_start, end).await?;

        samples
            .iter()
            .find(|s| s.time >= window_start && s.time <= end)
            .map(PadWeather::from)
            .ok_or(EnrichmentError::NoSample {
                start: window_start,
                end,
            })
    }

    /// Like [`lookup`](Self::lookup), but failures are logged and reported as `None`.
    pub async fn enrich(
        &self,
        at: Coordinates,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Option<PadWeather> {
        match self.lookup(at, window_start, window_end).await {
            Ok(weather) => Some(weather),
            Err(e) => {
                tracing::warn!(
                    "No pad weather at ({}, {}): {}",
                    at.latitude,
                    at.longitude,
                    e
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for WeatherEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherEnricher").finish_non_exhaustive()
    }
}
