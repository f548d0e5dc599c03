//! Fetch → map → enrich → upsert refresh cycle.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tminus_weather::{launch_window, WeatherEnricher};
use tokio_util::sync::CancellationToken;

use crate::client::LaunchSource;
use crate::error::RefreshError;
use crate::launch::Launch;
use crate::mapper;
use crate::store::LaunchStore;
use crate::types::RejectedResult;

/// Why enrichment did not run for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Weather enrichment is turned off
    Disabled,
    /// Both pad coordinates are the `0.0` parse fallback. A forecast for
    /// 0°N 0°E says nothing about the pad, so no lookup is attempted.
    NoCoordinates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherOutcome {
    Attached,
    Skipped(SkipReason),
    Failed(String),
}

/// What happened to one fetched launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub code: String,
    pub weather: WeatherOutcome,
    pub stored: Result<(), String>,
}

/// Summary of one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Results returned by the launch source, decodable or not
    pub fetched: usize,
    /// One entry per processed result, in fetch order
    pub items: Vec<ItemReport>,
    /// Results that could not be decoded and were not stored
    pub rejected: Vec<RejectedResult>,
    /// Launches removed by pruning
    pub pruned: usize,
    /// The cycle stopped early on cancellation
    pub cancelled: bool,
}

impl RefreshReport {
    pub fn stored_count(&self) -> usize {
        self.items.iter().filter(|i| i.stored.is_ok()).count()
    }

    pub fn weather_attached_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.weather == WeatherOutcome::Attached)
            .count()
    }

    /// Items whose store write failed.
    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items.iter().filter(|i| i.stored.is_err())
    }
}

pub struct RefreshPipeline {
    source: Arc<dyn LaunchSource>,
    enricher: Option<WeatherEnricher>,
    prune_after: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl RefreshPipeline {
    pub fn new(source: Arc<dyn LaunchSource>, enricher: WeatherEnricher) -> Self {
        Self {
            source,
            enricher: Some(enricher),
            prune_after: None,
            cancel: None,
        }
    }

    /// A pipeline that stores launches without looking up pad weather.
    pub fn without_weather(source: Arc<dyn LaunchSource>) -> Self {
        Self {
            source,
            enricher: None,
            prune_after: None,
            cancel: None,
        }
    }

    /// Delete launches whose NET is older than `age` at the end of each cycle.
    pub fn with_prune_after(mut self, age: Duration) -> Self {
        self.prune_after = Some(age);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Run one refresh cycle against `store`.
    ///
    /// # Errors
    /// `RefreshError::Fetch` when the launch source fails. The store is not
    /// touched in that case. Per-item enrichment and store failures are
    /// recorded in the report instead.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&self, store: &LaunchStore) -> Result<RefreshReport, RefreshError> {
        tracing::info!("Starting launch refresh");

        let fetched = match &self.cancel {
            Some(token) => tokio::select! {
                result = self.source.fetch_results() => result,
                () = token.cancelled() => {
                    tracing::info!("Refresh cancelled before fetch completed");
                    return Ok(RefreshReport {
                        cancelled: true,
                        ..RefreshReport::default()
                    });
                }
            },
            None => self.source.fetch_results().await,
        };

        let collection = fetched.map_err(|e| {
            tracing::error!("Launch fetch failed: {}", e);
            RefreshError::Fetch(e)
        })?;

        let mut report = RefreshReport {
            fetched: collection.results.len() + collection.rejected.len(),
            rejected: collection.rejected,
            ..RefreshReport::default()
        };
        tracing::info!("Fetched {} launches", report.fetched);
        if !report.rejected.is_empty() {
            tracing::warn!("{} launches could not be decoded", report.rejected.len());
        }

        for result in &collection.results {
            if self.is_cancelled() {
                tracing::info!(
                    "Refresh cancelled after {} of {} launches",
                    report.items.len(),
                    collection.results.len()
                );
                report.cancelled = true;
                break;
            }

            let mut launch = mapper::to_launch(result);
            let weather = self.enrich(&mut launch).await;

            let stored = match store.upsert(&launch) {
                Ok(outcome) => {
                    tracing::debug!("Stored launch {} ({:?})", launch.code, outcome);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Failed to store launch {}: {}", launch.code, e);
                    Err(e.to_string())
                }
            };

            report.items.push(ItemReport {
                code: launch.code,
                weather,
                stored,
            });
        }

        if !report.cancelled {
            if let Some(age) = self.prune_after {
                let cutoff = Utc::now() - age;
                match store.prune_before(cutoff) {
                    Ok(removed) => {
                        if removed > 0 {
                            tracing::info!("Pruned {} launches before {}", removed, cutoff);
                        }
                        report.pruned = removed;
                    }
                    Err(e) => tracing::error!("Failed to prune launches: {}", e),
                }
            }
        }

        tracing::info!(
            "Refresh complete: {} stored, {} with weather, {} failed",
            report.stored_count(),
            report.weather_attached_count(),
            report.failures().count()
        );
        Ok(report)
    }

    async fn enrich(&self, launch: &mut Launch) -> WeatherOutcome {
        let Some(enricher) = &self.enricher else {
            return WeatherOutcome::Skipped(SkipReason::Disabled);
        };
        if !launch.location.has_coordinates() {
            tracing::debug!("Launch {} has no pad coordinates, skipping weather", launch.code);
            return WeatherOutcome::Skipped(SkipReason::NoCoordinates);
        }

        let window_start = launch.net;
        let window_end = window_start + launch_window();
        match enricher
            .lookup(launch.location.coordinates(), window_start, window_end)
            .await
        {
            Ok(weather) => {
                launch.weather = Some(weather);
                WeatherOutcome::Attached
            }
            Err(e) => {
                tracing::warn!("No pad weather for launch {}: {}", launch.code, e);
                WeatherOutcome::Failed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for RefreshPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshPipeline")
            .field("enricher", &self.enricher)
            .field("prune_after", &self.prune_after)
            .finish_non_exhaustive()
    }
}
