//! Integration tests for the refresh cycle.
//!
//! Launch sources and weather providers are stubbed in-process so each test
//! controls exactly which stage fails.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tminus_launches::types::{
    LaunchResult, Mission, Orbit, Pad, PadLocation, ResultCollection, Rocket, RocketConfiguration,
};
use tminus_launches::{
    LaunchApiError, LaunchFilter, LaunchSource, LaunchStore, RefreshError, RefreshPipeline,
    SkipReason, SortOrder, WeatherOutcome,
};
use tminus_weather::{
    Coordinates, HourlySample, WeatherCondition, WeatherEnricher, WeatherError, WeatherProvider,
};
use tokio_util::sync::CancellationToken;

fn result(id: &str, net: DateTime<Utc>, latitude: &str) -> LaunchResult {
    LaunchResult {
        id: id.into(),
        net,
        rocket: Rocket {
            configuration: RocketConfiguration {
                name: "Falcon 9".into(),
            },
        },
        mission: Some(Mission {
            name: format!("Mission {}", id),
            description: "Rideshare".into(),
            orbit: Some(Orbit {
                abbrev: "SSO".into(),
            }),
        }),
        pad: Pad {
            name: "SLC-4E".into(),
            country_code: "USA".into(),
            longitude: "-120.611".into(),
            latitude: latitude.into(),
            location: PadLocation {
                timezone_name: "America/Los_Angeles".into(),
            },
        },
    }
}

fn net(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, day, 14, 0, 0).unwrap()
}

struct StaticSource {
    results: Vec<LaunchResult>,
    calls: AtomicUsize,
}

impl StaticSource {
    fn new(results: Vec<LaunchResult>) -> Arc<Self> {
        Arc::new(Self {
            results,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LaunchSource for StaticSource {
    async fn fetch_results(&self) -> Result<ResultCollection, LaunchApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ResultCollection {
            count: self.results.len() as u64,
            next: None,
            results: self.results.clone(),
            rejected: Vec::new(),
        })
    }
}

struct FailingSource;

#[async_trait]
impl LaunchSource for FailingSource {
    async fn fetch_results(&self) -> Result<ResultCollection, LaunchApiError> {
        Err(LaunchApiError::Api {
            status: 503,
            message: "maintenance".into(),
        })
    }
}

/// Clear skies everywhere except at `failing_latitude`.
struct SelectiveProvider {
    failing_latitude: f64,
    calls: AtomicUsize,
}

#[async_trait]
impl WeatherProvider for SelectiveProvider {
    async fn hourly_forecast(
        &self,
        at: Coordinates,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if at.latitude == self.failing_latitude {
            return Err(WeatherError::Api {
                status: 500,
                message: "forecast unavailable".into(),
            });
        }
        Ok(vec![HourlySample {
            time: start,
            temperature_celsius: 18.0,
            cloud_cover: 0.1,
            precipitation_chance: 0.0,
            condition: WeatherCondition::Clear,
        }])
    }
}

/// Cancels the token on the first forecast request.
struct CancellingProvider {
    token: CancellationToken,
}

#[async_trait]
impl WeatherProvider for CancellingProvider {
    async fn hourly_forecast(
        &self,
        _at: Coordinates,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, WeatherError> {
        self.token.cancel();
        Ok(vec![HourlySample {
            time: start,
            temperature_celsius: 10.0,
            cloud_cover: 0.9,
            precipitation_chance: 0.6,
            condition: WeatherCondition::Rain,
        }])
    }
}

fn selective_enricher(failing_latitude: f64) -> (WeatherEnricher, Arc<SelectiveProvider>) {
    let provider = Arc::new(SelectiveProvider {
        failing_latitude,
        calls: AtomicUsize::new(0),
    });
    (WeatherEnricher::new(provider.clone()), provider)
}

#[tokio::test]
async fn test_enrichment_failure_is_isolated_to_its_item() {
    let store = LaunchStore::in_memory().unwrap();
    let source = StaticSource::new(vec![
        result("l1", net(1), "34.632"),
        result("l2", net(2), "34.999"),
        result("l3", net(3), "34.632"),
    ]);
    let (enricher, _) = selective_enricher(34.999);

    let report = RefreshPipeline::new(source, enricher)
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(report.fetched, 3);
    assert_eq!(report.stored_count(), 3);
    assert_eq!(report.weather_attached_count(), 2);
    assert!(matches!(report.items[1].weather, WeatherOutcome::Failed(_)));

    assert_eq!(store.count().unwrap(), 3);
    assert!(store.get("l1").unwrap().unwrap().weather.is_some());
    assert!(store.get("l2").unwrap().unwrap().weather.is_none());
    assert!(store.get("l3").unwrap().unwrap().weather.is_some());
}

#[tokio::test]
async fn test_fetch_failure_leaves_store_untouched() {
    let store = LaunchStore::in_memory().unwrap();
    let seeded = StaticSource::new(vec![result("keep", net(1), "34.632")]);
    RefreshPipeline::without_weather(seeded)
        .refresh(&store)
        .await
        .unwrap();
    let before = store.query(&LaunchFilter::default(), SortOrder::Forward).unwrap();

    let err = RefreshPipeline::without_weather(Arc::new(FailingSource))
        .refresh(&store)
        .await
        .unwrap_err();

    assert!(matches!(err, RefreshError::Fetch(LaunchApiError::Api { status: 503, .. })));
    let after = store.query(&LaunchFilter::default(), SortOrder::Forward).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_repeated_refresh_does_not_duplicate() {
    let store = LaunchStore::in_memory().unwrap();
    let source = StaticSource::new(vec![
        result("a", net(1), "34.632"),
        result("b", net(2), "34.632"),
    ]);
    let pipeline = RefreshPipeline::without_weather(source.clone());

    pipeline.refresh(&store).await.unwrap();
    pipeline.refresh(&store).await.unwrap();

    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_weather_survives_refresh_without_weather() {
    let store = LaunchStore::in_memory().unwrap();
    let source = StaticSource::new(vec![result("a", net(1), "34.632")]);
    let (enricher, _) = selective_enricher(0.5);

    RefreshPipeline::new(source.clone(), enricher)
        .refresh(&store)
        .await
        .unwrap();
    let report = RefreshPipeline::without_weather(source)
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(
        report.items[0].weather,
        WeatherOutcome::Skipped(SkipReason::Disabled)
    );
    let stored = store.get("a").unwrap().unwrap();
    assert_eq!(stored.weather.unwrap().symbol_name, "sun.max");
}

#[tokio::test]
async fn test_missing_coordinates_skip_weather() {
    let store = LaunchStore::in_memory().unwrap();
    let mut unplaced = result("nowhere", net(1), "");
    unplaced.pad.longitude = "unknown".into();
    let (enricher, provider) = selective_enricher(0.5);

    let report = RefreshPipeline::new(StaticSource::new(vec![unplaced]), enricher)
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(
        report.items[0].weather,
        WeatherOutcome::Skipped(SkipReason::NoCoordinates)
    );
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_cancellation_stops_between_items() {
    let store = LaunchStore::in_memory().unwrap();
    let token = CancellationToken::new();
    let enricher = WeatherEnricher::new(Arc::new(CancellingProvider {
        token: token.clone(),
    }));
    let source = StaticSource::new(vec![
        result("first", net(1), "34.632"),
        result("second", net(2), "34.632"),
        result("third", net(3), "34.632"),
    ]);

    let report = RefreshPipeline::new(source, enricher)
        .with_cancellation(token)
        .refresh(&store)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.items.len(), 1);
    assert_eq!(store.count().unwrap(), 1);
    assert!(store.get("first").unwrap().is_some());
}

#[tokio::test]
async fn test_cancelled_before_fetch() {
    let store = LaunchStore::in_memory().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let source = StaticSource::new(vec![result("a", net(1), "34.632")]);

    let report = RefreshPipeline::without_weather(source)
        .with_cancellation(token)
        .refresh(&store)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.items.is_empty());
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_prune_removes_old_launches() {
    let store = LaunchStore::in_memory().unwrap();
    let now = Utc::now();
    let source = StaticSource::new(vec![
        result("ancient", now - Duration::days(40), "34.632"),
        result("recent", now - Duration::days(2), "34.632"),
        result("upcoming", now + Duration::days(3), "34.632"),
    ]);

    let report = RefreshPipeline::without_weather(source)
        .with_prune_after(Duration::days(30))
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(report.pruned, 1);
    assert_eq!(store.count().unwrap(), 2);
    assert!(store.get("ancient").unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_into_on_disk_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launches.db");
    let source = StaticSource::new(vec![
        result("a", net(1), "34.632"),
        result("b", net(2), "34.632"),
    ]);

    {
        let store = LaunchStore::new(&path).unwrap();
        RefreshPipeline::without_weather(source)
            .refresh(&store)
            .await
            .unwrap();
    }

    let store = LaunchStore::new(&path).unwrap();
    let range = store.date_range().unwrap();
    assert_eq!(*range.start(), net(1));
    assert_eq!(*range.end(), net(2));
}

#[tokio::test]
async fn test_store_failure_is_isolated_to_its_item() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("launches.db");
    let store = LaunchStore::new(&path).unwrap();

    let admin = rusqlite::Connection::open(&path).unwrap();
    admin
        .execute_batch(
            "CREATE TRIGGER reject_l2 BEFORE INSERT ON launches WHEN NEW.code = 'l2'
             BEGIN SELECT RAISE(ABORT, 'l2 rejected'); END;",
        )
        .unwrap();

    let source = StaticSource::new(vec![
        result("l1", net(1), "34.632"),
        result("l2", net(2), "34.632"),
        result("l3", net(3), "34.632"),
    ]);

    let report = RefreshPipeline::without_weather(source)
        .refresh(&store)
        .await
        .unwrap();

    assert_eq!(report.items.len(), 3);
    assert!(report.items[0].stored.is_ok());
    assert!(report.items[1].stored.is_err());
    assert!(report.items[2].stored.is_ok());
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.stored_count(), 2);

    assert!(store.get("l1").unwrap().is_some());
    assert!(store.get("l2").unwrap().is_none());
    assert!(store.get("l3").unwrap().is_some());
}
