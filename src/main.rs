use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use tminus_core::error::{ReqwestErrorExt, RusqliteErrorExt};
use tminus_core::{AppError, Config, ConfigError, DatabaseError, NetworkError};
use tminus_launches::{
    LaunchApiClient, LaunchApiError, LaunchFilter, LaunchStore, RefreshError, RefreshPipeline,
    RetryConfig, SortOrder, StoreError,
};
use tminus_weather::{OpenMeteoProvider, WeatherEnricher};

const UPCOMING_SHOWN: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    tminus_core::init()?;

    let once = std::env::args().skip(1).any(|arg| arg == "--once");
    let (config, _) = Config::load_validated()?;

    let store = open_store(&config)?;
    let cancel = CancellationToken::new();
    let pipeline = build_pipeline(&config)?.with_cancellation(cancel.clone());

    tracing::info!("T-Minus started");
    watch_ctrl_c(cancel.clone());

    if once {
        run_cycle(&pipeline, &store).await;
        print_upcoming(&config, &store)?;
        return Ok(());
    }

    let minutes = u64::from(config.refresh.interval_minutes.max(1));
    let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));

    loop {
        tokio::select! {
            _ = interval.tick() => run_cycle(&pipeline, &store).await,
            () = cancel.cancelled() => break,
        }
    }

    tracing::info!("T-Minus shutting down");
    Ok(())
}

/// Cancel `token` on Ctrl-C. A running refresh stops before its next launch.
fn watch_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, stopping");
                token.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

fn open_store(config: &Config) -> Result<LaunchStore> {
    let path = &config.store.database_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }

    LaunchStore::new(path).map_err(|e| {
        let err = store_error(e);
        tracing::error!("{}", err);
        anyhow::anyhow!("{} ({})", err.user_message(), path.display())
    })
}

fn build_pipeline(config: &Config) -> Result<RefreshPipeline> {
    let api = &config.launch_api;
    let client = LaunchApiClient::new(&api.base_url, Duration::from_secs(api.timeout_secs))
        .context("Failed to build launch API client")?
        .with_endpoint(&api.endpoint)
        .with_limit(api.limit)
        .with_retry(RetryConfig::new(
            api.max_retries,
            api.initial_retry_delay_ms,
            api.max_retry_delay_ms,
        ));
    let source = Arc::new(client);

    let pipeline = if config.weather.enabled {
        let provider =
            OpenMeteoProvider::with_base_url(&config.weather.base_url, config.weather.timeout_secs)
                .context("Failed to build weather client")?;
        RefreshPipeline::new(source, WeatherEnricher::new(Arc::new(provider)))
    } else {
        tracing::info!("Pad weather disabled");
        RefreshPipeline::without_weather(source)
    };

    Ok(match config.refresh.prune_after_days {
        Some(days) => pipeline.with_prune_after(chrono::Duration::days(i64::from(days))),
        None => pipeline,
    })
}

async fn run_cycle(pipeline: &RefreshPipeline, store: &LaunchStore) {
    match pipeline.refresh(store).await {
        Ok(report) => {
            for failure in report.failures() {
                tracing::warn!("Launch {} was not saved", failure.code);
            }
        }
        Err(e) => {
            let retry_next_cycle = match &e {
                RefreshError::Fetch(fetch) => fetch.is_retryable(),
            };
            let err = refresh_error(e);
            tracing::error!("Refresh failed: {}", err);
            if retry_next_cycle {
                tracing::info!("Will retry on the next refresh cycle");
            } else {
                tracing::warn!("Refresh will keep failing until the configuration or provider changes");
            }
            eprintln!("{}", err.user_message());
        }
    }
}

fn print_upcoming(config: &Config, store: &LaunchStore) -> Result<()> {
    let mut filter = LaunchFilter::default().future();
    filter.country_code = config.filters.default_country_code.clone();

    let upcoming = store.query(&filter, SortOrder::Forward).map_err(store_error)?;
    let total = store.count().map_err(store_error)?;

    println!("T-Minus: {} launches stored", total);
    if total > 0 {
        let range = store.date_range().map_err(store_error)?;
        println!(
            "  {} to {}",
            range.start().format("%Y-%m-%d"),
            range.end().format("%Y-%m-%d")
        );
    }

    println!();
    for launch in upcoming.iter().take(UPCOMING_SHOWN) {
        let weather = launch
            .weather
            .as_ref()
            .map(|w| format!("{} {:.0}°C", w.symbol_name, w.temperature_celsius))
            .unwrap_or_default();
        println!(
            "  {}  {:<28} {:<20} {}",
            launch.net.format("%Y-%m-%d %H:%M UTC"),
            launch.mission,
            launch.vehicle,
            weather
        );
    }
    if upcoming.len() > UPCOMING_SHOWN {
        println!("  … and {} more", upcoming.len() - UPCOMING_SHOWN);
    }

    Ok(())
}

fn refresh_error(err: RefreshError) -> AppError {
    match err {
        RefreshError::Fetch(e) => match e {
            LaunchApiError::Network(e) => e.into_network_error().into(),
            LaunchApiError::RateLimited(secs) => NetworkError::RateLimited(secs).into(),
            LaunchApiError::Api { status, message } => {
                NetworkError::ServerError { status, message }.into()
            }
            LaunchApiError::Parse(msg) => NetworkError::InvalidResponse(msg).into(),
            LaunchApiError::InvalidUrl(msg) => ConfigError::Invalid(msg).into(),
        },
    }
}

fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::Database(e) => e.into_database_error().into(),
        StoreError::Corrupt(msg) => DatabaseError::Corruption(msg).into(),
    }
}
