//! Launch tracking for T-Minus
//!
//! Fetches upcoming launches from Launch Library 2, attaches pad weather and
//! keeps them in a local SQLite store.

pub mod client;
pub mod error;
pub mod filter;
pub mod launch;
pub mod mapper;
pub mod pipeline;
pub mod retry;
pub mod store;
pub mod types;

pub use client::{LaunchApiClient, LaunchSource};
pub use error::{LaunchApiError, RefreshError, StoreError, StoreResult};
pub use filter::{LaunchFilter, SortOrder};
pub use launch::{Launch, Location};
pub use pipeline::{ItemReport, RefreshPipeline, RefreshReport, SkipReason, WeatherOutcome};
pub use retry::RetryConfig;
pub use store::{LaunchStore, UpsertOutcome};
pub use types::RejectedResult;
