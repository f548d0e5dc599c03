//! Pad weather for T-Minus
//!
//! Hourly forecasts from Open-Meteo, reduced to the weather at the launch hour.

pub mod enricher;
pub mod provider;
pub mod types;

pub use enricher::{launch_window, WeatherEnricher, LAUNCH_WINDOW_SECS};
pub use provider::{OpenMeteoProvider, WeatherProvider};
pub use types::*;
