//! Search and filter parameters for launch queries.

use chrono::{DateTime, Utc};

use crate::launch::Launch;

/// Sort direction by NET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Earliest first
    #[default]
    Forward,
    /// Latest first
    Reverse,
}

/// Which launches a list should show.
///
/// The default filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchFilter {
    /// Case-insensitive substring over code, vehicle, details and mission. Empty matches all.
    pub search_text: String,
    /// Only launches with NET after now
    pub only_future: bool,
    /// Only launches with NET before now
    pub only_past: bool,
    /// Only launches from this country code
    pub country_code: Option<String>,
}

impl LaunchFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search_text: text.into(),
            ..Self::default()
        }
    }

    pub fn future(mut self) -> Self {
        self.only_future = true;
        self
    }

    pub fn past(mut self) -> Self {
        self.only_past = true;
        self
    }

    pub fn in_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn matches(&self, launch: &Launch, now: DateTime<Utc>) -> bool {
        self.matches_text(launch)
            && (!self.only_future || launch.net > now)
            && (!self.only_past || launch.net < now)
            && self
                .country_code
                .as_deref()
                .map_or(true, |code| launch.country_code == code)
    }

    fn matches_text(&self, launch: &Launch) -> bool {
        let needle = self.search_text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [&launch.code, &launch.vehicle, &launch.details, &launch.mission]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}
