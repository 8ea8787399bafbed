//! Display formatting and timestamp normalization.
//!
//! Providers are asked for values already in the requested unit system, so
//! nothing here converts units; it only rounds and labels. Both provider
//! timestamp styles end up as `DateTime<FixedOffset>` in the location's offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{NormalizedWeather, UnitSystem};

/// Wind speed unit as returned by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindUnit {
    KilometersPerHour,
    MetersPerSecond,
    MilesPerHour,
}

impl WindUnit {
    pub fn label(&self) -> &'static str {
        match self {
            WindUnit::KilometersPerHour => "km/h",
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::MilesPerHour => "mph",
        }
    }

    /// Imperial is always mph; metric keeps the provider's own label.
    pub fn resolve(units: UnitSystem, metric: WindUnit) -> WindUnit {
        match units {
            UnitSystem::Imperial => WindUnit::MilesPerHour,
            UnitSystem::Metric => metric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Formatter {
    round_temperature: bool,
    wind_unit: WindUnit,
}

impl Formatter {
    pub fn new(round_temperature: bool, wind_unit: WindUnit) -> Self {
        Self {
            round_temperature,
            wind_unit,
        }
    }

    pub fn for_weather(weather: &NormalizedWeather, round_temperature: bool) -> Self {
        Self::new(round_temperature, weather.wind_unit)
    }

    /// Nearest integer when rounding is on, else one decimal place. No unit suffix.
    pub fn temperature(&self, value: f64) -> String {
        if self.round_temperature {
            format!("{}", value.round() as i64)
        } else {
            format!("{value:.1}")
        }
    }

    pub fn wind_speed(&self, value: f64) -> String {
        format!("{} {}", value.round() as i64, self.wind_unit.label())
    }

    pub fn humidity(&self, percent: u8) -> String {
        format!("{percent}%")
    }

    /// Local `HH:MM` clock time.
    pub fn clock(&self, at: &DateTime<FixedOffset>) -> String {
        at.format("%H:%M").to_string()
    }
}

/// Offset from a provider's "seconds east of UTC" field; UTC when absent or out of range.
pub fn offset_from_seconds(seconds: Option<i32>) -> FixedOffset {
    seconds
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Parse a provider ISO-8601 timestamp.
///
/// Zone-less values (`2024-01-15T07:15`) are wall-clock time at `offset`;
/// values carrying their own offset are converted into `offset`.
pub fn parse_iso(value: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    for pattern in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return offset.from_local_datetime(&naive).single();
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&offset))
}

/// Epoch seconds to an instant at `offset`.
pub fn from_epoch(seconds: i64, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&offset))
}
