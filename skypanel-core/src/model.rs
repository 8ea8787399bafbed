use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{condition::ConditionCode, format::WindUnit, provider::ProviderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!("Unknown unit system '{value}'. Use 'metric' or 'imperial'.")),
        }
    }
}

/// Everything one acquisition cycle needs. Built once per poll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub units: UnitSystem,
    pub language: String,
    /// Overrides the key the provider was constructed with.
    pub api_key: Option<String>,
    /// Upper bound on forecast entries.
    pub forecast_length: usize,
}

impl FetchRequest {
    pub const DEFAULT_FORECAST_LENGTH: usize = 6;
    pub const MAX_FORECAST_LENGTH: usize = 48;

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            units: UnitSystem::default(),
            language: "en".to_string(),
            api_key: None,
            forecast_length: Self::DEFAULT_FORECAST_LENGTH,
        }
    }
}

/// Provider-agnostic weather record consumed by the presentation layer.
///
/// Only `current` is required for rendering; `sun` and `forecast` are additive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    pub provider: ProviderId,
    pub units: UnitSystem,
    pub wind_unit: WindUnit,
    pub current: CurrentConditions,
    pub sun: Option<SunTimes>,
    pub forecast: Vec<ForecastEntry>,
}

/// Missing provider fields stay `None` so the matching widget is omitted
/// instead of showing a made-up zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub wind_speed: Option<f64>,
    pub condition: Option<ConditionCode>,
    pub is_daytime: bool,
    pub location_name: Option<String>,
    pub observed_at: Option<DateTime<FixedOffset>>,
    /// Provider's own localized summary text, when it sends one.
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<FixedOffset>,
    pub temperature: f64,
    pub condition: Option<ConditionCode>,
    pub is_daytime: bool,
}

/// Keep entries strictly after their predecessor, then cap the length.
///
/// Providers deliver chronological lists; anything out of order or repeated
/// is dropped rather than reordered.
pub fn bound_forecast(
    entries: impl IntoIterator<Item = ForecastEntry>,
    limit: usize,
) -> Vec<ForecastEntry> {
    let mut out: Vec<ForecastEntry> = Vec::new();
    for entry in entries {
        if out.len() == limit {
            break;
        }
        if out.last().is_some_and(|last| entry.time <= last.time) {
            continue;
        }
        out.push(entry);
    }
    out
}
