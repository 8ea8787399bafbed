use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    condition::{ConditionCode, is_daytime_at},
    error::WeatherError,
    fetch::fetch_json,
    format::{WindUnit, offset_from_seconds, parse_iso},
    model::{
        CurrentConditions, FetchRequest, ForecastEntry, NormalizedWeather, SunTimes, UnitSystem,
        bound_forecast,
    },
};

use super::{ProviderId, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,is_day";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";
const DAILY_FIELDS: &str = "sunrise,sunset";
const MIN_FORECAST_HOURS: usize = 12;

/// Open-Meteo: keyless, one `/forecast` call carries current, hourly and daily data.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    fn query(request: &FetchRequest) -> Vec<(&'static str, String)> {
        // One extra hour so a full strip remains after skipping the current hour.
        let hours = request.forecast_length.saturating_add(1).max(MIN_FORECAST_HOURS);

        let mut query = vec![
            ("latitude", request.latitude.to_string()),
            ("longitude", request.longitude.to_string()),
            ("current", CURRENT_FIELDS.to_string()),
            ("hourly", HOURLY_FIELDS.to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
            ("forecast_days", "1".to_string()),
            ("forecast_hours", hours.to_string()),
        ];

        if request.units == UnitSystem::Imperial {
            query.push(("temperature_unit", "fahrenheit".to_string()));
            query.push(("wind_speed_unit", "mph".to_string()));
        }

        query
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OmResponse {
    utc_offset_seconds: Option<i32>,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    weather_code: Option<u16>,
    wind_speed_10m: Option<f64>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<u16>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    sunrise: Vec<String>,
    #[serde(default)]
    sunset: Vec<String>,
}

pub(crate) fn normalize(
    raw: OmResponse,
    request: &FetchRequest,
    now: DateTime<Utc>,
) -> Result<NormalizedWeather, WeatherError> {
    let offset = offset_from_seconds(raw.utc_offset_seconds);

    let current = raw
        .current
        .ok_or_else(|| WeatherError::Parse("response contained no current conditions".into()))?;

    let observed_at = current.time.as_deref().and_then(|t| parse_iso(t, offset));
    let is_daytime = match current.is_day {
        Some(flag) => flag == 1,
        None => is_daytime_at(&observed_at.unwrap_or_else(|| now.with_timezone(&offset))),
    };

    let current = CurrentConditions {
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        humidity_pct: current
            .relative_humidity_2m
            .map(|h| h.round().clamp(0.0, 100.0) as u8),
        wind_speed: current.wind_speed_10m,
        condition: current.weather_code.map(ConditionCode::Wmo),
        is_daytime,
        location_name: None,
        observed_at,
        summary: None,
    };

    let sun = raw.daily.as_ref().and_then(|daily| sun_times(daily, offset));
    let forecast = raw
        .hourly
        .as_ref()
        .map(|hourly| hourly_forecast(hourly, offset, now, request.forecast_length))
        .unwrap_or_default();

    Ok(NormalizedWeather {
        provider: ProviderId::OpenMeteo,
        units: request.units,
        wind_unit: WindUnit::resolve(request.units, ProviderId::OpenMeteo.metric_wind_unit()),
        current,
        sun,
        forecast,
    })
}

fn sun_times(daily: &OmDaily, offset: FixedOffset) -> Option<SunTimes> {
    let sunrise = parse_iso(daily.sunrise.first()?, offset)?;
    let sunset = parse_iso(daily.sunset.first()?, offset)?;
    Some(SunTimes { sunrise, sunset })
}

/// Hourly strip starting at the first slot after `now` (or the first slot when
/// none is in the future). Slots without a temperature are skipped; slots
/// without a code keep `None`. Day/night comes from the slot's local hour.
fn hourly_forecast(
    hourly: &OmHourly,
    offset: FixedOffset,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<ForecastEntry> {
    let slots: Vec<_> = hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, time)| {
            let time = parse_iso(time, offset)?;
            let temperature = hourly.temperature_2m.get(i).copied().flatten();
            let code = hourly.weather_code.get(i).copied().flatten();
            Some((time, temperature, code))
        })
        .collect();

    let start = slots
        .iter()
        .position(|(time, _, _)| time.with_timezone(&Utc) > now)
        .unwrap_or(0);

    let entries = slots[start..].iter().filter_map(|&(time, temperature, code)| {
        Some(ForecastEntry {
            time,
            temperature: temperature?,
            condition: code.map(ConditionCode::Wmo),
            is_daytime: is_daytime_at(&time),
        })
    });

    bound_forecast(entries, limit)
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    #[instrument(
        skip(self, request),
        fields(
            lat = %request.latitude,
            lon = %request.longitude,
            units = %request.units
        )
    )]
    async fn fetch(&self, request: &FetchRequest) -> Result<NormalizedWeather, WeatherError> {
        let url = format!("{}/forecast", self.base_url.trim_end_matches('/'));
        debug!(url = %url, "fetching Open-Meteo forecast");

        let raw: OmResponse =
            fetch_json(&self.http, "openmeteo forecast", &url, &Self::query(request)).await?;

        normalize(raw, request, Utc::now())
    }
}
