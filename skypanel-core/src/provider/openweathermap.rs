use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    condition::{ConditionCode, is_daytime_at, owm_icon_is_day},
    error::WeatherError,
    fetch::fetch_json,
    format::{WindUnit, from_epoch, offset_from_seconds},
    join::{Endpoint, join_endpoints},
    model::{
        CurrentConditions, FetchRequest, ForecastEntry, NormalizedWeather, SunTimes, bound_forecast,
    },
};

use super::{ProviderId, WeatherProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeatherMap: `/weather` (primary) and `/forecast` (secondary) fetched
/// concurrently and merged.
#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenWeatherMapProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
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

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }

    fn query(&self, request: &FetchRequest) -> Vec<(&'static str, String)> {
        let api_key = request.api_key.as_deref().unwrap_or(&self.api_key);

        vec![
            ("lat", request.latitude.to_string()),
            ("lon", request.longitude.to_string()),
            ("appid", api_key.to_string()),
            ("units", request.units.as_str().to_string()),
            ("lang", request.language.clone()),
        ]
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwmCurrent {
    name: Option<String>,
    dt: Option<i64>,
    timezone: Option<i32>,
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    wind: Option<OwmWind>,
    sys: Option<OwmSys>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwmForecast {
    #[serde(default)]
    list: Vec<OwmForecastEntry>,
    city: Option<OwmCity>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastEntry {
    dt: Option<i64>,
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    sys: Option<OwmPartOfDay>,
}

#[derive(Debug, Deserialize)]
struct OwmPartOfDay {
    pod: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    timezone: Option<i32>,
}

fn icon_code(weather: &[OwmWeather]) -> Option<&str> {
    weather
        .first()?
        .icon
        .as_deref()
        .filter(|icon| !icon.is_empty())
}

/// Attach the forecast list (if the secondary endpoint delivered one) to the current record.
pub(crate) fn merge(
    current: OwmCurrent,
    forecast: Option<OwmForecast>,
    request: &FetchRequest,
) -> NormalizedWeather {
    let offset = offset_from_seconds(
        current
            .timezone
            .or_else(|| forecast.as_ref()?.city.as_ref()?.timezone),
    );

    let observed_at = current.dt.and_then(|dt| from_epoch(dt, offset));
    let sun = current.sys.as_ref().and_then(|sys| {
        Some(SunTimes {
            sunrise: from_epoch(sys.sunrise?, offset)?,
            sunset: from_epoch(sys.sunset?, offset)?,
        })
    });

    let icon = icon_code(&current.weather);
    let is_daytime = icon
        .and_then(owm_icon_is_day)
        .or_else(|| {
            let (at, sun) = (observed_at?, sun?);
            Some(sun.sunrise <= at && at < sun.sunset)
        })
        .or_else(|| observed_at.as_ref().map(is_daytime_at))
        .unwrap_or(true);

    let main = current.main.as_ref();
    let conditions = CurrentConditions {
        temperature: main.and_then(|m| m.temp),
        feels_like: main.and_then(|m| m.feels_like),
        humidity_pct: main
            .and_then(|m| m.humidity)
            .map(|h| h.round().clamp(0.0, 100.0) as u8),
        wind_speed: current.wind.as_ref().and_then(|w| w.speed),
        condition: icon.map(|code| ConditionCode::OwmIcon(code.to_string())),
        is_daytime,
        location_name: current.name.filter(|name| !name.is_empty()),
        observed_at,
        summary: current
            .weather
            .first()
            .and_then(|w| w.description.clone())
            .filter(|text| !text.is_empty()),
    };

    let forecast = forecast
        .map(|f| forecast_entries(f.list, offset, request.forecast_length))
        .unwrap_or_default();

    NormalizedWeather {
        provider: ProviderId::OpenWeatherMap,
        units: request.units,
        wind_unit: WindUnit::resolve(request.units, ProviderId::OpenWeatherMap.metric_wind_unit()),
        current: conditions,
        sun,
        forecast,
    }
}

fn forecast_entries(
    list: Vec<OwmForecastEntry>,
    offset: FixedOffset,
    limit: usize,
) -> Vec<ForecastEntry> {
    let entries = list.into_iter().filter_map(|entry| {
        let time = from_epoch(entry.dt?, offset)?;
        let temperature = entry.main.as_ref()?.temp?;
        let icon = icon_code(&entry.weather);
        let is_daytime = icon
            .and_then(owm_icon_is_day)
            .or_else(|| match entry.sys.as_ref()?.pod.as_deref()? {
                "d" => Some(true),
                "n" => Some(false),
                _ => None,
            })
            .unwrap_or_else(|| is_daytime_at(&time));

        Some(ForecastEntry {
            time,
            temperature,
            condition: icon.map(|code| ConditionCode::OwmIcon(code.to_string())),
            is_daytime,
        })
    });

    bound_forecast(entries, limit)
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherMap
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
        let current_url = self.endpoint("weather");
        let forecast_url = self.endpoint("forecast");

        let current_query = self.query(request);
        let mut forecast_query = current_query.clone();
        forecast_query.push(("cnt", request.forecast_length.to_string()));

        debug!(
            current = %current_url,
            forecast = %forecast_url,
            "fetching OpenWeatherMap current + forecast"
        );

        let current = fetch_json::<OwmCurrent>(
            &self.http,
            "openweathermap current",
            &current_url,
            &current_query,
        );
        let forecast = fetch_json::<OwmForecast>(
            &self.http,
            "openweathermap forecast",
            &forecast_url,
            &forecast_query,
        );

        let joined = join_endpoints(
            Endpoint::new("current", current),
            Endpoint::new("forecast", forecast),
        )
        .await?;

        Ok(merge(joined.primary, joined.secondary, request))
    }
}
