use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    model::{FetchRequest, UnitSystem},
    provider::ProviderId,
};

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's public API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_true")]
    pub round_temperature: bool,
    #[serde(default = "default_forecast_length")]
    pub forecast_length: usize,
    #[serde(default = "default_update_interval")]
    pub update_interval_minutes: u64,

    // Per-widget toggles for the panel.
    #[serde(default = "default_true")]
    pub show_temperature: bool,
    #[serde(default = "default_true")]
    pub show_feels_like: bool,
    #[serde(default = "default_true")]
    pub show_humidity: bool,
    #[serde(default = "default_true")]
    pub show_wind: bool,
    #[serde(default = "default_true")]
    pub show_summary: bool,
    #[serde(default = "default_true")]
    pub show_forecast: bool,
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_forecast_length() -> usize {
    FetchRequest::DEFAULT_FORECAST_LENGTH
}

const fn default_update_interval() -> u64 {
    10
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::default(),
            language: default_language(),
            round_temperature: true,
            forecast_length: default_forecast_length(),
            update_interval_minutes: default_update_interval(),
            show_temperature: true,
            show_feels_like: true,
            show_humidity: true,
            show_wind: true,
            show_summary: true,
            show_forecast: true,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openmeteo" or "openweathermap".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweathermap]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub location: Option<LocationConfig>,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `skypanel configure <provider>` \
                 (e.g. `skypanel configure openmeteo`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skypanel", "skypanel")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key and set the default provider if none is set yet.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)?.api_key.as_deref()
    }

    pub fn provider_base_url(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)?.base_url.as_deref()
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64, name: Option<String>) {
        self.location = Some(LocationConfig {
            latitude,
            longitude,
            name,
        });
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref()?.name.as_deref()
    }

    /// Build the per-cycle request from the stored location and display settings.
    pub fn fetch_request(&self) -> Result<FetchRequest> {
        let location = self
            .location
            .as_ref()
            .filter(|loc| loc.latitude != 0.0 && loc.longitude != 0.0)
            .ok_or_else(|| {
                anyhow!(
                    "Please set latitude and longitude in the config.\n\
                     Hint: run `skypanel configure <provider>` or pass --lat/--lon."
                )
            })?;

        if !(-90.0..=90.0).contains(&location.latitude)
            || !(-180.0..=180.0).contains(&location.longitude)
        {
            return Err(anyhow!(
                "Invalid coordinates ({}, {}): latitude must be -90 to 90, longitude -180 to 180.",
                location.latitude,
                location.longitude
            ));
        }

        let forecast_length = self.display.forecast_length;
        if !(1..=FetchRequest::MAX_FORECAST_LENGTH).contains(&forecast_length) {
            return Err(anyhow!(
                "Invalid forecast_length {forecast_length}: must be 1 to {}.\n\
                 Hint: set `forecast_length` in the [display] section of the config.",
                FetchRequest::MAX_FORECAST_LENGTH
            ));
        }

        Ok(FetchRequest {
            latitude: location.latitude,
            longitude: location.longitude,
            units: self.display.units,
            language: self.display.language.clone(),
            api_key: None,
            forecast_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OWM_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeatherMap);

        let key = cfg.provider_api_key(ProviderId::OpenWeatherMap);
        assert_eq!(key, Some("OWM_KEY"));
    }

    #[test]
    fn upsert_keeps_base_url_override() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "openweathermap".into(),
            ProviderConfig {
                api_key: None,
                base_url: Some("http://localhost:9000".into()),
            },
        );

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "K".into());

        assert_eq!(
            cfg.provider_base_url(ProviderId::OpenWeatherMap),
            Some("http://localhost:9000")
        );
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeatherMap), Some("K"));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OWM_KEY".into());
        cfg.set_default_provider(ProviderId::OpenMeteo);

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenMeteo);
    }

    #[test]
    fn fetch_request_requires_location() {
        let cfg = Config::default();
        let err = cfg.fetch_request().unwrap_err();
        assert!(err.to_string().contains("Please set latitude and longitude"));

        let mut cfg = Config::default();
        cfg.set_location(0.0, 0.0, None);
        assert!(cfg.fetch_request().is_err());
    }

    #[test]
    fn fetch_request_rejects_out_of_range_coordinates() {
        let mut cfg = Config::default();
        cfg.set_location(91.0, 10.0, None);
        assert!(
            cfg.fetch_request()
                .unwrap_err()
                .to_string()
                .contains("Invalid coordinates")
        );
    }

    #[test]
    fn fetch_request_rejects_unbounded_forecast_length() {
        let mut cfg: Config = toml::from_str(
            r#"
            [location]
            latitude = 52.52
            longitude = 13.41

            [display]
            forecast_length = 9000000000000000000
            "#,
        )
        .unwrap();

        let err = cfg.fetch_request().unwrap_err().to_string();
        assert!(err.contains("Invalid forecast_length"));
        assert!(err.contains("Hint:"));

        cfg.display.forecast_length = 0;
        assert!(cfg.fetch_request().is_err());

        cfg.display.forecast_length = FetchRequest::MAX_FORECAST_LENGTH;
        assert!(cfg.fetch_request().is_ok());
    }

    #[test]
    fn fetch_request_carries_display_settings() {
        let mut cfg = Config::default();
        cfg.set_location(52.52, 13.41, Some("Berlin".into()));
        cfg.display.units = UnitSystem::Imperial;
        cfg.display.language = "de".into();
        cfg.display.forecast_length = 4;

        let req = cfg.fetch_request().unwrap();
        assert_eq!(req.latitude, 52.52);
        assert_eq!(req.units, UnitSystem::Imperial);
        assert_eq!(req.language, "de");
        assert_eq!(req.forecast_length, 4);
        assert_eq!(cfg.location_name(), Some("Berlin"));
    }

    #[test]
    fn display_defaults_fill_missing_keys() {
        let cfg: Config = toml::from_str(
            r#"
            default_provider = "openmeteo"

            [location]
            latitude = 48.85
            longitude = 2.35

            [display]
            units = "imperial"
            show_wind = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.display.units, UnitSystem::Imperial);
        assert_eq!(cfg.display.language, "en");
        assert!(cfg.display.round_temperature);
        assert_eq!(cfg.display.forecast_length, 6);
        assert_eq!(cfg.display.update_interval_minutes, 10);
        assert!(!cfg.display.show_wind);
        assert!(cfg.display.show_feels_like && cfg.display.show_forecast);
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeatherMap, "OWM_KEY".into());
        cfg.set_location(52.52, 13.41, Some("Berlin".into()));
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider_api_key(ProviderId::OpenWeatherMap), Some("OWM_KEY"));
        assert_eq!(loaded.location, cfg.location);
        assert_eq!(loaded.display, cfg.display);
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.default_provider.is_none());
    }
}
