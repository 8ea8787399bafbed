//! Core library for the `skypanel` weather panel.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Provider integrations (Open-Meteo, OpenWeatherMap) behind one trait
//! - The fetch / join / normalize pipeline producing [`NormalizedWeather`]
//! - Condition-code mapping and display formatting
//! - Interval polling with cycle sequencing
//!
//! It is used by `skypanel-cli`, but can also be reused by other front-ends.

pub mod condition;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod join;
pub mod model;
pub mod poll;
pub mod provider;

pub use condition::{Condition, ConditionCode};
pub use config::{Config, DisplayConfig, LocationConfig, ProviderConfig};
pub use error::WeatherError;
pub use format::{Formatter, WindUnit};
pub use model::{
    CurrentConditions, FetchRequest, ForecastEntry, NormalizedWeather, SunTimes, UnitSystem,
};
pub use poll::{CycleReport, CycleSequencer, Poller};
pub use provider::{ProviderId, WeatherProvider};
