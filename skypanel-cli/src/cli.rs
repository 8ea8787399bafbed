use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Password, Text};
use skypanel_core::{
    Config, DisplayConfig, FetchRequest, Poller, ProviderId, UnitSystem, WeatherError,
    WeatherProvider,
    provider::{default_provider_from_config, provider_from_config},
};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skypanel", version, about = "Current weather and short-term forecast panel")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure a provider and the location to show.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "openweathermap".
        provider: String,
    },

    /// Fetch once and print the panel.
    Show(Overrides),

    /// Re-fetch on an interval and print each fresh result.
    Watch {
        #[command(flatten)]
        overrides: Overrides,

        /// Minutes between polls; defaults to the configured interval.
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
}

/// Per-invocation overrides of the stored configuration.
#[derive(Debug, Args)]
pub struct Overrides {
    /// Provider to use instead of the configured default.
    #[arg(long)]
    provider: Option<String>,

    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,

    /// "metric" or "imperial".
    #[arg(long)]
    units: Option<UnitSystem>,

    /// Language code passed to providers that localize descriptions.
    #[arg(long)]
    lang: Option<String>,

    /// Show temperatures with one decimal place.
    #[arg(long)]
    no_round: bool,
}

/// Everything one panel session needs, resolved from config + overrides.
struct Session {
    provider: Box<dyn WeatherProvider>,
    request: FetchRequest,
    header: Option<String>,
    display: DisplayConfig,
    interval: Duration,
}

fn minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.max(1).saturating_mul(60))
}

impl Overrides {
    fn resolve(&self, mut config: Config) -> anyhow::Result<Session> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            let name = config.location_name().map(str::to_owned);
            config.set_location(lat, lon, name);
        }
        if let Some(units) = self.units {
            config.display.units = units;
        }
        if let Some(lang) = &self.lang {
            config.display.language = lang.clone();
        }
        if self.no_round {
            config.display.round_temperature = false;
        }

        let provider = match (&self.provider, &config.default_provider) {
            (Some(name), _) => provider_from_config(ProviderId::try_from(name.as_str())?, &config)?,
            (None, Some(_)) => default_provider_from_config(&config)?,
            // Open-Meteo works without any setup.
            (None, None) => provider_from_config(ProviderId::OpenMeteo, &config)?,
        };

        let request = config.fetch_request()?;
        debug!(provider = %provider.id(), ?request, "resolved session");

        Ok(Session {
            provider,
            request,
            header: config.location_name().map(str::to_owned),
            interval: minutes(config.display.update_interval_minutes),
            display: config.display,
        })
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(id)?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show(overrides) => {
                let session = overrides.resolve(Config::load()?)?;
                show(session).await
            }
            Command::Watch {
                overrides,
                interval_minutes,
            } => {
                let mut session = overrides.resolve(Config::load()?)?;
                if let Some(interval) = interval_minutes {
                    session.interval = minutes(interval);
                }
                watch(session).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn configure(id: ProviderId) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("{id} API key:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("API key must not be empty."));
        }
        config.upsert_provider_api_key(id, api_key.trim().to_string());
    }

    let mut latitude = CustomType::<f64>::new("Latitude:");
    let mut longitude = CustomType::<f64>::new("Longitude:");
    if let Some(location) = &config.location {
        latitude = latitude.with_default(location.latitude);
        longitude = longitude.with_default(location.longitude);
    }
    let latitude = latitude.prompt().context("Failed to read latitude")?;
    let longitude = longitude.prompt().context("Failed to read longitude")?;

    let name = Text::new("Location name (optional):")
        .prompt_skippable()
        .context("Failed to read location name")?
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    config.set_location(latitude, longitude, name);
    config.set_default_provider(id);
    config.fetch_request()?;
    config.save()?;

    println!("Saved {id} configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(session: Session) -> anyhow::Result<ExitCode> {
    match session.provider.fetch(&session.request).await {
        Ok(weather) => {
            let header = session.header.as_deref();
            println!("{}", render::panel(&weather, header, &session.display));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            print_error(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn watch(session: Session) -> anyhow::Result<()> {
    let provider: Arc<dyn WeatherProvider> = Arc::from(session.provider);
    let poller = Poller::new(provider, session.request, session.interval);
    let mut latest = poller.subscribe();
    let polling = tokio::spawn(poller.run());

    loop {
        tokio::select! {
            changed = latest.changed() => {
                if changed.is_err() {
                    break;
                }
                let report = latest.borrow_and_update().clone();
                let Some(report) = report else { continue };

                let stamp = chrono::Local::now().format("%H:%M:%S");
                println!("--- {stamp} (cycle {}) ---", report.cycle);
                match &report.result {
                    Ok(weather) => {
                        let header = session.header.as_deref();
                        println!("{}", render::panel(weather, header, &session.display));
                    }
                    Err(err) => print_error(err),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    polling.abort();
    Ok(())
}

fn print_error(err: &WeatherError) {
    debug!(kind = err.kind(), error = %err, "acquisition cycle failed");
    println!("{}", render::error_panel(&err.to_string()));
}
