//! Single-attempt HTTP GET returning a typed JSON payload.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::error::WeatherError;

/// Issue one GET against `url` with `query`, accumulate the body, and decode it as `T`.
///
/// `endpoint` is a short label ("openmeteo forecast", "openweathermap current") used only
/// in log lines; the query string is never logged since it may carry an API key.
/// Exactly one log line is emitted per call, at the terminal state.
pub async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    endpoint: &str,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, WeatherError> {
    let (status, bytes) = match get_body(http, url, query).await {
        Ok(parts) => parts,
        Err(err) => {
            let err = err.without_url();
            error!(endpoint, url, error = %err, "request failed at transport level");
            return Err(WeatherError::from(err));
        }
    };

    if status != StatusCode::OK {
        error!(
            endpoint,
            status = status.as_u16(),
            body = %truncate_body(&bytes),
            "provider returned non-200 status"
        );
        return Err(WeatherError::HttpStatus(status.as_u16()));
    }

    match serde_json::from_slice::<T>(&bytes) {
        Ok(parsed) => {
            info!(endpoint, bytes = bytes.len(), "weather data received");
            Ok(parsed)
        }
        Err(err) => {
            error!(endpoint, error = %err, "failed to parse provider response");
            Err(WeatherError::from(err))
        }
    }
}

async fn get_body(
    http: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<(StatusCode, Vec<u8>), reqwest::Error> {
    let mut res = http.get(url).query(query).send().await?;
    let status = res.status();

    let mut body = Vec::new();
    while let Some(chunk) = res.chunk().await? {
        body.extend_from_slice(&chunk);
    }

    Ok((status, body))
}

fn truncate_body(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.into_owned()
    }
}
