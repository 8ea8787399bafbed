use thiserror::Error;

/// Terminal failure of one acquisition cycle.
///
/// The `Display` text is what the presentation layer shows in its error
/// panel. A `WeatherError` never carries partial weather data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Transport-level failure: DNS, connection reset, timeout, broken body stream.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with something other than 200 OK.
    #[error("API Error: {0}")]
    HttpStatus(u16),

    /// The body was not valid JSON for the expected payload shape.
    #[error("Error parsing weather data: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::Network(_) => "network-failure",
            WeatherError::HttpStatus(_) => "http-status-failure",
            WeatherError::Parse(_) => "parse-failure",
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Parse(err.to_string())
    }
}
