//! Text rendering of the weather panel.
//!
//! Each widget is emitted only when its data is present and its
//! `show_*` toggle is on; a missing value drops the widget instead of
//! printing a placeholder.

use skypanel_core::{DisplayConfig, Formatter, NormalizedWeather, condition::describe};

pub fn panel(weather: &NormalizedWeather, header: Option<&str>, display: &DisplayConfig) -> String {
    let fmt = Formatter::for_weather(weather, display.round_temperature);
    let current = &weather.current;
    let condition = describe(current.condition.as_ref(), current.is_daytime);

    let mut lines = Vec::new();

    if let Some(header) = header.or(current.location_name.as_deref()) {
        lines.push(format!("{header}'s Weather"));
    }

    let mut top = format!("[{}]", condition.icon);
    if let Some(temp) = current.temperature.filter(|_| display.show_temperature) {
        top.push_str(&format!("  {}°", fmt.temperature(temp)));
    }
    lines.push(top);

    if display.show_summary {
        let summary = current.summary.clone();
        lines.push(summary.unwrap_or_else(|| condition.description.to_string()));
    }

    let feels_like = current.feels_like.filter(|_| display.show_feels_like);
    let humidity = current.humidity_pct.filter(|_| display.show_humidity);
    let wind = current.wind_speed.filter(|_| display.show_wind);
    let details: Vec<String> = [
        feels_like.map(|t| format!("feels like {}°", fmt.temperature(t))),
        humidity.map(|h| format!("humidity {}", fmt.humidity(h))),
        wind.map(|w| format!("wind {}", fmt.wind_speed(w))),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !details.is_empty() {
        lines.push(details.join("  ·  "));
    }

    if let Some(sun) = &weather.sun {
        lines.push(format!(
            "sunrise {}  ·  sunset {}",
            fmt.clock(&sun.sunrise),
            fmt.clock(&sun.sunset)
        ));
    }

    if display.show_forecast && !weather.forecast.is_empty() {
        let strip: Vec<String> = weather
            .forecast
            .iter()
            .map(|entry| {
                let icon = describe(entry.condition.as_ref(), entry.is_daytime).icon;
                let time = fmt.clock(&entry.time);
                format!("{time} [{icon}] {}°", fmt.temperature(entry.temperature))
            })
            .collect();
        lines.push(strip.join(" | "));
    }

    lines.join("\n")
}

pub fn error_panel(message: &str) -> String {
    format!("Weather unavailable: {message}")
}
