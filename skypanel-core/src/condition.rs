//! Provider condition codes mapped onto one icon/description vocabulary.
//!
//! Icon identifiers are the file stems of the animated icon set
//! (`clear-day`, `partly-cloudy-night-rain`, ...). Every lookup is total:
//! an unrecognized code maps to [`Condition::UNKNOWN`].

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Provider-agnostic rendering of a weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Condition {
    pub description: &'static str,
    pub icon: &'static str,
}

impl Condition {
    pub const UNKNOWN: Condition = Condition {
        description: "Unknown",
        icon: "not-available",
    };
}

/// A provider's raw condition identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scheme", content = "code", rename_all = "snake_case")]
pub enum ConditionCode {
    /// WMO weather interpretation code, day/night neutral (Open-Meteo).
    Wmo(u16),
    /// OpenWeatherMap icon code such as `10n`; the suffix carries day/night.
    OwmIcon(String),
}

impl ConditionCode {
    pub fn condition(&self, is_daytime: bool) -> Condition {
        match self {
            ConditionCode::Wmo(code) => wmo_condition(*code, is_daytime),
            ConditionCode::OwmIcon(code) => owm_condition(code),
        }
    }
}

/// Map an optional code; absence renders as unknown.
pub fn describe(code: Option<&ConditionCode>, is_daytime: bool) -> Condition {
    code.map_or(Condition::UNKNOWN, |code| code.condition(is_daytime))
}

enum Icon {
    Single(&'static str),
    DayNight(&'static str, &'static str),
}

struct WmoEntry {
    code: u16,
    description: &'static str,
    icon: Icon,
}

const fn wmo(code: u16, description: &'static str, icon: Icon) -> WmoEntry {
    WmoEntry {
        code,
        description,
        icon,
    }
}

const CLEAR: Icon = Icon::DayNight("clear-day", "clear-night");
const PARTLY_CLOUDY: Icon = Icon::DayNight("partly-cloudy-day", "partly-cloudy-night");
const OVERCAST: Icon = Icon::DayNight("overcast-day", "overcast-night");
const FOG: Icon = Icon::DayNight("fog-day", "fog-night");
const LIGHT_RAIN: Icon = Icon::DayNight("partly-cloudy-day-rain", "partly-cloudy-night-rain");
const LIGHT_SNOW: Icon = Icon::DayNight("partly-cloudy-day-snow", "partly-cloudy-night-snow");
const THUNDERSTORMS: Icon = Icon::DayNight("thunderstorms-day", "thunderstorms-night");

static WMO_TABLE: &[WmoEntry] = &[
    wmo(0, "Clear sky", CLEAR),
    wmo(1, "Mainly clear", CLEAR),
    wmo(2, "Partly cloudy", PARTLY_CLOUDY),
    wmo(3, "Overcast", OVERCAST),
    wmo(45, "Foggy", FOG),
    wmo(48, "Depositing rime fog", FOG),
    wmo(51, "Light drizzle", Icon::Single("drizzle")),
    wmo(53, "Moderate drizzle", Icon::Single("drizzle")),
    wmo(55, "Dense drizzle", Icon::Single("drizzle")),
    wmo(61, "Slight rain", LIGHT_RAIN),
    wmo(63, "Moderate rain", Icon::Single("rain")),
    wmo(65, "Heavy rain", Icon::Single("rain")),
    wmo(66, "Light freezing rain", Icon::Single("sleet")),
    wmo(67, "Heavy freezing rain", Icon::Single("sleet")),
    wmo(71, "Slight snow", LIGHT_SNOW),
    wmo(73, "Moderate snow", Icon::Single("snow")),
    wmo(75, "Heavy snow", Icon::Single("snow")),
    wmo(77, "Snow grains", Icon::Single("snow")),
    wmo(80, "Slight rain showers", LIGHT_RAIN),
    wmo(81, "Moderate rain showers", Icon::Single("rain")),
    wmo(82, "Violent rain showers", Icon::Single("rain")),
    wmo(85, "Slight snow showers", LIGHT_SNOW),
    wmo(86, "Heavy snow showers", Icon::Single("snow")),
    wmo(95, "Thunderstorm", THUNDERSTORMS),
    wmo(96, "Thunderstorm with slight hail", THUNDERSTORMS),
    wmo(99, "Thunderstorm with heavy hail", THUNDERSTORMS),
];

// (icon code, description, icon)
static OWM_TABLE: &[(&str, &str, &str)] = &[
    ("01d", "Clear sky", "clear-day"),
    ("01n", "Clear sky", "clear-night"),
    ("02d", "Few clouds", "partly-cloudy-day"),
    ("02n", "Few clouds", "partly-cloudy-night"),
    ("03d", "Scattered clouds", "cloudy"),
    ("03n", "Scattered clouds", "cloudy"),
    ("04d", "Broken clouds", "overcast-day"),
    ("04n", "Broken clouds", "overcast-night"),
    ("09d", "Shower rain", "rain"),
    ("09n", "Shower rain", "rain"),
    ("10d", "Rain", "partly-cloudy-day-rain"),
    ("10n", "Rain", "partly-cloudy-night-rain"),
    ("11d", "Thunderstorm", "thunderstorms-day"),
    ("11n", "Thunderstorm", "thunderstorms-night"),
    ("13d", "Snow", "partly-cloudy-day-snow"),
    ("13n", "Snow", "partly-cloudy-night-snow"),
    ("50d", "Mist", "fog-day"),
    ("50n", "Mist", "fog-night"),
];

/// WMO code lookup; `is_daytime` picks the variant when the code has two icons.
pub fn wmo_condition(code: u16, is_daytime: bool) -> Condition {
    let Some(entry) = WMO_TABLE.iter().find(|e| e.code == code) else {
        return Condition::UNKNOWN;
    };

    let icon = match entry.icon {
        Icon::Single(icon) => icon,
        Icon::DayNight(day, _) if is_daytime => day,
        Icon::DayNight(_, night) => night,
    };

    Condition {
        description: entry.description,
        icon,
    }
}

/// OpenWeatherMap icon code lookup. Day/night comes from the code itself.
pub fn owm_condition(code: &str) -> Condition {
    OWM_TABLE
        .iter()
        .find(|(known, _, _)| *known == code)
        .map(|&(_, description, icon)| Condition { description, icon })
        .unwrap_or(Condition::UNKNOWN)
}

/// Day/night flag encoded in an OpenWeatherMap icon code, if any.
pub fn owm_icon_is_day(code: &str) -> Option<bool> {
    match code.chars().last()? {
        'd' => Some(true),
        'n' => Some(false),
        _ => None,
    }
}

/// Fixed daytime window used when a provider has no day/night flag: 06:00 <= hour < 20:00.
pub fn is_daytime_hour(hour: u32) -> bool {
    (6..20).contains(&hour)
}

/// Daytime heuristic applied to the local wall-clock hour of `at`.
pub fn is_daytime_at<Tz: TimeZone>(at: &DateTime<Tz>) -> bool {
    is_daytime_hour(at.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn scenario_codes() {
        assert_eq!(
            wmo_condition(0, true),
            Condition {
                description: "Clear sky",
                icon: "clear-day",
            }
        );
        assert_eq!(
            wmo_condition(61, false),
            Condition {
                description: "Slight rain",
                icon: "partly-cloudy-night-rain",
            }
        );
        assert_eq!(wmo_condition(999, true), Condition::UNKNOWN);
        assert_eq!(Condition::UNKNOWN.description, "Unknown");
        assert_eq!(Condition::UNKNOWN.icon, "not-available");
    }

    #[test]
    fn every_known_wmo_code_maps_to_non_default() {
        for entry in WMO_TABLE {
            for is_day in [true, false] {
                let c = wmo_condition(entry.code, is_day);
                assert_ne!(c, Condition::UNKNOWN, "code {}", entry.code);
                assert_ne!(c.icon, "not-available");
            }
        }
    }

    #[test]
    fn unknown_wmo_codes_map_to_default() {
        let known: Vec<u16> = WMO_TABLE.iter().map(|e| e.code).collect();
        for code in (0..=300u16).filter(|c| !known.contains(c)) {
            assert_eq!(wmo_condition(code, true), Condition::UNKNOWN);
            assert_eq!(wmo_condition(code, false), Condition::UNKNOWN);
        }
        assert_eq!(wmo_condition(u16::MAX, true), Condition::UNKNOWN);
    }

    #[test]
    fn single_icon_codes_ignore_daytime() {
        assert_eq!(wmo_condition(63, true), wmo_condition(63, false));
        assert_eq!(wmo_condition(51, true).icon, "drizzle");
    }

    #[test]
    fn day_night_codes_switch_icon() {
        assert_eq!(wmo_condition(95, true).icon, "thunderstorms-day");
        assert_eq!(wmo_condition(95, false).icon, "thunderstorms-night");
        assert_eq!(wmo_condition(2, false).icon, "partly-cloudy-night");
    }

    #[test]
    fn mapping_is_idempotent() {
        let code = ConditionCode::Wmo(71);
        assert_eq!(code.condition(true), code.condition(true));
        let code = ConditionCode::OwmIcon("10n".into());
        assert_eq!(code.condition(false), code.condition(false));
    }

    #[test]
    fn owm_codes_carry_their_own_day_night() {
        for (code, _, _) in OWM_TABLE {
            assert_ne!(owm_condition(code), Condition::UNKNOWN);
        }
        let night = ConditionCode::OwmIcon("01n".into());
        assert_eq!(night.condition(true).icon, "clear-night");
        assert_eq!(night.condition(false).icon, "clear-night");
        assert_eq!(owm_condition("99x"), Condition::UNKNOWN);
        assert_eq!(owm_condition(""), Condition::UNKNOWN);
    }

    #[test]
    fn owm_suffix_flag() {
        assert_eq!(owm_icon_is_day("04d"), Some(true));
        assert_eq!(owm_icon_is_day("04n"), Some(false));
        assert_eq!(owm_icon_is_day("04"), None);
        assert_eq!(owm_icon_is_day(""), None);
    }

    #[test]
    fn absent_code_is_unknown() {
        assert_eq!(describe(None, true), Condition::UNKNOWN);
        assert_eq!(describe(Some(&ConditionCode::Wmo(3)), true).icon, "overcast-day");
    }

    #[test]
    fn daytime_window_is_inclusive_exclusive() {
        assert!(!is_daytime_hour(5));
        assert!(is_daytime_hour(6));
        assert!(is_daytime_hour(19));
        assert!(!is_daytime_hour(20));
        assert!(!is_daytime_hour(0));
    }

    #[test]
    fn daytime_uses_local_wall_clock() {
        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        // 22:00 UTC is 08:00 the next morning at +10:00.
        let at = DateTime::parse_from_rfc3339("2024-06-01T22:00:00Z")
            .unwrap()
            .with_timezone(&offset);
        assert!(is_daytime_at(&at));
    }
}
