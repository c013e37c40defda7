use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyfav_core::normalize;
use thiserror::Error;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Device or typed-in position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// What to fetch weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    ByCity(String),
    ByCoordinates(Coordinates),
    Unresolved,
}

impl LocationQuery {
    /// `ByCity` for a non-blank name, trimmed.
    pub fn by_city(raw: &str) -> Option<Self> {
        let name = raw.trim();
        if name.is_empty() {
            None
        } else {
            Some(Self::ByCity(name.to_string()))
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByCity(name) => write!(f, "city={}", name),
            Self::ByCoordinates(c) => write!(f, "lat={:.4},lon={:.4}", c.latitude, c.longitude),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Current weather for the resolved location.
///
/// `city_name` is always normalized. Replaced wholesale on every successful
/// fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub observed_at: DateTime<Utc>,
    pub temperature: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub condition_icon: Option<String>,
}

impl WeatherSnapshot {
    /// Icon image for the current condition.
    pub fn icon_url(&self) -> Option<String> {
        self.condition_icon
            .as_deref()
            .map(|icon| format!("{}/{}@2x.png", ICON_BASE_URL, icon))
    }

    /// Observation date as "Month D, YYYY".
    pub fn display_date(&self) -> String {
        self.observed_at.format("%B %-d, %Y").to_string()
    }

    pub fn display_temperature(&self) -> i64 {
        round_half_up(self.temperature)
    }

    pub fn display_min(&self) -> i64 {
        round_half_up(self.temperature_min)
    }

    pub fn display_max(&self) -> i64 {
        round_half_up(self.temperature_max)
    }
}

/// -2.5 rounds to -2, 2.5 rounds to 3.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

// Wire format of GET /weather

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WeatherResponse {
    pub name: String,
    pub dt: i64,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    pub main: MainReadings,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConditionEntry {
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MainReadings {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

impl TryFrom<WeatherResponse> for WeatherSnapshot {
    type Error = FetchError;

    fn try_from(resp: WeatherResponse) -> Result<Self, Self::Error> {
        let observed_at = DateTime::<Utc>::from_timestamp(resp.dt, 0)
            .ok_or_else(|| FetchError::InvalidResponse(format!("bad timestamp {}", resp.dt)))?;

        Ok(Self {
            city_name: normalize(&resp.name),
            observed_at,
            temperature: resp.main.temp,
            temperature_min: resp.main.temp_min,
            temperature_max: resp.main.temp_max,
            condition_icon: resp.weather.into_iter().next().map(|w| w.icon),
        })
    }
}

/// Weather fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Session is not authenticated")]
    Unauthorized,

    #[error("Weather API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Invalid weather response: {0}")]
    InvalidResponse(String),

    #[error("No location to fetch")]
    Unresolved,

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
