//! Weather backend: device position and weather fetches.
//! All network work runs on the services runtime; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use skyfav_core::GeolocationError;
use skyfav_weather::{
    Coordinates, FetchError, Geolocator, LocationQuery, WeatherProvider, WeatherSnapshot,
};
use tokio::runtime::Handle;

/// Error type for weather operations
#[derive(Debug, Clone)]
pub enum WeatherError {
    Network(String),
    Unauthorized,
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::Network(s) => write!(f, "Weather error: {}", s),
            WeatherError::Unauthorized => write!(f, "Weather request not authenticated"),
        }
    }
}

impl std::error::Error for WeatherError {}

impl From<FetchError> for WeatherError {
    fn from(e: FetchError) -> Self {
        if e.is_unauthorized() {
            WeatherError::Unauthorized
        } else {
            WeatherError::Network(e.to_string())
        }
    }
}

/// Messages sent from async operations back to the weather model.
/// `token` identifies the request so superseded completions can be dropped.
#[derive(Debug)]
pub enum WeatherServiceMessage {
    /// Result of asking the device for its position
    Located {
        token: u64,
        result: Result<Coordinates, GeolocationError>,
    },
    /// Result of fetching weather data
    FetchDone {
        token: u64,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Ask the geolocator for the current position.
/// Sends `Located` on the channel when complete.
pub fn request_position(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    geolocator: Arc<dyn Geolocator>,
    token: u64,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = geolocator.current_position().await;
        if let Ok(c) = &result {
            tracing::info!("Got location: {}, {}", c.latitude, c.longitude);
        }
        let _ = tx.send(WeatherServiceMessage::Located { token, result });
    });
}

/// Fetch weather for `query`.
/// Sends `FetchDone` on the channel when complete.
pub fn request_fetch(
    tx: &Sender<WeatherServiceMessage>,
    runtime: &Handle,
    provider: Arc<WeatherProvider>,
    token: u64,
    query: LocationQuery,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = provider.fetch(&query).await.map_err(WeatherError::from);
        let _ = tx.send(WeatherServiceMessage::FetchDone { token, result });
    });
}
