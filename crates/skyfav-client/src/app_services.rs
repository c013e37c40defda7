//! Shared services handed to every controller.
//!
//! Built once at startup and passed explicitly; there is no process-wide
//! singleton. All clients share one cookie-carrying HTTP client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use skyfav_core::http::{base_url, session_client};
use skyfav_core::Config;
use skyfav_services::{AuthClient, PreferencesClient};
use skyfav_weather::{Coordinates, FixedGeolocation, Geolocator, NoGeolocation, WeatherProvider};

pub struct AppServices {
    /// Runtime that request futures are spawned on
    pub runtime: tokio::runtime::Handle,

    pub weather: Arc<WeatherProvider>,

    pub preferences: Arc<PreferencesClient>,

    pub auth: Arc<AuthClient>,

    /// Device position source
    pub geolocator: Arc<dyn Geolocator>,

    /// How long success notices stay up
    pub notice_duration: Duration,
}

impl AppServices {
    /// Build services from config. The geolocator reports the configured
    /// position, or no capability when none is configured.
    pub fn from_config(config: &Config, runtime: tokio::runtime::Handle) -> Result<Self> {
        let geolocator: Arc<dyn Geolocator> = match config.location.fixed_position() {
            Some((lat, lon)) => Arc::new(FixedGeolocation::new(Coordinates::new(lat, lon))),
            None => Arc::new(NoGeolocation),
        };
        Self::new(config, runtime, geolocator)
    }

    pub fn new(
        config: &Config,
        runtime: tokio::runtime::Handle,
        geolocator: Arc<dyn Geolocator>,
    ) -> Result<Self> {
        let http = session_client(&config.backend)?;
        let base = base_url(&config.backend.base_url)?;

        tracing::info!(base_url = %base, "Backend services configured");

        Ok(Self {
            runtime,
            weather: Arc::new(WeatherProvider::new(http.clone(), base.clone())),
            preferences: Arc::new(PreferencesClient::new(http.clone(), base.clone())),
            auth: Arc::new(AuthClient::new(http, base)),
            geolocator,
            notice_duration: config.notices.duration(),
        })
    }
}
