pub mod city_name;
pub mod config;
pub mod error;
pub mod http;
pub mod op_state;

pub use city_name::{normalize, same_city};
pub use config::{BackendConfig, Config, LocationConfig, NoticeConfig, ValidationResult};
pub use error::{
    AppError, AuthError, ConfigError, FavoritesError, GeolocationError, NetworkError,
    ReqwestErrorExt, ValidationError, WeatherError,
};
pub use op_state::InFlight;

use anyhow::Result;

/// Initialize logging for the application.
///
/// `default_level` is used when `RUST_LOG` is not set.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("SkyFav core initialized");
    Ok(())
}
