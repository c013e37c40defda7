pub mod auth_service;
pub mod preferences_service;
pub mod weather_service;

pub use auth_service::{AuthError, AuthServiceMessage};
pub use preferences_service::{AddOrigin, PreferencesError, PreferencesServiceMessage};
pub use weather_service::{WeatherError, WeatherServiceMessage};
