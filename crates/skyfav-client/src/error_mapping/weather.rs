use crate::services::weather_service::WeatherError as UiWeatherError;
use skyfav_core::{AppError, AuthError, WeatherError};

impl From<UiWeatherError> for AppError {
    fn from(e: UiWeatherError) -> Self {
        match e {
            UiWeatherError::Network(s) => AppError::Weather(WeatherError::FetchFailed(s)),
            UiWeatherError::Unauthorized => AppError::Auth(AuthError::NotAuthenticated),
        }
    }
}

/// Failure of a typed-in city search.
pub(crate) fn search_failure(e: UiWeatherError) -> AppError {
    match e {
        UiWeatherError::Network(s) => AppError::Weather(WeatherError::CityNotFound(s)),
        UiWeatherError::Unauthorized => AppError::Auth(AuthError::NotAuthenticated),
    }
}
