use crate::services::preferences_service::PreferencesError;
use skyfav_core::{AppError, AuthError, FavoritesError};

impl From<PreferencesError> for AppError {
    fn from(e: PreferencesError) -> Self {
        favorites_failure(e, FavoritesError::LoadFailed)
    }
}

/// Wrap a failure in the operation's own variant.
pub(crate) fn favorites_failure(
    e: PreferencesError,
    op: fn(String) -> FavoritesError,
) -> AppError {
    match e {
        PreferencesError::Network(s) => AppError::Favorites(op(s)),
        PreferencesError::Unauthorized => AppError::Auth(AuthError::NotAuthenticated),
    }
}
