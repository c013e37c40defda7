use crate::services::auth_service::AuthError as UiAuthError;
use skyfav_core::{AppError, AuthError, NetworkError};

impl From<UiAuthError> for AppError {
    fn from(e: UiAuthError) -> Self {
        match e {
            UiAuthError::Unauthorized => AppError::Auth(AuthError::NotAuthenticated),
            UiAuthError::Rejected(_) => AppError::Auth(AuthError::InvalidCredentials),
            UiAuthError::Network(s) => AppError::Network(NetworkError::ConnectionFailed(s)),
        }
    }
}

/// Any login failure reads as bad credentials.
pub(crate) fn login_failure(e: UiAuthError) -> AppError {
    tracing::debug!("Login failed: {}", e);
    AppError::Auth(AuthError::InvalidCredentials)
}

/// Registration failures carry the server's reason when it gave one.
pub(crate) fn registration_failure(e: UiAuthError) -> AppError {
    match e {
        UiAuthError::Rejected(reason) => AppError::Auth(AuthError::RegistrationFailed(reason)),
        _ => AppError::Auth(AuthError::RegistrationFailed(None)),
    }
}
