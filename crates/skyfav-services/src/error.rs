//! Backend client errors.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Session is not authenticated")]
    Unauthorized,

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// `error` field of the response body, if the server sent one.
        server_message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ServiceError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Server-provided reason, used verbatim by the registration form.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Turn a non-2xx response into a `ServiceError`; pass 2xx through.
pub(crate) async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ServiceError::Unauthorized);
    }

    let message = response.text().await.unwrap_or_default();
    let server_message = serde_json::from_str::<ErrorBody>(&message)
        .ok()
        .and_then(|b| b.error);
    tracing::warn!(status = status.as_u16(), "Backend request failed: {}", message);
    Err(ServiceError::Api {
        status: status.as_u16(),
        message,
        server_message,
    })
}
