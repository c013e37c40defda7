// crates/skyfav-services/src/auth.rs

use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use crate::error::{check_response, ServiceError};

/// Username and password for login and registration.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client for the cookie session endpoints.
///
/// Must share its `reqwest::Client` with the other backend clients so the
/// session cookie is visible to them.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Arc<Client>,
    base_url: Url,
}

impl AuthClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client: Arc::new(client),
            base_url,
        }
    }

    /// Check the session by hitting a protected endpoint.
    ///
    /// `Ok(())` means authenticated.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> Result<(), ServiceError> {
        let url = self.base_url.join("preferences")?;
        let response = self.client.get(url).send().await?;
        check_response(response).await?;
        tracing::debug!("Session probe succeeded");
        Ok(())
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ServiceError> {
        self.post_credentials("auth/login", credentials).await?;
        tracing::info!("Logged in");
        Ok(())
    }

    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn register(&self, credentials: &Credentials) -> Result<(), ServiceError> {
        self.post_credentials("auth/register", credentials).await?;
        tracing::info!("Registered");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ServiceError> {
        let url = self.base_url.join("auth/logout")?;
        let response = self.client.post(url).send().await?;
        check_response(response).await?;
        tracing::info!("Logged out");
        Ok(())
    }

    async fn post_credentials(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> Result<(), ServiceError> {
        let url = self.base_url.join(endpoint)?;
        let response = self.client.post(url).json(credentials).send().await?;
        check_response(response).await?;
        Ok(())
    }
}
