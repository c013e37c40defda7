use crate::types::{FetchError, LocationQuery, WeatherResponse, WeatherSnapshot};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

/// Client for the backend's `GET /weather` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: Url,
}

impl WeatherProvider {
    /// `base_url` must end with `/` (see `skyfav_core::http::base_url`).
    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client: Arc::new(client),
            base_url,
        }
    }

    /// Fetch current weather for `query`.
    ///
    /// # Errors
    ///
    /// `Unresolved` without a request for `LocationQuery::Unresolved`,
    /// `Unauthorized` on 401/403, `Status` on other non-2xx codes.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn fetch(&self, query: &LocationQuery) -> Result<WeatherSnapshot, FetchError> {
        let params: Vec<(&str, String)> = match query {
            LocationQuery::ByCity(name) => vec![("city", name.clone())],
            LocationQuery::ByCoordinates(c) => vec![
                ("lat", c.latitude.to_string()),
                ("lon", c.longitude.to_string()),
            ],
            LocationQuery::Unresolved => return Err(FetchError::Unresolved),
        };

        let url = self.base_url.join("weather")?;
        let response = self.client.get(url).query(&params).send().await?;
        let body: WeatherResponse = handle_response(response).await?;

        let snapshot = WeatherSnapshot::try_from(body)?;
        tracing::info!(city = %snapshot.city_name, "Fetched weather");
        Ok(snapshot)
    }
}

async fn handle_response(response: reqwest::Response) -> Result<WeatherResponse, FetchError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FetchError::Unauthorized);
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "Weather request failed");
        return Err(FetchError::Status {
            status: status.as_u16(),
            message,
        });
    }
    response
        .json::<WeatherResponse>()
        .await
        .map_err(|e| FetchError::InvalidResponse(e.to_string()))
}
