// crates/skyfav-services/src/preferences.rs

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use crate::error::{check_response, ServiceError};

/// Backend-assigned favorite identifier.
pub type FavoriteId = String;

/// A saved city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteCity {
    #[serde(alias = "_id")]
    pub id: FavoriteId,
    pub city: String,
}

impl FavoriteCity {
    /// Same record with its city name normalized.
    pub fn normalized(self) -> Self {
        Self {
            city: skyfav_core::normalize(&self.city),
            ..self
        }
    }
}

#[derive(Debug, Serialize)]
struct AddFavoriteRequest<'a> {
    city: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenameFavoriteRequest<'a> {
    new_city: &'a str,
}

/// Client for `/preferences`.
#[derive(Debug, Clone)]
pub struct PreferencesClient {
    client: Arc<Client>,
    base_url: Url,
}

impl PreferencesClient {
    pub fn new(client: Client, base_url: Url) -> Self {
        Self {
            client: Arc::new(client),
            base_url,
        }
    }

    /// All favorites in backend order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<FavoriteCity>, ServiceError> {
        let url = self.base_url.join("preferences")?;
        let response = self.client.get(url).send().await?;
        let response = check_response(response).await?;
        let favorites: Vec<FavoriteCity> = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        tracing::info!("Fetched {} favorites", favorites.len());
        Ok(favorites)
    }

    /// Store `city`; returns the backend's record.
    #[instrument(skip(self))]
    pub async fn add(&self, city: &str) -> Result<FavoriteCity, ServiceError> {
        let url = self.base_url.join("preferences")?;
        let response = self
            .client
            .post(url)
            .json(&AddFavoriteRequest { city })
            .send()
            .await?;
        let response = check_response(response).await?;
        let favorite: FavoriteCity = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        tracing::info!(id = %favorite.id, "Added favorite");
        Ok(favorite)
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: &str, new_city: &str) -> Result<(), ServiceError> {
        let url = self.entry_url(id)?;
        let response = self
            .client
            .put(url)
            .json(&RenameFavoriteRequest { new_city })
            .send()
            .await?;
        check_response(response).await?;

        tracing::info!(id, "Renamed favorite");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let url = self.entry_url(id)?;
        let response = self.client.delete(url).send().await?;
        check_response(response).await?;

        tracing::info!(id, "Deleted favorite");
        Ok(())
    }

    /// `preferences/<id>`, with the id percent-encoded as one path segment.
    fn entry_url(&self, id: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.join("preferences")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id);
        Ok(url)
    }

    /// Look up the current id for `city` (normalized comparison) and delete it.
    ///
    /// Returns the deleted id, or `None` if the city is not a favorite.
    #[instrument(skip(self))]
    pub async fn delete_city(&self, city: &str) -> Result<Option<FavoriteId>, ServiceError> {
        let found = self
            .list()
            .await?
            .into_iter()
            .find(|f| skyfav_core::same_city(&f.city, city));

        match found {
            Some(favorite) => {
                self.delete(&favorite.id).await?;
                Ok(Some(favorite.id))
            }
            None => {
                tracing::debug!("No favorite matches {}", city);
                Ok(None)
            }
        }
    }
}
