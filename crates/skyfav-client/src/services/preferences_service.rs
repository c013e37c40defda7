//! Preferences backend: async CRUD operations for favorite cities.
//! All network work runs on the services runtime; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use skyfav_services::{FavoriteCity, FavoriteId, PreferencesClient, ServiceError};
use tokio::runtime::Handle;

/// Error type for favorites operations
#[derive(Debug, Clone)]
pub enum PreferencesError {
    Network(String),
    Unauthorized,
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Network(s) => write!(f, "Network error: {}", s),
            PreferencesError::Unauthorized => write!(f, "Preferences request not authenticated"),
        }
    }
}

impl std::error::Error for PreferencesError {}

impl From<ServiceError> for PreferencesError {
    fn from(e: ServiceError) -> Self {
        if e.is_unauthorized() {
            PreferencesError::Unauthorized
        } else {
            PreferencesError::Network(e.to_string())
        }
    }
}

/// Where an add was triggered from; picks the failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOrigin {
    /// Favorites page form
    Form,
    /// Star toggle on the weather card
    Star,
}

/// Messages sent from async operations back to the favorites model
#[derive(Debug)]
pub enum PreferencesServiceMessage {
    /// Result of fetching the whole list
    LoadDone(Result<Vec<FavoriteCity>, PreferencesError>),
    /// Result of adding a city (`city` is the normalized name that was sent)
    AddDone {
        city: String,
        origin: AddOrigin,
        result: Result<FavoriteCity, PreferencesError>,
    },
    /// Result of renaming a favorite
    RenameDone {
        id: FavoriteId,
        new_city: String,
        result: Result<(), PreferencesError>,
    },
    /// Result of deleting a favorite by id
    DeleteDone {
        id: FavoriteId,
        result: Result<(), PreferencesError>,
    },
    /// Result of removing a city by name (id looked up on the backend)
    RemoveCityDone {
        city: String,
        result: Result<Option<FavoriteId>, PreferencesError>,
    },
    /// A notice's display time ran out
    NoticeExpired { generation: u64 },
}

/// Request to fetch favorites asynchronously.
/// Sends `LoadDone` on the channel when complete.
pub fn request_load(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    client: Arc<PreferencesClient>,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.list().await.map_err(PreferencesError::from);
        let _ = tx.send(PreferencesServiceMessage::LoadDone(result));
    });
}

/// Request to add a favorite asynchronously.
/// Sends `AddDone` on the channel when complete.
pub fn request_add(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    client: Arc<PreferencesClient>,
    city: String,
    origin: AddOrigin,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.add(&city).await.map_err(PreferencesError::from);
        let _ = tx.send(PreferencesServiceMessage::AddDone {
            city,
            origin,
            result,
        });
    });
}

/// Request to rename a favorite asynchronously.
/// Sends `RenameDone` on the channel when complete.
pub fn request_rename(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    client: Arc<PreferencesClient>,
    id: FavoriteId,
    new_city: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client
            .rename(&id, &new_city)
            .await
            .map_err(PreferencesError::from);
        let _ = tx.send(PreferencesServiceMessage::RenameDone {
            id,
            new_city,
            result,
        });
    });
}

/// Request to delete a favorite asynchronously.
/// Sends `DeleteDone` on the channel when complete.
pub fn request_delete(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    client: Arc<PreferencesClient>,
    id: FavoriteId,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.delete(&id).await.map_err(PreferencesError::from);
        let _ = tx.send(PreferencesServiceMessage::DeleteDone { id, result });
    });
}

/// Request to remove `city` by its current backend id.
/// Sends `RemoveCityDone` on the channel when complete.
pub fn request_remove_city(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    client: Arc<PreferencesClient>,
    city: String,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client
            .delete_city(&city)
            .await
            .map_err(PreferencesError::from);
        let _ = tx.send(PreferencesServiceMessage::RemoveCityDone { city, result });
    });
}

/// Send `NoticeExpired` for `generation` after `after`.
pub fn schedule_notice_expiry(
    tx: &Sender<PreferencesServiceMessage>,
    runtime: &Handle,
    generation: u64,
    after: Duration,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        tokio::time::sleep(after).await;
        let _ = tx.send(PreferencesServiceMessage::NoticeExpired { generation });
    });
}
