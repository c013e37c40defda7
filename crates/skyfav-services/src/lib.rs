// crates/skyfav-services/src/lib.rs

pub mod auth;
pub mod error;
pub mod preferences;

pub use auth::{AuthClient, Credentials};
pub use error::ServiceError;
pub use preferences::{FavoriteCity, FavoriteId, PreferencesClient};
