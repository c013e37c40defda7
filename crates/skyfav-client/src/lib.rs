//! Controllers for the weather and favorites screens.
//!
//! Each model owns an mpsc channel. Requests run on the tokio runtime carried
//! by [`AppServices`] and report back with a `*Done` message that the owner
//! applies in `poll_channel()`.

pub mod app;
pub mod app_services;
mod error_mapping;
pub mod models;
pub mod services;

pub use app::AppController;
pub use app_services::AppServices;
pub use models::edit_session::{EditSession, InteractionTarget};
pub use models::favorites_model::{AddOrigin, FavoritesModel, Notice, OpKey};
pub use models::membership::{FavoriteMembership, ToggleAction};
pub use models::session_model::{AuthState, GateDecision, Route, SessionGate};
pub use models::weather_model::WeatherModel;
