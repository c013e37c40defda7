//! Maps service-layer errors to skyfav_core::AppError for consistent user-facing messages.
//! Where the same failure reads differently per operation, a helper picks the variant.

mod auth;
mod preferences;
mod weather;

pub(crate) use auth::{login_failure, registration_failure};
pub(crate) use preferences::favorites_failure;
pub(crate) use weather::search_failure;
