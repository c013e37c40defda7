pub mod edit_session;
pub mod favorites_model;
pub mod membership;
pub mod session_model;
pub mod weather_model;
