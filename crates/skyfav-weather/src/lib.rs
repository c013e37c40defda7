pub mod location;
pub mod provider;
pub mod types;

pub use location::{FixedGeolocation, Geolocator, LocationResolver, NoGeolocation, Resolution};
pub use provider::WeatherProvider;
pub use types::{Coordinates, FetchError, LocationQuery, WeatherSnapshot};
