//! Location resolution: requested city, then device position, then manual
//! entry.

use async_trait::async_trait;
use skyfav_core::{GeolocationError, ValidationError};

use crate::types::{Coordinates, LocationQuery};

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// False when the platform has no position capability at all.
    fn is_supported(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// No position capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Always reports the same position (configured coordinates).
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation {
    position: Coordinates,
}

impl FixedGeolocation {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocation {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.position)
    }
}

/// Outcome of one resolution step.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub query: LocationQuery,
    pub error: Option<GeolocationError>,
    pub offer_manual_entry: bool,
}

impl Resolution {
    pub fn resolved(query: LocationQuery) -> Self {
        Self {
            query,
            error: None,
            offer_manual_entry: false,
        }
    }

    pub fn failed(error: GeolocationError) -> Self {
        Self {
            query: LocationQuery::Unresolved,
            error: Some(error),
            offer_manual_entry: true,
        }
    }
}

/// Stateless resolution rules. Controllers call the individual steps so each
/// can be driven from its own completion message.
pub struct LocationResolver;

impl LocationResolver {
    /// A non-blank requested city wins outright; geolocation is not consulted.
    pub fn requested(param: Option<&str>) -> Option<LocationQuery> {
        param.and_then(LocationQuery::by_city)
    }

    /// Typed-in city. Blank input is rejected without a request.
    pub fn manual(input: &str) -> Result<LocationQuery, ValidationError> {
        LocationQuery::by_city(input).ok_or(ValidationError::EmptyCityName)
    }

    /// Map a position result into a resolution.
    pub fn from_position(result: Result<Coordinates, GeolocationError>) -> Resolution {
        match result {
            Ok(c) => Resolution::resolved(LocationQuery::ByCoordinates(c)),
            Err(e) => {
                tracing::warn!("Geolocation failed: {}", e);
                Resolution::failed(e)
            }
        }
    }

    /// Run the whole chain once.
    pub async fn resolve(param: Option<&str>, geolocator: &dyn Geolocator) -> Resolution {
        if let Some(query) = Self::requested(param) {
            tracing::debug!(%query, "Resolved from requested city");
            return Resolution::resolved(query);
        }

        if !geolocator.is_supported() {
            return Resolution::failed(GeolocationError::Unsupported);
        }

        Self::from_position(geolocator.current_position().await)
    }
}
