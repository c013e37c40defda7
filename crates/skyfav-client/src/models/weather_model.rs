//! Weather page controller.
//!
//! Runs the resolution chain (requested city, device position, manual entry)
//! and keeps the latest snapshot. Every position and fetch request gets a
//! fresh token; a completion is applied only if its token is the latest one
//! issued, so a superseded response can never overwrite newer state.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use skyfav_core::{AppError, GeolocationError, ValidationError};
use skyfav_weather::{Coordinates, LocationQuery, LocationResolver, WeatherSnapshot};

use crate::app_services::AppServices;
use crate::error_mapping::search_failure;
use crate::services::weather_service::{self as svc, WeatherError, WeatherServiceMessage};

/// Which step issued the outstanding fetch; picks the failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOrigin {
    Resolution,
    Manual,
}

pub struct WeatherModel {
    services: Arc<AppServices>,
    tx: Sender<WeatherServiceMessage>,
    rx: Receiver<WeatherServiceMessage>,
    activated: bool,
    requested_city: Option<String>,
    /// Bumped on every navigation activation
    chain: u64,
    latest_token: u64,
    /// Token of the request whose completion is awaited
    awaiting: Option<u64>,
    origin: FetchOrigin,
    query: LocationQuery,
    snapshot: Option<WeatherSnapshot>,
    snapshot_chain: Option<u64>,
    error: Option<AppError>,
    offer_manual_search: bool,
    search_input: String,
    auth_failed: bool,
}

impl WeatherModel {
    pub fn new(services: Arc<AppServices>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            services,
            tx,
            rx,
            activated: false,
            requested_city: None,
            chain: 0,
            latest_token: 0,
            awaiting: None,
            origin: FetchOrigin::Resolution,
            query: LocationQuery::Unresolved,
            snapshot: None,
            snapshot_chain: None,
            error: None,
            offer_manual_search: false,
            search_input: String::new(),
            auth_failed: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    /// Last location the chain settled on (or is fetching).
    pub fn query(&self) -> &LocationQuery {
        &self.query
    }

    pub fn requested_city(&self) -> Option<&str> {
        self.requested_city.as_deref()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(AppError::user_message)
    }

    /// Set when the chain or a fetch failed and manual entry should be offered.
    pub fn offers_manual_search(&self) -> bool {
        self.offer_manual_search
    }

    /// Whether the manual search box should be on screen.
    pub fn manual_search_visible(&self) -> bool {
        self.snapshot.is_none() && (self.offer_manual_search || self.error.is_some())
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.search_input = text.into();
    }

    pub fn take_auth_failure(&mut self) -> bool {
        std::mem::take(&mut self.auth_failed)
    }

    /// Activate for a navigation context. Does nothing if the requested city
    /// is the same as the last activation's.
    pub fn navigate(&mut self, requested_city: Option<&str>) {
        let requested = LocationResolver::requested(requested_city).and_then(|q| match q {
            LocationQuery::ByCity(name) => Some(name),
            _ => None,
        });
        if self.activated && requested == self.requested_city {
            tracing::debug!("Navigation context unchanged, not re-resolving");
            return;
        }

        self.activated = true;
        self.requested_city = requested;
        self.chain += 1;
        self.error = None;
        self.offer_manual_search = false;

        match self.requested_city.clone() {
            Some(city) => self.start_fetch(LocationQuery::ByCity(city), FetchOrigin::Resolution),
            None => self.start_geolocation(),
        }
    }

    /// Re-run the device position step.
    pub fn retry_location(&mut self) {
        self.error = None;
        self.offer_manual_search = false;
        self.start_geolocation();
    }

    /// Submit what is in the search box.
    pub fn submit_search_input(&mut self) -> Result<(), ValidationError> {
        let text = self.search_input.clone();
        self.submit_manual_search(&text)
    }

    /// Fetch a typed-in city, bypassing geolocation.
    pub fn submit_manual_search(&mut self, input: &str) -> Result<(), ValidationError> {
        let query = LocationResolver::manual(input).map_err(|e| {
            self.error = Some(e.into());
            e
        })?;
        self.start_fetch(query, FetchOrigin::Manual);
        Ok(())
    }

    /// Drop all state (logout). In-flight completions are never applied.
    pub fn clear(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.tx = tx;
        self.rx = rx;
        self.activated = false;
        self.requested_city = None;
        self.awaiting = None;
        self.query = LocationQuery::Unresolved;
        self.snapshot = None;
        self.snapshot_chain = None;
        self.error = None;
        self.offer_manual_search = false;
        self.search_input.clear();
        self.auth_failed = false;
    }

    fn next_token(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    fn start_geolocation(&mut self) {
        let token = self.next_token();
        self.query = LocationQuery::Unresolved;

        if !self.services.geolocator.is_supported() {
            self.awaiting = None;
            self.resolution_failed(GeolocationError::Unsupported);
            return;
        }

        tracing::debug!(token, "Requesting device position");
        self.awaiting = Some(token);
        svc::request_position(
            &self.tx,
            &self.services.runtime,
            self.services.geolocator.clone(),
            token,
        );
    }

    fn start_fetch(&mut self, query: LocationQuery, origin: FetchOrigin) {
        let token = self.next_token();
        tracing::debug!(token, %query, ?origin, "Fetching weather");
        self.awaiting = Some(token);
        self.origin = origin;
        self.query = query.clone();
        svc::request_fetch(
            &self.tx,
            &self.services.runtime,
            self.services.weather.clone(),
            token,
            query,
        );
    }

    fn resolution_failed(&mut self, e: GeolocationError) {
        self.error = Some(e.into());
        self.offer_manual_search = true;
    }

    // ---- Completions ----

    pub fn poll_channel(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: WeatherServiceMessage) {
        match msg {
            WeatherServiceMessage::Located { token, result } => self.on_located(token, result),
            WeatherServiceMessage::FetchDone { token, result } => self.on_fetch_done(token, result),
        }
    }

    fn is_current(&self, token: u64) -> bool {
        token == self.latest_token && self.awaiting == Some(token)
    }

    fn on_located(&mut self, token: u64, result: Result<Coordinates, GeolocationError>) {
        if !self.is_current(token) {
            tracing::warn!(token, latest = self.latest_token, "Discarding stale position");
            return;
        }

        let resolution = LocationResolver::from_position(result);
        match resolution.error {
            None => self.start_fetch(resolution.query, FetchOrigin::Resolution),
            Some(e) => {
                self.awaiting = None;
                self.query = resolution.query;
                self.resolution_failed(e);
            }
        }
    }

    fn on_fetch_done(&mut self, token: u64, result: Result<WeatherSnapshot, WeatherError>) {
        if !self.is_current(token) {
            tracing::warn!(token, latest = self.latest_token, "Discarding stale weather response");
            return;
        }
        self.awaiting = None;

        match result {
            Ok(snapshot) => {
                tracing::info!(city = %snapshot.city_name, "Weather updated");
                self.snapshot = Some(snapshot);
                self.snapshot_chain = Some(self.chain);
                self.error = None;
                self.offer_manual_search = false;
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed: {}", e);
                let err = match self.origin {
                    FetchOrigin::Resolution => AppError::from(e),
                    FetchOrigin::Manual => search_failure(e),
                };
                if err.is_auth_error() {
                    self.auth_failed = true;
                }
                if self.snapshot_chain == Some(self.chain) {
                    self.snapshot = None;
                    self.snapshot_chain = None;
                }
                self.error = Some(err);
                self.offer_manual_search = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfav_core::Config;
    use skyfav_weather::{FixedGeolocation, Geolocator, NoGeolocation};

    fn model_with(geolocator: Arc<dyn Geolocator>) -> WeatherModel {
        let mut config = Config::default();
        config.backend.base_url = "http://127.0.0.1:9/api".into();
        let services =
            AppServices::new(&config, tokio::runtime::Handle::current(), geolocator).unwrap();
        WeatherModel::new(Arc::new(services))
    }

    fn model() -> WeatherModel {
        model_with(Arc::new(FixedGeolocation::new(Coordinates::new(30.0, 31.0))))
    }

    fn snapshot(name: &str) -> WeatherSnapshot {
        serde_json::from_value(serde_json::json!({
            "city_name": name,
            "observed_at": "2026-10-19T12:00:00Z",
            "temperature": 20.0,
            "temperature_min": 18.0,
            "temperature_max": 23.0,
            "condition_icon": "01d"
        }))
        .unwrap()
    }

    fn done(token: u64, name: &str) -> WeatherServiceMessage {
        WeatherServiceMessage::FetchDone {
            token,
            result: Ok(snapshot(name)),
        }
    }

    #[tokio::test]
    async fn requested_city_fetches_directly() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        assert!(m.is_loading());
        assert_eq!(m.query(), &LocationQuery::ByCity("Cairo".into()));

        m.handle_message(done(1, "Cairo"));
        assert!(!m.is_loading());
        assert_eq!(m.snapshot().map(|s| s.city_name.as_str()), Some("Cairo"));
    }

    #[tokio::test]
    async fn same_navigation_context_does_not_refetch() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        m.handle_message(done(1, "Cairo"));
        m.navigate(Some("Cairo"));
        assert!(!m.is_loading());
        m.navigate(Some("Giza"));
        assert!(m.is_loading());
    }

    #[tokio::test]
    async fn late_response_for_older_request_is_dropped() {
        let mut m = model();
        m.navigate(Some("A"));
        m.navigate(Some("B"));

        m.handle_message(done(2, "B"));
        m.handle_message(done(1, "A"));

        assert_eq!(m.snapshot().map(|s| s.city_name.as_str()), Some("B"));
        assert!(!m.is_loading());
    }

    #[tokio::test]
    async fn loading_stays_until_latest_completes() {
        let mut m = model();
        m.navigate(Some("A"));
        m.navigate(Some("B"));
        m.handle_message(done(1, "A"));
        assert!(m.is_loading());
        assert!(m.snapshot().is_none());
    }

    #[tokio::test]
    async fn position_leads_to_coordinate_fetch() {
        let mut m = model();
        m.navigate(None);
        assert!(m.is_loading());

        m.handle_message(WeatherServiceMessage::Located {
            token: 1,
            result: Ok(Coordinates::new(30.0, 31.0)),
        });
        assert!(m.is_loading());
        assert_eq!(
            m.query(),
            &LocationQuery::ByCoordinates(Coordinates::new(30.0, 31.0))
        );

        m.handle_message(done(2, "Cairo"));
        assert_eq!(m.snapshot().map(|s| s.city_name.as_str()), Some("Cairo"));
    }

    #[tokio::test]
    async fn denied_position_offers_manual_search() {
        let mut m = model();
        m.navigate(None);
        m.handle_message(WeatherServiceMessage::Located {
            token: 1,
            result: Err(GeolocationError::PermissionDenied),
        });

        assert!(!m.is_loading());
        assert_eq!(m.query(), &LocationQuery::Unresolved);
        assert_eq!(
            m.error_message().as_deref(),
            Some("تم رفض الإذن بالوصول إلى الموقع")
        );
        assert!(m.offers_manual_search());
        assert!(m.manual_search_visible());
    }

    #[tokio::test]
    async fn timeout_gets_timeout_message() {
        let mut m = model();
        m.navigate(None);
        m.handle_message(WeatherServiceMessage::Located {
            token: 1,
            result: Err(GeolocationError::Timeout),
        });
        assert_eq!(
            m.error_message().as_deref(),
            Some("انتهت المهلة في انتظار الموقع")
        );
    }

    #[tokio::test]
    async fn unsupported_fails_without_request() {
        let mut m = model_with(Arc::new(NoGeolocation));
        m.navigate(None);
        assert!(!m.is_loading());
        assert_eq!(m.error_message().as_deref(), Some("المتصفح لا يدعم تحديد الموقع"));
        assert!(m.offers_manual_search());
    }

    #[tokio::test]
    async fn manual_search_supersedes_pending_position() {
        let mut m = model();
        m.navigate(None);
        m.submit_manual_search("Cairo").unwrap();

        m.handle_message(WeatherServiceMessage::Located {
            token: 1,
            result: Err(GeolocationError::Timeout),
        });
        assert!(m.error().is_none());

        m.handle_message(done(2, "Cairo"));
        assert_eq!(m.snapshot().map(|s| s.city_name.as_str()), Some("Cairo"));
        assert!(!m.offers_manual_search());
    }

    #[tokio::test]
    async fn blank_manual_search_is_rejected() {
        let mut m = model();
        m.set_search_input("   ");
        assert_eq!(m.submit_search_input(), Err(ValidationError::EmptyCityName));
        assert!(!m.is_loading());
        assert_eq!(m.error_message().as_deref(), Some("الرجاء إدخال اسم المدينة."));
    }

    #[tokio::test]
    async fn manual_search_failure_has_search_message() {
        let mut m = model();
        m.submit_manual_search("Atlantis").unwrap();
        m.handle_message(WeatherServiceMessage::FetchDone {
            token: 1,
            result: Err(WeatherError::Network("404".into())),
        });
        assert_eq!(m.error_message().as_deref(), Some("فشل في العثور على المدينة"));
        assert!(m.offers_manual_search());
    }

    #[tokio::test]
    async fn failure_in_new_chain_keeps_previous_snapshot() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        m.handle_message(done(1, "Cairo"));

        m.navigate(Some("Atlantis"));
        m.handle_message(WeatherServiceMessage::FetchDone {
            token: 2,
            result: Err(WeatherError::Network("404".into())),
        });

        assert_eq!(m.snapshot().map(|s| s.city_name.as_str()), Some("Cairo"));
        assert_eq!(m.error_message().as_deref(), Some("فشل في جلب بيانات الطقس"));
        assert!(m.offers_manual_search());
    }

    #[tokio::test]
    async fn failure_in_same_chain_clears_snapshot() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        m.handle_message(done(1, "Cairo"));

        m.submit_manual_search("Atlantis").unwrap();
        m.handle_message(WeatherServiceMessage::FetchDone {
            token: 2,
            result: Err(WeatherError::Network("404".into())),
        });

        assert!(m.snapshot().is_none());
        assert!(m.manual_search_visible());
    }

    #[tokio::test]
    async fn unauthorized_fetch_is_flagged() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        m.handle_message(WeatherServiceMessage::FetchDone {
            token: 1,
            result: Err(WeatherError::Unauthorized),
        });
        assert!(m.take_auth_failure());
    }

    #[tokio::test]
    async fn retry_reruns_geolocation() {
        let mut m = model();
        m.navigate(None);
        m.handle_message(WeatherServiceMessage::Located {
            token: 1,
            result: Err(GeolocationError::PositionUnavailable),
        });
        m.retry_location();
        assert!(m.is_loading());
        assert!(m.error().is_none());

        m.handle_message(WeatherServiceMessage::Located {
            token: 2,
            result: Ok(Coordinates::new(1.0, 2.0)),
        });
        assert!(m.query().is_resolved());
    }

    #[tokio::test]
    async fn clear_forgets_context() {
        let mut m = model();
        m.navigate(Some("Cairo"));
        m.handle_message(done(1, "Cairo"));
        m.clear();
        assert!(m.snapshot().is_none());
        m.navigate(Some("Cairo"));
        assert!(m.is_loading());
    }
}
