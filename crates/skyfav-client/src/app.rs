//! Root controller.
//!
//! Owns the session gate and the per-screen models, and wires them together
//! after each poll: 401-class failures close the session, entering a session
//! loads favorites, leaving one clears every user-scoped model, and the star
//! flag is recomputed from the current list and snapshot.

use std::sync::Arc;

use skyfav_services::Credentials;

use crate::app_services::AppServices;
use crate::models::favorites_model::FavoritesModel;
use crate::models::membership::{FavoriteMembership, ToggleAction};
use crate::models::session_model::{AuthState, GateDecision, Route, SessionGate};
use crate::models::weather_model::WeatherModel;

pub struct AppController {
    services: Arc<AppServices>,
    session: SessionGate,
    weather: WeatherModel,
    favorites: FavoritesModel,
    membership: FavoriteMembership,
    last_state: AuthState,
}

impl AppController {
    pub fn new(services: Arc<AppServices>) -> Self {
        Self {
            session: SessionGate::new(services.clone()),
            weather: WeatherModel::new(services.clone()),
            favorites: FavoritesModel::new(services.clone()),
            membership: FavoriteMembership::default(),
            last_state: AuthState::Unknown,
            services,
        }
    }

    pub fn services(&self) -> &Arc<AppServices> {
        &self.services
    }

    /// Issue the startup session probe.
    pub fn start(&mut self) {
        self.session.start();
    }

    /// Apply every pending completion, then reconcile the models.
    pub fn poll(&mut self) {
        self.session.poll_channel();
        self.weather.poll_channel();
        self.favorites.poll_channel();

        let weather_rejected = self.weather.take_auth_failure();
        let favorites_rejected = self.favorites.take_auth_failure();
        if weather_rejected || favorites_rejected {
            self.session.mark_unauthenticated();
        }

        self.on_session_change();
        self.membership
            .sync(self.favorites.list(), self.weather.snapshot());
    }

    fn on_session_change(&mut self) {
        let state = self.session.state();
        if state == self.last_state {
            return;
        }
        let previous = std::mem::replace(&mut self.last_state, state);

        match state {
            AuthState::Authenticated => {
                tracing::info!("Session established, loading favorites");
                self.favorites.load();
            }
            AuthState::Unauthenticated if previous == AuthState::Authenticated => {
                self.teardown();
            }
            _ => {}
        }
    }

    fn teardown(&mut self) {
        tracing::info!("Session ended, clearing user state");
        self.weather.clear();
        self.favorites.clear();
        self.membership = FavoriteMembership::default();
    }

    /// True while any request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.session.is_busy() || self.weather.is_busy() || self.favorites.is_busy()
    }

    // ---- Navigation ----

    /// Show the weather page for an optional requested city.
    pub fn open_weather(&mut self, requested_city: Option<&str>) -> GateDecision {
        let decision = self.session.gate(Route::Weather);
        if decision == GateDecision::Allow {
            self.weather.navigate(requested_city);
        }
        decision
    }

    pub fn open_favorites(&self) -> GateDecision {
        self.session.gate(Route::Favorites)
    }

    /// Open a favorite's weather. `None` if nothing navigates (editing, or
    /// unknown id).
    pub fn open_favorite(&mut self, id: &str) -> Option<GateDecision> {
        let city = self.favorites.navigation_target(id)?;
        Some(self.open_weather(Some(&city)))
    }

    // ---- Star ----

    pub fn is_favorite(&self) -> bool {
        self.membership.is_member()
    }

    pub fn toggle_favorite(&mut self) -> ToggleAction {
        self.membership
            .toggle(&mut self.favorites, self.weather.snapshot())
    }

    // ---- Session ----

    pub fn login(&mut self, credentials: Credentials) {
        self.session.login(credentials);
    }

    pub fn register(&mut self, credentials: Credentials) {
        self.session.register(credentials);
    }

    /// Leave the session and drop user state right away.
    pub fn logout(&mut self) {
        self.session.logout();
        self.on_session_change();
    }

    // ---- Accessors ----

    pub fn session(&self) -> &SessionGate {
        &self.session
    }

    pub fn weather(&self) -> &WeatherModel {
        &self.weather
    }

    pub fn weather_mut(&mut self) -> &mut WeatherModel {
        &mut self.weather
    }

    pub fn favorites(&self) -> &FavoritesModel {
        &self.favorites
    }

    pub fn favorites_mut(&mut self) -> &mut FavoritesModel {
        &mut self.favorites
    }
}
