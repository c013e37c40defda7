//! Authentication gate.
//!
//! Starts `Unknown`, resolves once from a probe of a protected endpoint, and
//! is forced to `Unauthenticated` by logout or by any 401-class failure seen
//! elsewhere. There is no retry loop.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use skyfav_core::AppError;
use skyfav_services::Credentials;

use crate::app_services::AppServices;
use crate::error_mapping::{login_failure, registration_failure};
use crate::services::auth_service::{self as svc, AuthServiceMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Weather,
    Favorites,
    Login,
    Register,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Weather | Route::Favorites)
    }
}

/// What the view should do for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show a loading indicator; the probe has not answered yet
    Loading,
    Allow,
    RedirectToLogin,
}

pub struct SessionGate {
    services: Arc<AppServices>,
    tx: Sender<AuthServiceMessage>,
    rx: Receiver<AuthServiceMessage>,
    state: AuthState,
    probe_started: bool,
    submitting: bool,
    logout_pending: bool,
    error: Option<AppError>,
}

impl SessionGate {
    pub fn new(services: Arc<AppServices>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            services,
            tx,
            rx,
            state: AuthState::Unknown,
            probe_started: false,
            submitting: false,
            logout_pending: false,
            error: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Waiting on the probe, a login/register submission or a logout.
    pub fn is_busy(&self) -> bool {
        (self.state == AuthState::Unknown && self.probe_started)
            || self.submitting
            || self.logout_pending
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(AppError::user_message)
    }

    pub fn gate(&self, route: Route) -> GateDecision {
        if !route.is_protected() {
            return GateDecision::Allow;
        }
        match self.state {
            AuthState::Unknown => GateDecision::Loading,
            AuthState::Authenticated => GateDecision::Allow,
            AuthState::Unauthenticated => GateDecision::RedirectToLogin,
        }
    }

    /// Issue the single startup probe. Later calls do nothing.
    pub fn start(&mut self) {
        if self.probe_started {
            return;
        }
        self.probe_started = true;
        tracing::debug!("Probing session");
        svc::request_probe(&self.tx, &self.services.runtime, self.services.auth.clone());
    }

    pub fn login(&mut self, credentials: Credentials) {
        if self.submitting {
            tracing::warn!("Session request already in flight, ignoring login");
            return;
        }
        self.submitting = true;
        self.error = None;
        svc::request_login(
            &self.tx,
            &self.services.runtime,
            self.services.auth.clone(),
            credentials,
        );
    }

    pub fn register(&mut self, credentials: Credentials) {
        if self.submitting {
            tracing::warn!("Session request already in flight, ignoring register");
            return;
        }
        self.submitting = true;
        self.error = None;
        svc::request_register(
            &self.tx,
            &self.services.runtime,
            self.services.auth.clone(),
            credentials,
        );
    }

    /// Leave the session now; the backend call's outcome is only logged.
    pub fn logout(&mut self) {
        self.set_state(AuthState::Unauthenticated);
        self.error = None;
        self.logout_pending = true;
        svc::request_logout(&self.tx, &self.services.runtime, self.services.auth.clone());
    }

    /// A protected request came back 401-class.
    pub fn mark_unauthenticated(&mut self) {
        if self.state != AuthState::Unauthenticated {
            tracing::info!("Session rejected by backend");
            self.set_state(AuthState::Unauthenticated);
        }
    }

    fn set_state(&mut self, state: AuthState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Auth state changed");
            self.state = state;
        }
    }

    pub fn poll_channel(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: AuthServiceMessage) {
        match msg {
            AuthServiceMessage::ProbeDone(result) => {
                if self.state != AuthState::Unknown {
                    tracing::debug!("Probe answered after state was settled, ignoring");
                    return;
                }
                match result {
                    Ok(()) => self.set_state(AuthState::Authenticated),
                    Err(e) => {
                        tracing::info!("Session probe failed: {}", e);
                        self.set_state(AuthState::Unauthenticated);
                    }
                }
            }
            AuthServiceMessage::LoginDone(result) => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        tracing::info!("Logged in");
                        self.set_state(AuthState::Authenticated);
                    }
                    Err(e) => {
                        self.set_state(AuthState::Unauthenticated);
                        self.error = Some(login_failure(e));
                    }
                }
            }
            AuthServiceMessage::RegisterDone(result) => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        tracing::info!("Registered");
                        self.set_state(AuthState::Authenticated);
                    }
                    Err(e) => {
                        tracing::warn!("Registration failed: {}", e);
                        self.error = Some(registration_failure(e));
                    }
                }
            }
            AuthServiceMessage::LogoutDone(result) => {
                self.logout_pending = false;
                if let Err(e) = result {
                    let err = AppError::from(e);
                    tracing::warn!("Logout request failed: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::AuthError;
    use skyfav_core::Config;
    use skyfav_weather::NoGeolocation;

    fn gate() -> SessionGate {
        let mut config = Config::default();
        config.backend.base_url = "http://127.0.0.1:9/api".into();
        let services = AppServices::new(
            &config,
            tokio::runtime::Handle::current(),
            Arc::new(NoGeolocation),
        )
        .unwrap();
        SessionGate::new(Arc::new(services))
    }

    #[tokio::test]
    async fn unknown_blocks_protected_routes() {
        let g = gate();
        assert_eq!(g.state(), AuthState::Unknown);
        assert_eq!(g.gate(Route::Weather), GateDecision::Loading);
        assert_eq!(g.gate(Route::Favorites), GateDecision::Loading);
        assert_eq!(g.gate(Route::Login), GateDecision::Allow);
    }

    #[tokio::test]
    async fn probe_resolves_once() {
        let mut g = gate();
        g.start();
        assert!(g.is_busy());
        g.handle_message(AuthServiceMessage::ProbeDone(Ok(())));
        assert_eq!(g.gate(Route::Weather), GateDecision::Allow);
        assert!(!g.is_busy());

        g.handle_message(AuthServiceMessage::ProbeDone(Err(AuthError::Unauthorized)));
        assert_eq!(g.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn failed_probe_redirects() {
        let mut g = gate();
        g.handle_message(AuthServiceMessage::ProbeDone(Err(AuthError::Unauthorized)));
        assert_eq!(g.gate(Route::Favorites), GateDecision::RedirectToLogin);
        assert!(g.error().is_none());
    }

    #[tokio::test]
    async fn login_failure_reads_as_bad_credentials() {
        let mut g = gate();
        g.login(Credentials::new("u", "p"));
        assert!(g.is_busy());
        g.handle_message(AuthServiceMessage::LoginDone(Err(AuthError::Unauthorized)));
        assert!(!g.is_busy());
        assert_eq!(g.state(), AuthState::Unauthenticated);
        assert_eq!(g.error_message().as_deref(), Some("بيانات الاعتماد غير صحيحة"));
    }

    #[tokio::test]
    async fn register_failure_uses_server_reason() {
        let mut g = gate();
        g.register(Credentials::new("u", "p"));
        g.handle_message(AuthServiceMessage::RegisterDone(Err(AuthError::Rejected(
            Some("Username taken".into()),
        ))));
        assert_eq!(g.error_message().as_deref(), Some("Username taken"));
    }

    #[tokio::test]
    async fn logout_is_immediate_and_failure_is_silent() {
        let mut g = gate();
        g.handle_message(AuthServiceMessage::LoginDone(Ok(())));
        assert!(g.is_authenticated());

        g.logout();
        assert_eq!(g.state(), AuthState::Unauthenticated);
        assert!(g.is_busy());
        g.handle_message(AuthServiceMessage::LogoutDone(Err(AuthError::Network(
            "refused".into(),
        ))));
        assert!(g.error().is_none());
        assert!(!g.is_busy());
    }

    #[tokio::test]
    async fn backend_rejection_forces_unauthenticated() {
        let mut g = gate();
        g.handle_message(AuthServiceMessage::ProbeDone(Ok(())));
        g.mark_unauthenticated();
        assert_eq!(g.gate(Route::Weather), GateDecision::RedirectToLogin);
    }
}
