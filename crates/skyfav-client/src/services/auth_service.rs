//! Session backend: probe, login, register, logout.
//! All network work runs on the services runtime; results sent via mpsc.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use skyfav_services::{AuthClient, Credentials, ServiceError};
use tokio::runtime::Handle;

/// Error type for session operations
#[derive(Debug, Clone)]
pub enum AuthError {
    /// 401/403 from the backend
    Unauthorized,
    /// Any other rejection; carries the server's `error` field if present
    Rejected(Option<String>),
    Network(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthorized => write!(f, "Not authenticated"),
            AuthError::Rejected(Some(reason)) => write!(f, "Rejected: {}", reason),
            AuthError::Rejected(None) => write!(f, "Rejected by server"),
            AuthError::Network(s) => write!(f, "Network error: {}", s),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthorized => AuthError::Unauthorized,
            ServiceError::Api { server_message, .. } => AuthError::Rejected(server_message),
            other => AuthError::Network(other.to_string()),
        }
    }
}

/// Messages sent from async operations back to the session gate
#[derive(Debug)]
pub enum AuthServiceMessage {
    ProbeDone(Result<(), AuthError>),
    LoginDone(Result<(), AuthError>),
    RegisterDone(Result<(), AuthError>),
    LogoutDone(Result<(), AuthError>),
}

/// Probe a protected endpoint once.
/// Sends `ProbeDone` on the channel when complete.
pub fn request_probe(tx: &Sender<AuthServiceMessage>, runtime: &Handle, client: Arc<AuthClient>) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.probe().await.map_err(AuthError::from);
        let _ = tx.send(AuthServiceMessage::ProbeDone(result));
    });
}

/// Sends `LoginDone` on the channel when complete.
pub fn request_login(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    client: Arc<AuthClient>,
    credentials: Credentials,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.login(&credentials).await.map_err(AuthError::from);
        let _ = tx.send(AuthServiceMessage::LoginDone(result));
    });
}

/// Sends `RegisterDone` on the channel when complete.
pub fn request_register(
    tx: &Sender<AuthServiceMessage>,
    runtime: &Handle,
    client: Arc<AuthClient>,
    credentials: Credentials,
) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.register(&credentials).await.map_err(AuthError::from);
        let _ = tx.send(AuthServiceMessage::RegisterDone(result));
    });
}

/// Sends `LogoutDone` on the channel when complete.
pub fn request_logout(tx: &Sender<AuthServiceMessage>, runtime: &Handle, client: Arc<AuthClient>) {
    let tx = tx.clone();
    runtime.spawn(async move {
        let result = client.logout().await.map_err(AuthError::from);
        let _ = tx.send(AuthServiceMessage::LogoutDone(result));
    });
}
