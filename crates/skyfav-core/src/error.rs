//! Centralized error types for SkyFav.
//!
//! Every variant carries two texts: the `Display` text written to logs, and
//! the localized `user_message()` shown to the user. Failures are never fatal;
//! callers keep their last-known-good state and surface the message.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Weather error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Favorites error: {0}")]
    Favorites(#[from] FavoritesError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Localized message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Auth(e) => e.user_message(),
            AppError::Validation(e) => e.user_message().to_string(),
            AppError::Geolocation(e) => e.user_message().to_string(),
            AppError::Weather(e) => e.user_message().to_string(),
            AppError::Favorites(e) => e.user_message().to_string(),
            AppError::Io(_) => "فشلت عملية على الملفات. الرجاء المحاولة مرة أخرى.".to_string(),
            AppError::Other(_) => "حدث خطأ غير متوقع. الرجاء المحاولة مرة أخرى.".to_string(),
        }
    }

    /// True if the failure means the session is gone.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Auth(AuthError::NotAuthenticated))
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("TLS/SSL error: {0}")]
    TlsError(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => "تعذر الاتصال. تحقق من اتصالك بالإنترنت.",
            NetworkError::Timeout => "انتهت مهلة الطلب. الرجاء المحاولة مرة أخرى.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "الخادم يواجه مشكلة. الرجاء المحاولة لاحقاً."
            }
            NetworkError::ServerError { .. } => "فشل الطلب. الرجاء المحاولة مرة أخرى.",
            NetworkError::InvalidResponse(_) => "تم استلام استجابة غير متوقعة.",
            NetworkError::TlsError(_) => "فشل الاتصال الآمن. تحقق من إعدادات الشبكة.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "الإعدادات غير صالحة. تحقق من ملف الإعدادات.",
            ConfigError::ParseError(_) => "ملف الإعدادات تالف. تحقق من محتواه.",
        }
    }
}

/// Session errors. `NotAuthenticated` sends the user to login instead of
/// being displayed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Registration failed: {}", .0.as_deref().unwrap_or("no reason given"))]
    RegistrationFailed(Option<String>),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::NotAuthenticated => "الرجاء تسجيل الدخول للمتابعة.".to_string(),
            AuthError::InvalidCredentials => "بيانات الاعتماد غير صحيحة".to_string(),
            AuthError::RegistrationFailed(Some(reason)) => reason.clone(),
            AuthError::RegistrationFailed(None) => {
                "فشل في إنشاء الحساب. الرجاء المحاولة مرة أخرى.".to_string()
            }
        }
    }
}

/// Rejected input. Handled locally, never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("City name is empty")]
    EmptyCityName,

    #[error("City name is unchanged")]
    UnchangedCityName,
}

impl ValidationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyCityName => "الرجاء إدخال اسم المدينة.",
            ValidationError::UnchangedCityName => "لم يتم تغيير اسم المدينة.",
        }
    }
}

/// Device position failures. Each kind has its own message and leads to the
/// manual entry fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported")]
    Unsupported,

    #[error("Permission to read the position was denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for the position")]
    Timeout,

    #[error("Unknown geolocation failure")]
    Unknown,
}

impl GeolocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::Unsupported => "المتصفح لا يدعم تحديد الموقع",
            GeolocationError::PermissionDenied => "تم رفض الإذن بالوصول إلى الموقع",
            GeolocationError::PositionUnavailable => "معلومات الموقع غير متاحة",
            GeolocationError::Timeout => "انتهت المهلة في انتظار الموقع",
            GeolocationError::Unknown => "تعذر الحصول على الموقع الحالي",
        }
    }
}

/// Weather retrieval errors.
#[derive(Debug, Clone, Error)]
pub enum WeatherError {
    /// Fetch failed for a city parameter or device position.
    #[error("Weather fetch failed: {0}")]
    FetchFailed(String),

    /// Fetch failed for a name the user typed.
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("No location to fetch weather for")]
    Unresolved,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::FetchFailed(_) | WeatherError::Unresolved => "فشل في جلب بيانات الطقس",
            WeatherError::CityNotFound(_) => "فشل في العثور على المدينة",
        }
    }
}

/// Favorites list errors, one per operation.
#[derive(Debug, Clone, Error)]
pub enum FavoritesError {
    #[error("Failed to load favorites: {0}")]
    LoadFailed(String),

    #[error("Failed to add favorite: {0}")]
    AddFailed(String),

    #[error("Failed to rename favorite: {0}")]
    UpdateFailed(String),

    #[error("Failed to delete favorite: {0}")]
    DeleteFailed(String),

    #[error("Failed to star city: {0}")]
    StarAddFailed(String),

    #[error("Failed to unstar city: {0}")]
    StarRemoveFailed(String),
}

impl FavoritesError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FavoritesError::LoadFailed(_) => "فشل في جلب المدن المفضلة",
            FavoritesError::AddFailed(_) => "فشل في إضافة المدينة المفضلة",
            FavoritesError::UpdateFailed(_) => "فشل في تحديث المدينة المفضلة",
            FavoritesError::DeleteFailed(_) => "فشل في حذف المدينة.",
            FavoritesError::StarAddFailed(_) => "فشل في إضافة المدينة إلى المفضلة",
            FavoritesError::StarRemoveFailed(_) => "فشل في إزالة المدينة من المفضلة",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
