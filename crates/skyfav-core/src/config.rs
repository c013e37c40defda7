use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const APP_DIR: &str = "skyfav";
const ENV_PREFIX: &str = "SKYFAV";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Backend API settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Transient notice settings
    #[serde(default)]
    pub notices: NoticeConfig,

    /// Device position used by the command line geolocator
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the API, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Allow invalid/self-signed certificates (DEVELOPMENT ONLY)
    ///
    /// Only takes effect in debug builds.
    #[serde(default)]
    pub allow_invalid_certs: bool,
}

fn default_base_url() -> String {
    "https://weatherappgrouph.onrender.com/api".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
            allow_invalid_certs: false,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// How long a success notice stays visible
    #[serde(default = "default_notice_ms")]
    pub duration_ms: u64,
}

fn default_notice_ms() -> u64 {
    3000
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_notice_ms(),
        }
    }
}

impl NoticeConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl LocationConfig {
    /// Configured position, if both coordinates are set.
    pub fn fixed_position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            backend: BackendConfig::default(),
            notices: NoticeConfig::default(),
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, then apply `SKYFAV_*` environment
    /// overrides (`SKYFAV_BACKEND__BASE_URL`, `SKYFAV_NOTICES__DURATION_MS`, ...).
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse config file")?;

        tracing::debug!(base_url = %config.backend.base_url, "Loaded config");
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: Option<&Path>) -> Result<(Self, ValidationResult)> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.backend.base_url, "backend.base_url", &mut result);

        if self.backend.request_timeout_secs == Some(0) {
            result.add_error(
                "backend.request_timeout_secs",
                "Timeout must be greater than 0 (leave unset for no timeout)",
            );
        }

        if self.backend.allow_invalid_certs {
            result.add_warning(
                "backend.allow_invalid_certs",
                "Certificate validation is disabled (debug builds only)",
            );
        }

        if self.notices.duration_ms == 0 {
            result.add_error("notices.duration_ms", "Notice duration must be greater than 0");
        } else if self.notices.duration_ms > 60_000 {
            result.add_warning("notices.duration_ms", "Notice duration is more than a minute");
        }

        if let Some(lat) = self.location.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                result.add_error("location.latitude", "Latitude must be within -90..=90");
            }
        }
        if let Some(lon) = self.location.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                result.add_error("location.longitude", "Longitude must be within -180..=180");
            }
        }
        if self.location.latitude.is_some() != self.location.longitude.is_some() {
            result.add_warning(
                "location",
                "Only one coordinate is set; geolocation is disabled",
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }
}
