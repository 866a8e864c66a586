//! # Service Configuration
//!
//! Layered configuration for the Dataset ID API, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file named by `DATASET_API_CONFIG`
//! 3. Environment variables
//!
//! ## Environment Variables
//! - `DATASET_API_HOST`: Bind host (default: "0.0.0.0")
//! - `DATASET_API_PORT`: Bind port (default: 8000)
//! - `DATASET_API_UPSTREAM_URL`: Upstream base URL
//! - `DATASET_API_CATALOG_PATH`: Catalog path (default: "/api/core/dataset/pageList")
//! - `DATASET_API_TIMEOUT_SECONDS`: Per-request upstream timeout (default: 10)
//! - `DATASET_API_FAN_OUT`: Max in-flight level-2/level-3 requests (default: 1)
//! - `DATASET_API_STATUS_MODE`: `envelope` or `rest` (default: envelope)
//! - `DATASET_API_TOKEN`: Inline session token
//! - `DATASET_API_TOKEN_FILE`: Path of a file holding the session token
//! - `DATASET_API_TOKEN_COOKIE`: Cookie name carrying the token (default: "isoftstone_token")
//!
//! ## Token Rotation
//! A token file takes precedence over an inline token and is re-read at the
//! start of every aggregation run. Rewriting the file rotates the credential
//! without restarting the service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::{ApiError, Result};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "DATASET_API_CONFIG";

/// How domain status codes surface on the HTTP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusMode {
    /// Always answer 200; the domain code lives only in the body.
    #[default]
    Envelope,
    /// Mirror the domain code onto the transport status.
    Rest,
}

impl FromStr for StatusMode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "envelope" => Ok(Self::Envelope),
            "rest" => Ok(Self::Rest),
            other => Err(ApiError::Configuration(format!(
                "unknown status mode '{other}', expected 'envelope' or 'rest'"
            ))),
        }
    }
}

/// Upstream catalog connection settings.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme, host and port of the catalog service.
    #[validate(custom(function = "validate_base_url"))]
    pub base_url: String,
    /// Path of the single catalog endpoint, appended to `base_url`.
    #[validate(length(min = 1))]
    pub catalog_path: String,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1, max = 3600))]
    pub timeout_seconds: u64,
    /// Inline session token.
    pub token: Option<String>,
    /// File holding the session token; wins over `token`.
    pub token_file: Option<PathBuf>,
    /// Cookie name the token is sent under.
    #[validate(length(min = 1))]
    pub token_cookie: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:32669".to_string(),
            catalog_path: "/api/core/dataset/pageList".to_string(),
            timeout_seconds: 10,
            token: None,
            token_file: None,
            token_cookie: "isoftstone_token".to_string(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("catalog_path", &self.catalog_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("token_file", &self.token_file)
            .field("token_cookie", &self.token_cookie)
            .finish()
    }
}

impl UpstreamConfig {
    /// Full catalog URL: base URL joined with the catalog path.
    pub fn catalog_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.catalog_path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns the current session token.
    ///
    /// The token file is read on every call so a rewritten file takes effect
    /// on the next aggregation run. Surrounding whitespace is stripped and a
    /// blank token counts as no token.
    pub async fn resolve_token(&self) -> std::io::Result<Option<String>> {
        let raw = match &self.token_file {
            Some(path) => Some(tokio::fs::read_to_string(path).await?),
            None => self.token.clone(),
        };

        Ok(raw
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

/// Configuration for the Dataset ID API server.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServiceConfig {
    /// Host to bind the server to.
    #[validate(length(min = 1))]
    pub host: String,
    /// Port to bind the server to.
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    /// Upstream catalog settings.
    #[validate(nested)]
    pub upstream: UpstreamConfig,
    /// Max upstream requests in flight per level; 1 walks sequentially.
    #[validate(range(min = 1, max = 64))]
    pub fan_out: usize,
    /// Transport status behavior for the aggregation endpoint.
    pub status_mode: StatusMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            upstream: UpstreamConfig::default(),
            fan_out: 1,
            status_mode: StatusMode::Envelope,
        }
    }
}

impl ServiceConfig {
    /// Loads defaults, then the optional config file, then environment
    /// overrides, and validates the result.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.ensure_valid()?;

        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Parses a TOML config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ApiError::Configuration(format!("invalid TOML config: {e}")))
    }

    /// Applies `DATASET_API_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DATASET_API_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("DATASET_API_PORT") {
            self.port = parse_value("DATASET_API_PORT", &port)?;
        }
        if let Some(url) = lookup("DATASET_API_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }
        if let Some(path) = lookup("DATASET_API_CATALOG_PATH") {
            self.upstream.catalog_path = path;
        }
        if let Some(timeout) = lookup("DATASET_API_TIMEOUT_SECONDS") {
            self.upstream.timeout_seconds = parse_value("DATASET_API_TIMEOUT_SECONDS", &timeout)?;
        }
        if let Some(fan_out) = lookup("DATASET_API_FAN_OUT") {
            self.fan_out = parse_value("DATASET_API_FAN_OUT", &fan_out)?;
        }
        if let Some(mode) = lookup("DATASET_API_STATUS_MODE") {
            self.status_mode = mode.parse()?;
        }
        if let Some(token) = lookup("DATASET_API_TOKEN") {
            self.upstream.token = Some(token);
        }
        if let Some(file) = lookup("DATASET_API_TOKEN_FILE") {
            self.upstream.token_file = Some(PathBuf::from(file));
        }
        if let Some(cookie) = lookup("DATASET_API_TOKEN_COOKIE") {
            self.upstream.token_cookie = cookie;
        }
        Ok(())
    }

    /// Runs the field validators and folds any failures into one
    /// configuration error.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate()
            .map_err(|e| ApiError::Configuration(format!("invalid configuration: {e}")))
    }

    /// Creates a builder for configuration.
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

fn validate_base_url(value: &str) -> std::result::Result<(), ValidationError> {
    match reqwest::Url::parse(value) {
        Ok(url) if url.has_host() => Ok(()),
        _ => Err(ValidationError::new("Invalid upstream base URL")),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ApiError::Configuration(format!("{key}: cannot parse '{value}': {e}")))
}

/// Builder for `ServiceConfig`.
#[derive(Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the upstream base URL.
    #[must_use]
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.config.upstream.base_url = url.into();
        self
    }

    #[must_use]
    pub fn catalog_path(mut self, path: impl Into<String>) -> Self {
        self.config.upstream.catalog_path = path.into();
        self
    }

    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.upstream.timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.upstream.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.upstream.token_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn token_cookie(mut self, name: impl Into<String>) -> Self {
        self.config.upstream.token_cookie = name.into();
        self
    }

    #[must_use]
    pub fn fan_out(mut self, fan_out: usize) -> Self {
        self.config.fan_out = fan_out;
        self
    }

    #[must_use]
    pub fn status_mode(mut self, mode: StatusMode) -> Self {
        self.config.status_mode = mode;
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.ensure_valid()?;
        Ok(self.config)
    }
}
