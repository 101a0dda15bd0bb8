//! read session configuration from a file, the environment, or explicit values

use std::time::Duration;

use crate::errors::Error;

const DEFAULT_LOGOUT_PATH: &str = "/logout";
const DEFAULT_LOGIN_PATH: &str = "/auth";
const DEFAULT_FALLBACK_TTL_SECS: u64 = 2 * 60 * 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    /// Base URL of the admin REST backend.
    pub base_url: String,
    /// Path of the remote session-invalidation endpoint.
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// Path the host application is routed to after logout.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// TTL assumed when a token carries no decodable expiry claim.
    #[serde(default = "default_fallback_ttl_secs")]
    pub fallback_ttl_secs: u64,
    /// Deadline for the best-effort invalidation call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_values(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            fallback_ttl_secs: DEFAULT_FALLBACK_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid config file '{}': {}", path, e)))?;
        config.validate()
    }

    /// # ENV Vars
    /// * `TRYGG_API_BASE_URL` - Base URL of the admin REST backend
    /// * `TRYGG_LOGOUT_PATH` - Optional override for the invalidation path
    /// * `TRYGG_LOGIN_PATH` - Optional override for the post-logout route
    pub fn from_env() -> Result<Self, Error> {
        let base_url = std::env::var("TRYGG_API_BASE_URL")
            .map_err(|_| Error::Config("Missing TRYGG_API_BASE_URL env var".to_string()))?;
        let mut config = Self::from_values(&base_url);
        if let Ok(path) = std::env::var("TRYGG_LOGOUT_PATH") {
            config.logout_path = path;
        }
        if let Ok(path) = std::env::var("TRYGG_LOGIN_PATH") {
            config.login_path = path;
        }
        config.validate()
    }

    pub(crate) fn validate(self) -> Result<Self, Error> {
        let base = if self.base_url.starts_with("http") {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };
        let _ = reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        Ok(Self {
            base_url: base,
            ..self
        })
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL of the invalidation endpoint.
    pub fn logout_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.logout_path
        )
    }
}

fn default_logout_path() -> String {
    DEFAULT_LOGOUT_PATH.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_fallback_ttl_secs() -> u64 {
    DEFAULT_FALLBACK_TTL_SECS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
