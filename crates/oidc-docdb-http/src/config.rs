//! Connection settings for the CouchDB HTTP backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// CouchDB server connection configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [couchdb]
/// url = "http://couch.internal:5984/"
/// username = "admin"
/// password = "secret"
/// request_timeout = "30s"
/// create_database = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpDatabaseConfig {
    /// Base URL of the CouchDB server.
    pub url: String,

    /// Basic-auth user name.
    pub username: Option<String>,

    /// Basic-auth password.
    pub password: Option<String>,

    /// Per-request timeout (default: 30 seconds).
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Create the database on connect when it does not exist.
    pub create_database: bool,
}

impl Default for HttpDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984/".to_string(),
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            create_database: false,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpDatabaseConfig {
    /// Creates a configuration pointing at `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets basic-auth credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Creates the database on connect when missing.
    #[must_use]
    pub fn with_create_database(mut self, create: bool) -> Self {
        self.create_database = create;
        self
    }

    /// Validates the configuration and returns the parsed server URL.
    ///
    /// # Errors
    ///
    /// Returns `HttpConfigError::InvalidValue` if:
    /// - The URL does not parse or is not `http`/`https`
    /// - A password is set without a user name
    /// - The request timeout is zero
    pub fn validate(&self) -> Result<Url, HttpConfigError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| HttpConfigError::InvalidValue(format!("url '{}': {e}", self.url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpConfigError::InvalidValue(format!(
                "url scheme must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(HttpConfigError::InvalidValue(
                "password requires a username".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(HttpConfigError::InvalidValue(
                "request_timeout must be > 0".to_string(),
            ));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HttpDatabaseConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.create_database);
        assert_eq!(config.validate().unwrap().as_str(), "http://localhost:5984/");
    }

    #[test]
    fn test_deserialize_humantime() {
        let config: HttpDatabaseConfig = toml::from_str(
            r#"
            url = "https://couch.example.com/prefix"
            username = "admin"
            password = "secret"
            request_timeout = "2m"
            "#,
        )
        .unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(
            config.validate().unwrap().as_str(),
            "https://couch.example.com/prefix/"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = HttpDatabaseConfig::new("ftp://couch").validate().unwrap_err();
        assert!(matches!(err, HttpConfigError::InvalidValue(_)));

        let err = HttpDatabaseConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, HttpConfigError::InvalidValue(_)));

        let mut config = HttpDatabaseConfig::default();
        config.password = Some("secret".into());
        assert!(config.validate().is_err());

        let config = HttpDatabaseConfig::default().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
