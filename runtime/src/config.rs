//! Configuration for the fetch middleware and its transport

use thiserror::Error;

/// Environment variable holding the base URL for relative request URLs
pub const BASE_URL_ENV: &str = "FETCH_BASE_URL";

/// Environment variable overriding the transport's user agent
pub const USER_AGENT_ENV: &str = "FETCH_USER_AGENT";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("fetch-middleware/", env!("CARGO_PKG_VERSION"));

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable is set but not valid unicode
    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Settings shared by the middleware and the transport
///
/// # Example
///
/// ```ignore
/// let config = FetchConfig::default()
///     .with_base_url("https://api.example.com")
///     .with_user_agent("my-app/1.0");
///
/// let transport = ReqwestTransport::from_config(&config)?;
/// let middleware = FetchMiddleware::new(transport).with_config(&config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Prefix for request URLs that are not absolute
    pub base_url: String,
    /// User agent of the HTTP client
    pub user_agent: String,
}

impl FetchConfig {
    /// Create a configuration with explicit values
    #[must_use]
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Read the configuration from `FETCH_BASE_URL` and `FETCH_USER_AGENT`
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotUnicode`] if a variable is set to a non-unicode value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = read_env(BASE_URL_ENV)? {
            config.base_url = base_url;
        }
        if let Some(user_agent) = read_env(USER_AGENT_ENV)? {
            config.user_agent = user_agent;
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn read_env(name: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(name)),
    }
}
