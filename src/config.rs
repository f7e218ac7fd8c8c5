use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    /// Base URL of the content backend, e.g. `http://127.0.0.1:8000/api`.
    pub backend_url: String,
    /// Bearer token sent with every backend request.
    pub backend_token: Option<String>,
    /// How long a finished import keeps its dialog open before it may be closed.
    pub close_delay: Duration,
    pub request_timeout: Duration,
}

pub const DEFAULT_CLOSE_DELAY_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7070,
            database_path: PathBuf::from("data/basecamp.db"),
            backend_url: "http://127.0.0.1:8000/api".into(),
            backend_token: None,
            close_delay: Duration::from_millis(DEFAULT_CLOSE_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Unparseable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("BASECAMP_HOST").unwrap_or(defaults.host),
            port: lookup("BASECAMP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_path: lookup("BASECAMP_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or(defaults.database_path),
            backend_url: lookup("BASECAMP_BACKEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            backend_token: lookup("BASECAMP_BACKEND_TOKEN").filter(|t| !t.is_empty()),
            close_delay: lookup("BASECAMP_CLOSE_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.close_delay),
            request_timeout: lookup("BASECAMP_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
