use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_SEARCH_BUDGET: u64 = 200_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Knobs for the constrained search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum placement steps before the depth-first search gives up.
    pub search_budget: u64,
    /// Solve an exact 0/1 model when the budget runs out.
    pub exact_fallback: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            search_budget: DEFAULT_SEARCH_BUDGET,
            exact_fallback: true,
        }
    }
}

/// Process configuration, read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
    pub engine: EngineSettings,
    pub generation_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("SEATING_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| ConfigError {
            key: "SEATING_BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let log_filter = lookup("SEATING_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let search_budget = match lookup("SEATING_SEARCH_BUDGET") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => return Err(invalid("SEATING_SEARCH_BUDGET", raw, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(invalid("SEATING_SEARCH_BUDGET", raw, e)),
            },
            None => DEFAULT_SEARCH_BUDGET,
        };

        let exact_fallback = match lookup("SEATING_EXACT_FALLBACK") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("SEATING_EXACT_FALLBACK", raw, "expected true or false")),
            },
            None => true,
        };

        let generation_timeout = match lookup("SEATING_GENERATION_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(e) => return Err(invalid("SEATING_GENERATION_TIMEOUT_MS", raw, e)),
            },
            None => None,
        };

        Ok(Self {
            bind_addr,
            log_filter,
            engine: EngineSettings {
                search_budget,
                exact_fallback,
            },
            generation_timeout,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            engine: EngineSettings::default(),
            generation_timeout: None,
        }
    }
}

fn invalid(key: &'static str, value: String, reason: impl ToString) -> ConfigError {
    ConfigError {
        key,
        value,
        reason: reason.to_string(),
    }
}
