//! Runtime configuration, read once at startup from env vars.
//! - HEADEND_HTTP_ADDR: bind address (default 0.0.0.0:3001).
//! - PLANTS_PATH: seed file with plants, panels and alerts (optional).
//! - DASHBOARD_REFRESH_SECS: dashboard auto-refresh, clamped to 10..=300 (default 60).
//! - HISTORY_DEFAULT_DAYS: history window when no range is given, 1..=3660 (default 7).
//! - SIM_SEED: fixed RNG seed for reproducible demos (optional).
//! - ANTHROPIC_API_KEY / ASSISTANT_MODEL / ASSISTANT_API_URL: assistant backend.

use std::{net::SocketAddr, path::PathBuf};

pub const MIN_REFRESH_SECS: u64 = 10;
pub const MAX_REFRESH_SECS: u64 = 300;
const DEFAULT_REFRESH_SECS: u64 = 60;
const DEFAULT_HISTORY_DAYS: i64 = 7;
/// Longest history span served in one request, also the cap on HISTORY_DEFAULT_DAYS.
pub const MAX_HISTORY_DAYS: i64 = 3660;
const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_ASSISTANT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_ASSISTANT_URL: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct HeadendConfig {
    pub http_addr: SocketAddr,
    pub plants_path: Option<PathBuf>,
    pub refresh_secs: u64,
    pub history_default_days: i64,
    pub sim_seed: Option<u64>,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// `None` disables the assistant endpoints.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

impl Default for HeadendConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3001))),
            plants_path: None,
            refresh_secs: DEFAULT_REFRESH_SECS,
            history_default_days: DEFAULT_HISTORY_DAYS,
            sim_seed: None,
            assistant: AssistantConfig {
                api_key: None,
                model: DEFAULT_ASSISTANT_MODEL.to_string(),
                api_url: DEFAULT_ASSISTANT_URL.to_string(),
            },
        }
    }
}

impl HeadendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_addr = match read("HEADEND_HTTP_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("HEADEND_HTTP_ADDR", raw))?,
            None => HeadendConfig::default().http_addr,
        };
        let refresh_secs = match read("DASHBOARD_REFRESH_SECS") {
            Some(raw) => clamp_refresh(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid("DASHBOARD_REFRESH_SECS", raw))?,
            ),
            None => DEFAULT_REFRESH_SECS,
        };
        let history_default_days = match read("HISTORY_DEFAULT_DAYS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(days) if (1..=MAX_HISTORY_DAYS).contains(&days) => days,
                _ => return Err(ConfigError::Invalid("HISTORY_DEFAULT_DAYS", raw)),
            },
            None => DEFAULT_HISTORY_DAYS,
        };
        let sim_seed = match read("SIM_SEED") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::Invalid("SIM_SEED", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            http_addr,
            plants_path: read("PLANTS_PATH").map(PathBuf::from),
            refresh_secs,
            history_default_days,
            sim_seed,
            assistant: AssistantConfig {
                api_key: read("ANTHROPIC_API_KEY"),
                model: read("ASSISTANT_MODEL")
                    .unwrap_or_else(|| DEFAULT_ASSISTANT_MODEL.to_string()),
                api_url: read("ASSISTANT_API_URL")
                    .unwrap_or_else(|| DEFAULT_ASSISTANT_URL.to_string()),
            },
        })
    }
}

/// The dashboard slider only offers 10..=300 seconds.
pub fn clamp_refresh(secs: u64) -> u64 {
    secs.clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<HeadendConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        HeadendConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.http_addr.port(), 3001);
        assert_eq!(cfg.refresh_secs, 60);
        assert_eq!(cfg.history_default_days, 7);
        assert!(cfg.sim_seed.is_none());
        assert!(cfg.plants_path.is_none());
        assert!(cfg.assistant.api_key.is_none());
        assert_eq!(cfg.assistant.model, DEFAULT_ASSISTANT_MODEL);
    }

    #[test]
    fn refresh_interval_is_clamped() {
        assert_eq!(from_pairs(&[("DASHBOARD_REFRESH_SECS", "1")]).unwrap().refresh_secs, 10);
        assert_eq!(from_pairs(&[("DASHBOARD_REFRESH_SECS", "9000")]).unwrap().refresh_secs, 300);
        assert_eq!(from_pairs(&[("DASHBOARD_REFRESH_SECS", "120")]).unwrap().refresh_secs, 120);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = from_pairs(&[("HEADEND_HTTP_ADDR", "not an addr")]).unwrap_err();
        assert!(err.to_string().contains("HEADEND_HTTP_ADDR"));
        assert!(from_pairs(&[("SIM_SEED", "abc")]).is_err());
        assert!(from_pairs(&[("HISTORY_DEFAULT_DAYS", "0")]).is_err());
        assert!(from_pairs(&[("HISTORY_DEFAULT_DAYS", "200000000")]).is_err());
        assert_eq!(
            from_pairs(&[("HISTORY_DEFAULT_DAYS", "3660")]).unwrap().history_default_days,
            MAX_HISTORY_DAYS
        );
        assert!(from_pairs(&[("DASHBOARD_REFRESH_SECS", "-5")]).is_err());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = from_pairs(&[("ANTHROPIC_API_KEY", "  "), ("PLANTS_PATH", "")]).unwrap();
        assert!(cfg.assistant.api_key.is_none());
        assert!(cfg.plants_path.is_none());
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = from_pairs(&[
            ("HEADEND_HTTP_ADDR", "127.0.0.1:8080"),
            ("PLANTS_PATH", "/etc/solar/plants.yaml"),
            ("SIM_SEED", "42"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("ASSISTANT_MODEL", "custom-model"),
        ])
        .unwrap();
        assert_eq!(cfg.http_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(cfg.plants_path, Some(PathBuf::from("/etc/solar/plants.yaml")));
        assert_eq!(cfg.sim_seed, Some(42));
        assert_eq!(cfg.assistant.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.assistant.model, "custom-model");
    }
}
