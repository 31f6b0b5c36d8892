//! Client configuration.
//!
//! Defaults mirror the production dashboards. Values can be overridden from
//! `MEMORAID_*` environment variables or loaded from a JSON file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "memoraid_client=info,memoraid_core=info"
}

/// Which dashboard a scheduler or listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Patient,
    Caregiver,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub patient_refresh_secs: u64,
    pub caregiver_refresh_secs: u64,
    pub clock_tick_secs: u64,
    pub patient_toast_secs: u64,
    pub caregiver_toast_secs: u64,
    pub sos_location_timeout_secs: u64,
    pub sos_sent_window_secs: u64,
    pub log_filter: String,
    pub session_db_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
            patient_refresh_secs: 10,
            caregiver_refresh_secs: 30,
            clock_tick_secs: 10,
            patient_toast_secs: 10,
            caregiver_toast_secs: 8,
            sos_location_timeout_secs: 10,
            sos_sent_window_secs: 10,
            log_filter: default_log_filter().to_string(),
            session_db_path: PathBuf::from("memoraid-session.db"),
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `MEMORAID_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MEMORAID_API_URL") {
            config.api_base_url = url;
        }
        if let Some(filter) = lookup("MEMORAID_LOG") {
            config.log_filter = filter;
        }
        if let Some(path) = lookup("MEMORAID_SESSION_DB") {
            config.session_db_path = PathBuf::from(path);
        }

        let seconds = [
            ("MEMORAID_REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs),
            ("MEMORAID_PATIENT_REFRESH_SECS", &mut config.patient_refresh_secs),
            ("MEMORAID_CAREGIVER_REFRESH_SECS", &mut config.caregiver_refresh_secs),
            ("MEMORAID_CLOCK_TICK_SECS", &mut config.clock_tick_secs),
            ("MEMORAID_PATIENT_TOAST_SECS", &mut config.patient_toast_secs),
            ("MEMORAID_CAREGIVER_TOAST_SECS", &mut config.caregiver_toast_secs),
            ("MEMORAID_SOS_LOCATION_TIMEOUT_SECS", &mut config.sos_location_timeout_secs),
            ("MEMORAID_SOS_SENT_WINDOW_SECS", &mut config.sos_sent_window_secs),
        ];
        for (key, slot) in seconds {
            if let Some(value) = lookup(key) {
                *slot = parse_secs(key, &value)?;
            }
        }

        Ok(config)
    }

    /// Every period and timeout must be at least one second.
    pub fn validate(&self) -> ConfigResult<()> {
        let seconds = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("patient_refresh_secs", self.patient_refresh_secs),
            ("caregiver_refresh_secs", self.caregiver_refresh_secs),
            ("clock_tick_secs", self.clock_tick_secs),
            ("patient_toast_secs", self.patient_toast_secs),
            ("caregiver_toast_secs", self.caregiver_toast_secs),
            ("sos_location_timeout_secs", self.sos_location_timeout_secs),
            ("sos_sent_window_secs", self.sos_sent_window_secs),
        ];
        match seconds.into_iter().find(|(_, secs)| *secs == 0) {
            Some((key, secs)) => Err(ConfigError::InvalidValue {
                key,
                value: secs.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Base URL with exactly one trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}/", self.api_base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_period(&self, view: ViewKind) -> Duration {
        match view {
            ViewKind::Patient => Duration::from_secs(self.patient_refresh_secs),
            ViewKind::Caregiver => Duration::from_secs(self.caregiver_refresh_secs),
        }
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.clock_tick_secs)
    }

    pub fn toast_duration(&self, view: ViewKind) -> Duration {
        match view {
            ViewKind::Patient => Duration::from_secs(self.patient_toast_secs),
            ViewKind::Caregiver => Duration::from_secs(self.caregiver_toast_secs),
        }
    }

    pub fn sos_location_timeout(&self) -> Duration {
        Duration::from_secs(self.sos_location_timeout_secs)
    }

    pub fn sos_sent_window(&self) -> Duration {
        Duration::from_secs(self.sos_sent_window_secs)
    }
}

fn parse_secs(key: &'static str, value: &str) -> ConfigResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), "http://localhost:8000/api/");
        assert_eq!(config.refresh_period(ViewKind::Patient), Duration::from_secs(10));
        assert_eq!(config.refresh_period(ViewKind::Caregiver), Duration::from_secs(30));
        assert_eq!(config.toast_duration(ViewKind::Caregiver), Duration::from_secs(8));
        assert_eq!(config.toast_duration(ViewKind::Patient), Duration::from_secs(10));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("MEMORAID_API_URL", "https://care.example.org/api"),
            ("MEMORAID_CAREGIVER_REFRESH_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "https://care.example.org/api/");
        assert_eq!(config.caregiver_refresh_secs, 15);
        assert_eq!(config.patient_refresh_secs, 10);
    }

    #[test]
    fn test_rejects_zero_and_garbage() {
        let err = ClientConfig::from_lookup(lookup(&[("MEMORAID_CLOCK_TICK_SECS", "0")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));

        let err = ClientConfig::from_lookup(lookup(&[("MEMORAID_CLOCK_TICK_SECS", "soon")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_file_keeps_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoraid.json");
        std::fs::write(&path, r#"{"api_base_url": "http://10.0.0.2:8000/api/", "patient_toast_secs": 5}"#)
            .unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.api_base_url, "http://10.0.0.2:8000/api/");
        assert_eq!(config.patient_toast_secs, 5);
        assert_eq!(config.sos_sent_window_secs, 10);
    }

    #[test]
    fn test_from_file_rejects_zero_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memoraid.json");
        std::fs::write(&path, r#"{"patient_refresh_secs": 0}"#).unwrap();

        let err = ClientConfig::from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "patient_refresh_secs", .. }
        ));
    }
}
