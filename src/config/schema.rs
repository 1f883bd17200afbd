use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const MAX_DEBOUNCE_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Debounce and retry tuning for the override sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Window in which a second "saved" notice is suppressed.
    #[serde(default = "default_notice_dedupe_ms")]
    pub notice_dedupe_ms: u64,
    /// Consecutive automatic retries after a failure with nothing to roll back to.
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn notice_dedupe(&self) -> Duration {
        Duration::from_millis(self.notice_dedupe_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            notice_dedupe_ms: default_notice_dedupe_ms(),
            max_auto_retries: default_max_auto_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    350
}

fn default_notice_dedupe_ms() -> u64 {
    3_000
}

fn default_max_auto_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    350
}

/// Where the override mutation endpoints live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_overrides_path")]
    pub user_overrides_path: String,
    #[serde(default = "default_team_overrides_path")]
    pub team_overrides_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_overrides_path: default_user_overrides_path(),
            team_overrides_path: default_team_overrides_path(),
            timeout_secs: default_timeout_secs(),
            api_token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:54321".into()
}

fn default_user_overrides_path() -> String {
    "/admin/users/overrides".into()
}

fn default_team_overrides_path() -> String {
    "/admin/teams/overrides".into()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "sync.debounce_ms must be at most {MAX_DEBOUNCE_MS}"
            )));
        }
        if self.rpc.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "rpc.timeout_secs must be greater than zero".into(),
            ));
        }
        Url::parse(&self.rpc.base_url).map_err(|error| {
            ConfigError::Validation(format!("rpc.base_url is not a valid URL: {error}"))
        })?;
        for (field, path) in [
            ("rpc.user_overrides_path", &self.rpc.user_overrides_path),
            ("rpc.team_overrides_path", &self.rpc.team_overrides_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{field} must start with '/'"
                )));
            }
        }
        if self.log.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "log.level '{}' is not a tracing level",
                self.log.level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_timing() {
        let config = Config::default();
        assert_eq!(config.sync.debounce(), Duration::from_millis(350));
        assert_eq!(config.sync.notice_dedupe(), Duration::from_secs(3));
        assert_eq!(config.sync.max_auto_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
[sync]
debounce_ms = 100

[rpc]
base_url = "https://api.example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.sync.debounce_ms, 100);
        assert_eq!(config.sync.retry_delay_ms, 350);
        assert_eq!(config.rpc.team_overrides_path, "/admin/teams/overrides");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn validate_rejects_long_debounce() {
        let mut config = Config::default();
        config.sync.debounce_ms = 120_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn validate_rejects_bad_url_and_paths() {
        let mut config = Config::default();
        config.rpc.base_url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rpc.user_overrides_path = "admin/users".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rpc.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.log.level = "chatty".into();
        assert!(config.validate().is_err());
    }
}
