use super::Config;
use crate::error::{ConfigError, Result};
use directories::UserDirs;
use std::fs;
use std::path::Path;

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .ok_or_else(|| ConfigError::Load("could not find home directory".into()))?;
        let pagegate_dir = home.join(".pagegate");
        let config_path = pagegate_dir.join("config.toml");

        if !pagegate_dir.exists() {
            fs::create_dir_all(&pagegate_dir).map_err(ConfigError::Io)?;
        }

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let mut config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let mut config: Config = toml::from_str(&contents).map_err(|error| {
            ConfigError::Load(format!("failed to parse {}: {error}", path.display()))
        })?;
        config.config_path = path.to_path_buf();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|error| ConfigError::Load(format!("failed to serialize config: {error}")))?;
        fs::write(&self.config_path, toml_str).map_err(ConfigError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;
    use tempfile::TempDir;

    #[test]
    fn load_from_reads_sections() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[sync]
debounce_ms = 500
max_auto_retries = 1

[rpc]
base_url = "https://api.example.com"
timeout_secs = 5
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.config_path, path);
        assert_eq!(config.sync.max_auto_retries, 1);
        assert_eq!(config.rpc.timeout_secs, 5);
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[rpc]\ntimeout_secs = 0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, GateError::Config(ConfigError::Validation(_))));
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config {
            config_path: tmp.path().join("config.toml"),
            ..Config::default()
        };
        config.sync.notice_dedupe_ms = 1_500;
        config.save().unwrap();

        let loaded = Config::load_from(&config.config_path).unwrap();
        assert_eq!(loaded.sync.notice_dedupe_ms, 1_500);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, GateError::Config(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_toml_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[sync\ndebounce_ms = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, GateError::Config(ConfigError::Load(_))));
        assert!(err.to_string().contains("config.toml"));
    }
}
