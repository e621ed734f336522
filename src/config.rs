//! Config file discovery and flag-dependent validation.
//!
//! Searched, in order, in the current directory, `/etc/s3lurk/`, and
//! `$HOME/.s3lurk/`; the first `config.yml` found wins. No config file is
//! required at all unless a flag that needs one is set (`-provider custom`,
//! `-db`, `-mq`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::provider::custom::CustomProviderConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub db: Option<DbConfig>,
    pub mq: Option<MqConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub custom: Option<CustomProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqConfig {
    pub uri: String,
    pub queue_name: String,
}

impl Config {
    /// Search paths, in priority order, for `config.yml`.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.yml")];
        paths.push(PathBuf::from("/etc/s3lurk/config.yml"));
        if let Some(home) = dirs_next::home_dir() {
            paths.push(home.join(".s3lurk").join("config.yml"));
        }
        paths
    }

    fn find() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|p| p.exists())
    }

    /// Loads the first `config.yml` found on the search path. Returns an
    /// empty default config if none exists — a missing file is only an
    /// error once a flag that requires a key tries to read it (see
    /// [`Config::validate`]).
    pub fn load() -> Result<Self> {
        match Self::find() {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Fails fast with a fatal startup error if a flag-required key is
    /// missing, matching the Go source's `validateConfig`.
    pub fn validate(&self, provider: &str, needs_db: bool, needs_mq: bool) -> Result<()> {
        if provider == "custom" && self.providers.custom.is_none() {
            return Err(ScanError::Config(
                "provider 'custom' requires a providers.custom section in config.yml".to_string(),
            ));
        }
        if needs_db {
            match &self.db {
                Some(db) if !db.uri.is_empty() => {}
                _ => return Err(ScanError::Config("-db requires db.uri in config.yml".to_string())),
            }
        }
        if needs_mq {
            match &self.mq {
                Some(mq) if !mq.uri.is_empty() && !mq.queue_name.is_empty() => {}
                _ => return Err(ScanError::Config("-mq requires mq.uri and mq.queue_name in config.yml".to_string())),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_provider_without_section_is_rejected() {
        let cfg = Config::default();
        let err = cfg.validate("custom", false, false).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn aws_provider_needs_no_config_section() {
        let cfg = Config::default();
        assert!(cfg.validate("aws", false, false).is_ok());
    }

    #[test]
    fn db_flag_requires_uri() {
        let cfg = Config::default();
        assert!(cfg.validate("aws", true, false).is_err());

        let cfg = Config {
            db: Some(DbConfig { uri: "postgres://localhost/s3lurk".to_string() }),
            ..Default::default()
        };
        assert!(cfg.validate("aws", true, false).is_ok());
    }

    #[test]
    fn mq_flag_requires_uri_and_queue_name() {
        let cfg = Config {
            mq: Some(MqConfig { uri: "amqp://localhost".to_string(), queue_name: String::new() }),
            ..Default::default()
        };
        assert!(cfg.validate("aws", false, true).is_err());
    }
}
