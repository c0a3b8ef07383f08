use crate::core::series::LookbackPeriod;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173/oakie";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpSourceConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LocalSourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct SourceConfig {
    pub http: Option<HttpSourceConfig>,
    pub local: Option<LocalSourceConfig>,
}

/// Where company data is read from once the config is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Http(String),
    Local(PathBuf),
}

impl SourceConfig {
    /// A local directory takes precedence over an HTTP base URL.
    pub fn resolve(&self) -> DataSource {
        match (&self.local, &self.http) {
            (Some(local), _) => DataSource::Local(local.path.clone()),
            (None, Some(http)) => DataSource::Http(http.base_url.trim_end_matches('/').to_string()),
            (None, None) => DataSource::Http(DEFAULT_BASE_URL.to_string()),
        }
    }
}

fn default_lookback() -> LookbackPeriod {
    LookbackPeriod::OneYear
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    /// Lookback used by `analysis` when no period is given.
    #[serde(default = "default_lookback")]
    pub lookback: LookbackPeriod,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceConfig::default(),
            lookback: default_lookback(),
        }
    }
}

impl AppConfig {
    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "oakie", "oakie")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!(source = ?config.source.resolve(), lookback = %config.lookback, "Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
source:
  http:
    base_url: "https://example.com/oakie/"
lookback: YTD
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.lookback, LookbackPeriod::YearToDate);
        assert_eq!(
            config.source.resolve(),
            DataSource::Http("https://example.com/oakie".to_string())
        );
    }

    #[test]
    fn test_local_source_wins() {
        let yaml_str = r#"
source:
  http:
    base_url: "https://example.com"
  local:
    path: "/srv/oakie/public"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.lookback, LookbackPeriod::OneYear);
        assert_eq!(
            config.source.resolve(),
            DataSource::Local(PathBuf::from("/srv/oakie/public"))
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(
            config.source.resolve(),
            DataSource::Http(DEFAULT_BASE_URL.to_string())
        );
    }

    #[test]
    fn test_invalid_lookback_is_rejected() {
        assert!(serde_yaml::from_str::<AppConfig>("lookback: 7Y").is_err());
    }

    #[test]
    fn test_load_from_path_reports_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let missing = temp_dir.path().join("missing.yaml");
        let err = AppConfig::load_from_path(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));

        let present = temp_dir.path().join("config.yaml");
        fs::write(&present, "lookback: 3M\n")?;
        let config = AppConfig::load_from_path(&present)?;
        assert_eq!(config.lookback, LookbackPeriod::ThreeMonths);
        Ok(())
    }
}
