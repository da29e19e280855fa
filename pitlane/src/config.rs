use gateway::config::{Config as GatewayConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

const DEFAULT_METRICS_PREFIX: &str = "pitlane";

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub sentry_dsn: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(flatten)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Loads the file, applies environment overrides from `lookup` and
    /// validates the result.
    pub fn load<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_file(path)?;
        config.gateway.apply_overrides(lookup)?;
        config.gateway.validate()?;
        Ok(config)
    }
}

fn default_metrics_prefix() -> String {
    DEFAULT_METRICS_PREFIX.to_string()
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    const YAML: &str = r#"
            listener:
                host: 0.0.0.0
                port: 3000
            admin_listener:
                host: 127.0.0.1
                port: 3001
            cms:
                url: https://cms.example.com
            tenant:
                default_slug: mra
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                environment: staging
            "#;

    #[test]
    fn pitlane_config() {
        let tmp = write_tmp_file(YAML);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(metrics.prefix, "pitlane");
        assert_eq!(config.logging.unwrap().sentry_dsn, None);
        assert_eq!(config.gateway.listener.port, 3000);
        assert_eq!(config.gateway.tenant.default_slug.as_deref(), Some("mra"));
        assert!(!config.gateway.cms.is_configured());
    }

    #[test]
    fn env_overrides_apply_before_validation() {
        let tmp = write_tmp_file(YAML);
        let config = Config::load(tmp.path(), |name| match name {
            "CMS_API_TOKEN" => Some("token".into()),
            "SITE_SLUG" => Some("hrc".into()),
            _ => None,
        })
        .expect("load config");

        assert!(config.gateway.cms.is_configured());
        assert_eq!(config.gateway.tenant.default_slug.as_deref(), Some("hrc"));

        let err = Config::load(tmp.path(), |name| {
            (name == "CMS_URL").then(|| "::not a url::".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_and_bad_yaml() {
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/pitlane.yaml")),
            Err(ConfigError::LoadError(_))
        ));

        let tmp = write_tmp_file("listener: [");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
