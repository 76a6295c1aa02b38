use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::report::OutputFilter;

pub const DEFAULT_MAX_MSG_PER_CONNECTION: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub logger: LoggerConfig,
    pub clouds: Clouds,
    pub email: EmailConfig,
    #[serde(default)]
    pub output_filter: OutputFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub filename: String,
    #[serde(rename = "Formatter", default = "default_line_format")]
    pub formatter: String,
}

fn default_line_format() -> String {
    "%(message)s".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clouds {
    pub openstack: CloudConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub region_name: String,
    #[serde(default = "default_identity_api_version")]
    pub identity_api_version: serde_yaml::Value,
    #[serde(default = "default_interface")]
    pub interface: String,
    pub auth: CloudAuth,
}

fn default_identity_api_version() -> serde_yaml::Value {
    serde_yaml::Value::from(3)
}

fn default_interface() -> String {
    "public".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudAuth {
    pub auth_url: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub project_name: String,
    #[serde(default = "default_domain")]
    pub user_domain_name: String,
    #[serde(default = "default_domain")]
    pub project_domain_name: String,
}

fn default_domain() -> String {
    "Default".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// `host` or `host:port`; implicit TLS, port 465 unless given.
    pub host: String,
    #[serde(rename = "From")]
    pub from: String,
    /// Sends every report to this address instead of the users' own.
    #[serde(rename = "To", default)]
    pub to: Option<String>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default)]
    pub msg_prefix: String,
    #[serde(default)]
    pub msg_infix: String,
    #[serde(default)]
    pub msg_postfix: String,
    #[serde(default)]
    pub max_msg_per_connection: Option<usize>,
}

impl EmailConfig {
    pub fn max_msg_per_connection(&self) -> usize {
        self.max_msg_per_connection
            .unwrap_or(DEFAULT_MAX_MSG_PER_CONNECTION)
    }
}

impl CloudConfig {
    /// Only Keystone v3 is spoken; `3`, `"3"` and `"v3"` are accepted.
    pub fn identity_version(&self) -> Option<u8> {
        match &self.identity_api_version {
            serde_yaml::Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
            serde_yaml::Value::String(s) => s.trim_start_matches('v').parse().ok(),
            _ => None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("logger.filename", &self.logger.filename),
            ("clouds.openstack.region_name", &self.clouds.openstack.region_name),
            ("clouds.openstack.auth.auth_url", &self.clouds.openstack.auth.auth_url),
            ("email.host", &self.email.host),
            ("email.From", &self.email.from),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must not be empty".into(),
                });
            }
        }
        if self.email.max_msg_per_connection == Some(0) {
            return Err(ConfigError::Invalid {
                key: "email.max_msg_per_connection",
                reason: "must be at least 1".into(),
            });
        }
        if self.clouds.openstack.identity_version() != Some(3) {
            return Err(ConfigError::Invalid {
                key: "clouds.openstack.identity_api_version",
                reason: format!(
                    "unsupported identity API version {:?}, only 3 is supported",
                    self.clouds.openstack.identity_api_version
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
logger:
  filename: inventory.log
  Formatter: "%(asctime)s - %(message)s"
clouds:
  openstack:
    region_name: RegionOne
    identity_api_version: 3
    interface: public
    auth:
      auth_url: https://keystone.example.org:5000/v3
      username: admin
      project_name: admin
email:
  host: smtp.example.org
  From: reports@example.org
  Subject: Your cloud resources
  msg_prefix: "Hello,\n"
  msg_infix: " owns"
  msg_postfix: "\nBye"
output_filter:
  server: [links]
  properties: [os_hash_value]
"#;

    #[test]
    fn loads_full_config_with_defaults() {
        let config = Config::load_from_str(FULL).unwrap();
        assert_eq!(config.email.max_msg_per_connection(), 3);
        assert_eq!(config.email.to, None);
        assert_eq!(config.clouds.openstack.auth.user_domain_name, "Default");
        assert_eq!(config.output_filter.server, vec!["links".to_string()]);
        assert!(config.output_filter.image.is_empty());
        assert_eq!(config.logger.formatter, "%(asctime)s - %(message)s");
    }

    #[test]
    fn missing_required_key_fails_fast() {
        let yaml = FULL.replace("  Subject: Your cloud resources\n", "");
        let err = Config::load_from_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
        assert!(err.to_string().contains("Subject"), "{err}");
    }

    #[test]
    fn zero_messages_per_connection_is_rejected() {
        let yaml = FULL.replace("  Subject:", "  max_msg_per_connection: 0\n  Subject:");
        let err = Config::load_from_str(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "email.max_msg_per_connection", .. }
        ));
    }

    #[test]
    fn identity_version_accepts_string_forms() {
        let yaml = FULL.replace("identity_api_version: 3", "identity_api_version: \"v3\"");
        assert!(Config::load_from_str(&yaml).is_ok());
        let yaml = FULL.replace("identity_api_version: 3", "identity_api_version: 2");
        assert!(Config::load_from_str(&yaml).is_err());
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
