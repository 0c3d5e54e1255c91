//! Configuration management for the key recovery function
//!
//! Everything is environment-variable driven. Values are read through the
//! `config` crate so tests can feed an explicit variable map instead of
//! touching the process environment.

use serde::Deserialize;
use thiserror::Error;

/// Environment tag that gates automatic remediation behind manual approval
pub const PRODUCTION_ENVIRONMENT: &str = "prod";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line (CloudWatch)
    Json,
    /// Human-readable output for local runs
    Console,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "console" | "pretty" | "text" => Ok(LogFormat::Console),
            _ => Err(ConfigError::InvalidValue {
                name: "LOG_FORMAT",
                value: value.to_string(),
            }),
        }
    }
}

/// Raw view of the environment, keys lowercased by the `config` crate
#[derive(Debug, Deserialize)]
struct RawConfig {
    kms_key_id: Option<String>,
    backup_vault_name: Option<String>,
    environment: Option<String>,
    restore_iam_role_arn: Option<String>,
    log_level: Option<String>,
    log_format: Option<String>,
}

/// Recovery function configuration
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Key to watch (`KMS_KEY_ID`)
    pub kms_key_id: String,
    /// Backup vault holding recovery points for the key (`BACKUP_VAULT_NAME`)
    pub backup_vault_name: Option<String>,
    /// Deployment stage tag (`ENVIRONMENT`)
    pub environment: String,
    /// Role assumed by the backup service for restores (`RESTORE_IAM_ROLE_ARN`)
    pub restore_iam_role_arn: Option<String>,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl RecoveryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_source(config::Environment::default())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self::from_source(config::Environment::default().source(Some(map)))
    }

    fn from_source(source: config::Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        let kms_key_id = non_blank(raw.kms_key_id).ok_or(ConfigError::MissingVar("KMS_KEY_ID"))?;
        let environment =
            non_blank(raw.environment).ok_or(ConfigError::MissingVar("ENVIRONMENT"))?;

        let log_format = match non_blank(raw.log_format) {
            Some(value) => LogFormat::parse(&value)?,
            None => LogFormat::Json,
        };

        Ok(Self {
            kms_key_id,
            backup_vault_name: non_blank(raw.backup_vault_name),
            environment,
            restore_iam_role_arn: non_blank(raw.restore_iam_role_arn),
            log_level: non_blank(raw.log_level),
            log_format,
        })
    }

    /// Get the backup vault name, if backup integration is configured
    pub fn backup_vault(&self) -> Option<&str> {
        self.backup_vault_name.as_deref()
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
