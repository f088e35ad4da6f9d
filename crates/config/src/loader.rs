//! Configuration loader implementation

use crate::schema::Config;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::{ConfigError, WheelbaseError};

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        // Check if config file exists
        if !config_path.exists() {
            return Err(WheelbaseError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            ))
            .into());
        }

        // Load configuration using Figment
        let config: Config = Figment::new()
            // Start with YAML file
            .merge(Yaml::file(config_path))
            // Override with environment variables (prefixed with WHEELBASE_)
            .merge(Env::prefixed("WHEELBASE_").split("_"))
            // Also support unprefixed environment variables for common settings
            .merge(Env::raw().only(&[
                "RUST_LOG",
                "DATABASE_URL",
                "HTTP_PORT",
                "HTTP_HOST",
            ]))
            .extract()
            .context("Failed to parse configuration")?;

        // Validate the configuration
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration
    fn validate(config: &Config) -> Result<()> {
        // Validate marketplace constants
        if config.marketplace.currency.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "marketplace.currency".to_string(),
            }
            .into());
        }

        if config.marketplace.deposit_multiplier == 0 {
            return Err(ConfigError::ValidationError {
                field: "marketplace.deposit_multiplier".to_string(),
                message: "Deposit multiplier cannot be 0".to_string(),
            }
            .into());
        }

        // Validate the refund schedule
        let tiers = &config.policy.refund_tiers;
        if tiers.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "policy.refund_tiers".to_string(),
                message: "At least one refund tier must be configured".to_string(),
            }
            .into());
        }

        for pair in tiers.windows(2) {
            if pair[0].min_days_before_start <= pair[1].min_days_before_start {
                return Err(ConfigError::ValidationError {
                    field: "policy.refund_tiers".to_string(),
                    message: "Tier thresholds must be strictly descending".to_string(),
                }
                .into());
            }
        }

        if tiers.last().map(|t| t.min_days_before_start) != Some(0) {
            return Err(ConfigError::ValidationError {
                field: "policy.refund_tiers".to_string(),
                message: "The final tier must cover 0 days before start".to_string(),
            }
            .into());
        }

        for tier in tiers {
            if tier.refund_percent > 100 {
                return Err(ConfigError::ValidationError {
                    field: "policy.refund_tiers".to_string(),
                    message: format!(
                        "Refund percentage cannot exceed 100: {}",
                        tier.refund_percent
                    ),
                }
                .into());
            }
        }

        // Validate the remaining policy percentages
        for (field, value) in [
            (
                "policy.platform_commission_percent",
                config.policy.platform_commission_percent,
            ),
            (
                "policy.owner_cancel_penalty_percent",
                config.policy.owner_cancel_penalty_percent,
            ),
            (
                "policy.compensation_coupon_percent",
                config.policy.compensation_coupon_percent,
            ),
        ] {
            if value > 100 {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    message: format!("Percentage cannot exceed 100: {}", value),
                }
                .into());
            }
        }

        if config.policy.late_fee_per_hour < 0 {
            return Err(ConfigError::ValidationError {
                field: "policy.late_fee_per_hour".to_string(),
                message: "Late fee cannot be negative".to_string(),
            }
            .into());
        }

        // Validate gateway endpoints
        for (field, url) in [
            ("gateway.base_url", &config.gateway.base_url),
            ("gateway.upload_url", &config.gateway.upload_url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                }
                .into());
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    field: field.to_string(),
                    message: format!("Invalid URL format: {}", url),
                }
                .into());
            }
        }

        if config.gateway.key_id.is_empty() {
            return Err(ConfigError::MissingField {
                field: "gateway.key_id".to_string(),
            }
            .into());
        }

        if config.gateway.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "gateway.timeout_seconds".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            }
            .into());
        }

        if config.gateway.timeout_seconds > 300 {
            return Err(ConfigError::ValidationError {
                field: "gateway.timeout_seconds".to_string(),
                message: "Timeout too high (max 300s)".to_string(),
            }
            .into());
        }

        // Validate server configuration
        if config.server.port == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.port".to_string(),
                message: "Server port cannot be 0".to_string(),
            }
            .into());
        }

        if config.server.max_body_size == 0 {
            return Err(ConfigError::ValidationError {
                field: "server.max_body_size".to_string(),
                message: "Max body size cannot be 0".to_string(),
            }
            .into());
        }

        // Validate database configuration
        if config.database.url.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "database.url".to_string(),
                message: "Database URL cannot be empty".to_string(),
            }
            .into());
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::ValidationError {
                field: "database.max_connections".to_string(),
                message: "Max connections cannot be 0".to_string(),
            }
            .into());
        }

        // Validate logging configuration
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.level".to_string(),
                message: format!(
                    "Invalid log level: {}. Valid levels: {:?}",
                    config.logging.level, valid_log_levels
                ),
            }
            .into());
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logging.format".to_string(),
                message: format!(
                    "Invalid log format: {}. Valid formats: {:?}",
                    config.logging.format, valid_log_formats
                ),
            }
            .into());
        }

        // Validate scheduler configuration
        if config.scheduler.overdue_sweep_interval_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "scheduler.overdue_sweep_interval_seconds".to_string(),
                message: "Sweep interval cannot be 0".to_string(),
            }
            .into());
        }

        if config.scheduler.gateway_health_interval_seconds == 0 {
            return Err(ConfigError::ValidationError {
                field: "scheduler.gateway_health_interval_seconds".to_string(),
                message: "Health check interval cannot be 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_default_config() {
        let config = ConfigLoader::default();
        assert_eq!(config.marketplace.currency, "INR");
        assert_eq!(config.marketplace.deposit_multiplier, 5);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.policy.refund_tiers.len(), 5);
    }

    #[test]
    fn test_load_from_string() {
        let yaml_content = r#"
marketplace:
  currency: "INR"
  deposit_multiplier: 5
policy:
  platform_commission_percent: 25
  owner_cancel_penalty_percent: 15
gateway:
  base_url: "https://api.pay.test"
  key_id: "rzp_test_abc"
  key_secret: "s3cret"
  upload_url: "https://uploads.pay.test"
server:
  port: 9090
"#;

        let config = ConfigLoader::load_from_str(yaml_content).unwrap();
        assert_eq!(config.policy.platform_commission_percent, 25);
        assert_eq!(config.policy.owner_cancel_penalty_percent, 15);
        assert_eq!(config.gateway.base_url, "https://api.pay.test");
        assert_eq!(config.server.port, 9090);
        // Unspecified sections fall back to defaults
        assert_eq!(config.policy.refund_tiers.len(), 5);
        assert_eq!(config.policy.late_grace_minutes, 60);
    }

    #[test]
    fn test_validation_errors() {
        // Ascending tier thresholds are rejected
        let yaml_content = r#"
policy:
  refund_tiers:
    - min_days_before_start: 1
      refund_percent: 30
    - min_days_before_start: 7
      refund_percent: 90
gateway:
  base_url: "https://api.pay.test"
  key_id: "k"
  key_secret: "s"
  upload_url: "https://uploads.pay.test"
"#;
        let result = ConfigLoader::load_from_str(yaml_content);
        assert!(result.is_err());

        // A schedule that never reaches day 0 is rejected
        let yaml_content = r#"
policy:
  refund_tiers:
    - min_days_before_start: 7
      refund_percent: 90
    - min_days_before_start: 1
      refund_percent: 30
gateway:
  base_url: "https://api.pay.test"
  key_id: "k"
  key_secret: "s"
  upload_url: "https://uploads.pay.test"
"#;
        let result = ConfigLoader::load_from_str(yaml_content);
        assert!(result.is_err());

        // Gateway URL without a scheme is rejected
        let yaml_content = r#"
gateway:
  base_url: "api.pay.test"
  key_id: "k"
  key_secret: "s"
  upload_url: "https://uploads.pay.test"
"#;
        let result = ConfigLoader::load_from_str(yaml_content);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_example() {
        let temp_file = NamedTempFile::new().unwrap();
        let result = ConfigLoader::create_example(temp_file.path());
        assert!(result.is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("policy:"));
        assert!(content.contains("refund_tiers:"));
        assert!(content.contains("gateway:"));
    }
}
