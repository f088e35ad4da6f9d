//! Configuration validation utilities

use crate::schema::Config;
use types::Result;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> Result<ValidationReport> {
        let mut report = ValidationReport::new();

        Self::validate_marketplace(config, &mut report);
        Self::validate_policy(config, &mut report);
        Self::validate_gateway(config, &mut report);
        Self::validate_server(config, &mut report);
        Self::validate_database(config, &mut report);
        Self::validate_logging(config, &mut report);
        Self::validate_scheduler(config, &mut report);

        Ok(report)
    }

    fn validate_marketplace(config: &Config, report: &mut ValidationReport) {
        if config.marketplace.currency.trim().is_empty() {
            report.add_error("marketplace.currency", "Currency cannot be empty");
        } else if config.marketplace.currency.len() != 3 {
            report.add_warning(
                "marketplace.currency",
                &format!(
                    "Currency '{}' is not a 3-letter ISO code",
                    config.marketplace.currency
                ),
            );
        }

        if config.marketplace.deposit_multiplier == 0 {
            report.add_error("marketplace.deposit_multiplier", "Deposit multiplier cannot be 0");
        } else if config.marketplace.deposit_multiplier > 24 {
            report.add_warning(
                "marketplace.deposit_multiplier",
                "Deposit multiplier is very high, renters will face a large hold",
            );
        }
    }

    fn validate_policy(config: &Config, report: &mut ValidationReport) {
        let tiers = &config.policy.refund_tiers;
        if tiers.is_empty() {
            report.add_error("policy.refund_tiers", "At least one refund tier must be configured");
            return;
        }

        for pair in tiers.windows(2) {
            if pair[0].min_days_before_start <= pair[1].min_days_before_start {
                report.add_error(
                    "policy.refund_tiers",
                    "Tier thresholds must be strictly descending",
                );
            }
            if pair[0].refund_percent < pair[1].refund_percent {
                report.add_warning(
                    "policy.refund_tiers",
                    "Earlier cancellation refunds less than a later one, check the schedule",
                );
            }
        }

        if tiers.last().map(|t| t.min_days_before_start) != Some(0) {
            report.add_error("policy.refund_tiers", "The final tier must cover 0 days before start");
        }

        for tier in tiers {
            if tier.refund_percent > 100 {
                report.add_error(
                    "policy.refund_tiers",
                    &format!("Refund percentage cannot exceed 100: {}", tier.refund_percent),
                );
            }
        }

        if config.policy.platform_commission_percent > 100 {
            report.add_error(
                "policy.platform_commission_percent",
                "Commission cannot exceed 100",
            );
        } else if config.policy.platform_commission_percent > 50 {
            report.add_warning(
                "policy.platform_commission_percent",
                "Commission above 50% leaves owners very little",
            );
        }

        if config.policy.owner_cancel_penalty_percent > 100 {
            report.add_error(
                "policy.owner_cancel_penalty_percent",
                "Penalty percentage cannot exceed 100",
            );
        }

        if config.policy.compensation_coupon_percent > 100 {
            report.add_error(
                "policy.compensation_coupon_percent",
                "Coupon percentage cannot exceed 100",
            );
        }

        if config.policy.late_fee_per_hour < 0 {
            report.add_error("policy.late_fee_per_hour", "Late fee cannot be negative");
        } else if config.policy.late_fee_per_hour == 0 {
            report.add_warning(
                "policy.late_fee_per_hour",
                "Late fee is zero, late returns will not be charged",
            );
        }

        if config.policy.late_grace_minutes > 24 * 60 {
            report.add_warning(
                "policy.late_grace_minutes",
                "Grace period is longer than a day",
            );
        }
    }

    fn validate_gateway(config: &Config, report: &mut ValidationReport) {
        for (field, url) in [
            ("gateway.base_url", &config.gateway.base_url),
            ("gateway.upload_url", &config.gateway.upload_url),
        ] {
            if url.is_empty() {
                report.add_error(field, "URL cannot be empty");
            } else if !url.starts_with("https://") {
                report.add_warning(field, "Gateway endpoints should use HTTPS");
            }
        }

        if config.gateway.key_id.is_empty() {
            report.add_error("gateway.key_id", "Key id cannot be empty");
        }

        if config.gateway.key_secret.is_empty() {
            report.add_error("gateway.key_secret", "Key secret cannot be empty");
        } else if config.gateway.key_secret == "changeme" {
            report.add_warning("gateway.key_secret", "Key secret is the placeholder default");
        }

        if config.gateway.timeout_seconds == 0 {
            report.add_error("gateway.timeout_seconds", "Timeout cannot be zero");
        } else if config.gateway.timeout_seconds > 300 {
            report.add_warning(
                "gateway.timeout_seconds",
                &format!("Timeout is very high ({}s)", config.gateway.timeout_seconds),
            );
        }
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning(
                "server.port",
                "Server port is below 1024, may require elevated privileges",
            );
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        } else if config.server.request_timeout_seconds > 300 {
            report.add_warning("server.request_timeout_seconds", "Request timeout is very high");
        }

        if config.server.max_body_size == 0 {
            report.add_error("server.max_body_size", "Max body size cannot be 0");
        } else if config.server.max_body_size > 10 * 1024 * 1024 {
            report.add_warning("server.max_body_size", "Max body size is greater than 10MB");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }
    }

    fn validate_database(config: &Config, report: &mut ValidationReport) {
        if config.database.url.is_empty() {
            report.add_error("database.url", "Database URL cannot be empty");
        }

        if !config.database.url.starts_with("sqlite:") {
            report.add_warning("database.url", "Only SQLite is currently supported");
        }

        if config.database.max_connections == 0 {
            report.add_error("database.max_connections", "Max connections cannot be 0");
        } else if config.database.max_connections > 100 {
            report.add_warning("database.max_connections", "Max connections is very high");
        }

        if config.database.connection_timeout_seconds == 0 {
            report.add_error(
                "database.connection_timeout_seconds",
                "Connection timeout cannot be 0",
            );
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error(
                "logging.level",
                &format!(
                    "Invalid log level: {}. Valid levels: {:?}",
                    config.logging.level, valid_levels
                ),
            );
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error(
                "logging.format",
                &format!(
                    "Invalid log format: {}. Valid formats: {:?}",
                    config.logging.format, valid_formats
                ),
            );
        }

        if config.logging.level == "trace" || config.logging.level == "debug" {
            report.add_warning(
                "logging.level",
                "Debug/trace logging may impact performance in production",
            );
        }

        if let Some(ref file_path) = config.logging.file_path {
            if let Some(parent) = std::path::Path::new(file_path).parent() {
                if !parent.exists() {
                    report.add_warning("logging.file_path", "Log file directory does not exist");
                }
            }
        }
    }

    fn validate_scheduler(config: &Config, report: &mut ValidationReport) {
        if config.scheduler.overdue_sweep_interval_seconds == 0 {
            report.add_error(
                "scheduler.overdue_sweep_interval_seconds",
                "Sweep interval cannot be 0",
            );
        } else if config.scheduler.overdue_sweep_interval_seconds < 30 {
            report.add_warning(
                "scheduler.overdue_sweep_interval_seconds",
                "Sweep interval is very low, may hammer the database",
            );
        }

        if config.scheduler.gateway_health_interval_seconds == 0 {
            report.add_error(
                "scheduler.gateway_health_interval_seconds",
                "Health check interval cannot be 0",
            );
        } else if config.scheduler.gateway_health_interval_seconds < 10 {
            report.add_warning(
                "scheduler.gateway_health_interval_seconds",
                "Health check interval is very low",
            );
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!(
            "Validation: {} errors, {} warnings",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RefundTier;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        let report = ConfigValidator::validate(&config).unwrap();
        assert!(report.is_valid());
        // The placeholder gateway secret should at least warn
        assert!(report.has_warnings());
    }

    #[test]
    fn inverted_schedule_is_flagged() {
        let mut config = Config::default();
        config.policy.refund_tiers = vec![
            RefundTier { min_days_before_start: 7, refund_percent: 30 },
            RefundTier { min_days_before_start: 0, refund_percent: 90 },
        ];
        let report = ConfigValidator::validate(&config).unwrap();
        assert!(report.is_valid());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.field == "policy.refund_tiers"));
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut config = Config::default();
        config.server.port = 0;
        let report = ConfigValidator::validate(&config).unwrap();
        assert!(!report.is_valid());
    }
}
