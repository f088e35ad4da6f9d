//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use types::Money;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Marketplace-wide constants
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
    /// Business-rule knobs: refund schedule, commissions, penalties
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Payment gateway and evidence upload endpoints
    pub gateway: GatewayConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Background sweep configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Marketplace constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// ISO currency code used at the gateway boundary
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Security deposit as a multiple of the hourly rate
    #[serde(default = "default_deposit_multiplier")]
    pub deposit_multiplier: u32,
}

/// One step of the renter cancellation schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundTier {
    /// Inclusive lower bound on whole days before the trip start
    pub min_days_before_start: u32,
    /// Refund percentage applied to the net base amount
    pub refund_percent: u8,
}

/// Business-rule configuration
///
/// Every constant the policy engines depend on lives here, so deployment
/// resolves each open policy choice exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Renter cancellation schedule, highest threshold first
    #[serde(default = "default_refund_tiers")]
    pub refund_tiers: Vec<RefundTier>,
    /// Platform's percentage of the gross earning on each payout
    #[serde(default = "default_commission_percent")]
    pub platform_commission_percent: u8,
    /// Penalty charged to an owner who cancels a confirmed booking, as a
    /// percentage of the booking total
    #[serde(default = "default_owner_cancel_penalty_percent")]
    pub owner_cancel_penalty_percent: u8,
    /// Discount percentage on the compensation coupon issued to the renter
    /// of an owner-cancelled trip
    #[serde(default = "default_compensation_coupon_percent")]
    pub compensation_coupon_percent: u8,
    /// Late-return charge per whole hour past the scheduled end, in major
    /// currency units
    #[serde(default = "default_late_fee_per_hour")]
    pub late_fee_per_hour: i64,
    /// Overage tolerated before a drop counts as late
    #[serde(default = "default_late_grace_minutes")]
    pub late_grace_minutes: u32,
}

impl PolicyConfig {
    pub fn late_fee_per_hour(&self) -> types::Result<Money> {
        Money::new(self.late_fee_per_hour)
    }
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Payment gateway base URL
    pub base_url: String,
    /// API key identifier
    pub key_id: String,
    /// API key secret
    pub key_secret: String,
    /// Evidence upload service URL
    pub upload_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_gateway_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// Enable WAL mode for SQLite
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log file path (optional)
    pub file_path: Option<String>,
    /// Enable request logging
    #[serde(default = "default_true")]
    pub request_logging: bool,
}

/// Background scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between overdue-drop sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub overdue_sweep_interval_seconds: u64,
    /// Interval between gateway health probes, in seconds
    #[serde(default = "default_health_check_interval")]
    pub gateway_health_interval_seconds: u64,
}

// Default value functions

fn default_currency() -> String {
    "INR".to_string()
}

fn default_deposit_multiplier() -> u32 {
    5
}

fn default_refund_tiers() -> Vec<RefundTier> {
    vec![
        RefundTier { min_days_before_start: 7, refund_percent: 90 },
        RefundTier { min_days_before_start: 5, refund_percent: 70 },
        RefundTier { min_days_before_start: 3, refund_percent: 50 },
        RefundTier { min_days_before_start: 1, refund_percent: 30 },
        RefundTier { min_days_before_start: 0, refund_percent: 10 },
    ]
}

fn default_commission_percent() -> u8 {
    20
}

fn default_owner_cancel_penalty_percent() -> u8 {
    10
}

fn default_compensation_coupon_percent() -> u8 {
    10
}

fn default_late_fee_per_hour() -> i64 {
    100
}

fn default_late_grace_minutes() -> u32 {
    60
}

fn default_gateway_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_database_url() -> String {
    "sqlite:data/wheelbase.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_sweep_interval() -> u64 {
    300 // 5 minutes
}

fn default_health_check_interval() -> u64 {
    60
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            deposit_multiplier: default_deposit_multiplier(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            refund_tiers: default_refund_tiers(),
            platform_commission_percent: default_commission_percent(),
            owner_cancel_penalty_percent: default_owner_cancel_penalty_percent(),
            compensation_coupon_percent: default_compensation_coupon_percent(),
            late_fee_per_hour: default_late_fee_per_hour(),
            late_grace_minutes: default_late_grace_minutes(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gateway.example.com".to_string(),
            key_id: "rzp_test_key".to_string(),
            key_secret: "changeme".to_string(),
            upload_url: "https://uploads.example.com".to_string(),
            timeout_seconds: default_gateway_timeout_seconds(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors_enabled: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout(),
            wal_mode: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file_path: None,
            request_logging: true,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            overdue_sweep_interval_seconds: default_sweep_interval(),
            gateway_health_interval_seconds: default_health_check_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace: MarketplaceConfig::default(),
            policy: PolicyConfig::default(),
            gateway: GatewayConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}
