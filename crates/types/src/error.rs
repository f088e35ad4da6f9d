//! Error types for the Wheelbase engine

use thiserror::Error;

/// Main error type for the booking and settlement engine
#[derive(Error, Debug)]
pub enum WheelbaseError {
    /// Bad input shape or range, surfaced immediately to the caller
    #[error("Validation error: {0}")]
    Validation(String),

    /// State machine guard failure; the booking is left untouched
    #[error("Invalid transition: cannot {action} a booking in state {from}")]
    InvalidTransition { from: String, action: String },

    /// Missing entity
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// Single-use coupon violation
    #[error("Coupon already used: {code}")]
    AlreadyUsed { code: String },

    /// Claim attempted after the record left its claimable state
    #[error("Already claimed: {resource}")]
    AlreadyClaimed { resource: String },

    /// Another active booking overlaps the requested window
    #[error("Slot unavailable for car {car_id} in the requested window")]
    SlotUnavailable { car_id: String },

    /// Claim supplied an empty or malformed payout destination
    #[error("Invalid payout destination: {0}")]
    InvalidDestination(String),

    /// Handover OTP did not match
    #[error("OTP does not match")]
    InvalidOtp,

    /// External payment gateway failure; retryable by the caller
    #[error("Gateway error: {service}: {message}")]
    Gateway { service: String, message: String },

    /// Payment signature verification failed; definitive, not retryable
    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    /// Evidence upload failure; retryable by the caller
    #[error("Evidence upload failed: {0}")]
    UploadFailed(String),

    /// Monetary arithmetic overflow
    #[error("Money calculation overflow")]
    CalculationOverflow,

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WheelbaseError {
    /// Whether the caller may retry the failed operation verbatim.
    ///
    /// Only external-collaborator failures are retryable; validation,
    /// transition and single-use violations are definitive.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WheelbaseError::Gateway { .. } | WheelbaseError::UploadFailed(_)
        )
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, WheelbaseError>;

/// Coupon validation specific errors
#[derive(Error, Debug)]
pub enum CouponError {
    /// Unknown code, including the collaborator's -1 sentinel
    #[error("Coupon not found: {code}")]
    NotFound { code: String },

    /// Coupon was already reserved or burned
    #[error("Coupon already used: {code}")]
    AlreadyUsed { code: String },

    /// Lookup returned a percentage outside (0, 100]
    #[error("Invalid coupon discount percentage: {percentage}")]
    InvalidPercentage { percentage: i64 },

    /// Empty or whitespace-only code
    #[error("Coupon code is empty")]
    EmptyCode,
}

/// Gateway communication specific errors
#[derive(Error, Debug)]
pub enum GatewayCallError {
    /// Request did not complete within the caller's deadline
    #[error("Connection timeout to {service}")]
    Timeout { service: String },

    /// Non-2xx HTTP response
    #[error("HTTP error from {service}: {status}")]
    Http { service: String, status: u16 },

    /// Body could not be decoded
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: String, message: String },

    /// The gateway definitively rejected the request
    #[error("Rejected by {service}: {reason}")]
    Rejected { service: String, reason: String },
}

/// Database specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Connection failed
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Constraint violation
    #[error("Database constraint violation: {0}")]
    ConstraintViolation(String),

    /// Record not found
    #[error("Record not found: {table}")]
    RecordNotFound { table: String },
}

/// Configuration specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Parse error
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Validation error
    #[error("Configuration validation error: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid value
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

// Conversion implementations for common error types

impl From<CouponError> for WheelbaseError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::NotFound { code } => WheelbaseError::NotFound {
                resource: format!("coupon {}", code),
            },
            CouponError::AlreadyUsed { code } => WheelbaseError::AlreadyUsed { code },
            CouponError::InvalidPercentage { percentage } => WheelbaseError::Validation(format!(
                "coupon discount percentage out of range: {}",
                percentage
            )),
            CouponError::EmptyCode => {
                WheelbaseError::Validation("coupon code is empty".to_string())
            }
        }
    }
}

impl From<GatewayCallError> for WheelbaseError {
    fn from(err: GatewayCallError) -> Self {
        match err {
            GatewayCallError::Timeout { service } => WheelbaseError::Gateway {
                service,
                message: "connection timeout".to_string(),
            },
            GatewayCallError::Http { service, status } => WheelbaseError::Gateway {
                service,
                message: format!("HTTP error: {}", status),
            },
            GatewayCallError::InvalidResponse { service, message } => {
                WheelbaseError::Gateway { service, message }
            }
            GatewayCallError::Rejected { reason, .. } => {
                WheelbaseError::VerificationFailed(reason)
            }
        }
    }
}

impl From<StorageError> for WheelbaseError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RecordNotFound { table } => {
                WheelbaseError::NotFound { resource: table }
            }
            other => WheelbaseError::Database(other.to_string()),
        }
    }
}

impl From<ConfigError> for WheelbaseError {
    fn from(err: ConfigError) -> Self {
        WheelbaseError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        let gateway = WheelbaseError::Gateway {
            service: "payments".to_string(),
            message: "HTTP error: 502".to_string(),
        };
        assert!(gateway.is_retryable());
        assert!(WheelbaseError::UploadFailed("cdn down".to_string()).is_retryable());

        assert!(!WheelbaseError::VerificationFailed("bad signature".to_string()).is_retryable());
        assert!(!WheelbaseError::InvalidOtp.is_retryable());
        assert!(!WheelbaseError::SlotUnavailable {
            car_id: "car-1".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn coupon_error_conversion() {
        let err: WheelbaseError = CouponError::AlreadyUsed {
            code: "WELCOME10".to_string(),
        }
        .into();
        assert!(matches!(err, WheelbaseError::AlreadyUsed { .. }));

        let err: WheelbaseError = CouponError::NotFound {
            code: "NOPE".to_string(),
        }
        .into();
        assert!(matches!(err, WheelbaseError::NotFound { .. }));
    }

    #[test]
    fn gateway_rejection_is_verification_failure() {
        let err: WheelbaseError = GatewayCallError::Rejected {
            service: "payments".to_string(),
            reason: "signature mismatch".to_string(),
        }
        .into();
        assert!(matches!(err, WheelbaseError::VerificationFailed(_)));
        assert!(!err.is_retryable());
    }
}
