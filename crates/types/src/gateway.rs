//! Payment-gateway boundary types
//!
//! Everything that crosses into external collaborators is expressed in
//! minor currency units and opaque reference strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order handed back by the payment gateway before checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentOrder {
    /// Gateway order reference
    #[serde(rename = "orderId")]
    pub order_id: String,
    /// Amount in minor currency units, as the gateway quotes it
    pub amount: i64,
    pub currency: String,
}

/// Proof of a completed checkout, supplied by the gateway callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProof {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    pub signature: String,
}

/// Health status of an external collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayHealth {
    Healthy,
    Unhealthy,
    Unknown,
}

/// Latest health observation for one external service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayHealthCheck {
    pub service: String,
    pub health: GatewayHealth,
    /// Round-trip of the last successful probe
    pub response_time_ms: Option<u64>,
    pub last_error: Option<String>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl GatewayHealthCheck {
    pub fn new(service: String, health: GatewayHealth) -> Self {
        Self {
            service,
            health,
            response_time_ms: None,
            last_error: None,
            checked_at: None,
        }
    }

    pub fn mark_healthy(&mut self, response_time_ms: u64) {
        self.health = GatewayHealth::Healthy;
        self.response_time_ms = Some(response_time_ms);
        self.last_error = None;
        self.checked_at = Some(Utc::now());
    }

    pub fn mark_unhealthy(&mut self, error: String) {
        self.health = GatewayHealth::Unhealthy;
        self.response_time_ms = None;
        self.last_error = Some(error);
        self.checked_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_transitions() {
        let mut check = GatewayHealthCheck::new("payments".to_string(), GatewayHealth::Unknown);
        assert!(check.checked_at.is_none());

        check.mark_healthy(42);
        assert_eq!(check.health, GatewayHealth::Healthy);
        assert_eq!(check.response_time_ms, Some(42));

        check.mark_unhealthy("HTTP error: 502".to_string());
        assert_eq!(check.health, GatewayHealth::Unhealthy);
        assert!(check.response_time_ms.is_none());
        assert_eq!(check.last_error.as_deref(), Some("HTTP error: 502"));
    }
}
