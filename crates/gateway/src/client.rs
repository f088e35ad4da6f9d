//! Payment settlement gateway client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;

use config::GatewayConfig;
use types::{GatewayCallError, PaymentOrder, PaymentProof, Result};

const SERVICE_NAME: &str = "payments";

/// Seam for the external payment settlement gateway.
///
/// Order creation and verification are synchronous request/response calls
/// with a caller-defined timeout; timeouts and 5xx responses surface as
/// retryable errors, verification rejections are definitive.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a checkout order for the given amount in minor currency
    /// units.
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder>;

    /// Verify a completed checkout against the gateway's signature.
    async fn verify_payment(&self, proof: &PaymentProof) -> Result<()>;

    /// Probe the gateway, returning the round-trip time when reachable.
    async fn health_check(&self) -> Result<Duration>;
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    order_id: &'a str,
    payment_id: &'a str,
    signature: &'a str,
}

/// HTTP implementation of the gateway seam
#[derive(Debug, Clone)]
pub struct RestPaymentGateway {
    config: GatewayConfig,
    http_client: Client,
}

impl RestPaymentGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("wheelbase/0.1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.config.base_url.trim_end_matches('/'))
    }

    fn verify_url(&self) -> String {
        format!(
            "{}/payments/verify",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PaymentGateway for RestPaymentGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<PaymentOrder> {
        let request = CreateOrderRequest {
            amount: amount_minor_units,
            currency,
            receipt,
        };

        tracing::info!(
            amount_minor_units,
            currency,
            receipt,
            "Creating gateway payment order"
        );

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.http_client
                .post(self.orders_url())
                .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| GatewayCallError::Timeout {
            service: SERVICE_NAME.to_string(),
        })?
        .map_err(|e| GatewayCallError::Http {
            service: SERVICE_NAME.to_string(),
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        })?;

        if !response.status().is_success() {
            return Err(GatewayCallError::Http {
                service: SERVICE_NAME.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let raw_text = response
            .text()
            .await
            .map_err(|e| GatewayCallError::InvalidResponse {
                service: SERVICE_NAME.to_string(),
                message: format!("error reading response body: {}", e),
            })?;

        let order = parse_order_response(&raw_text)?;
        tracing::info!(order_id = %order.order_id, "Gateway order created");
        Ok(order)
    }

    async fn verify_payment(&self, proof: &PaymentProof) -> Result<()> {
        let request = VerifyRequest {
            order_id: &proof.order_id,
            payment_id: &proof.payment_id,
            signature: &proof.signature,
        };

        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.http_client
                .post(self.verify_url())
                .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
                .json(&request)
                .send(),
        )
        .await
        .map_err(|_| GatewayCallError::Timeout {
            service: SERVICE_NAME.to_string(),
        })?
        .map_err(|e| GatewayCallError::Http {
            service: SERVICE_NAME.to_string(),
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(payment_id = %proof.payment_id, "Payment verified");
            return Ok(());
        }

        // 4xx means the gateway examined the proof and said no; that is a
        // definitive rejection, not a transient fault
        if status.is_client_error() {
            let reason = response
                .text()
                .await
                .ok()
                .and_then(|body| {
                    serde_json::from_str::<Value>(&body)
                        .ok()
                        .and_then(|v| {
                            v.get("error")
                                .and_then(|e| e.as_str())
                                .map(|s| s.to_string())
                        })
                })
                .unwrap_or_else(|| "signature mismatch".to_string());

            return Err(GatewayCallError::Rejected {
                service: SERVICE_NAME.to_string(),
                reason,
            }
            .into());
        }

        Err(GatewayCallError::Http {
            service: SERVICE_NAME.to_string(),
            status: status.as_u16(),
        }
        .into())
    }

    async fn health_check(&self) -> Result<Duration> {
        let start = std::time::Instant::now();

        let response = timeout(
            Duration::from_secs(10), // Shorter timeout for health checks
            self.http_client.get(self.orders_url()).send(),
        )
        .await
        .map_err(|_| GatewayCallError::Timeout {
            service: SERVICE_NAME.to_string(),
        })?
        .map_err(|e| GatewayCallError::Http {
            service: SERVICE_NAME.to_string(),
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
        })?;

        let elapsed = start.elapsed();

        // Any HTTP answer (even 401/405 on a bare GET) proves the gateway
        // is reachable
        if response.status().as_u16() < 500 {
            Ok(elapsed)
        } else {
            Err(GatewayCallError::Http {
                service: SERVICE_NAME.to_string(),
                status: response.status().as_u16(),
            }
            .into())
        }
    }
}

/// Parse the order-creation response with a loose fallback for gateways
/// that wrap the payload
fn parse_order_response(raw_text: &str) -> std::result::Result<PaymentOrder, GatewayCallError> {
    // 1) Strict schema
    if let Ok(resp) = serde_json::from_str::<CreateOrderResponse>(raw_text) {
        return Ok(PaymentOrder {
            order_id: resp.id,
            amount: resp.amount,
            currency: resp.currency,
        });
    }

    // 2) Loose parsing
    let value: Value =
        serde_json::from_str(raw_text).map_err(|e| GatewayCallError::InvalidResponse {
            service: SERVICE_NAME.to_string(),
            message: format!("invalid JSON response: {} | raw: {}", e, raw_text),
        })?;

    // { "order": { "id": ..., "amount": ..., "currency": ... } }
    if let Some(order) = value.get("order") {
        if let (Some(id), Some(amount), Some(currency)) = (
            order.get("id").and_then(|v| v.as_str()),
            order.get("amount").and_then(|v| v.as_i64()),
            order.get("currency").and_then(|v| v.as_str()),
        ) {
            return Ok(PaymentOrder {
                order_id: id.to_string(),
                amount,
                currency: currency.to_string(),
            });
        }
    }

    let message = value
        .get("error")
        .and_then(|e| e.as_str())
        .unwrap_or("unexpected response shape")
        .to_string();

    Err(GatewayCallError::InvalidResponse {
        service: SERVICE_NAME.to_string(),
        message: format!("{} | raw: {}", message, raw_text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::WheelbaseError;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_config(base_url: String) -> GatewayConfig {
        GatewayConfig {
            base_url,
            key_id: "rzp_test_abc".to_string(),
            key_secret: "s3cret".to_string(),
            upload_url: "https://uploads.test".to_string(),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_successful_order_creation() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "order_9A33XWu170gUtm",
                "amount": 82000,
                "currency": "INR"
            })))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        let order = gateway.create_order(82_000, "INR", "booking-1").await.unwrap();

        assert_eq!(order.order_id, "order_9A33XWu170gUtm");
        assert_eq!(order.amount, 82_000);
        assert_eq!(order.currency, "INR");
    }

    #[tokio::test]
    async fn test_wrapped_order_response_is_accepted() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "order": { "id": "order_x", "amount": 50000, "currency": "INR" }
            })))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        let order = gateway.create_order(50_000, "INR", "booking-2").await.unwrap();
        assert_eq!(order.order_id, "order_x");
    }

    #[tokio::test]
    async fn test_server_error_is_retryable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        let err = gateway.create_order(10_000, "INR", "booking-3").await.unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, WheelbaseError::Gateway { .. }));
    }

    #[tokio::test]
    async fn test_verification_rejection_is_definitive() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/payments/verify"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "signature mismatch"
            })))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        let proof = PaymentProof {
            order_id: "order_x".to_string(),
            payment_id: "pay_y".to_string(),
            signature: "bad".to_string(),
        };
        let err = gateway.verify_payment(&proof).await.unwrap_err();

        assert!(matches!(err, WheelbaseError::VerificationFailed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_successful_verification() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/payments/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true
            })))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        let proof = PaymentProof {
            order_id: "order_x".to_string(),
            payment_id: "pay_y".to_string(),
            signature: "good".to_string(),
        };
        assert!(gateway.verify_payment(&proof).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_round_trip() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&mock_server)
            .await;

        let gateway = RestPaymentGateway::new(test_config(mock_server.uri()));
        assert!(gateway.health_check().await.is_ok());
    }
}
