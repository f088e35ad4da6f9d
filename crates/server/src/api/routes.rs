//! API route definitions

use crate::api::handlers;
use crate::app::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Create the main API router
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Draft and booking endpoints
        .route("/bookings/quote", post(handlers::quote_booking))
        .route("/bookings/checkout", post(handlers::begin_checkout))
        .route("/bookings", post(handlers::create_booking))
        .route("/bookings/:booking_id", get(handlers::get_booking))
        .route("/bookings/:booking_id/pickup", post(handlers::confirm_pickup))
        .route("/bookings/:booking_id/drop", post(handlers::confirm_drop))
        .route("/bookings/:booking_id/cancel", post(handlers::cancel_by_user))
        .route(
            "/bookings/:booking_id/cancel-by-owner",
            post(handlers::cancel_by_owner),
        )
        // Coupon endpoints
        .route("/coupons/apply", post(handlers::apply_coupon))
        .route("/coupons/release", post(handlers::release_coupon))
        // Evidence upload passthrough
        .route("/evidence/upload", post(handlers::upload_evidence))
        // Settlement endpoints
        .route("/refunds/:refund_id/claim", post(handlers::claim_refund))
        .route("/payouts/:payout_id/claim", post(handlers::claim_payout))
        .route(
            "/penalties/:penalty_id/order",
            post(handlers::begin_penalty_payment),
        )
        .route("/penalties/:penalty_id/pay", post(handlers::pay_penalty))
        // Health and status endpoints
        .route("/healthz", get(handlers::health_check))
        .route("/status", get(handlers::system_status))
        // Admin endpoints
        .route("/admin/killswitch", post(handlers::toggle_killswitch))
        .route(
            "/admin/refunds/:refund_id/settle",
            post(handlers::settle_refund),
        )
        .route(
            "/admin/payouts/:payout_id/settle",
            post(handlers::settle_payout),
        )
        .route("/admin/penalties/damage", post(handlers::record_damage))
}
