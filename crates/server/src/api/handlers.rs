//! HTTP API request handlers
//!
//! Thin wrappers mapping the engine's operations onto JSON endpoints and
//! its error taxonomy onto HTTP statuses. No business rules live here.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use types::{BookingDraft, Money, PaymentProof, PhotoSet, WheelbaseError};

use crate::app::AppState;

type HandlerResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// Map the engine's error taxonomy onto HTTP statuses
fn reject(err: WheelbaseError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        WheelbaseError::Validation(_) | WheelbaseError::InvalidDestination(_) => {
            StatusCode::BAD_REQUEST
        }
        WheelbaseError::InvalidOtp => StatusCode::FORBIDDEN,
        WheelbaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        WheelbaseError::InvalidTransition { .. }
        | WheelbaseError::AlreadyUsed { .. }
        | WheelbaseError::AlreadyClaimed { .. }
        | WheelbaseError::SlotUnavailable { .. } => StatusCode::CONFLICT,
        WheelbaseError::VerificationFailed(_) => StatusCode::PAYMENT_REQUIRED,
        WheelbaseError::Gateway { .. } | WheelbaseError::UploadFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        WheelbaseError::CalculationOverflow
        | WheelbaseError::Database(_)
        | WheelbaseError::Config(_)
        | WheelbaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(json!({
            "error": err.to_string(),
            "retryable": err.is_retryable(),
        })),
    )
}

fn service_unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Service temporarily unavailable - killswitch active"
        })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub car_id: Uuid,
    pub renter_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub draft: BookingDraft,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseCouponRequest {
    pub draft: BookingDraft,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub draft: BookingDraft,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub draft: BookingDraft,
    pub payment: PaymentProof,
}

#[derive(Debug, Deserialize)]
pub struct HandoverRequest {
    pub otp: String,
    pub photos: PhotoSet,
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct PayPenaltyRequest {
    pub payment: PaymentProof,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDamageRequest {
    pub booking_id: Uuid,
    pub amount: i64,
}

/// Price a rental window into a draft
pub async fn quote_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteRequest>,
) -> HandlerResult {
    let draft = state
        .engine
        .price_draft(
            request.car_id,
            request.renter_id,
            request.start,
            request.end,
            Utc::now(),
        )
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "draft": draft })))
}

/// Validate and reserve a coupon against a draft
pub async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApplyCouponRequest>,
) -> HandlerResult {
    let mut draft = request.draft;
    let applied = state
        .engine
        .coupons()
        .apply_to_draft(&mut draft, &request.code)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "draft": draft, "applied": applied })))
}

/// Release a reserved coupon from an abandoned draft
pub async fn release_coupon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReleaseCouponRequest>,
) -> HandlerResult {
    let mut draft = request.draft;
    let released = state
        .engine
        .coupons()
        .release_from_draft(&mut draft)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "draft": draft, "released": released })))
}

/// Create a gateway order for a priced draft
pub async fn begin_checkout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckoutRequest>,
) -> HandlerResult {
    if state.is_killswitch_active().await {
        return Err(service_unavailable());
    }

    let order = state
        .engine
        .begin_checkout(&request.draft)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "order": order })))
}

/// Confirm payment and persist the booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if state.is_killswitch_active().await {
        return Err(service_unavailable());
    }

    let booking = state
        .engine
        .create_booking(&request.draft, &request.payment, Utc::now())
        .await
        .map_err(reject)?;

    Ok((StatusCode::CREATED, Json(json!({ "booking": booking }))))
}

/// Fetch a booking
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> HandlerResult {
    let booking = state
        .engine
        .get_booking(booking_id)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "booking": booking })))
}

/// OTP-gated pickup with before photos
pub async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<HandoverRequest>,
) -> HandlerResult {
    let booking = state
        .engine
        .confirm_pickup(booking_id, &request.otp, request.photos, Utc::now())
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "booking": booking })))
}

/// OTP-gated drop with after photos; triggers settlement
pub async fn confirm_drop(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(request): Json<HandoverRequest>,
) -> HandlerResult {
    let outcome = state
        .engine
        .confirm_drop(booking_id, &request.otp, request.photos, Utc::now())
        .await
        .map_err(reject)?;

    Ok(Json(json!({
        "booking": outcome.booking,
        "depositRefund": outcome.deposit_refund,
        "payout": outcome.payout,
        "latePenalty": outcome.late_penalty,
    })))
}

/// Renter-initiated cancellation on the time-based schedule
pub async fn cancel_by_user(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> HandlerResult {
    let outcome = state
        .engine
        .cancel_by_user(booking_id, Utc::now())
        .await
        .map_err(reject)?;

    Ok(Json(json!({
        "booking": outcome.booking,
        "refund": outcome.refund,
    })))
}

/// Owner-initiated cancellation: full refund, compensation coupon,
/// penalty
pub async fn cancel_by_owner(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> HandlerResult {
    let outcome = state
        .engine
        .cancel_by_owner(booking_id, Utc::now())
        .await
        .map_err(reject)?;

    Ok(Json(json!({
        "booking": outcome.booking,
        "refund": outcome.refund,
        "penalty": outcome.penalty,
        "compensationCoupon": outcome.compensation_coupon,
    })))
}

/// Claim a pending refund with a payout destination
pub async fn claim_refund(
    State(state): State<Arc<AppState>>,
    Path(refund_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> HandlerResult {
    let refund = state
        .engine
        .refunds()
        .claim(refund_id, &request.destination)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "refund": refund })))
}

/// External settlement confirmation for a claimed refund
pub async fn settle_refund(
    State(state): State<Arc<AppState>>,
    Path(refund_id): Path<Uuid>,
) -> HandlerResult {
    let refund = state
        .engine
        .refunds()
        .settle(refund_id)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "refund": refund })))
}

/// Claim a pending payout with a payout destination
pub async fn claim_payout(
    State(state): State<Arc<AppState>>,
    Path(payout_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> HandlerResult {
    let payout = state
        .engine
        .payouts()
        .claim(payout_id, &request.destination)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "payout": payout })))
}

/// External settlement confirmation for a claimed payout
pub async fn settle_payout(
    State(state): State<Arc<AppState>>,
    Path(payout_id): Path<Uuid>,
) -> HandlerResult {
    let payout = state
        .engine
        .payouts()
        .settle(payout_id)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "payout": payout })))
}

/// Create a gateway order for an unpaid penalty
pub async fn begin_penalty_payment(
    State(state): State<Arc<AppState>>,
    Path(penalty_id): Path<Uuid>,
) -> HandlerResult {
    let order = state
        .engine
        .penalties()
        .begin_payment(penalty_id)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "order": order })))
}

/// Mark a penalty paid after verified payment
pub async fn pay_penalty(
    State(state): State<Arc<AppState>>,
    Path(penalty_id): Path<Uuid>,
    Json(request): Json<PayPenaltyRequest>,
) -> HandlerResult {
    let penalty = state
        .engine
        .penalties()
        .complete_payment(penalty_id, &request.payment)
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "penalty": penalty })))
}

/// Record a damage charge decided by external adjudication
pub async fn record_damage(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordDamageRequest>,
) -> HandlerResult {
    let amount = Money::new(request.amount).map_err(reject)?;
    let penalty = state
        .engine
        .penalties()
        .record_damage(request.booking_id, amount, Utc::now())
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "penalty": penalty })))
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

/// Push handover photo bytes to the evidence store and get back the
/// secure URL to reference in pickup/drop confirmations
pub async fn upload_evidence(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> HandlerResult {
    let secure_url = state
        .uploader
        .upload(&params.filename, body.to_vec())
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "secureUrl": secure_url })))
}

/// Health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> HandlerResult {
    state
        .database
        .health_check()
        .await
        .map_err(reject)?;

    Ok(Json(json!({ "status": "ok" })))
}

/// System status summary
pub async fn system_status(State(state): State<Arc<AppState>>) -> HandlerResult {
    let killswitch = state.is_killswitch_active().await;
    let database_ok = state.database.health_check().await.is_ok();

    Ok(Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "currency": state.config.marketplace.currency,
        "killswitch": killswitch,
        "database": if database_ok { "ok" } else { "unavailable" },
    })))
}

/// Toggle the killswitch
pub async fn toggle_killswitch(State(state): State<Arc<AppState>>) -> HandlerResult {
    let mut killswitch = state.killswitch.write().await;
    *killswitch = !*killswitch;

    tracing::warn!(active = *killswitch, "Killswitch toggled");
    Ok(Json(json!({ "active": *killswitch })))
}
