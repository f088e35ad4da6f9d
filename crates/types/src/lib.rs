//! Shared types for the Wheelbase booking and settlement engine
//!
//! This crate contains all the shared domain types used across the
//! marketplace components: cars, bookings, coupons, refunds, penalties,
//! payouts and the error taxonomy they share.

pub mod booking;
pub mod car;
pub mod coupon;
pub mod error;
pub mod gateway;
pub mod money;
pub mod pricing;
pub mod settlement;

// Re-export commonly used types
pub use booking::*;
pub use car::*;
pub use coupon::*;
pub use error::{
    ConfigError, CouponError, GatewayCallError, Result, StorageError, WheelbaseError,
};
pub use gateway::*;
pub use money::Money;
pub use pricing::*;
pub use settlement::*;
