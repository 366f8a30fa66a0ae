//! Application layer containing the payment lifecycle orchestration.
//!
//! `PaymentService` is the lifecycle manager: idempotent creation, the
//! conditional and unconditional status transitions, and the bulk expiry
//! primitive. `CleanupSweeper` drives that primitive on a timer, and
//! `CachedPaymentService` puts a read cache in front of the service.

pub mod cache;
pub mod lifecycle;
pub mod sweeper;
