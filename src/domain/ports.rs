use super::payment::{OrderId, Payment, PaymentId, PaymentStatus};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable keyed storage for payments.
///
/// Implementations must enforce uniqueness of `order_id`: `insert` reports a
/// second payment for the same order as `StoreError::UniqueConstraintViolation`
/// and leaves the stored row untouched.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>>;
    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>>;
    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool>;
    async fn insert(&self, payment: Payment) -> StoreResult<Payment>;
    /// Replaces a single existing row.
    async fn update(&self, payment: Payment) -> StoreResult<Payment>;
    /// Replaces every given row as one write.
    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()>;
    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>>;
}

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
