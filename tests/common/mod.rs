#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paymentsvc::domain::payment::{Amount, OrderId, Payment, PaymentId, PaymentStatus};
use paymentsvc::domain::ports::{PaymentStore, StoreResult};
use paymentsvc::error::StoreError;
use paymentsvc::infrastructure::in_memory::InMemoryPaymentStore;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

pub fn payment_created_at(created_on: DateTime<Utc>) -> Payment {
    Payment::new(
        Uuid::new_v4(),
        Amount::new(dec!(10.00)).unwrap(),
        "CARD".to_string(),
        created_on,
    )
}

/// Writes a command file with one `create` per row, each for a fresh order.
pub fn generate_commands_csv(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["type", "order", "amount", "method", "status"])?;

    for i in 1..=rows {
        let order = Uuid::new_v4().to_string();
        let amount = format!("{i}.50");
        wtr.write_record(["create", order.as_str(), amount.as_str(), "CARD", ""])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Delegates to an in-memory store and counts writes.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryPaymentStore,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    bulk_updates: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn bulk_updates(&self) -> usize {
        self.bulk_updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStore for CountingStore {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool> {
        self.inner.exists_by_order_id(order_id).await
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(payment).await
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(payment).await
    }

    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()> {
        self.bulk_updates.fetch_add(1, Ordering::SeqCst);
        self.inner.bulk_update(payments).await
    }

    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        self.inner.find_all(status, created_before).await
    }
}

/// Holds the first `find_by_id` after it has read the row, until the test
/// calls `release`. Lets a write land between a read and its use.
#[derive(Default)]
pub struct PausingReadStore {
    pub inner: InMemoryPaymentStore,
    paused: AtomicBool,
    read_done: Notify,
    release: Notify,
}

impl PausingReadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once the paused read has fetched its row.
    pub async fn wait_for_read(&self) {
        self.read_done.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl PaymentStore for PausingReadStore {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        let found = self.inner.find_by_id(id).await?;
        if !self.paused.swap(true, Ordering::SeqCst) {
            self.read_done.notify_one();
            self.release.notified().await;
        }
        Ok(found)
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>> {
        self.inner.find_by_order_id(order_id).await
    }

    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool> {
        self.inner.exists_by_order_id(order_id).await
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        self.inner.insert(payment).await
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        self.inner.update(payment).await
    }

    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()> {
        self.inner.bulk_update(payments).await
    }

    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        self.inner.find_all(status, created_before).await
    }
}

/// Simulates a concurrent creator slipping in between the order lookup and
/// the insert: the first `find_by_order_id` stores `competitor` and still
/// reports no payment.
pub struct RacingStore {
    pub inner: InMemoryPaymentStore,
    competitor: Mutex<Option<Payment>>,
}

impl RacingStore {
    pub fn new(competitor: Payment) -> Self {
        Self {
            inner: InMemoryPaymentStore::new(),
            competitor: Mutex::new(Some(competitor)),
        }
    }
}

#[async_trait]
impl PaymentStore for RacingStore {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>> {
        let competitor = self.competitor.lock().unwrap().take();
        if let Some(competitor) = competitor {
            self.inner.insert(competitor).await?;
            return Ok(None);
        }
        self.inner.find_by_order_id(order_id).await
    }

    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool> {
        self.inner.exists_by_order_id(order_id).await
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        self.inner.insert(payment).await
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        self.inner.update(payment).await
    }

    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()> {
        self.inner.bulk_update(payments).await
    }

    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        self.inner.find_all(status, created_before).await
    }
}

/// A store that rejects every insert as a duplicate yet never finds the
/// conflicting row.
pub struct InconsistentStore;

#[async_trait]
impl PaymentStore for InconsistentStore {
    async fn find_by_id(&self, _id: PaymentId) -> StoreResult<Option<Payment>> {
        Ok(None)
    }

    async fn find_by_order_id(&self, _order_id: OrderId) -> StoreResult<Option<Payment>> {
        Ok(None)
    }

    async fn exists_by_order_id(&self, _order_id: OrderId) -> StoreResult<bool> {
        Ok(false)
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        Err(StoreError::UniqueConstraintViolation {
            order_id: payment.order_id,
        })
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        Err(StoreError::MissingRow(payment.id))
    }

    async fn bulk_update(&self, _payments: Vec<Payment>) -> StoreResult<()> {
        Ok(())
    }

    async fn find_all(
        &self,
        _status: PaymentStatus,
        _created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        Ok(Vec::new())
    }
}

/// A store whose every call fails as if the backend were down.
pub struct UnavailableStore;

#[async_trait]
impl PaymentStore for UnavailableStore {
    async fn find_by_id(&self, _id: PaymentId) -> StoreResult<Option<Payment>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_order_id(&self, _order_id: OrderId) -> StoreResult<Option<Payment>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn exists_by_order_id(&self, _order_id: OrderId) -> StoreResult<bool> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn insert(&self, _payment: Payment) -> StoreResult<Payment> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn update(&self, _payment: Payment) -> StoreResult<Payment> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn bulk_update(&self, _payments: Vec<Payment>) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_all(
        &self,
        _status: PaymentStatus,
        _created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}
