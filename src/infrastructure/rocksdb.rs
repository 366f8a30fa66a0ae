use crate::domain::payment::{OrderId, Payment, PaymentId, PaymentStatus};
use crate::domain::ports::{PaymentStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for storing payment rows keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family mapping order id to payment id; enforces order uniqueness.
pub const CF_ORDER_INDEX: &str = "order_index";

/// A persistent payment store using RocksDB.
///
/// Rows are JSON-encoded in `payments`; `order_index` backs the unique
/// constraint on the order id. A row and its index entry are always written in
/// the same `WriteBatch`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // serializes the check-then-put of insert
    insert_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("payments" and "order_index") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_order_index = ColumnFamilyDescriptor::new(CF_ORDER_INDEX, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments, cf_order_index])?;

        Ok(Self {
            db: Arc::new(db),
            insert_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Unavailable(format!("{name} column family not found")))
    }

    fn get_payment(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn payment_id_for_order(&self, order_id: OrderId) -> StoreResult<Option<PaymentId>> {
        let cf = self.cf(CF_ORDER_INDEX)?;
        match self.db.get_pinned_cf(cf, order_id.as_bytes())? {
            Some(bytes) => Uuid::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Corrupted(format!("Invalid order index entry: {e}"))),
            None => Ok(None),
        }
    }

    fn contains_payment(&self, id: PaymentId) -> StoreResult<bool> {
        let cf = self.cf(CF_PAYMENTS)?;
        Ok(self.db.get_pinned_cf(cf, id.as_bytes())?.is_some())
    }
}

fn encode(payment: &Payment) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(payment)
        .map_err(|e| StoreError::Corrupted(format!("Serialization error: {e}")))
}

fn decode(bytes: &[u8]) -> StoreResult<Payment> {
    serde_json::from_slice(bytes)
        .map_err(|e| StoreError::Corrupted(format!("Deserialization error: {e}")))
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        self.get_payment(id)
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>> {
        match self.payment_id_for_order(order_id)? {
            Some(id) => self.get_payment(id),
            None => Ok(None),
        }
    }

    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool> {
        let cf = self.cf(CF_ORDER_INDEX)?;
        Ok(self.db.get_pinned_cf(cf, order_id.as_bytes())?.is_some())
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        let _guard = self.insert_guard.lock();

        if self.payment_id_for_order(payment.order_id)?.is_some() {
            return Err(StoreError::UniqueConstraintViolation {
                order_id: payment.order_id,
            });
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_PAYMENTS)?, payment.id.as_bytes(), encode(&payment)?);
        batch.put_cf(
            self.cf(CF_ORDER_INDEX)?,
            payment.order_id.as_bytes(),
            payment.id.as_bytes(),
        );
        self.db.write(batch)?;

        Ok(payment)
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        if !self.contains_payment(payment.id)? {
            return Err(StoreError::MissingRow(payment.id));
        }
        let cf = self.cf(CF_PAYMENTS)?;
        self.db.put_cf(cf, payment.id.as_bytes(), encode(&payment)?)?;
        Ok(payment)
    }

    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()> {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut batch = WriteBatch::default();
        for payment in &payments {
            if !self.contains_payment(payment.id)? {
                return Err(StoreError::MissingRow(payment.id));
            }
            batch.put_cf(cf, payment.id.as_bytes(), encode(payment)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut matched = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let payment = decode(&value)?;
            if payment.status == status && payment.created_on < created_before {
                matched.push(payment);
            }
        }

        matched.sort_by_key(|p| p.created_on);
        Ok(matched)
    }
}
