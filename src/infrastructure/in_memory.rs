use crate::domain::payment::{OrderId, Payment, PaymentId, PaymentStatus};
use crate::domain::ports::{PaymentStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    payments: HashMap<PaymentId, Payment>,
    by_order: HashMap<OrderId, PaymentId>,
}

/// A thread-safe in-memory payment store.
///
/// Rows and the order-id index live behind one `RwLock`, so every call is
/// atomic and `insert` is a real check-and-set on the order id.
/// Ideal for testing or single-process deployments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn find_by_id(&self, id: PaymentId) -> StoreResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: OrderId) -> StoreResult<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_order
            .get(&order_id)
            .and_then(|id| tables.payments.get(id))
            .cloned())
    }

    async fn exists_by_order_id(&self, order_id: OrderId) -> StoreResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.by_order.contains_key(&order_id))
    }

    async fn insert(&self, payment: Payment) -> StoreResult<Payment> {
        let mut tables = self.tables.write().await;
        if tables.by_order.contains_key(&payment.order_id) {
            return Err(StoreError::UniqueConstraintViolation {
                order_id: payment.order_id,
            });
        }
        tables.by_order.insert(payment.order_id, payment.id);
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(&self, payment: Payment) -> StoreResult<Payment> {
        let mut tables = self.tables.write().await;
        match tables.payments.get_mut(&payment.id) {
            Some(row) => {
                *row = payment.clone();
                Ok(payment)
            }
            None => Err(StoreError::MissingRow(payment.id)),
        }
    }

    async fn bulk_update(&self, payments: Vec<Payment>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        // All-or-nothing: check every row before touching any of them
        if let Some(missing) = payments
            .iter()
            .find(|p| !tables.payments.contains_key(&p.id))
        {
            return Err(StoreError::MissingRow(missing.id));
        }
        for payment in payments {
            tables.payments.insert(payment.id, payment);
        }
        Ok(())
    }

    async fn find_all(
        &self,
        status: PaymentStatus,
        created_before: DateTime<Utc>,
    ) -> StoreResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.status == status && p.created_on < created_before)
            .cloned()
            .collect();
        matched.sort_by_key(|p| p.created_on);
        Ok(matched)
    }
}
