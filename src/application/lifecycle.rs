use crate::domain::payment::{OrderId, Payment, PaymentId, PaymentRequest, PaymentStatus};
use crate::domain::ports::PaymentStoreRef;
use crate::error::{PaymentError, PaymentRef, Result, StoreError};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// The payment lifecycle manager.
///
/// `PaymentService` owns the status state machine and the write protocols
/// around it. It holds no state besides the store handle; every call is an
/// independent request and all cross-request coordination is left to the
/// store's unique order-id constraint.
pub struct PaymentService {
    store: PaymentStoreRef,
}

impl PaymentService {
    /// Creates a new `PaymentService` over the given store.
    pub fn new(store: PaymentStoreRef) -> Self {
        Self { store }
    }

    /// Creates the payment for an order.
    ///
    /// A payment that already exists for the order is reported as
    /// `AlreadyExists`. If a concurrent caller inserts one between the lookup
    /// and our insert, the store rejects ours and the winner's payment is
    /// returned instead, so every caller ends up with the same payment.
    pub async fn create(&self, request: PaymentRequest) -> Result<Payment> {
        let request = request.validate()?;
        let order_id = request.order_id;

        info!(
            %order_id,
            amount = %request.amount,
            method = %request.method,
            "Creating payment"
        );

        if let Some(existing) = self.store.find_by_order_id(order_id).await? {
            warn!(%order_id, payment_id = %existing.id, "Payment already exists for order");
            return Err(PaymentError::AlreadyExists {
                order_id,
                payment_id: existing.id,
            });
        }

        let payment = Payment::new(order_id, request.amount, request.method, Utc::now());

        match self.store.insert(payment).await {
            Ok(saved) => {
                info!(payment_id = %saved.id, %order_id, "Payment created");
                Ok(saved)
            }
            Err(violation @ StoreError::UniqueConstraintViolation { .. }) => {
                warn!(%order_id, "Lost creation race, loading the stored payment");
                match self.store.find_by_order_id(order_id).await? {
                    Some(existing) => {
                        info!(
                            payment_id = %existing.id,
                            %order_id,
                            "Returning existing payment instead of creating a new one"
                        );
                        Ok(existing)
                    }
                    None => Err(violation.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: PaymentId) -> Result<Payment> {
        debug!(payment_id = %id, "Fetching payment");
        self.load(id).await
    }

    pub async fn get_by_order_id(&self, order_id: OrderId) -> Result<Payment> {
        debug!(%order_id, "Fetching payment for order");
        self.store.find_by_order_id(order_id).await?.ok_or_else(|| {
            warn!(%order_id, "Payment for order not found");
            PaymentError::NotFound(PaymentRef::Order(order_id))
        })
    }

    /// Overwrites the status of a payment.
    ///
    /// Unlike `process` this does not consult the state machine: a terminal
    /// status can be replaced by any other status.
    pub async fn update_status(&self, id: PaymentId, status: PaymentStatus) -> Result<Payment> {
        info!(payment_id = %id, %status, "Updating payment status");

        let mut payment = self.load(id).await?;
        if payment.status.is_terminal() && payment.status != status {
            warn!(
                payment_id = %id,
                from = %payment.status,
                to = %status,
                "Overwriting terminal payment status"
            );
        }
        payment.set_status(status, Utc::now());

        let saved = self.store.update(payment).await?;
        info!(payment_id = %saved.id, status = %saved.status, "Payment status updated");
        Ok(saved)
    }

    /// Marks a pending payment as successful.
    ///
    /// Any other status is left as it is and the payment is returned without
    /// a write, so repeating the call is harmless.
    pub async fn process(&self, id: PaymentId) -> Result<Payment> {
        info!(payment_id = %id, "Processing payment");

        let mut payment = self.load(id).await?;
        if !payment.mark_successful(Utc::now()) {
            warn!(
                payment_id = %id,
                status = %payment.status,
                "Payment not processed, only PENDING payments change"
            );
            return Ok(payment);
        }

        let saved = self.store.update(payment).await?;
        info!(payment_id = %id, "Payment processed successfully");
        Ok(saved)
    }

    /// Fails every payment still `Pending` that was created before `cutoff`.
    ///
    /// All matches share one `updated_on` and are written with a single bulk
    /// update. Nothing is written when no payment matches. Returns the number
    /// of payments failed.
    pub async fn fail_pending_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut stale = self
            .store
            .find_all(PaymentStatus::Pending, cutoff)
            .await?;

        if stale.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        stale.retain_mut(|payment| payment.expire(now));
        let expired = stale.len();
        self.store.bulk_update(stale).await?;
        Ok(expired)
    }

    async fn load(&self, id: PaymentId) -> Result<Payment> {
        self.store.find_by_id(id).await?.ok_or_else(|| {
            warn!(payment_id = %id, "Payment not found");
            PaymentError::NotFound(PaymentRef::Id(id))
        })
    }
}
