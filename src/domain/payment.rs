use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type PaymentId = Uuid;
pub type OrderId = Uuid;

/// Represents a positive monetary amount for a payment.
///
/// Deserialization goes through `TryFrom<Decimal>`, so a stored or submitted
/// amount can never be zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "amount must be greater than 0".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Successful,
    Failed,
}

impl PaymentStatus {
    /// `Successful` and `Failed` are terminal: `process` and the cleanup
    /// sweep never move a payment out of them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Successful => "SUCCESSFUL",
            PaymentStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// The tracked record of a single order's payment attempt.
///
/// `id`, `order_id`, `amount`, `method` and `created_on` are fixed once the
/// payment exists; only `status` and `updated_on` change afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Amount,
    pub method: String,
    pub status: PaymentStatus,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Payment {
    /// Creates a fresh `Pending` payment with a newly generated id.
    pub fn new(order_id: OrderId, amount: Amount, method: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            created_on: now,
            updated_on: now,
        }
    }

    /// Overwrites the status regardless of the current one.
    pub fn set_status(&mut self, status: PaymentStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// `Pending -> Successful`. Returns `false` and leaves the payment alone
    /// for any other starting status.
    pub fn mark_successful(&mut self, now: DateTime<Utc>) -> bool {
        self.transition_from_pending(PaymentStatus::Successful, now)
    }

    /// `Pending -> Failed`, used by the cleanup sweep.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        self.transition_from_pending(PaymentStatus::Failed, now)
    }

    fn transition_from_pending(&mut self, target: PaymentStatus, now: DateTime<Utc>) -> bool {
        if self.status != PaymentStatus::Pending {
            return false;
        }
        self.set_status(target, now);
        true
    }

    // updated_on never precedes created_on, even with a skewed clock
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_on = now.max(self.created_on);
    }
}

/// Input to `PaymentService::create`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub order_id: Option<OrderId>,
    pub amount: Decimal,
    pub method: String,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPaymentRequest {
    pub order_id: OrderId,
    pub amount: Amount,
    pub method: String,
}

impl PaymentRequest {
    /// Checks every field and reports all problems in a single error.
    pub fn validate(self) -> Result<ValidPaymentRequest, PaymentError> {
        let mut problems = Vec::new();

        if self.order_id.is_none() {
            problems.push("order_id must not be null".to_string());
        }
        let amount = match Amount::new(self.amount) {
            Ok(amount) => Some(amount),
            Err(PaymentError::ValidationError(msg)) => {
                problems.push(msg);
                None
            }
            Err(other) => return Err(other),
        };
        if self.method.trim().is_empty() {
            problems.push("method must not be blank".to_string());
        }

        match (self.order_id, amount) {
            (Some(order_id), Some(amount)) if problems.is_empty() => Ok(ValidPaymentRequest {
                order_id,
                amount,
                method: self.method,
            }),
            _ => Err(PaymentError::ValidationError(problems.join(", "))),
        }
    }
}
