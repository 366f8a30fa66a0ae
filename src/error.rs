use crate::domain::payment::{OrderId, PaymentId};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Which lookup key a missing payment was addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentRef {
    Id(PaymentId),
    Order(OrderId),
}

impl fmt::Display for PaymentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentRef::Id(id) => write!(f, "Payment with id [{id}]"),
            PaymentRef::Order(order_id) => write!(f, "Payment for order [{order_id}]"),
        }
    }
}

/// Failures reported by a `PaymentStore` implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: a payment for order {order_id} is already stored")]
    UniqueConstraintViolation { order_id: OrderId },
    #[error("Payment {0} is not stored")]
    MissingRow(PaymentId),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Stored data corrupted: {0}")]
    Corrupted(String),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::Unavailable(err.into_string())
    }
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// The caller already has a payment for this order; `payment_id` names it.
    #[error("Payment already exists for order {order_id}")]
    AlreadyExists {
        order_id: OrderId,
        payment_id: PaymentId,
    },
    #[error("{0} not found.")]
    NotFound(PaymentRef),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}
