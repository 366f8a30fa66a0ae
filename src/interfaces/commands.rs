use super::csv::command_reader::{Command, CommandType};
use crate::application::cache::CachedPaymentService;
use crate::domain::payment::{OrderId, Payment, PaymentRequest};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Executes one command against the lifecycle manager and returns the
/// resulting payment.
pub async fn execute(service: &CachedPaymentService, command: Command) -> Result<Payment> {
    match command.r#type {
        CommandType::Create => {
            let request = PaymentRequest {
                order_id: command.order,
                amount: parse_amount(command.amount.as_deref())?,
                method: command.method.unwrap_or_default(),
            };
            service.create(request).await
        }
        CommandType::Process => {
            let payment = service.get_by_order_id(require_order(command.order)?).await?;
            service.process(payment.id).await
        }
        CommandType::Update => {
            let status = command.status.ok_or_else(|| {
                PaymentError::ValidationError("status must not be null".to_string())
            })?;
            let payment = service.get_by_order_id(require_order(command.order)?).await?;
            service.update_status(payment.id, status).await
        }
        CommandType::Get => service.get_by_order_id(require_order(command.order)?).await,
    }
}

fn require_order(order: Option<OrderId>) -> Result<OrderId> {
    order.ok_or_else(|| PaymentError::ValidationError("order_id must not be null".to_string()))
}

fn parse_amount(raw: Option<&str>) -> Result<Decimal> {
    let raw = raw.ok_or_else(|| PaymentError::ValidationError("amount must not be null".to_string()))?;
    Decimal::from_str(raw)
        .map_err(|e| PaymentError::ValidationError(format!("amount '{raw}' is not a decimal: {e}")))
}
