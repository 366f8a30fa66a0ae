use crate::domain::payment::{OrderId, PaymentStatus};
use crate::error::{PaymentError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Process,
    Update,
    Get,
}

/// One row of a command file: `type, order, amount, method, status`.
///
/// Commands other than `create` address the payment through its order id.
/// The amount stays textual here so its scale survives (`9.90` is not `9.9`).
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub r#type: CommandType,
    #[serde(default)]
    pub order: Option<OrderId>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
}

/// Reads payment commands from a CSV source.
///
/// Wraps `csv::Reader`, trimming whitespace and accepting short rows.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
