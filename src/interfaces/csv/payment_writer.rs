use crate::domain::payment::Payment;
use crate::error::Result;
use std::io::Write;

/// Output encoding for payments written by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV with a header row.
    #[default]
    Csv,
    /// One JSON object per line.
    Json,
}

/// Writes payments to any `Write` sink, one record per payment.
pub enum PaymentWriter<W: Write> {
    Csv(csv::Writer<W>),
    Json(W),
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W, format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => Self::Csv(csv::Writer::from_writer(sink)),
            OutputFormat::Json => Self::Json(sink),
        }
    }

    pub fn write_payment(&mut self, payment: &Payment) -> Result<()> {
        match self {
            Self::Csv(writer) => writer.serialize(payment)?,
            Self::Json(sink) => {
                serde_json::to_writer(&mut *sink, payment).map_err(std::io::Error::from)?;
                sink.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        match self {
            Self::Csv(writer) => writer.flush()?,
            Self::Json(sink) => sink.flush()?,
        }
        Ok(())
    }
}
