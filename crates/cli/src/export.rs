//! CSV rendering of extracted transactions.

use std::io::Write;

use form26as_extract::TransactionRecord;
use serde::Serialize;

use crate::CliError;

const HEADER: [&str; 13] = [
    "Sr.No",
    "Name of Deductor",
    "TAN of Deductor",
    "Section",
    "Transaction Date",
    "Status of Booking",
    "Date of Booking",
    "Amount Paid / Credited",
    "Tax Deducted",
    "TDS Deposited",
    "Net Amount",
    "Rate %",
    "PDF Page No",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Sr.No")]
    serial: usize,
    #[serde(rename = "Name of Deductor")]
    entity_name: &'a str,
    #[serde(rename = "TAN of Deductor")]
    entity_tax_id: &'a str,
    #[serde(rename = "Section")]
    section: &'a str,
    #[serde(rename = "Transaction Date")]
    transaction_date: &'a str,
    #[serde(rename = "Status of Booking")]
    status: &'a str,
    #[serde(rename = "Date of Booking")]
    booking_date: &'a str,
    #[serde(rename = "Amount Paid / Credited")]
    gross: String,
    #[serde(rename = "Tax Deducted")]
    tax: String,
    #[serde(rename = "TDS Deposited")]
    deposited: String,
    #[serde(rename = "Net Amount")]
    net: String,
    #[serde(rename = "Rate %")]
    rate: String,
    #[serde(rename = "PDF Page No")]
    page: usize,
}

impl<'a> From<&'a TransactionRecord> for CsvRow<'a> {
    fn from(r: &'a TransactionRecord) -> Self {
        Self {
            serial: r.serial_number,
            entity_name: &r.entity_name,
            entity_tax_id: &r.entity_tax_id,
            section: &r.section,
            transaction_date: &r.transaction_date,
            status: &r.status,
            booking_date: &r.booking_date,
            gross: format!("{:.2}", r.gross_amount),
            tax: format!("{:.2}", r.tax_amount),
            deposited: format!("{:.2}", r.deposit_amount),
            net: format!("{:.2}", r.net_amount),
            rate: format!("{:.2}", r.rate),
            page: r.page_number,
        }
    }
}

/// Write one CSV row per record. The header is always written.
pub fn write_csv<W: Write>(records: &[TransactionRecord], writer: W) -> Result<(), CliError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    // serialize() only emits the header alongside the first row
    if records.is_empty() {
        csv_writer
            .write_record(HEADER)
            .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    }

    for record in records {
        csv_writer
            .serialize(CsvRow::from(record))
            .map_err(|e| CliError::io(format!("CSV write error: {e}")))?;
    }

    csv_writer
        .flush()
        .map_err(|e| CliError::io(format!("CSV flush error: {e}")))?;
    Ok(())
}
