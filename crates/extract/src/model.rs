use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel for identity fields that could not be recovered.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Round to two decimals, the precision every amount is reported at.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One table row; cells may be null or blank.
pub type Row = Vec<Option<String>>;

/// One table as handed over by the extraction layer.
pub type Table = Vec<Row>;

/// Per-page output of the (external) text/table extraction layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based. Zero means "unnumbered"; sources renumber by position.
    #[serde(default)]
    pub page_number: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Page {
    pub fn text_only(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            tables: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Taxpayer + entity headers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxpayerInfo {
    pub name: String,
    pub tax_id: String,
    pub financial_year: String,
    pub address: String,
    pub assessment_year: String,
}

/// Header-level totals of a reporting entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTotals {
    pub gross: f64,
    pub tax: f64,
    pub deposited: f64,
}

/// A reporting-entity header as recognised by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityHeader {
    pub name: String,
    /// Identity key. `None` when only header keywords were present.
    pub tax_id: Option<String>,
    pub totals: EntityTotals,
}

impl EntityHeader {
    pub fn tax_id_label(&self) -> &str {
        self.tax_id.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Fields the classifier reads off a single transaction line.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLine {
    pub section: String,
    pub transaction_date: String,
    pub status: String,
    /// Empty when the line carries a single date.
    pub booking_date: String,
    pub gross_amount: f64,
    pub tax_amount: f64,
    pub deposit_amount: f64,
    pub net_amount: f64,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Table,
    Text,
    TextEnhanced,
}

impl Strategy {
    /// Both text variants count as one family when resolving duplicates.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text | Self::TextEnhanced)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Text => write!(f, "text"),
            Self::TextEnhanced => write!(f, "text_enhanced"),
        }
    }
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Provenance {
    Table { table_index: usize, row_index: usize },
    Text { line_index: usize },
    TextEnhanced { line_index: usize },
}

impl Provenance {
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Table { .. } => Strategy::Table,
            Self::Text { .. } => Strategy::Text,
            Self::TextEnhanced { .. } => Strategy::TextEnhanced,
        }
    }

    /// Positional part of the dedup key.
    pub fn position_key(&self) -> String {
        match self {
            Self::Table { table_index, row_index } => format!("table_{table_index}_row_{row_index}"),
            Self::Text { line_index } | Self::TextEnhanced { line_index } => {
                format!("line_{line_index}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Dense 1..N, assigned after deduplication. Zero until then.
    pub serial_number: usize,
    pub entity_name: String,
    pub entity_tax_id: String,
    pub section: String,
    pub transaction_date: String,
    pub status: String,
    pub booking_date: String,
    pub gross_amount: f64,
    pub tax_amount: f64,
    pub deposit_amount: f64,
    pub net_amount: f64,
    pub rate: f64,
    pub page_number: usize,
    #[serde(flatten)]
    pub provenance: Provenance,
    pub entity_total_gross: f64,
    pub entity_total_tax: f64,
    pub entity_total_deposit: f64,
}

impl TransactionRecord {
    /// Attach a classified line to the header it was collected under.
    pub fn new(
        line: TransactionLine,
        header: &EntityHeader,
        page_number: usize,
        provenance: Provenance,
    ) -> Self {
        Self {
            serial_number: 0,
            entity_name: header.name.clone(),
            entity_tax_id: header.tax_id_label().to_string(),
            section: line.section,
            transaction_date: line.transaction_date,
            status: line.status,
            booking_date: line.booking_date,
            gross_amount: line.gross_amount,
            tax_amount: line.tax_amount,
            deposit_amount: line.deposit_amount,
            net_amount: line.net_amount,
            rate: line.rate,
            page_number,
            provenance,
            entity_total_gross: header.totals.gross,
            entity_total_tax: header.totals.tax,
            entity_total_deposit: header.totals.deposited,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.provenance.strategy()
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedStatement {
    pub taxpayer_info: TaxpayerInfo,
    pub transactions: Vec<TransactionRecord>,
    pub count: usize,
}

impl ParsedStatement {
    pub fn new(taxpayer_info: TaxpayerInfo, transactions: Vec<TransactionRecord>) -> Self {
        let count = transactions.len();
        Self {
            taxpayer_info,
            transactions,
            count,
        }
    }
}

/// A header carrying a tax-id, logged as it is detected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedHeader {
    pub page_number: usize,
    pub name: String,
    pub tax_id: String,
    pub strategy: Strategy,
}

/// Per-entity rollup of the kept records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySummary {
    pub entity_name: String,
    pub entity_tax_id: String,
    pub transactions: usize,
    pub positive: usize,
    pub negative: usize,
    pub zero: usize,
    pub gross_amount: f64,
    pub tax_amount: f64,
    pub deposit_amount: f64,
}

/// Informational counters. Never feed back into the returned records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub pages: usize,
    pub header_count: usize,
    pub detected_headers: Vec<DetectedHeader>,
    pub transaction_rows: usize,
    pub empty_entities_skipped: usize,
    pub lookahead_hits: usize,
    pub fallback_used: bool,
    pub records_before_dedup: usize,
    pub duplicates_dropped: usize,
    pub replaced_by_table: usize,
    pub strategy_counts: BTreeMap<String, usize>,
    pub entities: Vec<EntitySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    /// False when the page source failed and the result is the empty shell.
    pub source_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseReport {
    pub meta: ParseMeta,
    pub statement: ParsedStatement,
    pub diagnostics: Diagnostics,
}
