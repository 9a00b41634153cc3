//! Line classifier: decides whether one line (or one joined table row) is a
//! reporting-entity header, a transaction record, or neither.
//!
//! Everything here is a pure function of the line and the heuristics switches.
//! The detection log lives with the strategies that drive the classifier.

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::ExtractConfig;
use crate::model::{round2, EntityHeader, EntityTotals, TransactionLine, NOT_AVAILABLE};

/// Labels whose presence makes a line a header candidate.
pub const HEADER_KEYWORDS: &[&str] = &[
    "Name of Deductor",
    "Total Amount Paid / Credited",
    "Total TDS Deposited",
    "Total Tax Deducted",
    "TAN of Deductor",
];

/// A transaction row never carries any of these.
pub const ROW_REJECT_KEYWORDS: &[&str] = &[
    "Name of Deductor",
    "TAN of Deductor",
    "Total Amount Paid",
    "Total TDS Deposited",
    "Total Tax Deducted",
    "Sr. No.",
    "Section",
];

/// Lookahead in the text strategy never crosses a line carrying one of these.
pub const LOOKAHEAD_STOP_KEYWORDS: &[&str] = &["Name of Deductor", "TAN of Deductor", "Total Amount"];

/// Looser header trigger used by the enhanced text scan.
pub const ENHANCED_HEADER_TRIGGERS: &[&str] = &["TAN of Deductor", "Name of Deductor"];

pub fn contains_any(line: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| line.contains(k))
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

lazy_static! {
    /// Deductor format (AAAA99999A) or the ten-character AAAAA9999A format.
    static ref RE_ENTITY_ID: Regex = pattern(r"[A-Z]{4}[0-9]{5}[A-Z]|[A-Z]{5}[0-9]{4}[A-Z]");
    static ref RE_SECTION: Regex = pattern(r"19[0-9]{1,2}[A-Z]?");
    static ref RE_DATE: Regex = pattern(r"\d{2}-[A-Za-z]{3}-\d{4}");
    static ref RE_GROUPED_AMOUNT: Regex = pattern(r"-?[\d,]+\.\d{2}");
    static ref RE_PLAIN_AMOUNT: Regex = pattern(r"-?\d+\.\d{2}");
    static ref RE_LONE_HYPHEN: Regex = pattern(r"\s-\s");
    static ref RE_ISOLATED_CAPITAL: Regex = pattern(r"\s([A-Z])\s");
    static ref RE_TOTAL_TOKEN: Regex = pattern(r"\d+\.?\d{0,2}");

    // Entity name cleanup
    static ref RE_LEADING_SERIAL: Regex = pattern(r"^\d+\s*");
    static ref RE_SERIAL_LABEL: Regex = pattern(r"(?i)^Sr\.?\s*No\.?\s*");
    static ref RE_NAME_LABEL: Regex = pattern(r"(?i)Name of Deductor\s*[:.]*\s*");
    static ref RE_TAN_LABEL: Regex = pattern(r"(?i)TAN of Deductor\s*[:.]*\s*");
    static ref RE_LABELLED_NAME: Regex = pattern(r"(?i)Name of Deductor\s*[:.]*\s*(.+)");
    static ref RE_WHITESPACE: Regex = pattern(r"\s+");
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern compiles")
}

pub(crate) fn collapse_whitespace(s: &str) -> String {
    RE_WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// First entity tax-id on the line, if any.
pub fn find_entity_id(line: &str) -> Option<&str> {
    RE_ENTITY_ID.find(line).map(|m| m.as_str())
}

/// Commas stripped; an unparseable token counts as zero.
fn parse_amount(token: &str) -> f64 {
    token.replace(',', "").parse::<f64>().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LineClassifier {
    hyphen_means_zero: bool,
    isolated_capital_status: bool,
    default_status: char,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(&ExtractConfig::default())
    }
}

impl LineClassifier {
    pub fn new(config: &ExtractConfig) -> Self {
        Self {
            hyphen_means_zero: config.heuristics.hyphen_means_zero,
            isolated_capital_status: config.heuristics.isolated_capital_status,
            default_status: config.default_status_char(),
        }
    }

    /// Header test. A line is a header if it carries an entity tax-id or any
    /// header keyword. Totals are only read when a tax-id is present.
    pub fn header(&self, line: &str) -> Option<EntityHeader> {
        let line = line.trim();
        let id_match = RE_ENTITY_ID.find(line);

        if id_match.is_none() && !contains_any(line, HEADER_KEYWORDS) {
            return None;
        }

        let Some(m) = id_match else {
            return Some(EntityHeader {
                name: NOT_AVAILABLE.to_string(),
                tax_id: None,
                totals: EntityTotals::default(),
            });
        };

        let tax_id = m.as_str().to_string();
        let name = name_before(line, m.start())
            .or_else(|| labelled_name(line))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Some(EntityHeader {
            name,
            tax_id: Some(tax_id),
            totals: trailing_totals(line),
        })
    }

    /// Transaction test: rejects any line carrying a header keyword, then
    /// runs the field parser.
    pub fn transaction(&self, line: &str) -> Option<TransactionLine> {
        let line = line.trim();
        if contains_any(line, ROW_REJECT_KEYWORDS) {
            return None;
        }
        self.parse_transaction(line)
    }

    /// Cheap membership check used by the enhanced text scan.
    pub fn has_section_and_date(&self, line: &str) -> bool {
        RE_SECTION.is_match(line) && RE_DATE.is_match(line)
    }

    /// Field parser without the keyword rejection.
    pub fn parse_transaction(&self, line: &str) -> Option<TransactionLine> {
        let line = line.trim();

        let section = RE_SECTION.find(line)?.as_str().to_string();

        let mut dates = RE_DATE.find_iter(line);
        let transaction_date = dates.next()?.as_str().to_string();
        let booking_date = dates
            .next()
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let amounts = self.amounts(line)?;
        let gross = round2(amounts[0]);
        let tax = round2(amounts[1]);
        let deposit = round2(amounts.get(2).copied().unwrap_or(amounts[1]));

        let rate = if gross != 0.0 { tax / gross * 100.0 } else { 0.0 };

        Some(TransactionLine {
            section,
            transaction_date,
            status: self.status(line).to_string(),
            booking_date,
            gross_amount: gross,
            tax_amount: tax,
            deposit_amount: deposit,
            net_amount: round2(gross - deposit),
            rate: round2(rate),
        })
    }

    /// Two-decimal amounts in reading order, with the lone-hyphen zero rule as
    /// the last resort. Fewer than two amounts and no hyphen rejects the line.
    fn amounts(&self, line: &str) -> Option<Vec<f64>> {
        let grouped: Vec<&str> = RE_GROUPED_AMOUNT.find_iter(line).map(|m| m.as_str()).collect();
        let tokens = if grouped.len() >= 2 {
            grouped
        } else {
            let plain: Vec<&str> = RE_PLAIN_AMOUNT.find_iter(line).map(|m| m.as_str()).collect();
            if plain.len() >= 2 {
                plain
            } else if self.hyphen_means_zero && RE_LONE_HYPHEN.is_match(line) {
                return Some(vec![0.0; 3]);
            } else {
                return None;
            }
        };

        Some(tokens.into_iter().map(parse_amount).collect())
    }

    fn status(&self, line: &str) -> char {
        if !self.isolated_capital_status {
            return self.default_status;
        }
        let padded = format!(" {line} ");
        RE_ISOLATED_CAPITAL
            .captures(&padded)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().chars().next())
            .unwrap_or(self.default_status)
    }
}

/// Entity name from the text ahead of the tax-id, or `None` if what is left
/// after stripping serial markers and labels is too short to be a name.
fn name_before(line: &str, id_start: usize) -> Option<String> {
    if id_start == 0 {
        return None;
    }
    let before = line[..id_start].trim();
    let s = RE_LEADING_SERIAL.replace(before, "");
    let s = RE_SERIAL_LABEL.replace(&s, "");
    let s = RE_LEADING_SERIAL.replace(&s, "");
    let s = RE_NAME_LABEL.replace_all(&s, "");
    let s = RE_TAN_LABEL.replace_all(&s, "");
    let name = collapse_whitespace(&s);

    (name.chars().count() > 2).then_some(name)
}

/// `Name of Deductor: <name>` anywhere on the line, cut at the tax-id.
fn labelled_name(line: &str) -> Option<String> {
    let caps = RE_LABELLED_NAME.captures(line)?;
    let mut rest = caps.get(1)?.as_str();
    if let Some(m) = RE_ENTITY_ID.find(rest) {
        rest = &rest[..m.start()];
    }
    let rest = RE_TAN_LABEL.replace_all(rest, "");
    let rest = RE_LEADING_SERIAL.replace(&rest, "");
    let name = collapse_whitespace(&rest);

    (name.chars().count() > 2).then_some(name)
}

/// Last three numeric tokens on the line, commas stripped first.
fn trailing_totals(line: &str) -> EntityTotals {
    let stripped = line.replace(',', "");
    let tokens: Vec<f64> = RE_TOTAL_TOKEN
        .find_iter(&stripped)
        .map(|m| parse_amount(m.as_str()))
        .collect();

    if tokens.len() < 3 {
        return EntityTotals::default();
    }

    let last = &tokens[tokens.len() - 3..];
    EntityTotals {
        gross: round2(last[0]),
        tax: round2(last[1]),
        deposited: round2(last[2]),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
