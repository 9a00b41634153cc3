//! Taxpayer identity from the first page's text.
//!
//! Each field walks an ordered list of pattern alternatives; the first
//! alternative that matches anywhere wins and the rest are never tried.
//! A field that nothing matches stays empty.

use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::collapse_whitespace;
use crate::model::{TaxpayerInfo, NOT_AVAILABLE};

const TAX_ID_PATTERNS: &[&str] = &[
    r"(?i)Permanent Account Number \(PAN\)\s*:\s*([A-Z]{5}[0-9]{4}[A-Z])",
    r"(?i)Permanent Account Number \(PAN\)\s*([A-Z]{5}[0-9]{4}[A-Z])",
    r"(?i)PAN\s*:\s*([A-Z]{5}[0-9]{4}[A-Z])",
    r"(?i)PAN\s*([A-Z]{5}[0-9]{4}[A-Z])",
    r"(?i)([A-Z]{5}[0-9]{4}[A-Z])\s*\(PAN\)",
];

const PERIOD_PATTERNS: &[&str] = &[
    r"(?i)Financial Year\s*:\s*(\d{4}-\d{2,4})",
    r"(?i)F\.Y\.\s*:\s*(\d{4}-\d{2,4})",
    r"(?i)Financial\s+Year\s+(\d{4}-\d{2,4})",
    r"(?i)Assessment Year\s*:\s*(\d{4}-\d{2,4})",
    r"(?i)A\.Y\.\s*:\s*(\d{4}-\d{2,4})",
    r"(?i)Financial Year\s*(\d{4}-\d{2,4})",
    r"(?i)F\.Y\.\s*(\d{4}-\d{2,4})",
];

/// Name capture stops at the next identity label (or end of text).
const NAME_PATTERNS: &[&str] = &[
    r"(?i)Name of Assessee\s*:\s*([^\n\r]+?)\s*(?:\b(?:Permanent Account Number|Financial Year|PAN|Address)\b|$)",
    r"(?i)Assessee Name\s*:\s*([^\n\r]+?)\s*(?:\b(?:Permanent Account Number|Financial Year|PAN|Address)\b|$)",
    r"(?i)Name\s*:\s*([^\n\r]+?)\s*(?:\b(?:Permanent Account Number|Financial Year|PAN|Address)\b|$)",
    r"(?i)Name of Assessee\s*([^\n\r]+?)\s*(?:\b(?:Permanent Account Number|Financial Year|PAN|Address)\b|$)",
];

/// Address capture may span lines; it stops at the next section marker.
const ADDRESS_PATTERNS: &[&str] = &[
    r"(?i)Address of Assessee\s*:\s*([^\n\r]+?(?:\n[^\n\r]+?)*)\s*(?:\b(?:PART|Details|Above data)\b|$)",
    r"(?i)Address\s*:\s*([^\n\r]+?(?:\n[^\n\r]+?)*)\s*(?:\b(?:PART|Details|Above data)\b|$)",
    r"(?i)Address of Assessee\s*([^\n\r]+?(?:\n[^\n\r]+?)*)\s*(?:\b(?:PART|Details|Above data)\b|$)",
];

const ADDRESS_LINE_KEYWORDS: &[&str] = &["Address", "ADDRESS"];

/// Minimum length for a line picked up by the address line scan.
const MIN_ADDRESS_LINE_LEN: usize = 10;

lazy_static! {
    static ref TAX_ID_RES: Vec<Regex> = compile_all(TAX_ID_PATTERNS);
    static ref PERIOD_RES: Vec<Regex> = compile_all(PERIOD_PATTERNS);
    static ref NAME_RES: Vec<Regex> = compile_all(NAME_PATTERNS);
    static ref ADDRESS_RES: Vec<Regex> = compile_all(ADDRESS_PATTERNS);

    static ref RE_EMBEDDED_TAX_ID: Regex = pattern(r"[A-Z]{5}[0-9]{4}[A-Z]");
    static ref RE_NAME_TRAILING_JUNK: Regex = pattern(r"[^A-Za-z\s&.(),-]+$");
    static ref RE_BOILERPLATE: Regex = pattern(r"(?is)Above data\s*Status of PAN is as per PAN.*");
    static ref RE_ADDRESS_DISALLOWED: Regex = pattern(r"[^A-Za-z0-9\s,.\-()]");
}

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("static pattern compiles")
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().copied().map(pattern).collect()
}

/// Group 1 of the first pattern that matches.
fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim())
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

pub fn extract_taxpayer_info(first_page_text: &str) -> TaxpayerInfo {
    let mut info = TaxpayerInfo::default();

    if let Some(tax_id) = first_capture(&TAX_ID_RES, first_page_text) {
        info.tax_id = tax_id.to_uppercase();
    }

    if let Some(raw) = first_capture(&PERIOD_RES, first_page_text) {
        info.financial_year = normalize_period(raw);
        info.assessment_year = assessment_year(raw);
    }

    if let Some(raw) = first_capture(&NAME_RES, first_page_text) {
        info.name = clean_name(raw);
    }

    if let Some(raw) = first_capture(&ADDRESS_RES, first_page_text) {
        info.address = clean_address(raw);
    }

    if info.address.is_empty() {
        if let Some(line) = address_from_lines(first_page_text) {
            info.address = line;
        }
    }

    log::debug!(
        "taxpayer: tax_id={:?} financial_year={:?} name_len={} address_len={}",
        info.tax_id,
        info.financial_year,
        info.name.len(),
        info.address.len()
    );

    info
}

/// `YYYY-YY` stays, `YYYY-YYYY` shortens to `YYYY-YY`, anything else as-is.
pub fn normalize_period(raw: &str) -> String {
    match raw.split_once('-') {
        Some((start, end)) if end.len() == 4 => format!("{start}-{}", &end[2..]),
        _ => raw.to_string(),
    }
}

/// The year after the statement's period, e.g. `2023-24` gives `2024-25`.
pub fn assessment_year(raw: &str) -> String {
    let start = raw.split('-').next().unwrap_or_default();
    match start.parse::<u32>() {
        Ok(year) => {
            let next = year + 1;
            let suffix = (next + 1).to_string();
            format!("{next}-{}", &suffix[suffix.len().saturating_sub(2)..])
        }
        Err(_) => NOT_AVAILABLE.to_string(),
    }
}

fn clean_name(raw: &str) -> String {
    let name = RE_EMBEDDED_TAX_ID.replace_all(raw, "");
    let name = collapse_whitespace(&name);
    RE_NAME_TRAILING_JUNK.replace(&name, "").trim().to_string()
}

fn clean_address(raw: &str) -> String {
    let address = RE_BOILERPLATE.replace_all(raw, "");
    let address = collapse_whitespace(&address);
    RE_ADDRESS_DISALLOWED
        .replace_all(&address, "")
        .trim()
        .to_string()
}

/// Line scan: the first non-empty line after one mentioning the address.
fn address_from_lines(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if !ADDRESS_LINE_KEYWORDS.iter().any(|k| line.contains(k)) {
            continue;
        }
        let Some(next) = lines[i + 1..].iter().map(|l| l.trim()).find(|l| !l.is_empty()) else {
            continue;
        };
        let candidate = RE_BOILERPLATE.replace_all(next, "").trim().to_string();
        if candidate.chars().count() > MIN_ADDRESS_LINE_LEN {
            return Some(candidate);
        }
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_PAGE: &str = "\
Annual Tax Statement
Permanent Account Number (PAN) : abcde1234f   Current Status of PAN : Active
Financial Year : 2023-2024   Assessment Year : 2024-25
Name of Assessee : RAVI KUMAR SHARMA
Address of Assessee : 221B, LAKE VIEW ROAD, SECTOR 4
NEW DELHI - 110001
Above data Status of PAN is as per PAN details.
PART-I - Details of Tax Deducted at Source
";

    #[test]
    fn full_first_page() {
        let info = extract_taxpayer_info(FIRST_PAGE);
        assert_eq!(info.tax_id, "ABCDE1234F");
        assert_eq!(info.financial_year, "2023-24");
        assert_eq!(info.assessment_year, "2024-25");
        assert_eq!(info.name, "RAVI KUMAR SHARMA");
        assert_eq!(info.address, "221B, LAKE VIEW ROAD, SECTOR 4 NEW DELHI - 110001");
    }

    #[test]
    fn empty_text_leaves_every_field_blank() {
        assert_eq!(extract_taxpayer_info(""), TaxpayerInfo::default());
    }

    #[test]
    fn tax_id_suffix_form() {
        let info = extract_taxpayer_info("holder ABCDE1234F (PAN)");
        assert_eq!(info.tax_id, "ABCDE1234F");
    }

    #[test]
    fn first_period_alternative_wins() {
        // "Financial Year :" outranks the assessment-year fallback even though
        // the latter appears first in the text.
        let info = extract_taxpayer_info("Assessment Year : 2025-26\nFinancial Year : 2023-24");
        assert_eq!(info.financial_year, "2023-24");
        assert_eq!(info.assessment_year, "2024-25");
    }

    #[test]
    fn period_short_form_kept() {
        assert_eq!(normalize_period("2023-24"), "2023-24");
        assert_eq!(normalize_period("2023-2024"), "2023-24");
        assert_eq!(normalize_period("2023-202"), "2023-202");
    }

    #[test]
    fn assessment_year_wraps_century_suffix() {
        assert_eq!(assessment_year("2098-99"), "2099-00");
        assert_eq!(assessment_year("20x3-24"), NOT_AVAILABLE);
    }

    #[test]
    fn name_strips_embedded_tax_id_and_trailing_junk() {
        let info = extract_taxpayer_info("Name of Assessee : MEERA NAIR ABCDE1234F 42\nAddress : x");
        assert_eq!(info.name, "MEERA NAIR");
    }

    #[test]
    fn name_boundary_respects_word_edges() {
        // "PAN" inside the name is not a boundary.
        let info = extract_taxpayer_info("Name of Assessee : SPANDANA RAO\nPAN : ABCDE1234F");
        assert_eq!(info.name, "SPANDANA RAO");
    }

    #[test]
    fn address_drops_disallowed_characters() {
        let info = extract_taxpayer_info("Address : FLAT #12/B, ROSE APTS; PUNE Details follow");
        assert_eq!(info.address, "FLAT 12B, ROSE APTS PUNE");
    }

    #[test]
    fn address_line_scan_fallback() {
        let text = "Name of Assessee : A B\nADDRESS\n\n  14 MARINE DRIVE MUMBAI  \nother";
        let info = extract_taxpayer_info(text);
        assert_eq!(info.address, "14 MARINE DRIVE MUMBAI");
    }

    #[test]
    fn address_line_scan_ignores_short_lines() {
        let text = "ADDRESS\nMUMBAI\nend";
        assert_eq!(extract_taxpayer_info(text).address, "");
    }
}
