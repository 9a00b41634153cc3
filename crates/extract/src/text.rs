//! Page-text strategies: the primary line state machine and the looser
//! enhanced variant used as the fallback merge source.

use crate::classify::{
    contains_any, find_entity_id, LineClassifier, ENHANCED_HEADER_TRIGGERS, LOOKAHEAD_STOP_KEYWORDS,
};
use crate::context::{EntityContext, ScanState};
use crate::model::{Diagnostics, Page, Provenance};

/// Shared per-run inputs of the text scans.
#[derive(Debug, Clone, Copy)]
pub struct TextScan<'a> {
    pub classifier: &'a LineClassifier,
    pub lookahead_lines: usize,
}

impl<'a> TextScan<'a> {
    pub fn new(classifier: &'a LineClassifier, lookahead_lines: usize) -> Self {
        Self {
            classifier,
            lookahead_lines,
        }
    }

    /// Primary scan of one page's text. `ctx` carries the open entity across
    /// pages and across table-driven pages of the same run.
    pub fn scan_page(&self, page: &Page, ctx: &mut EntityContext, diag: &mut Diagnostics) {
        let lines: Vec<&str> = page.text.split('\n').collect();

        let mut i = 0;
        while i < lines.len() {
            if ctx.state == ScanState::Closed {
                ctx.state = ScanState::AwaitingHeader;
            }

            let line = lines[i].trim();
            if line.is_empty() {
                i += 1;
                continue;
            }

            match ctx.state {
                ScanState::AwaitingHeader => {
                    if let Some(header) = self.classifier.header(line) {
                        ctx.record_header(&header, page.page_number, diag);
                        ctx.open(header, page.page_number, diag);
                    }
                }
                ScanState::InsideHeader | ScanState::InsideTable => {
                    if let Some(header) = self.classifier.header(line) {
                        ctx.record_header(&header, page.page_number, diag);
                        if header.tax_id.is_some() && ctx.is_new_entity(&header) {
                            ctx.open(header, page.page_number, diag);
                            i += 1;
                            continue;
                        }
                    }

                    if let Some(tx) = self.classifier.transaction(line) {
                        ctx.push(tx, page.page_number, Provenance::Text { line_index: i }, diag);
                    } else if ctx.state == ScanState::InsideTable {
                        if let Some(skip) = self.look_ahead(&lines, i, page.page_number, ctx, diag) {
                            i += skip;
                        }
                    }
                }
                ScanState::Closed => {}
            }

            i += 1;
        }
    }

    /// Peek at the next `lookahead_lines` lines for a transaction. The first
    /// hit is appended and its offset returned so the cursor can jump past it.
    fn look_ahead(
        &self,
        lines: &[&str],
        i: usize,
        page_number: usize,
        ctx: &mut EntityContext,
        diag: &mut Diagnostics,
    ) -> Option<usize> {
        for k in 1..=self.lookahead_lines {
            let Some(next) = lines.get(i + k) else {
                break;
            };
            let next = next.trim();
            if next.is_empty() || contains_any(next, LOOKAHEAD_STOP_KEYWORDS) {
                continue;
            }
            if let Some(tx) = self.classifier.transaction(next) {
                log::debug!("page {page_number}: lookahead hit at line {} (+{k})", i + k);
                diag.lookahead_hits += 1;
                ctx.push(tx, page_number, Provenance::Text { line_index: i + k }, diag);
                return Some(k);
            }
        }
        None
    }

    /// Enhanced scan of one page. Entities open on a trigger keyword plus a
    /// tax-id; rows only need a section code and a date to be parsed.
    pub fn scan_page_enhanced(&self, page: &Page, ctx: &mut EntityContext, diag: &mut Diagnostics) {
        for (i, raw) in page.text.split('\n').enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if contains_any(line, ENHANCED_HEADER_TRIGGERS) {
                if find_entity_id(line).is_some() {
                    if let Some(header) = self.classifier.header(line) {
                        ctx.record_header(&header, page.page_number, diag);
                        if ctx.is_new_entity(&header) {
                            ctx.open(header, page.page_number, diag);
                        }
                    }
                }
                continue;
            }

            if ctx.is_open() && self.classifier.has_section_and_date(line) {
                if let Some(tx) = self.classifier.parse_transaction(line) {
                    ctx.push(tx, page.page_number, Provenance::TextEnhanced { line_index: i }, diag);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Strategy, TransactionRecord};

    fn primary(pages: &[Page], lookahead: usize) -> (Vec<TransactionRecord>, Diagnostics) {
        let classifier = LineClassifier::default();
        let scan = TextScan::new(&classifier, lookahead);
        let mut diag = Diagnostics::default();
        let mut ctx = EntityContext::new(Strategy::Text);
        for page in pages {
            scan.scan_page(page, &mut ctx, &mut diag);
        }
        (ctx.finish(&mut diag), diag)
    }

    fn enhanced(pages: &[Page]) -> (Vec<TransactionRecord>, Diagnostics) {
        let classifier = LineClassifier::default();
        let scan = TextScan::new(&classifier, 3);
        let mut diag = Diagnostics::default();
        let mut ctx = EntityContext::new(Strategy::TextEnhanced);
        for page in pages {
            scan.scan_page_enhanced(page, &mut ctx, &mut diag);
        }
        (ctx.finish(&mut diag), diag)
    }

    const TWO_ENTITIES: &str = "\
1 ACME INFRA PRIVATE LIMITED MUMA12345B 3,000.00 300.00 300.00
1 194C 01-Apr-2023 F 05-May-2023 1,000.00 100.00 100.00
2 194C 15-Apr-2023 F 05-May-2023 2,000.00 200.00 200.00

2 GLOBEX TRADING CO DELG01234C 500.00 50.00 50.00
1 194J 10-Jun-2023 F 12-Jul-2023 500.00 50.00 50.00
";

    #[test]
    fn groups_rows_under_their_entity() {
        let (records, diag) = primary(&[Page::text_only(1, TWO_ENTITIES)], 3);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].entity_name, "ACME INFRA PRIVATE LIMITED");
        assert_eq!(records[1].entity_tax_id, "MUMA12345B");
        assert_eq!(records[2].entity_tax_id, "DELG01234C");
        assert_eq!(records[2].section, "194J");
        assert_eq!(records[0].provenance, Provenance::Text { line_index: 1 });
        assert_eq!(diag.header_count, 2);
        assert_eq!(diag.detected_headers[1].tax_id, "DELG01234C");
    }

    #[test]
    fn same_tax_id_does_not_reopen() {
        let text = "\
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
194C 01-Apr-2023 F 1,000.00 100.00 100.00
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
194C 02-Apr-2023 F 2,000.00 200.00 200.00
";
        let (records, diag) = primary(&[Page::text_only(1, text)], 3);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.entity_tax_id == "MUMA12345B"));
        assert_eq!(diag.empty_entities_skipped, 0);
        // The repeat is still logged as a detected header.
        assert_eq!(diag.header_count, 2);
        assert_eq!(diag.detected_headers[1].tax_id, "MUMA12345B");
    }

    #[test]
    fn entity_carries_across_pages() {
        let first = "ACME INFRA MUMA12345B 3,000.00 300.00 300.00\n194C 01-Apr-2023 F 1,000.00 100.00 100.00";
        let second = "194C 02-Apr-2023 F 2,000.00 200.00 200.00";
        let (records, _) = primary(&[Page::text_only(1, first), Page::text_only(2, second)], 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].page_number, 2);
        assert_eq!(records[1].entity_tax_id, "MUMA12345B");
    }

    #[test]
    fn lookahead_finds_row_after_noise() {
        let text = "\
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
194C 01-Apr-2023 F 1,000.00 100.00 100.00
continued from previous row
more noise
194C 03-Apr-2023 F 2,000.00 200.00 200.00
";
        let (records, diag) = primary(&[Page::text_only(1, text)], 3);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].provenance, Provenance::Text { line_index: 4 });
        assert_eq!(diag.lookahead_hits, 1);
    }

    const HEADER_AFTER_NOISE: &str = "\
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
194C 01-Apr-2023 F 1,000.00 100.00 100.00
carried forward
GLOBEX TRADING DELG01234C 500.00 50.00 50.00
194J 10-Jun-2023 F 500.00 50.00 50.00
";

    #[test]
    fn lookahead_window_is_bounded() {
        let (records, diag) = primary(&[Page::text_only(1, HEADER_AFTER_NOISE)], 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].entity_tax_id, "DELG01234C");
        assert_eq!(diag.lookahead_hits, 0);
    }

    #[test]
    fn known_fragile_lookahead_can_jump_over_header() {
        let (records, diag) = primary(&[Page::text_only(1, HEADER_AFTER_NOISE)], 2);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.entity_tax_id == "MUMA12345B"));
        assert_eq!(diag.lookahead_hits, 1);
        assert_eq!(diag.header_count, 1);
    }

    #[test]
    fn rows_before_any_header_are_ignored() {
        let text = "194C 01-Apr-2023 F 1,000.00 100.00 100.00\n";
        let (records, diag) = primary(&[Page::text_only(1, text)], 3);
        assert!(records.is_empty());
        assert_eq!(diag.transaction_rows, 0);
    }

    #[test]
    fn header_without_rows_is_dropped() {
        let text = "\
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
GLOBEX TRADING CO DELG01234C 500.00 50.00 50.00
194J 10-Jun-2023 F 500.00 50.00 50.00
";
        let (records, diag) = primary(&[Page::text_only(1, text)], 3);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_tax_id, "DELG01234C");
        assert_eq!(diag.empty_entities_skipped, 1);
    }

    #[test]
    fn enhanced_needs_trigger_keyword() {
        let text = "\
TAN of Deductor MUMA12345B Name of Deductor: ACME INFRA
194C 01-Apr-2023 F 1,000.00 100.00 100.00
ACME INFRA DELG01234C
194C 02-Apr-2023 F 2,000.00 200.00 200.00
";
        let (records, _) = enhanced(&[Page::text_only(3, text)]);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.entity_tax_id == "MUMA12345B"));
        assert_eq!(records[0].entity_name, "ACME INFRA");
        assert_eq!(records[1].provenance, Provenance::TextEnhanced { line_index: 3 });
        assert_eq!(records[0].page_number, 3);
    }

    #[test]
    fn enhanced_skips_rows_without_amounts() {
        let text = "\
Name of Deductor GLOBEX DELG01234C
194C 01-Apr-2023 F
194C 02-Apr-2023 F 10.00 1.00 1.00
";
        let (records, _) = enhanced(&[Page::text_only(1, text)]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gross_amount, 10.0);
    }
}
