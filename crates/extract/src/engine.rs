use crate::classify::LineClassifier;
use crate::config::ExtractConfig;
use crate::context::EntityContext;
use crate::dedup::reconcile;
use crate::evidence::{compute_summary, log_summary};
use crate::metadata::extract_taxpayer_info;
use crate::model::{Diagnostics, Page, ParseMeta, ParseReport, ParsedStatement, Strategy, TaxpayerInfo};
use crate::source::PageSource;
use crate::table;
use crate::text::TextScan;

/// Run the full pipeline over already-extracted pages.
pub fn run(pages: &[Page], config: &ExtractConfig) -> ParseReport {
    let mut diag = Diagnostics {
        pages: pages.len(),
        ..Diagnostics::default()
    };
    log::info!("parsing {} pages with config '{}'", pages.len(), config.name);

    let taxpayer_info = pages
        .first()
        .map(|p| extract_taxpayer_info(&p.text))
        .unwrap_or_default();

    let classifier = LineClassifier::new(config);
    let scan = TextScan::new(&classifier, config.heuristics.lookahead_lines);

    // Table pass; text-only pages run the primary text scan on the same context.
    let mut ctx = EntityContext::new(Strategy::Table);
    for page in pages {
        table::scan_page(&scan, page, &mut ctx, &mut diag);
    }
    let mut records = ctx.finish(&mut diag);
    log::info!("table pass: {} transactions", records.len());

    if records.len() < config.heuristics.fallback_threshold {
        log::warn!(
            "table pass yielded {} transactions (< {}), running text fallback",
            records.len(),
            config.heuristics.fallback_threshold
        );
        diag.fallback_used = true;

        let mut fallback = EntityContext::new(Strategy::TextEnhanced);
        for page in pages {
            scan.scan_page_enhanced(page, &mut fallback, &mut diag);
        }
        let extra = fallback.finish(&mut diag);
        log::info!("text fallback: {} transactions", extra.len());
        records.extend(extra);
    }

    let transactions = reconcile(records, &mut diag);
    compute_summary(&transactions, &mut diag);
    log_summary(&diag, transactions.len());

    report(config, ParsedStatement::new(taxpayer_info, transactions), diag, true)
}

/// Load pages from `source` and run. A source that fails yields the empty
/// statement with `meta.source_ok == false`.
pub fn parse_document<S: PageSource + ?Sized>(source: &S, config: &ExtractConfig) -> ParseReport {
    match source.load_pages() {
        Ok(pages) => run(&pages, config),
        Err(e) => {
            log::warn!("page source failed: {e}");
            report(
                config,
                ParsedStatement::new(TaxpayerInfo::default(), Vec::new()),
                Diagnostics::default(),
                false,
            )
        }
    }
}

fn report(
    config: &ExtractConfig,
    statement: ParsedStatement,
    diagnostics: Diagnostics,
    source_ok: bool,
) -> ParseReport {
    ParseReport {
        meta: ParseMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            source_ok,
        },
        statement,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    struct Broken;

    impl PageSource for Broken {
        fn load_pages(&self) -> Result<Vec<Page>, ExtractError> {
            Err(ExtractError::Io("gone".into()))
        }
    }

    const PAGE: &str = "\
Permanent Account Number (PAN) : ABCDE1234F
ACME INFRA MUMA12345B 3,000.00 300.00 300.00
194C 01-Apr-2023 F 05-May-2023 1,000.00 100.00 100.00
194C 02-Apr-2023 F 2,000.00 200.00 200.00
";

    #[test]
    fn no_pages_is_empty_statement() {
        let report = run(&[], &ExtractConfig::default());
        assert_eq!(report.statement.count, 0);
        assert!(report.meta.source_ok);
        assert_eq!(report.statement.taxpayer_info, TaxpayerInfo::default());
    }

    #[test]
    fn failing_source_gives_empty_report() {
        let report = parse_document(&Broken, &ExtractConfig::default());
        assert!(!report.meta.source_ok);
        assert_eq!(report.statement.count, 0);
        assert!(report.statement.transactions.is_empty());
    }

    #[test]
    fn text_only_page_without_fallback() {
        let mut config = ExtractConfig::default();
        config.heuristics.fallback_threshold = 0;
        let report = run(&[Page::text_only(1, PAGE)], &config);

        assert!(!report.diagnostics.fallback_used);
        assert_eq!(report.statement.count, 2);
        let tx = &report.statement.transactions;
        assert_eq!(tx[0].serial_number, 1);
        assert_eq!(tx[1].booking_date, "02-Apr-2023");
        assert_eq!(tx[0].entity_total_gross, 3000.0);
        assert_eq!(report.statement.taxpayer_info.tax_id, "ABCDE1234F");
    }

    #[test]
    fn fallback_runs_below_threshold() {
        let report = run(&[Page::text_only(1, PAGE)], &ExtractConfig::default());
        assert!(report.diagnostics.fallback_used);
        // The enhanced scan has no trigger keyword to open an entity here.
        assert_eq!(report.statement.count, 2);
        assert_eq!(report.diagnostics.strategy_counts.get("text"), Some(&2));
    }

    #[test]
    fn text_page_and_table_page_rows_both_survive() {
        let mut config = ExtractConfig::default();
        config.heuristics.fallback_threshold = 0;
        let text_page = Page::text_only(
            1,
            "ACME INFRA MUMA12345B 2,000.00 150.00 150.00\n194C 01-Apr-2023 F 1,000.00 100.00 100.00\n",
        );
        let table_page = Page {
            page_number: 2,
            text: String::new(),
            tables: vec![vec![["194J", "01-Apr-2023", "F", "1,000.00", "50.00", "50.00"]
                .iter()
                .map(|c| Some(c.to_string()))
                .collect()]],
        };

        let report = run(&[text_page, table_page], &config);
        let tx = &report.statement.transactions;
        assert_eq!(tx.len(), 2);
        assert_eq!((tx[0].section.as_str(), tx[0].strategy()), ("194C", Strategy::Text));
        assert_eq!((tx[1].section.as_str(), tx[1].strategy()), ("194J", Strategy::Table));
        assert_eq!(report.diagnostics.replaced_by_table, 0);
        assert_eq!(report.diagnostics.records_before_dedup, 2);
    }

    #[test]
    fn meta_carries_config_name() {
        let config = ExtractConfig::from_toml("name = \"audit\"").unwrap();
        let report = parse_document(&vec![Page::text_only(1, "")], &config);
        assert_eq!(report.meta.config_name, "audit");
        assert_eq!(report.meta.engine_version, env!("CARGO_PKG_VERSION"));
        assert!(!report.meta.run_at.is_empty());
    }
}
