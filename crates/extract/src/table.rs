//! Page-table strategy. Table rows are the primary evidence; a page without
//! tables is handed to the primary text scan on the same context.

use crate::context::EntityContext;
use crate::model::{Diagnostics, Page, Provenance, Row};
use crate::text::TextScan;

/// Join the non-empty cells of a row into one line.
pub fn row_text(row: &Row) -> String {
    row.iter()
        .flatten()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drive the classifier over every row of every table on `page`.
pub fn scan_page(scan: &TextScan<'_>, page: &Page, ctx: &mut EntityContext, diag: &mut Diagnostics) {
    if page.tables.is_empty() {
        log::debug!("page {}: no tables, scanning text", page.page_number);
        scan.scan_page(page, ctx, diag);
        return;
    }

    for (table_index, table) in page.tables.iter().enumerate() {
        for (row_index, row) in table.iter().enumerate() {
            let line = row_text(row);
            if line.is_empty() {
                continue;
            }

            if let Some(header) = scan.classifier.header(&line) {
                ctx.record_header(&header, page.page_number, diag);
                if ctx.is_new_entity(&header) {
                    ctx.open(header, page.page_number, diag);
                }
                continue;
            }

            if !ctx.is_open() {
                continue;
            }
            if let Some(tx) = scan.classifier.transaction(&line) {
                ctx.push(
                    tx,
                    page.page_number,
                    Provenance::Table {
                        table_index,
                        row_index,
                    },
                    diag,
                );
            }
        }
    }
}
