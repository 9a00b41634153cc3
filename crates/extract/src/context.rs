use crate::model::{
    round2, DetectedHeader, Diagnostics, EntityHeader, Provenance, Strategy, TransactionLine,
    TransactionRecord,
};

/// Where the text scan stands relative to the entity blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    AwaitingHeader,
    InsideHeader,
    InsideTable,
    /// Transient: becomes `AwaitingHeader` on the next line.
    Closed,
}

#[derive(Debug)]
struct OpenEntity {
    header: EntityHeader,
    pending: Vec<(TransactionLine, usize, Provenance)>,
    running_total: f64,
}

/// The currently open reporting entity plus everything emitted so far.
///
/// One context per strategy run; it is threaded through every page of that
/// run and consumed by [`EntityContext::finish`].
#[derive(Debug)]
pub struct EntityContext {
    strategy: Strategy,
    open: Option<OpenEntity>,
    pub state: ScanState,
    emitted: Vec<TransactionRecord>,
}

impl EntityContext {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            open: None,
            state: ScanState::AwaitingHeader,
            emitted: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Identity key of the open entity; `None` when nothing is open.
    pub fn open_tax_id(&self) -> Option<Option<&str>> {
        self.open.as_ref().map(|e| e.header.tax_id.as_deref())
    }

    /// True when `header` names an entity other than the open one.
    pub fn is_new_entity(&self, header: &EntityHeader) -> bool {
        self.open_tax_id() != Some(header.tax_id.as_deref())
    }

    /// Log a classified header with a tax-id, whether or not it opens an
    /// entity. Informational only.
    pub fn record_header(&self, header: &EntityHeader, page_number: usize, diag: &mut Diagnostics) {
        let Some(tax_id) = &header.tax_id else {
            return;
        };
        diag.header_count += 1;
        diag.detected_headers.push(DetectedHeader {
            page_number,
            name: header.name.clone(),
            tax_id: tax_id.clone(),
            strategy: self.strategy,
        });
    }

    /// Close whatever is open, then open `header`.
    pub fn open(&mut self, header: EntityHeader, page_number: usize, diag: &mut Diagnostics) {
        self.close(diag);

        log::debug!(
            "[{}] page {page_number}: entity {} | {}",
            self.strategy,
            header.name,
            header.tax_id_label()
        );
        self.open = Some(OpenEntity {
            header,
            pending: Vec::new(),
            running_total: 0.0,
        });
        self.state = ScanState::InsideHeader;
    }

    /// Collect a transaction under the open entity. Returns false (and drops
    /// the line) when no entity is open.
    pub fn push(
        &mut self,
        line: TransactionLine,
        page_number: usize,
        provenance: Provenance,
        diag: &mut Diagnostics,
    ) -> bool {
        let Some(entity) = self.open.as_mut() else {
            return false;
        };
        entity.running_total += line.gross_amount;
        entity.pending.push((line, page_number, provenance));
        diag.transaction_rows += 1;
        self.state = ScanState::InsideTable;
        true
    }

    /// Emit the open entity's records with its totals attached. An entity
    /// with nothing collected is dropped silently.
    pub fn close(&mut self, diag: &mut Diagnostics) {
        let Some(entity) = self.open.take() else {
            return;
        };
        self.state = ScanState::Closed;

        if entity.pending.is_empty() {
            diag.empty_entities_skipped += 1;
            log::debug!(
                "[{}] skipping entity without transactions: {} | {}",
                self.strategy,
                entity.header.name,
                entity.header.tax_id_label()
            );
            return;
        }

        let count = entity.pending.len();
        let positive = entity.pending.iter().filter(|(l, _, _)| l.gross_amount > 0.0).count();
        let negative = entity.pending.iter().filter(|(l, _, _)| l.gross_amount < 0.0).count();
        log::info!(
            "[{}] closed {} | {} | {count} transactions (+{positive}/-{negative}/0{}) | total {:.2}",
            self.strategy,
            entity.header.name,
            entity.header.tax_id_label(),
            count - positive - negative,
            round2(entity.running_total)
        );

        let header = entity.header;
        self.emitted.extend(
            entity
                .pending
                .into_iter()
                .map(|(line, page, provenance)| TransactionRecord::new(line, &header, page, provenance)),
        );
    }

    /// Close the last entity and hand back every emitted record in order.
    pub fn finish(mut self, diag: &mut Diagnostics) -> Vec<TransactionRecord> {
        self.close(diag);
        self.emitted
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
