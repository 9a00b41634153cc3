//! Reconciliation of the table-pass and fallback outputs into one ordered,
//! numbered record list.

use std::collections::{HashMap, HashSet};

use crate::model::{Diagnostics, Strategy, TransactionRecord};

/// Outcome of a cross-strategy duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The candidate takes the kept record's slot.
    Replace,
    /// The candidate is dropped.
    KeepExisting,
}

/// Table evidence beats text evidence; otherwise the first-kept record stays.
pub fn tie_break(existing: Strategy, candidate: Strategy) -> Resolution {
    if candidate == Strategy::Table && existing.is_text() {
        Resolution::Replace
    } else {
        Resolution::KeepExisting
    }
}

/// Full identity of a record, including where it was read from.
pub fn composite_key(r: &TransactionRecord) -> String {
    format!(
        "{}|{}|{}|{}|{}|{:.2}|{:.2}|{:.2}|{}|{}|{}",
        r.entity_tax_id,
        r.section,
        r.transaction_date,
        r.booking_date,
        r.status,
        r.gross_amount,
        r.tax_amount,
        r.deposit_amount,
        r.page_number,
        r.strategy(),
        r.provenance.position_key(),
    )
}

/// Only a fallback record and a primary-pass record can be twins. Table and
/// text records both come from the primary pass and are never paired.
pub fn is_twin_pair(existing: Strategy, candidate: Strategy) -> bool {
    (existing == Strategy::TextEnhanced) != (candidate == Strategy::TextEnhanced)
}

/// The triple two strategies must agree on to be the same transaction.
fn match_key(r: &TransactionRecord) -> String {
    format!("{}|{:.2}|{}", r.entity_tax_id, r.gross_amount, r.transaction_date)
}

/// Drop exact repeats, collapse fallback copies of primary records
/// one-to-one, then number what is left.
pub fn reconcile(records: Vec<TransactionRecord>, diag: &mut Diagnostics) -> Vec<TransactionRecord> {
    diag.records_before_dedup = records.len();

    let mut seen: HashSet<String> = HashSet::new();
    let mut by_triple: HashMap<String, Vec<usize>> = HashMap::new();
    let mut kept: Vec<TransactionRecord> = Vec::with_capacity(records.len());
    let mut absorbed: Vec<bool> = Vec::with_capacity(records.len());

    for record in records {
        if !seen.insert(composite_key(&record)) {
            diag.duplicates_dropped += 1;
            continue;
        }

        let triple = match_key(&record);
        let twin = by_triple.get(&triple).and_then(|slots| {
            slots.iter().copied().find(|&idx| {
                !absorbed[idx] && is_twin_pair(kept[idx].strategy(), record.strategy())
            })
        });

        if let Some(idx) = twin {
            absorbed[idx] = true;
            match tie_break(kept[idx].strategy(), record.strategy()) {
                Resolution::Replace => {
                    log::debug!(
                        "table row replaces {} record for {} on {}",
                        kept[idx].strategy(),
                        record.entity_tax_id,
                        record.transaction_date
                    );
                    kept[idx] = record;
                    diag.replaced_by_table += 1;
                }
                Resolution::KeepExisting => {
                    diag.duplicates_dropped += 1;
                }
            }
            continue;
        }

        by_triple.entry(triple).or_default().push(kept.len());
        kept.push(record);
        absorbed.push(false);
    }

    number_records(&mut kept);
    kept
}

/// Dense serials 1..N in list order; blank booking dates take the
/// transaction date.
pub fn number_records(records: &mut [TransactionRecord]) {
    for (i, r) in records.iter_mut().enumerate() {
        r.serial_number = i + 1;
        if r.booking_date.is_empty() {
            r.booking_date = r.transaction_date.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
