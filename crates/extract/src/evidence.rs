use std::collections::BTreeMap;

use crate::model::{round2, Diagnostics, EntitySummary, TransactionRecord};

/// Fill the per-entity rollup and strategy counts from the kept records.
pub fn compute_summary(records: &[TransactionRecord], diag: &mut Diagnostics) {
    let mut strategy_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut entities: Vec<EntitySummary> = Vec::new();
    let mut index: BTreeMap<(String, String), usize> = BTreeMap::new();

    for r in records {
        *strategy_counts.entry(r.strategy().to_string()).or_insert(0) += 1;

        let key = (r.entity_name.clone(), r.entity_tax_id.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            entities.push(EntitySummary {
                entity_name: r.entity_name.clone(),
                entity_tax_id: r.entity_tax_id.clone(),
                transactions: 0,
                positive: 0,
                negative: 0,
                zero: 0,
                gross_amount: 0.0,
                tax_amount: 0.0,
                deposit_amount: 0.0,
            });
            entities.len() - 1
        });

        let e = &mut entities[slot];
        e.transactions += 1;
        if r.gross_amount > 0.0 {
            e.positive += 1;
        } else if r.gross_amount < 0.0 {
            e.negative += 1;
        } else {
            e.zero += 1;
        }
        e.gross_amount += r.gross_amount;
        e.tax_amount += r.tax_amount;
        e.deposit_amount += r.deposit_amount;
    }

    for e in &mut entities {
        e.gross_amount = round2(e.gross_amount);
        e.tax_amount = round2(e.tax_amount);
        e.deposit_amount = round2(e.deposit_amount);
    }

    diag.strategy_counts = strategy_counts;
    diag.entities = entities;
}

/// Log the validation summary at info level.
pub fn log_summary(diag: &Diagnostics, kept: usize) {
    log::info!(
        "{kept} transactions from {} entities ({} headers, {} rows, {} duplicates dropped, {} replaced by table)",
        diag.entities.len(),
        diag.header_count,
        diag.transaction_rows,
        diag.duplicates_dropped,
        diag.replaced_by_table
    );
    for (strategy, count) in &diag.strategy_counts {
        log::info!("  {strategy}: {count}");
    }
    for e in &diag.entities {
        log::info!(
            "  {} | {} | {} (+{}/-{}/0{}) | gross {:.2} tax {:.2} deposited {:.2}",
            e.entity_name,
            e.entity_tax_id,
            e.transactions,
            e.positive,
            e.negative,
            e.zero,
            e.gross_amount,
            e.tax_amount,
            e.deposit_amount
        );
    }
}
