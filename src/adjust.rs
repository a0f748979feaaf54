//! Post-mapping dataset adjustment.
//!
//! After the resolver has produced a [`HeaderMapping`], the uploaded rows are
//! renamed to canonical column names, every canonical field missing from the
//! sheet is added as an all-null column, and the date-typed fields are
//! coerced to `YYYY-MM-DD`. None of these steps fail: values that cannot be
//! parsed as dates become null and are only counted.

use std::collections::HashSet;

use log::{debug, warn};

use crate::{
    data::{Dataset, coerce_date, format_date},
    resolver::HeaderMapping,
    vocabulary::Vocabulary,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustReport {
    /// Canonical fields added as null columns, in vocabulary order.
    pub added_columns: Vec<String>,
    /// Columns dropped because an earlier column already took their name.
    pub dropped_columns: Vec<String>,
    /// Date cells successfully normalized.
    pub dates_normalized: usize,
    /// Non-empty date cells that could not be parsed and were nulled.
    pub date_failures: usize,
}

/// Renames mapped headers to their canonical field. The first column to claim
/// a name keeps it; later columns with the same resulting name are dropped.
pub fn rename_columns(dataset: &mut Dataset, mapping: &HeaderMapping) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut dropped = Vec::new();
    let mut idx = 0;
    while idx < dataset.headers().len() {
        let original = dataset.headers()[idx].clone();
        let target = mapping
            .get(&original)
            .cloned()
            .unwrap_or_else(|| original.clone());
        if !taken.insert(target.clone()) {
            warn!("Dropping column '{original}': '{target}' is already provided by an earlier column");
            dataset.remove_column(idx);
            dropped.push(original);
            continue;
        }
        if target != original {
            debug!("Renaming column '{original}' -> '{target}'");
            dataset.set_header(idx, target);
        }
        idx += 1;
    }
    dropped
}

/// Adds missing canonical columns and normalizes the date fields in place.
pub fn complete_canonical_columns(dataset: &mut Dataset, vocabulary: &Vocabulary) -> AdjustReport {
    let mut report = AdjustReport::default();
    for field in vocabulary.fields() {
        if !dataset.has_column(field) {
            dataset.push_null_column(field);
            report.added_columns.push(field.clone());
        }
    }

    for field in vocabulary.date_fields() {
        let Some(idx) = dataset.column_index(field) else {
            continue;
        };
        for cell in dataset.column_cells_mut(idx) {
            let had_value = cell.as_deref().is_some_and(|v| !v.trim().is_empty());
            let coerced = coerce_date(cell.as_deref()).map(format_date);
            match (&coerced, had_value) {
                (Some(_), _) => report.dates_normalized += 1,
                (None, true) => report.date_failures += 1,
                (None, false) => {}
            }
            *cell = coerced;
        }
    }
    report
}

/// Renames, completes, and coerces `dataset` for `mapping`.
pub fn adjust_dataset(
    dataset: &mut Dataset,
    mapping: &HeaderMapping,
    vocabulary: &Vocabulary,
) -> AdjustReport {
    let dropped = rename_columns(dataset, mapping);
    let mut report = complete_canonical_columns(dataset, vocabulary);
    report.dropped_columns = dropped;
    if report.date_failures > 0 {
        warn!(
            "{} date value(s) could not be parsed and were stored as null",
            report.date_failures
        );
    }
    report
}
