// ============================================================
// CLEANING PIPELINE
// ============================================================
// Apply selected operations in canonical order and report on the result

use std::collections::HashSet;

use tracing::debug;

use crate::domain::csv::{CellValue, CleaningReport, OperationFlag, OperationSet, Table};

/// Clean `table` with the selected operations.
///
/// Operations run in the fixed order of [`OperationFlag::ALL`] regardless of
/// how the selection was built. The input table is left untouched.
pub fn clean(table: &Table, operations: &OperationSet) -> (Table, CleaningReport) {
    let original_row_count = table.row_count();
    let mut cleaned = table.clone();
    let mut applied = Vec::with_capacity(operations.len());

    for op in operations.iter() {
        let rows_before = cleaned.row_count();
        cleaned = apply(op, cleaned);
        debug!(
            operation = op.key(),
            rows_before,
            rows_after = cleaned.row_count(),
            columns = cleaned.column_count(),
            "Applied cleaning operation"
        );
        applied.push(op.display_name().to_string());
    }

    let report = CleaningReport::new(
        original_row_count,
        cleaned.row_count(),
        cleaned.column_count(),
        applied,
    );

    (cleaned, report)
}

/// Apply a single operation
pub fn apply(op: OperationFlag, table: Table) -> Table {
    if table.is_empty() {
        return table;
    }

    match op {
        OperationFlag::RemoveDuplicates => remove_duplicates(table),
        OperationFlag::RemoveNulls => remove_nulls(table),
        OperationFlag::TrimWhitespace => trim_whitespace(table),
        OperationFlag::RemoveEmptyColumns => remove_empty_columns(table),
        OperationFlag::StandardizeCase => standardize_case(table),
        OperationFlag::RemoveSpecialChars => remove_special_chars(table),
    }
}

/// Drop rows identical to an earlier row; the first occurrence stays
pub fn remove_duplicates(table: Table) -> Table {
    let mut seen: HashSet<Vec<CellValue>> = HashSet::with_capacity(table.row_count());
    table.retain_rows(|row| seen.insert(row.to_vec()))
}

/// Drop rows holding a null or empty cell in any column
pub fn remove_nulls(table: Table) -> Table {
    table.retain_rows(|row| !row.iter().any(CellValue::is_blank))
}

pub fn trim_whitespace(table: Table) -> Table {
    table.map_text_cells(|s| s.trim().to_string())
}

/// Drop columns where every cell is null
pub fn remove_empty_columns(table: Table) -> Table {
    let empty: Vec<bool> = (0..table.column_count())
        .map(|i| table.column_cells(i).all(CellValue::is_null))
        .collect();

    table.retain_columns(|i| !empty[i])
}

pub fn standardize_case(table: Table) -> Table {
    table.map_text_cells(str::to_lowercase)
}

/// Keep alphanumerics and whitespace only
pub fn remove_special_chars(table: Table) -> Table {
    table.map_text_cells(|s| {
        s.chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect()
    })
}
