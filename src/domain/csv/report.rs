// ============================================================
// CLEANING REPORT
// ============================================================
// Bookkeeping produced once per pipeline run

use serde::{Deserialize, Serialize};

/// Summary of one cleaning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Rows in the uploaded table
    pub original_row_count: usize,

    /// Rows left after every enabled operation
    pub cleaned_row_count: usize,

    /// Always `original_row_count - cleaned_row_count`
    pub removed_row_count: usize,

    /// Columns left in the cleaned table
    pub final_column_count: usize,

    /// Display names of the applied operations, in application order
    pub applied_operations: Vec<String>,
}

impl CleaningReport {
    pub fn new(
        original_row_count: usize,
        cleaned_row_count: usize,
        final_column_count: usize,
        applied_operations: Vec<String>,
    ) -> Self {
        Self {
            original_row_count,
            cleaned_row_count,
            removed_row_count: original_row_count.saturating_sub(cleaned_row_count),
            final_column_count,
            applied_operations,
        }
    }

    /// Applied operations joined with ", ", or "None" when nothing ran
    pub fn operations_summary(&self) -> String {
        if self.applied_operations.is_empty() {
            "None".to_string()
        } else {
            self.applied_operations.join(", ")
        }
    }
}
