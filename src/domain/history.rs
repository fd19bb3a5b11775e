use serde::{Deserialize, Serialize};

use crate::domain::csv::CleaningReport;

/// Fields of a cleaning run handed to the history store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub user_id: i64,
    pub filename: String,
    pub original_rows: i64,
    pub cleaned_rows: i64,
    pub operations: String,
}

impl NewHistoryEntry {
    pub fn from_report(user_id: i64, filename: &str, report: &CleaningReport) -> Self {
        Self {
            user_id,
            filename: filename.to_string(),
            original_rows: report.original_row_count as i64,
            cleaned_rows: report.cleaned_row_count as i64,
            operations: report.operations_summary(),
        }
    }
}

/// A persisted cleaning run; the timestamp is assigned by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub filename: String,
    pub original_rows: i64,
    pub cleaned_rows: i64,
    pub operations: String,
    pub cleaned_at: chrono::DateTime<chrono::Utc>,
}
