// ============================================================
// CLEAN FILE USE CASE
// ============================================================
// Orchestrate type check, loading, cleaning, previews and history

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use super::cleaning_pipeline::clean;
use crate::domain::csv::{CleaningReport, OperationSet, TablePreview};
use crate::domain::error::Result;
use crate::domain::history::{HistoryRecord, NewHistoryEntry};
use crate::infrastructure::config::CleanerConfig;
use crate::infrastructure::csv::{write_table, TableLoader};
use crate::infrastructure::db::CleaningStore;

/// Everything the presentation layer needs after one cleaning run
#[derive(Debug, Clone, Serialize)]
pub struct CleaningOutcome {
    pub filename: String,
    pub download_name: String,
    pub report: CleaningReport,
    pub operations_summary: String,
    pub original_preview: TablePreview,
    pub cleaned_preview: TablePreview,
    /// Serialized cleaned table, handed to session storage for download
    #[serde(skip)]
    pub cleaned_csv: String,
    /// False when the history store rejected the record
    pub history_saved: bool,
    pub processing_time_ms: u64,
}

pub struct CleanFileUseCase {
    store: Arc<dyn CleaningStore>,
    settings: CleanerConfig,
}

impl CleanFileUseCase {
    pub fn new(store: Arc<dyn CleaningStore>, settings: CleanerConfig) -> Self {
        Self { store, settings }
    }

    /// Clean an uploaded file for `user_id` and log the run to history.
    ///
    /// Type and parse failures abort before anything is persisted. A failed
    /// history insert is logged and reported through `history_saved`.
    pub async fn execute(
        &self,
        user_id: i64,
        filename: &str,
        raw: &[u8],
        operations: &OperationSet,
    ) -> Result<CleaningOutcome> {
        let start = Instant::now();

        TableLoader::ensure_csv(filename, raw)?;

        let original = TableLoader::new()
            .with_coerce_numeric(self.settings.coerce_numeric)
            .load(raw)?;

        let (cleaned, report) = clean(&original, operations);
        let cleaned_csv = write_table(&cleaned)?;

        let original_preview = TablePreview::build(&original, self.settings.preview_rows);
        let cleaned_preview = TablePreview::build(&cleaned, self.settings.preview_rows);

        let entry = NewHistoryEntry::from_report(user_id, filename, &report);
        let history_saved = match self.store.insert_history(&entry).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, user_id, filename, "Failed to record cleaning history");
                false
            }
        };

        info!(
            user_id,
            filename,
            original_rows = report.original_row_count,
            cleaned_rows = report.cleaned_row_count,
            operations = %report.operations_summary(),
            "Cleaned CSV file"
        );

        Ok(CleaningOutcome {
            filename: filename.to_string(),
            download_name: format!("cleaned_{}", filename),
            operations_summary: report.operations_summary(),
            report,
            original_preview,
            cleaned_preview,
            cleaned_csv,
            history_saved,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Most recent runs of `user_id`, newest first
    pub async fn history(&self, user_id: i64) -> Result<Vec<HistoryRecord>> {
        self.store
            .recent_history(user_id, self.settings.history_limit)
            .await
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::csv::OperationFlag;
    use crate::domain::error::AppError;
    use crate::domain::user::User;
    use crate::infrastructure::db::sqlite::SqliteStore;
    use async_trait::async_trait;

    const UPLOAD: &[u8] = b"name,age\nAlice ,30\nAlice ,30\nBob,\n";

    async fn use_case() -> (CleanFileUseCase, i64) {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = store.insert_user("alice", "hash").await.unwrap();
        (
            CleanFileUseCase::new(Arc::new(store), CleanerConfig::default()),
            user.id,
        )
    }

    fn default_ops() -> OperationSet {
        OperationSet::ui_defaults()
    }

    #[tokio::test]
    async fn test_clean_upload_and_record_history() {
        let (use_case, user_id) = use_case().await;

        let outcome = use_case
            .execute(user_id, "people.csv", UPLOAD, &default_ops())
            .await
            .unwrap();

        assert_eq!(outcome.cleaned_csv, "name,age\nAlice,30\n");
        assert_eq!(outcome.download_name, "cleaned_people.csv");
        assert_eq!(outcome.report.original_row_count, 3);
        assert_eq!(outcome.report.cleaned_row_count, 1);
        assert_eq!(
            outcome.operations_summary,
            "Remove Duplicates, Remove NULL Values, Trim Whitespace"
        );
        assert_eq!(outcome.original_preview.rows.len(), 3);
        assert_eq!(outcome.cleaned_preview.rows.len(), 1);
        assert!(outcome.history_saved);

        let history = use_case.history(user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].filename, "people.csv");
        assert_eq!(history[0].original_rows, 3);
        assert_eq!(history[0].cleaned_rows, 1);
    }

    #[tokio::test]
    async fn test_no_operations_recorded_as_none() {
        let (use_case, user_id) = use_case().await;

        let outcome = use_case
            .execute(user_id, "people.csv", UPLOAD, &OperationSet::new())
            .await
            .unwrap();

        assert_eq!(outcome.operations_summary, "None");
        let history = use_case.history(user_id).await.unwrap();
        assert_eq!(history[0].operations, "None");
    }

    #[tokio::test]
    async fn test_rejected_uploads_write_no_history() {
        let (use_case, user_id) = use_case().await;
        let ops: OperationSet = [OperationFlag::RemoveDuplicates].into_iter().collect();

        let result = use_case.execute(user_id, "people.txt", UPLOAD, &ops).await;
        assert!(matches!(result, Err(AppError::UnsupportedFileType(_))));

        let result = use_case.execute(user_id, "empty.csv", b"", &ops).await;
        assert!(matches!(result, Err(AppError::ParseError(_))));

        assert!(use_case.history(user_id).await.unwrap().is_empty());
    }

    struct FailingStore;

    #[async_trait]
    impl CleaningStore for FailingStore {
        fn backend_name(&self) -> &'static str {
            "Failing"
        }

        async fn insert_user(&self, _username: &str, _password_hash: &str) -> Result<User> {
            Err(AppError::DatabaseError("offline".to_string()))
        }

        async fn find_user(&self, _username: &str) -> Result<Option<User>> {
            Err(AppError::DatabaseError("offline".to_string()))
        }

        async fn insert_history(&self, _entry: &NewHistoryEntry) -> Result<HistoryRecord> {
            Err(AppError::DatabaseError("offline".to_string()))
        }

        async fn recent_history(&self, _user_id: i64, _limit: i64) -> Result<Vec<HistoryRecord>> {
            Err(AppError::DatabaseError("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_history_failure_still_returns_result() {
        let use_case = CleanFileUseCase::new(Arc::new(FailingStore), CleanerConfig::default());

        let outcome = use_case
            .execute(1, "people.csv", UPLOAD, &default_ops())
            .await
            .unwrap();

        assert!(!outcome.history_saved);
        assert_eq!(outcome.report.cleaned_row_count, 1);
        assert_eq!(outcome.cleaned_csv, "name,age\nAlice,30\n");
    }
}
