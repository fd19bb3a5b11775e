// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types and value objects for CSV cleaning
// No I/O, no async, no external dependencies

mod operation;
mod preview;
mod report;
mod table;

pub use operation::{OperationFlag, OperationSet};
pub use preview::{TablePreview, DEFAULT_PREVIEW_ROWS};
pub use report::CleaningReport;
pub use table::{CellValue, Table};
