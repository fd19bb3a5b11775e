// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV loading with encoding detection, and CSV serialization

mod table_loader;
mod table_writer;

pub use table_loader::{TableLoader, NULL_MARKERS};
pub use table_writer::write_table;
