// ============================================================
// TABLE WRITER
// ============================================================
// Serialize a Table back to comma-delimited CSV text

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::csv::Table;
use crate::domain::error::AppError;

/// Write the header row and every row, quoting only where needed.
/// Null cells are written as empty fields.
pub fn write_table(table: &Table) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.columns())
        .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

    for (index, row) in table.rows().iter().enumerate() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| {
                AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
            })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV output: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("CSV output is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::csv::CellValue;

    #[test]
    fn test_write_quotes_only_when_needed() {
        let table = Table::new(
            vec!["name".to_string(), "note".to_string()],
            vec![
                vec![CellValue::text("Alice"), CellValue::text("likes, commas")],
                vec![CellValue::text("Bob"), CellValue::Null],
                vec![CellValue::Number(3.5), CellValue::text("say \"hi\"")],
            ],
        );

        let csv = write_table(&table).unwrap();
        assert_eq!(
            csv,
            "name,note\nAlice,\"likes, commas\"\nBob,\n3.5,\"say \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_write_header_only() {
        let table = Table::empty(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(write_table(&table).unwrap(), "a,b\n");
    }
}
