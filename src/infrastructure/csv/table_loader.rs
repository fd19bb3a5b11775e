// ============================================================
// TABLE LOADER
// ============================================================
// Parse uploaded CSV bytes into a Table with encoding detection

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::csv::{CellValue, Table};
use crate::domain::error::AppError;

/// Field values read as null, matching the usual CSV tooling defaults
pub const NULL_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// CSV loader producing positional tables
pub struct TableLoader {
    /// Delimiter character (default: comma)
    delimiter: u8,

    /// Read numeric-looking fields as numbers instead of text
    coerce_numeric: bool,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            coerce_numeric: false,
        }
    }
}

impl TableLoader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether numeric-looking fields load as numbers
    pub fn with_coerce_numeric(mut self, coerce_numeric: bool) -> Self {
        self.coerce_numeric = coerce_numeric;
        self
    }

    /// Reject uploads that are not CSV before any parsing happens
    pub fn ensure_csv(filename: &str, raw: &[u8]) -> Result<(), AppError> {
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(AppError::UnsupportedFileType(format!(
                "Only .csv files are accepted, got '{}'",
                filename
            )));
        }

        if raw.contains(&0) {
            return Err(AppError::UnsupportedFileType(format!(
                "'{}' contains binary data",
                filename
            )));
        }

        Ok(())
    }

    /// Parse raw upload bytes into a table
    pub fn load(&self, raw: &[u8]) -> Result<Table, AppError> {
        let content = decode_bytes(raw);
        if content.trim().is_empty() {
            return Err(AppError::ParseError("Uploaded file is empty".to_string()));
        }

        // The csv reader silently repairs stray and unbalanced quotes
        check_quoting(&content, self.delimiter)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::None)
            .flexible(true) // Short rows are padded below
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::ParseError("CSV file has no columns".to_string()));
        }

        let columns: Vec<String> = headers.iter().map(str::to_string).collect();
        let width = columns.len();
        let mut rows = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            if record.len() > width {
                return Err(AppError::ParseError(format!(
                    "Row {} has {} fields, expected at most {}",
                    index + 1,
                    record.len(),
                    width
                )));
            }

            rows.push(self.parse_row(&record));
        }

        Ok(Table::new(columns, rows))
    }

    /// Parse a single record; padding to the header width happens in `Table::new`
    fn parse_row(&self, record: &StringRecord) -> Vec<CellValue> {
        record.iter().map(|field| self.parse_cell(field)).collect()
    }

    fn parse_cell(&self, field: &str) -> CellValue {
        if NULL_MARKERS.contains(&field) {
            return CellValue::Null;
        }

        if self.coerce_numeric {
            if let Ok(number) = field.trim().parse::<f64>() {
                return CellValue::Number(number);
            }
        }

        CellValue::Text(field.to_string())
    }
}

/// Reject a quoted field that never closes, or text between a closing
/// quote and the next delimiter
fn check_quoting(content: &str, delimiter: u8) -> Result<(), AppError> {
    let bytes = content.as_bytes();
    let mut line = 1;
    let mut field_start = true;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if field_start && byte == b'"' {
            let opened_on = line;
            i += 1;
            loop {
                match bytes.get(i) {
                    None => {
                        return Err(AppError::ParseError(format!(
                            "Unterminated quoted field starting on line {}",
                            opened_on
                        )))
                    }
                    Some(b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
                    Some(b'"') => {
                        i += 1;
                        break;
                    }
                    Some(b'\n') => {
                        line += 1;
                        i += 1;
                    }
                    Some(_) => i += 1,
                }
            }

            match bytes.get(i) {
                None | Some(b'\n') | Some(b'\r') => {}
                Some(&next) if next == delimiter => {}
                Some(_) => {
                    return Err(AppError::ParseError(format!(
                        "Unexpected text after closing quote on line {}",
                        line
                    )))
                }
            }
            field_start = false;
            continue;
        }

        if byte == b'\n' {
            line += 1;
        }
        field_start = byte == delimiter || byte == b'\n' || byte == b'\r';
        i += 1;
    }

    Ok(())
}

/// Decode as UTF-8 (dropping a BOM), falling back to Windows-1252
fn decode_bytes(raw: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(raw);
    if !had_errors {
        return text.into_owned();
    }

    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(raw);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_simple_csv() {
        let table = TableLoader::new()
            .load(b"name,age,city\nAlice,30,NYC\nBob,25,LA")
            .unwrap();

        assert_eq!(table.columns(), &["name", "age", "city"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0][0], CellValue::text("Alice"));
        assert_eq!(table.rows()[0][1], CellValue::text("30"));
    }

    #[test]
    fn test_load_keeps_whitespace_and_duplicates() {
        let table = TableLoader::new()
            .load(b"name,name\nAlice ,x\nAlice ,x\n")
            .unwrap();

        assert_eq!(table.columns(), &["name", "name"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1][0], CellValue::text("Alice "));
    }

    #[test]
    fn test_load_pads_short_rows_with_null() {
        let table = TableLoader::new().load(b"a,b,c\n1\n1,2,").unwrap();

        assert_eq!(
            table.rows()[0],
            vec![CellValue::text("1"), CellValue::Null, CellValue::Null]
        );
        assert!(table.rows()[1][2].is_null());
    }

    #[test]
    fn test_load_null_markers() {
        let table = TableLoader::new().load(b"a,b\nNA,n/a\n").unwrap();
        assert!(table.rows()[0].iter().all(CellValue::is_null));
    }

    #[test]
    fn test_load_rejects_empty_input() {
        assert!(matches!(
            TableLoader::new().load(b""),
            Err(AppError::ParseError(_))
        ));
        assert!(matches!(
            TableLoader::new().load(b"  \n \n"),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_rejects_long_rows() {
        let result = TableLoader::new().load(b"a,b\n1,2,3\n");
        assert!(matches!(result, Err(AppError::ParseError(_))));
    }

    #[test]
    fn test_load_rejects_unterminated_quote() {
        let result = TableLoader::new().load(b"a,b\n\"x,1\n2,3\n");
        assert!(matches!(result, Err(AppError::ParseError(msg)) if msg.contains("line 2")));

        let result = TableLoader::new().load(b"\"a,b\n1,2\n");
        assert!(matches!(result, Err(AppError::ParseError(msg)) if msg.contains("line 1")));
    }

    #[test]
    fn test_load_rejects_text_after_closing_quote() {
        let result = TableLoader::new().load(b"a,b\n\"x\"y,1\n");
        assert!(matches!(result, Err(AppError::ParseError(msg)) if msg.contains("closing quote")));
    }

    #[test]
    fn test_load_accepts_escaped_and_multiline_quotes() {
        let table = TableLoader::new()
            .load(b"a,b\n\"say \"\"hi\"\"\",1\n\"two\nlines\",2\r\nx\"y,3\n")
            .unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[0][0], CellValue::text("say \"hi\""));
        assert_eq!(table.rows()[1][0], CellValue::text("two\nlines"));
        assert_eq!(table.rows()[2][0], CellValue::text("x\"y"));
    }

    #[test]
    fn test_load_header_only() {
        let table = TableLoader::new().load(b"a,b\n").unwrap();
        assert_eq!(table.column_count(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_coerce_numeric() {
        let table = TableLoader::new()
            .with_coerce_numeric(true)
            .load(b"name,age\nAlice, 30\n")
            .unwrap();

        assert_eq!(table.rows()[0][0], CellValue::text("Alice"));
        assert_eq!(table.rows()[0][1], CellValue::Number(30.0));
    }

    #[test]
    fn test_decodes_bom_and_latin1() {
        let table = TableLoader::new().load(b"\xEF\xBB\xBFname\nx\n").unwrap();
        assert_eq!(table.columns(), &["name"]);

        let table = TableLoader::new().load(b"name\ncaf\xE9\n").unwrap();
        assert_eq!(table.rows()[0][0], CellValue::text("caf\u{e9}"));
    }

    #[test]
    fn test_ensure_csv() {
        assert!(TableLoader::ensure_csv("data.csv", b"a\n1").is_ok());
        assert!(TableLoader::ensure_csv("DATA.CSV", b"a\n1").is_ok());
        assert!(matches!(
            TableLoader::ensure_csv("data.xlsx", b"a\n1"),
            Err(AppError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            TableLoader::ensure_csv("data.csv", b"PK\x03\x04\x00\x00"),
            Err(AppError::UnsupportedFileType(_))
        ));
    }
}
