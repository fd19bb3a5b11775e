// ============================================================
// TABLE TYPES
// ============================================================
// In-memory tabular data: positional cells aligned to columns

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell value
///
/// Cells are typed once at load time. Operations match on the tag
/// instead of coercing between representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Null,
}

impl CellValue {
    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for null cells and empty text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    // -0.0 and 0.0 compare equal, every NaN is the same key
    fn number_key(n: f64) -> u64 {
        if n == 0.0 {
            0
        } else if n.is_nan() {
            f64::NAN.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => {
                Self::number_key(*a) == Self::number_key(*b)
            }
            (CellValue::Null, CellValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(n) => Self::number_key(*n).hash(state),
            CellValue::Null => {}
        }
    }
}

/// Renders the cell as it appears in CSV output; null renders empty
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Null => Ok(()),
        }
    }
}

/// Ordered columns plus ordered rows of positional cells
///
/// Every row holds exactly `columns.len()` cells. Column names are not
/// required to be unique; duplicates are kept positionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create a table, padding short rows with nulls and dropping cells
    /// past the last column
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Create a table with headers and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of one column, top to bottom
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Keep rows matching the predicate, in their original order
    pub fn retain_rows<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.retain(|row| keep(row.as_slice()));
        self
    }

    /// Keep columns whose index matches the predicate, re-indexing every row
    pub fn retain_columns<F>(self, keep: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let kept: Vec<usize> = (0..self.columns.len()).filter(|&i| keep(i)).collect();
        if kept.len() == self.columns.len() {
            return self;
        }

        let columns = kept.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| kept.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self { columns, rows }
    }

    /// Apply `f` to every text cell; numbers and nulls are left untouched
    pub fn map_text_cells<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let CellValue::Text(value) = cell {
                    *value = f(value);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_pads_short_rows() {
        let table = Table::new(cols(&["a", "b", "c"]), vec![vec![CellValue::text("1")]]);

        assert_eq!(table.rows()[0].len(), 3);
        assert!(table.rows()[0][1].is_null());
        assert!(table.rows()[0][2].is_null());
    }

    #[test]
    fn test_retain_columns_keeps_order_and_duplicates() {
        let table = Table::new(
            cols(&["x", "drop", "x"]),
            vec![vec![
                CellValue::text("1"),
                CellValue::Null,
                CellValue::text("3"),
            ]],
        );

        let table = table.retain_columns(|i| i != 1);

        assert_eq!(table.columns(), &cols(&["x", "x"])[..]);
        assert_eq!(
            table.rows()[0],
            vec![CellValue::text("1"), CellValue::text("3")]
        );
    }

    #[test]
    fn test_map_text_cells_skips_numbers_and_nulls() {
        let table = Table::new(
            cols(&["a", "b", "c"]),
            vec![vec![
                CellValue::text("Hi"),
                CellValue::Number(2.5),
                CellValue::Null,
            ]],
        );

        let table = table.map_text_cells(|s| s.to_uppercase());

        assert_eq!(
            table.rows()[0],
            vec![CellValue::text("HI"), CellValue::Number(2.5), CellValue::Null]
        );
    }

    #[test]
    fn test_cell_equality_normalizes_zero() {
        assert_eq!(CellValue::Number(0.0), CellValue::Number(-0.0));
        assert_ne!(CellValue::text(""), CellValue::Null);
        assert!(CellValue::text("").is_blank());
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
    }
}
