// ============================================================
// CLEANING OPERATIONS
// ============================================================
// Operation flags and the canonical order they are applied in

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::domain::error::AppError;

/// A cleaning operation the pipeline can apply
///
/// Variants are declared in canonical application order; the derived
/// `Ord` is what fixes the order of an `OperationSet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationFlag {
    #[serde(rename = "remove_duplicates")]
    RemoveDuplicates,
    #[serde(rename = "remove_null")]
    RemoveNulls,
    #[serde(rename = "trim_whitespace")]
    TrimWhitespace,
    #[serde(rename = "remove_empty_cols")]
    RemoveEmptyColumns,
    #[serde(rename = "standardize_case")]
    StandardizeCase,
    #[serde(rename = "remove_special_chars")]
    RemoveSpecialChars,
}

impl OperationFlag {
    /// All operations in canonical order
    pub const ALL: [OperationFlag; 6] = [
        OperationFlag::RemoveDuplicates,
        OperationFlag::RemoveNulls,
        OperationFlag::TrimWhitespace,
        OperationFlag::RemoveEmptyColumns,
        OperationFlag::StandardizeCase,
        OperationFlag::RemoveSpecialChars,
    ];

    /// Name recorded in reports and history
    pub fn display_name(&self) -> &'static str {
        match self {
            OperationFlag::RemoveDuplicates => "Remove Duplicates",
            OperationFlag::RemoveNulls => "Remove NULL Values",
            OperationFlag::TrimWhitespace => "Trim Whitespace",
            OperationFlag::RemoveEmptyColumns => "Remove Empty Columns",
            OperationFlag::StandardizeCase => "Standardize Case",
            OperationFlag::RemoveSpecialChars => "Remove Special Characters",
        }
    }

    /// Key used by clients to select the operation
    pub fn key(&self) -> &'static str {
        match self {
            OperationFlag::RemoveDuplicates => "remove_duplicates",
            OperationFlag::RemoveNulls => "remove_null",
            OperationFlag::TrimWhitespace => "trim_whitespace",
            OperationFlag::RemoveEmptyColumns => "remove_empty_cols",
            OperationFlag::StandardizeCase => "standardize_case",
            OperationFlag::RemoveSpecialChars => "remove_special_chars",
        }
    }

    /// Whether the upload form pre-selects this operation
    pub fn checked_by_default(&self) -> bool {
        matches!(
            self,
            OperationFlag::RemoveDuplicates
                | OperationFlag::RemoveNulls
                | OperationFlag::TrimWhitespace
        )
    }
}

impl std::fmt::Display for OperationFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OperationFlag {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        OperationFlag::ALL
            .into_iter()
            .find(|op| op.key() == key)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown cleaning operation: {}", key)))
    }
}

/// A set of selected operations, iterated in canonical order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSet(BTreeSet<OperationFlag>);

impl OperationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation enabled
    pub fn all() -> Self {
        OperationFlag::ALL.into_iter().collect()
    }

    /// The selection the upload form starts with
    pub fn ui_defaults() -> Self {
        OperationFlag::ALL
            .into_iter()
            .filter(|op| op.checked_by_default())
            .collect()
    }

    /// Parse a comma-separated list of operation keys; blanks are ignored
    pub fn parse_keys(keys: &str) -> Result<Self, AppError> {
        keys.split(',')
            .filter(|k| !k.trim().is_empty())
            .map(OperationFlag::from_str)
            .collect()
    }

    pub fn insert(&mut self, op: OperationFlag) -> bool {
        self.0.insert(op)
    }

    pub fn contains(&self, op: OperationFlag) -> bool {
        self.0.contains(&op)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected operations in canonical order
    pub fn iter(&self) -> impl Iterator<Item = OperationFlag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<OperationFlag> for OperationSet {
    fn from_iter<I: IntoIterator<Item = OperationFlag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a OperationFlag> for OperationSet {
    fn from_iter<I: IntoIterator<Item = &'a OperationFlag>>(iter: I) -> Self {
        Self(iter.into_iter().copied().collect())
    }
}
