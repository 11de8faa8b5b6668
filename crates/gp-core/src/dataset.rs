//! Columnar dataset storage with hash-based variable lookup.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Stable hash of a variable name, used by variable nodes to reference
/// a dataset column.
pub fn variable_hash(name: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(name.as_bytes());
    hasher.finish()
}

/// A named dataset column.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Column name.
    pub name: String,
    /// Hash of the name, as produced by [`variable_hash`].
    pub hash: u64,
    /// Column index into the dataset.
    pub index: usize,
}

/// Column-major numeric matrix, immutable for the duration of an
/// evaluation.
///
/// Columns are addressed either by index or by the hash of their name;
/// hash lookup is how variable nodes resolve their readings.
#[derive(Debug, Clone)]
pub struct Dataset {
    variables: Vec<Variable>,
    values: Vec<Vec<f64>>,
    hash_to_index: HashMap<u64, usize>,
    rows: usize,
}

impl Dataset {
    /// Create a dataset from named columns.
    ///
    /// All columns must have the same length and contain only finite
    /// values; names must be unique.
    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, Vec<f64>)>,
    ) -> Result<Self> {
        let mut variables = Vec::new();
        let mut values = Vec::new();
        let mut hash_to_index = HashMap::new();

        let mut rows: Option<usize> = None;
        for (index, (name, col)) in columns.into_iter().enumerate() {
            if let Some(n) = rows {
                if col.len() != n {
                    return Err(Error::Validation(format!(
                        "column length mismatch for '{}': expected {}, got {}",
                        name,
                        n,
                        col.len()
                    )));
                }
            } else {
                rows = Some(col.len());
            }
            if col.iter().any(|x| !x.is_finite()) {
                return Err(Error::Validation(format!(
                    "column '{}' contains non-finite values",
                    name
                )));
            }
            let hash = variable_hash(&name);
            if hash_to_index.insert(hash, index).is_some() {
                return Err(Error::Validation(format!("duplicate column name '{}'", name)));
            }
            variables.push(Variable { name, hash, index });
            values.push(col);
        }

        if variables.is_empty() {
            return Err(Error::Validation("dataset requires at least one column".into()));
        }

        Ok(Self { variables, values, hash_to_index, rows: rows.unwrap_or(0) })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.values.len()
    }

    /// The dataset's variables, in column order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Resolve a variable hash to its column index.
    pub fn get_index(&self, hash: u64) -> Option<usize> {
        self.hash_to_index.get(&hash).copied()
    }

    /// Full column by index.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn column(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    /// Full column by variable hash.
    pub fn values(&self, hash: u64) -> Option<&[f64]> {
        self.get_index(hash).map(|i| self.values[i].as_slice())
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.get_index(variable_hash(name)).map(|i| &self.variables[i])
    }
}
