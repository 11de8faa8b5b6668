//! Regression problem definition.

use crate::dataset::{variable_hash, Dataset};
use crate::error::{Error, Result};
use crate::range::Range;

/// A regression problem: a dataset, the training row range, and the
/// target variable the predictions are scored against.
#[derive(Debug, Clone)]
pub struct Problem {
    dataset: Dataset,
    training_range: Range,
    target_name: String,
    target_hash: u64,
}

impl Problem {
    /// Create a problem over `dataset` with the given target column and
    /// training range.
    pub fn new(dataset: Dataset, target: impl Into<String>, training_range: Range) -> Result<Self> {
        let target_name = target.into();
        let target_hash = variable_hash(&target_name);
        if dataset.get_index(target_hash).is_none() {
            return Err(Error::Validation(format!(
                "target variable '{}' not found in dataset",
                target_name
            )));
        }
        if training_range.end() > dataset.rows() {
            return Err(Error::Validation(format!(
                "training range [{}, {}) exceeds dataset rows ({})",
                training_range.start(),
                training_range.end(),
                dataset.rows()
            )));
        }
        Ok(Self { dataset, training_range, target_name, target_hash })
    }

    /// The underlying dataset.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Rows used for training.
    pub fn training_range(&self) -> Range {
        self.training_range
    }

    /// Hash of the target variable.
    pub fn target_variable(&self) -> u64 {
        self.target_hash
    }

    /// Name of the target variable.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Full target column.
    pub fn target_values(&self) -> &[f64] {
        self.dataset
            .values(self.target_hash)
            .expect("target column validated at construction")
    }
}
