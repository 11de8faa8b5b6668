//! Residual functor bridging tree evaluation and least squares.

use gp_ad::Scalar;
use gp_core::{Dataset, Range, Tree};
use gp_eval::evaluate_into;

/// Presents `residual[i] = predicted[i] − target[i]` over a fixed
/// `(tree, dataset, target, range)` tuple, generic over the scalar type
/// so the least-squares driver can push dual numbers through the same
/// evaluation path.
pub struct ResidualFunctor<'a> {
    tree: &'a Tree,
    dataset: &'a Dataset,
    target: &'a [f64],
    range: Range,
}

impl<'a> ResidualFunctor<'a> {
    /// Bind the functor to its problem data.
    ///
    /// # Panics
    /// Panics if `target` does not cover exactly `range.size()` rows.
    pub fn new(tree: &'a Tree, dataset: &'a Dataset, target: &'a [f64], range: Range) -> Self {
        assert_eq!(target.len(), range.size(), "target length mismatch");
        Self { tree, dataset, target, range }
    }

    /// Number of residuals (rows in the range).
    pub fn residual_count(&self) -> usize {
        self.range.size()
    }

    /// Evaluate the tree under `parameters` and write the residual
    /// vector into `out`.
    pub fn residuals_into<T: Scalar>(&self, parameters: &[T], out: &mut [T]) {
        evaluate_into(self.tree, self.dataset, self.range, Some(parameters), out);
        for (r, &t) in out.iter_mut().zip(self.target) {
            *r = *r - T::from_f64(t);
        }
    }
}
