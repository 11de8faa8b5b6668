//! Candidate solutions evaluated by the fitness functions.

use crate::tree::Tree;

/// A candidate individual: a genotype tree and its last assigned
/// fitness (lower is better; unevaluated individuals carry the worst
/// admissible value).
#[derive(Debug, Clone)]
pub struct Individual {
    /// The expression tree.
    pub genotype: Tree,
    /// Scalar fitness, lower is better.
    pub fitness: f64,
}

impl Individual {
    /// Wrap a genotype with the worst admissible fitness.
    pub fn new(genotype: Tree) -> Self {
        Self { genotype, fitness: f64::MAX }
    }
}
