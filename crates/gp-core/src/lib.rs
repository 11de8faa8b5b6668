//! # gp-core
//!
//! Core data model for the GP symbolic-regression framework.
//!
//! Provides the linear (postfix) expression representation ([`Node`],
//! [`Tree`]), the columnar [`Dataset`] with hash-based variable lookup,
//! the row [`Range`], and the [`Problem`]/[`Individual`] types consumed
//! by the fitness evaluators.
//!
//! ## Architecture
//!
//! Expression trees are stored flat, in postfix order, with the subtree
//! length cached on every node. Child lookup for a binary operator at
//! index `i` is O(1): the first operand sits at `i - 1`, the second at
//! `i - 2 - length(i - 1)`. Evaluation code (gp-eval) and the coefficient
//! optimizer (gp-opt) depend only on the types in this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dataset;
pub mod error;
pub mod individual;
pub mod node;
pub mod problem;
pub mod range;
pub mod tree;

pub use dataset::{variable_hash, Dataset, Variable};
pub use error::{Error, Result};
pub use individual::Individual;
pub use node::{Node, NodeType};
pub use problem::Problem;
pub use range::Range;
pub use tree::Tree;
