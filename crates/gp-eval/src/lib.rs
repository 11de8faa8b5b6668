//! # gp-eval
//!
//! Batched evaluation of postfix expression trees against columnar data.
//!
//! The interpreter walks the linear program once per batch of rows,
//! keeping one scratch column per node, and is generic over the
//! [`Scalar`](gp_ad::Scalar) type so the same body serves plain `f64`
//! evaluation and forward-mode derivative propagation. Outputs are
//! sanitized: every entry of an evaluation result is finite.
//!
//! Error metrics (NMSE, Pearson R²) used by the fitness evaluators live
//! in [`metrics`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod interpreter;
pub mod metrics;

pub use interpreter::{evaluate, evaluate_into, limit_to_range, min_max_finite, BATCH_SIZE};
