//! # gp-opt
//!
//! Coefficient optimization and fitness evaluation.
//!
//! A [`ResidualFunctor`] presents a tree's prediction error as the
//! residual vector of a nonlinear least-squares problem; the
//! trust-region Levenberg–Marquardt loop in [`optimizer`] fits the
//! tree's numeric coefficients against a target column, with Jacobians
//! from forward-mode dual numbers or central finite differences. The
//! [`evaluator`] module exposes the NMSE and 1−R² fitness functions the
//! evolutionary search ranks individuals by.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod evaluator;
pub mod optimizer;
pub mod residual;

pub use evaluator::{FitnessEvaluator, NmseEvaluator, RSquaredEvaluator};
pub use optimizer::{
    optimize, optimize_autodiff, optimize_numeric, DiffMode, OptimizationSummary,
    OptimizerConfig, TerminationReason,
};
pub use residual::ResidualFunctor;
