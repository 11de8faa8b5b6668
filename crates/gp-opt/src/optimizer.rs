//! Trust-region Levenberg–Marquardt coefficient fitting.
//!
//! Fits the numeric coefficients of a tree (constants and variable
//! weights) against a target column by minimizing `½ Σ residual²`.
//! Jacobians come from forward-mode dual numbers or central finite
//! differences; the damped step is obtained from a dense QR
//! factorization of the augmented system `[J; √λ·D]` with column-norm
//! scaling `D`.
//!
//! The fit runs single-threaded. Outer evolutionary loops parallelize
//! across independent individuals instead.

use crate::residual::ResidualFunctor;
use gp_ad::Dual;
use gp_core::{Dataset, Range, Tree};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Jacobian source for the least-squares driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// Forward-mode dual numbers, one seeded parameter per pass.
    Autodiff,
    /// Central finite differences with adaptive step size.
    Numeric,
}

/// Configuration for a coefficient fit.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Iteration budget: at most `iterations.saturating_sub(1)`
    /// trust-region steps are performed.
    pub iterations: usize,
    /// Write the fitted coefficients back into the tree.
    pub write_coefficients: bool,
    /// Emit progress events via `tracing`.
    pub report: bool,
    /// Jacobian source.
    pub mode: DiffMode,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self { iterations: 50, write_coefficients: true, report: false, mode: DiffMode::Autodiff }
    }
}

/// Why a fit stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The tree had no coefficients to fit.
    Skipped,
    /// Gradient, step, or cost tolerance reached.
    Converged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Singular or non-finite linear step; coefficients kept as-is.
    Failed,
}

/// Result of a coefficient fit. Costs are `½‖residual‖²`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Number of iterations performed.
    pub iterations: usize,
    /// Cost at the initial coefficients.
    pub initial_cost: f64,
    /// Cost at the final coefficients.
    pub final_cost: f64,
    /// Why the loop stopped.
    pub termination: TerminationReason,
}

impl Default for OptimizationSummary {
    fn default() -> Self {
        Self {
            iterations: 0,
            initial_cost: 0.0,
            final_cost: 0.0,
            termination: TerminationReason::Skipped,
        }
    }
}

impl fmt::Display for OptimizationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OptimizationSummary(iterations={}, initial_cost={:.6e}, final_cost={:.6e}, termination={:?})",
            self.iterations, self.initial_cost, self.final_cost, self.termination
        )
    }
}

const GRADIENT_TOL: f64 = 1e-8;
const STEP_TOL: f64 = 1e-12;
const COST_TOL: f64 = 1e-12;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_DECREASE: f64 = 0.1;
const LAMBDA_INCREASE: f64 = 10.0;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;

/// Fit the coefficients of `tree` against `target` over `range`.
///
/// Never panics on numerical trouble and never propagates an error to
/// the caller: ill-conditioned Jacobians surface as
/// [`TerminationReason::Failed`] with a well-defined coefficient
/// vector. The tree structure is never modified; only constant values
/// and variable weights are, and only when `write_coefficients` is set.
pub fn optimize(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    config: &OptimizerConfig,
) -> OptimizationSummary {
    let coefficients = tree.coefficients();
    if coefficients.is_empty() {
        return OptimizationSummary::default();
    }
    if config.report {
        tracing::info!(coefficients = ?coefficients, tree = %tree, "coefficient fit: start");
    }

    let (fitted, summary) = {
        let functor = ResidualFunctor::new(&*tree, dataset, target, range);
        solve(&functor, coefficients, config)
    };

    if config.report {
        tracing::info!(
            iterations = summary.iterations,
            initial_cost = summary.initial_cost,
            final_cost = summary.final_cost,
            termination = ?summary.termination,
            coefficients = ?fitted,
            "coefficient fit: done"
        );
    }
    if config.write_coefficients {
        tree.set_coefficients(&fitted);
    }
    summary
}

/// [`optimize`] with autodiff Jacobians, coefficient write-back, and no
/// reporting.
pub fn optimize_autodiff(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    iterations: usize,
) -> OptimizationSummary {
    let config = OptimizerConfig { iterations, mode: DiffMode::Autodiff, ..Default::default() };
    optimize(tree, dataset, target, range, &config)
}

/// [`optimize`] with finite-difference Jacobians, coefficient
/// write-back, and no reporting.
pub fn optimize_numeric(
    tree: &mut Tree,
    dataset: &Dataset,
    target: &[f64],
    range: Range,
    iterations: usize,
) -> OptimizationSummary {
    let config = OptimizerConfig { iterations, mode: DiffMode::Numeric, ..Default::default() };
    optimize(tree, dataset, target, range, &config)
}

fn solve(
    functor: &ResidualFunctor<'_>,
    initial: Vec<f64>,
    config: &OptimizerConfig,
) -> (Vec<f64>, OptimizationSummary) {
    let m = functor.residual_count();
    let n = initial.len();
    let max_iterations = config.iterations.saturating_sub(1);

    let mut x = DVector::from_vec(initial);
    let mut residual = DVector::zeros(m);
    functor.residuals_into(x.as_slice(), residual.as_mut_slice());
    let initial_cost = 0.5 * residual.norm_squared();
    let mut cost = initial_cost;

    let mut jacobian = DMatrix::zeros(m, n);
    let mut jacobian_stale = true;
    let mut lambda = LAMBDA_INIT;
    let mut termination = TerminationReason::MaxIterations;
    let mut iterations = 0;

    loop {
        if iterations >= max_iterations {
            break;
        }
        if jacobian_stale {
            fill_jacobian(functor, x.as_slice(), &mut jacobian, config.mode);
            jacobian_stale = false;
            let gradient = jacobian.transpose() * &residual;
            if gradient.amax() < GRADIENT_TOL {
                termination = TerminationReason::Converged;
                break;
            }
        }

        let step = match damped_step(&jacobian, &residual, lambda) {
            Some(s) if s.iter().all(|v| v.is_finite()) => s,
            _ => {
                termination = TerminationReason::Failed;
                break;
            }
        };

        iterations += 1;
        let x_new = &x + &step;
        let mut residual_new = DVector::zeros(m);
        functor.residuals_into(x_new.as_slice(), residual_new.as_mut_slice());
        let cost_new = 0.5 * residual_new.norm_squared();

        if cost_new.is_finite() && cost_new < cost {
            let small_decrease = cost - cost_new <= COST_TOL * cost;
            let small_step = step.norm() <= STEP_TOL * (x.norm() + STEP_TOL);
            x = x_new;
            residual = residual_new;
            cost = cost_new;
            lambda = (lambda * LAMBDA_DECREASE).max(LAMBDA_MIN);
            jacobian_stale = true;
            if small_decrease || small_step {
                termination = TerminationReason::Converged;
                break;
            }
        } else {
            lambda *= LAMBDA_INCREASE;
            if lambda > LAMBDA_MAX {
                termination = TerminationReason::Failed;
                break;
            }
        }
    }

    let summary = OptimizationSummary {
        iterations,
        initial_cost,
        final_cost: cost,
        termination,
    };
    (x.as_slice().to_vec(), summary)
}

/// Solve `(JᵀJ + λ·DᵀD) δ = −Jᵀr` through the QR factorization of the
/// augmented matrix `[J; √λ·D]`, `D = diag(max(‖J.col(k)‖, 1))`.
fn damped_step(
    jacobian: &DMatrix<f64>,
    residual: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, n) = jacobian.shape();
    let mut augmented = DMatrix::zeros(m + n, n);
    augmented.view_mut((0, 0), (m, n)).copy_from(jacobian);
    for k in 0..n {
        let scale = jacobian.column(k).norm().max(1.0);
        augmented[(m + k, k)] = lambda.sqrt() * scale;
    }
    let mut rhs = DVector::zeros(m + n);
    rhs.rows_mut(0, m).copy_from(residual);
    rhs.neg_mut();

    let qr = augmented.qr();
    let qtb = qr.q().transpose() * rhs;
    qr.r().solve_upper_triangular(&qtb)
}

fn fill_jacobian(
    functor: &ResidualFunctor<'_>,
    x: &[f64],
    jacobian: &mut DMatrix<f64>,
    mode: DiffMode,
) {
    match mode {
        DiffMode::Autodiff => jacobian_autodiff(functor, x, jacobian),
        DiffMode::Numeric => jacobian_numeric(functor, x, jacobian),
    }
}

fn jacobian_autodiff(functor: &ResidualFunctor<'_>, x: &[f64], jacobian: &mut DMatrix<f64>) {
    let m = jacobian.nrows();
    let mut parameters: Vec<Dual> = x.iter().map(|&v| Dual::constant(v)).collect();
    let mut out = vec![Dual::constant(0.0); m];
    for k in 0..x.len() {
        parameters[k] = Dual::var(x[k]);
        functor.residuals_into(&parameters, &mut out);
        for i in 0..m {
            jacobian[(i, k)] = out[i].dot;
        }
        parameters[k] = Dual::constant(x[k]);
    }
}

fn jacobian_numeric(functor: &ResidualFunctor<'_>, x: &[f64], jacobian: &mut DMatrix<f64>) {
    let m = jacobian.nrows();
    let mut plus = x.to_vec();
    let mut minus = x.to_vec();
    let mut r_plus = vec![0.0; m];
    let mut r_minus = vec![0.0; m];
    for k in 0..x.len() {
        // Adaptive step size: eps = sqrt(machine_epsilon) * max(|x_k|, 1)
        let eps = 1e-8 * x[k].abs().max(1.0);
        plus[k] = x[k] + eps;
        minus[k] = x[k] - eps;
        functor.residuals_into(&plus, &mut r_plus);
        functor.residuals_into(&minus, &mut r_minus);
        for i in 0..m {
            jacobian[(i, k)] = (r_plus[i] - r_minus[i]) / (2.0 * eps);
        }
        plus[k] = x[k];
        minus[k] = x[k];
    }
}
