//! Fitness evaluators ranking individuals by prediction error.
//!
//! Both evaluators optionally run a bounded coefficient fit before the
//! final prediction, and expose monotonic counters so the outer search
//! can account for the total evaluation effort.

use crate::optimizer::optimize_autodiff;
use gp_core::{Individual, Problem};
use gp_eval::evaluate;
use gp_eval::metrics::{normalized_mean_squared_error, r_squared};
use rand::RngCore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A scalar fitness function over individuals; lower is better.
pub trait FitnessEvaluator {
    /// Score one individual. Coefficient fitting, when enabled, writes
    /// the fitted values back into the genotype.
    fn evaluate(&self, rng: &mut dyn RngCore, individual: &mut Individual) -> f64;

    /// Per-generation hook; stateless in this release.
    fn prepare(&self, _population: &[Individual]) {}

    /// Number of fitness evaluations performed so far.
    fn fitness_evaluations(&self) -> usize;

    /// Accumulated coefficient-fit iterations across all evaluations.
    fn local_evaluations(&self) -> usize;
}

#[derive(Default)]
struct EvaluationCounters {
    fitness: AtomicUsize,
    local: AtomicUsize,
}

/// Shared body of both evaluators: optional coefficient fit, then a
/// final prediction over the training range.
fn predict(problem: &Problem, individual: &mut Individual, iterations: usize, counters: &EvaluationCounters) -> Vec<f64> {
    counters.fitness.fetch_add(1, Ordering::Relaxed);
    let dataset = problem.dataset();
    let range = problem.training_range();
    let target = &problem.target_values()[range.start()..range.end()];

    if iterations > 0 {
        let summary =
            optimize_autodiff(&mut individual.genotype, dataset, target, range, iterations);
        counters.local.fetch_add(summary.iterations, Ordering::Relaxed);
    }

    evaluate::<f64>(&individual.genotype, dataset, range, None)
}

/// Normalized-mean-squared-error fitness: `mse / var(target)`, with
/// non-finite values mapped to the largest representable scalar.
pub struct NmseEvaluator<'a> {
    problem: &'a Problem,
    iterations: usize,
    counters: EvaluationCounters,
}

impl<'a> NmseEvaluator<'a> {
    /// Evaluator without coefficient fitting.
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem, iterations: 0, counters: EvaluationCounters::default() }
    }

    /// Enable a coefficient fit of up to `iterations` steps before each
    /// final prediction.
    pub fn with_local_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

impl FitnessEvaluator for NmseEvaluator<'_> {
    fn evaluate(&self, _rng: &mut dyn RngCore, individual: &mut Individual) -> f64 {
        let estimated = predict(self.problem, individual, self.iterations, &self.counters);
        let range = self.problem.training_range();
        let target = &self.problem.target_values()[range.start()..range.end()];
        let nmse = normalized_mean_squared_error(&estimated, target);
        if nmse.is_finite() { nmse } else { f64::MAX }
    }

    fn fitness_evaluations(&self) -> usize {
        self.counters.fitness.load(Ordering::Relaxed)
    }

    fn local_evaluations(&self) -> usize {
        self.counters.local.load(Ordering::Relaxed)
    }
}

/// `1 − R²` fitness: the squared Pearson correlation between prediction
/// and target, clamped to `[0, 1]`, subtracted from one. Non-finite
/// correlations score as zero (worst fitness 1).
pub struct RSquaredEvaluator<'a> {
    problem: &'a Problem,
    iterations: usize,
    counters: EvaluationCounters,
}

impl<'a> RSquaredEvaluator<'a> {
    /// Lower clamp bound for R².
    pub const LOWER_BOUND: f64 = 0.0;
    /// Upper clamp bound for R².
    pub const UPPER_BOUND: f64 = 1.0;

    /// Evaluator without coefficient fitting.
    pub fn new(problem: &'a Problem) -> Self {
        Self { problem, iterations: 0, counters: EvaluationCounters::default() }
    }

    /// Enable a coefficient fit of up to `iterations` steps before each
    /// final prediction.
    pub fn with_local_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

impl FitnessEvaluator for RSquaredEvaluator<'_> {
    fn evaluate(&self, _rng: &mut dyn RngCore, individual: &mut Individual) -> f64 {
        let estimated = predict(self.problem, individual, self.iterations, &self.counters);
        let range = self.problem.training_range();
        let target = &self.problem.target_values()[range.start()..range.end()];
        let mut r2 = r_squared(&estimated, target);
        if !r2.is_finite() {
            r2 = 0.0;
        }
        let r2 = r2.clamp(Self::LOWER_BOUND, Self::UPPER_BOUND);
        Self::UPPER_BOUND - r2 + Self::LOWER_BOUND
    }

    fn fitness_evaluations(&self) -> usize {
        self.counters.fitness.load(Ordering::Relaxed)
    }

    fn local_evaluations(&self) -> usize {
        self.counters.local.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gp_core::{variable_hash, Dataset, Node, Range, Tree};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn problem() -> Problem {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        let ds = Dataset::from_columns(vec![
            ("x".to_string(), x),
            ("y".to_string(), y),
        ])
        .unwrap();
        Problem::new(ds, "y", Range::new(0, 10)).unwrap()
    }

    fn identity_individual() -> Individual {
        Individual::new(Tree::leaf(Node::variable(variable_hash("x"), 1.0)))
    }

    #[test]
    fn test_nmse_perfect_model_scores_zero() {
        let problem = problem();
        let evaluator = NmseEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(0);
        // 2x predicts y exactly.
        let mut ind = Individual::new(Tree::leaf(Node::variable(variable_hash("x"), 2.0)));
        let fitness = evaluator.evaluate(&mut rng, &mut ind);
        assert_relative_eq!(fitness, 0.0, epsilon = 1e-12);
        assert_eq!(evaluator.fitness_evaluations(), 1);
        assert_eq!(evaluator.local_evaluations(), 0);
    }

    #[test]
    fn test_r_squared_correlated_model_scores_zero() {
        let problem = problem();
        let evaluator = RSquaredEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(0);
        // x is perfectly correlated with 2x even without fitting.
        let mut ind = identity_individual();
        let fitness = evaluator.evaluate(&mut rng, &mut ind);
        assert_relative_eq!(fitness, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_r_squared_constant_model_scores_worst() {
        let problem = problem();
        let evaluator = RSquaredEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(0);
        // A constant prediction has undefined correlation, scored as 1.
        let mut ind = Individual::new(Tree::leaf(Node::constant(3.0)));
        let fitness = evaluator.evaluate(&mut rng, &mut ind);
        assert_eq!(fitness, 1.0);
    }

    #[test]
    fn test_local_iterations_fit_and_count() {
        let problem = problem();
        let evaluator = NmseEvaluator::new(&problem).with_local_iterations(30);
        let mut rng = StdRng::seed_from_u64(0);
        // Weight starts at 1; the fit should pull it to 2.
        let mut ind = identity_individual();
        let fitness = evaluator.evaluate(&mut rng, &mut ind);
        assert!(fitness < 1e-10, "fitness {}", fitness);
        assert_relative_eq!(ind.genotype.coefficients()[0], 2.0, epsilon = 1e-6);
        assert_eq!(evaluator.fitness_evaluations(), 1);
        assert!(evaluator.local_evaluations() > 0);
    }

    #[test]
    fn test_counters_are_monotonic() {
        let problem = problem();
        let evaluator = NmseEvaluator::new(&problem);
        let mut rng = StdRng::seed_from_u64(7);
        let mut ind = identity_individual();
        for expected in 1..=3 {
            evaluator.evaluate(&mut rng, &mut ind);
            assert_eq!(evaluator.fitness_evaluations(), expected);
        }
    }

    #[test]
    fn test_prepare_is_stateless() {
        let problem = problem();
        let evaluator = NmseEvaluator::new(&problem);
        evaluator.prepare(&[identity_individual()]);
        assert_eq!(evaluator.fitness_evaluations(), 0);
    }
}
