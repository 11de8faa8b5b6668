//! End-to-end interpreter tests: concrete scenarios, finiteness,
//! determinism, batch-boundary independence, coefficient round-trips,
//! and dual-number consistency.

use approx::assert_relative_eq;
use gp_ad::{Dual, Scalar};
use gp_core::{variable_hash, Dataset, Node, NodeType, Range, Tree};
use gp_eval::{evaluate, BATCH_SIZE};

fn constant(v: f64) -> Tree {
    Tree::leaf(Node::constant(v))
}

fn variable(name: &str, weight: f64) -> Tree {
    Tree::leaf(Node::variable(variable_hash(name), weight))
}

fn single_column(name: &str, values: Vec<f64>) -> Dataset {
    Dataset::from_columns(vec![(name.to_string(), values)]).unwrap()
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn add_two_constants() {
    let tree = Tree::binary(NodeType::Add, constant(1.0), constant(2.0));
    let ds = single_column("x", vec![0.0; 4]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 4), None);
    assert_eq!(out, vec![3.0, 3.0, 3.0, 3.0]);
}

#[test]
fn weighted_variable_times_constant() {
    let tree = Tree::binary(NodeType::Mul, variable("x", 2.0), constant(3.0));
    let ds = single_column("x", vec![1.0, 2.0, 3.0, 4.0]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 4), None);
    assert_eq!(out, vec![6.0, 12.0, 18.0, 24.0]);
}

#[test]
fn variable_difference() {
    let tree = Tree::binary(NodeType::Sub, variable("x", 1.0), variable("y", 1.0));
    let ds = Dataset::from_columns(vec![
        ("x".to_string(), vec![5.0, 5.0, 5.0]),
        ("y".to_string(), vec![1.0, 2.0, 3.0]),
    ])
    .unwrap();
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 3), None);
    assert_eq!(out, vec![4.0, 3.0, 2.0]);
}

#[test]
fn division_by_zero_is_sanitized_to_midrange() {
    let tree = Tree::binary(NodeType::Div, constant(1.0), variable("x", 1.0));
    let ds = single_column("x", vec![1.0, 0.0, -1.0]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 3), None);
    // Raw values are [1, inf, -1]; the infinity collapses to the
    // midpoint of the finite min/max.
    assert_eq!(out, vec![1.0, 0.0, -1.0]);
}

#[test]
fn square_of_signed_inputs() {
    let tree = Tree::unary(NodeType::Square, variable("x", 1.0));
    let ds = single_column("x", vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 5), None);
    assert_eq!(out, vec![4.0, 1.0, 0.0, 1.0, 4.0]);
}

#[test]
fn signed_cube_root() {
    let tree = Tree::unary(NodeType::Cbrt, variable("x", 1.0));
    let ds = single_column("x", vec![-27.0, -8.0, 0.0, 8.0, 27.0]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 5), None);
    let expected = [-3.0, -2.0, 0.0, 2.0, 3.0];
    for (o, e) in out.iter().zip(expected) {
        assert_relative_eq!(*o, e, epsilon = 1e-12);
    }
}

#[test]
fn identity_tree_returns_column() {
    let values = vec![0.5, -1.5, 2.5, 3.5, -4.5];
    let ds = single_column("x", values.clone());
    let out = evaluate::<f64>(&variable("x", 1.0), &ds, Range::new(0, 5), None);
    assert_eq!(out, values);
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

/// A moderately deep tree mixing every operator family:
/// exp(sin(2x) + sqrt(|…|-free) …) kept smooth on positive data.
fn smooth_tree() -> Tree {
    let inner = Tree::binary(
        NodeType::Add,
        Tree::unary(NodeType::Sin, variable("x", 2.0)),
        Tree::binary(NodeType::Mul, variable("x", 1.0), constant(0.25)),
    );
    Tree::binary(NodeType::Add, Tree::unary(NodeType::Exp, inner), constant(1.0))
}

fn wide_dataset(rows: usize) -> Dataset {
    let x: Vec<f64> = (0..rows).map(|i| 0.1 + i as f64 * 0.01).collect();
    single_column("x", x)
}

#[test]
fn outputs_are_always_finite() {
    // log over non-positive inputs produces -inf and NaN pre-sanitization.
    let tree = Tree::unary(NodeType::Log, variable("x", 1.0));
    let ds = single_column("x", vec![-1.0, 0.0, 0.5, 1.0, 2.0]);
    let out = evaluate::<f64>(&tree, &ds, Range::new(0, 5), None);
    assert!(out.iter().all(|v| v.is_finite()));

    // Bounded by the min/max of the finite log values.
    let finite_min = 0.5_f64.ln();
    let finite_max = 2.0_f64.ln();
    assert!(out.iter().all(|&v| v >= finite_min && v <= finite_max));
}

#[test]
fn evaluation_is_deterministic() {
    let tree = smooth_tree();
    let ds = wide_dataset(333);
    let range = Range::new(0, 333);
    let a = evaluate::<f64>(&tree, &ds, range, None);
    let b = evaluate::<f64>(&tree, &ds, range, None);
    assert_eq!(a, b);
}

#[test]
fn output_is_independent_of_batch_boundaries() {
    // Row i's value must not depend on where it falls within a batch.
    // Compare a full-range evaluation against per-row evaluations at
    // sizes that straddle the batch width.
    let tree = smooth_tree();
    for rows in [1, BATCH_SIZE - 1, BATCH_SIZE, BATCH_SIZE + 1, 200] {
        let ds = wide_dataset(rows);
        let full = evaluate::<f64>(&tree, &ds, Range::new(0, rows), None);
        for row in 0..rows {
            let single = evaluate::<f64>(&tree, &ds, Range::new(row, row + 1), None);
            assert_eq!(single[0], full[row], "row {} of {}", row, rows);
        }
    }
}

#[test]
fn coefficient_round_trip_preserves_output() {
    let mut tree = smooth_tree();
    let ds = wide_dataset(100);
    let range = Range::new(0, 100);
    let before = evaluate::<f64>(&tree, &ds, range, None);
    let coef = tree.coefficients();
    tree.set_coefficients(&coef);
    let after = evaluate::<f64>(&tree, &ds, range, None);
    assert_eq!(before, after);
}

#[test]
fn explicit_parameters_match_embedded_coefficients() {
    let tree = smooth_tree();
    let ds = wide_dataset(100);
    let range = Range::new(0, 100);
    let implicit = evaluate::<f64>(&tree, &ds, range, None);
    let explicit = evaluate::<f64>(&tree, &ds, range, Some(&tree.coefficients()));
    assert_eq!(implicit, explicit);
}

// ---------------------------------------------------------------------------
// Dual-number consistency
// ---------------------------------------------------------------------------

#[test]
fn dual_values_match_plain_evaluation() {
    let tree = smooth_tree();
    let ds = wide_dataset(150);
    let range = Range::new(0, 150);

    let plain = evaluate::<f64>(&tree, &ds, range, None);
    let duals: Vec<Dual> = tree.coefficients().iter().map(|&c| Dual::constant(c)).collect();
    let dual_out = evaluate::<Dual>(&tree, &ds, range, Some(&duals));

    for (d, p) in dual_out.iter().zip(&plain) {
        assert_eq!(d.val, *p);
    }
}

#[test]
fn dual_jacobian_matches_finite_differences() {
    let tree = smooth_tree();
    let ds = wide_dataset(80);
    let range = Range::new(0, 80);
    let coef = tree.coefficients();

    for k in 0..coef.len() {
        // Forward-mode column k.
        let seeded: Vec<Dual> = coef
            .iter()
            .enumerate()
            .map(|(j, &c)| if j == k { Dual::var(c) } else { Dual::constant(c) })
            .collect();
        let dual_out = evaluate::<Dual>(&tree, &ds, range, Some(&seeded));

        // Central differences.
        let h = 1e-6 * coef[k].abs().max(1.0);
        let mut plus = coef.clone();
        plus[k] += h;
        let mut minus = coef.clone();
        minus[k] -= h;
        let f_plus = evaluate::<f64>(&tree, &ds, range, Some(&plus));
        let f_minus = evaluate::<f64>(&tree, &ds, range, Some(&minus));

        for i in 0..range.size() {
            let numeric = (f_plus[i] - f_minus[i]) / (2.0 * h);
            assert_relative_eq!(dual_out[i].dot, numeric, max_relative = 1e-4, epsilon = 1e-8);
        }
    }
}
