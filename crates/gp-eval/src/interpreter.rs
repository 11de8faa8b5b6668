//! Batched postfix interpreter.
//!
//! Rows are processed in fixed-size batches. The interpreter keeps a
//! scratch matrix with one column per node; column `i` holds the running
//! value of the subtree rooted at node `i` across the current batch.
//! Children sit strictly to the left of their parents in the postfix
//! order, so splitting the scratch buffer at the current column yields
//! disjoint borrows of operands and destination.

use gp_ad::Scalar;
use gp_core::{Dataset, Node, NodeType, Range, Tree};

/// Number of rows processed per batch.
pub const BATCH_SIZE: usize = 64;

/// Evaluate `tree` against `dataset` over `range`.
///
/// `parameters` optionally overrides the tree's embedded coefficients;
/// it must match the layout of [`Tree::coefficients`]. Every entry of
/// the output is finite (see [`limit_to_range`]).
///
/// # Panics
/// Panics on structural programming errors: a variable hash unknown to
/// the dataset, a parameter buffer of the wrong length, or a range
/// extending past the dataset rows.
pub fn evaluate<T: Scalar>(
    tree: &Tree,
    dataset: &Dataset,
    range: Range,
    parameters: Option<&[T]>,
) -> Vec<T> {
    let mut result = vec![T::from_f64(0.0); range.size()];
    evaluate_into(tree, dataset, range, parameters, &mut result);
    result
}

/// In-place variant of [`evaluate`]: writes into a caller-provided slice
/// of length `range.size()`.
pub fn evaluate_into<T: Scalar>(
    tree: &Tree,
    dataset: &Dataset,
    range: Range,
    parameters: Option<&[T]>,
    result: &mut [T],
) {
    let nodes = tree.nodes();
    let n = nodes.len();
    assert_eq!(result.len(), range.size(), "result buffer length mismatch");
    assert!(range.end() <= dataset.rows(), "range exceeds dataset rows");
    if let Some(p) = parameters {
        let expected = nodes.iter().filter(|node| node.is_leaf()).count();
        assert_eq!(p.len(), expected, "parameter buffer length mismatch");
    }

    let mut scratch = vec![T::from_f64(0.0); BATCH_SIZE * n];
    let mut columns = vec![0usize; n];

    // Setup pass: constants broadcast their (possibly overridden) value
    // into their column once; variables resolve their dataset column.
    // The parameter cursor walks the coefficient vector in node order.
    let mut idx = 0;
    for (i, node) in nodes.iter().enumerate() {
        if node.is_constant() {
            let v = match parameters {
                Some(p) => p[idx],
                None => T::from_f64(node.value),
            };
            scratch[i * BATCH_SIZE..(i + 1) * BATCH_SIZE].fill(v);
            idx += 1;
        } else if node.is_variable() {
            columns[i] = dataset.get_index(node.hash_value).unwrap_or_else(|| {
                panic!("unknown variable hash {:#018x}", node.hash_value)
            });
            idx += 1;
        }
    }

    let num_rows = range.size();
    let mut row = 0;
    while row < num_rows {
        let remaining = BATCH_SIZE.min(num_rows - row);
        let mut idx = 0;
        for (i, node) in nodes.iter().enumerate() {
            let (operands, rest) = scratch.split_at_mut(i * BATCH_SIZE);
            let current = &mut rest[..BATCH_SIZE];
            match node.node_type {
                NodeType::Add => binary(current, operands, nodes, i, |a, b| a + b),
                NodeType::Sub => binary(current, operands, nodes, i, |a, b| a - b),
                NodeType::Mul => binary(current, operands, nodes, i, |a, b| a * b),
                NodeType::Div => binary(current, operands, nodes, i, |a, b| a / b),
                NodeType::Log => unary(current, operands, i, T::ln),
                NodeType::Exp => unary(current, operands, i, T::exp),
                NodeType::Sin => unary(current, operands, i, T::sin),
                NodeType::Cos => unary(current, operands, i, T::cos),
                NodeType::Tan => unary(current, operands, i, T::tan),
                NodeType::Sqrt => unary(current, operands, i, T::sqrt),
                NodeType::Cbrt => unary(current, operands, i, T::cbrt),
                NodeType::Square => unary(current, operands, i, T::square),
                NodeType::Constant => {
                    // Column filled during setup.
                    idx += 1;
                }
                NodeType::Variable => {
                    let w = match parameters {
                        Some(p) => p[idx],
                        None => T::from_f64(node.value),
                    };
                    idx += 1;
                    let column = dataset.column(columns[i]);
                    let offset = range.start() + row;
                    let segment = &column[offset..offset + remaining];
                    for (r, &x) in current[..remaining].iter_mut().zip(segment) {
                        *r = w * T::from_f64(x);
                    }
                }
            }
        }
        // The final value lives in the root's column.
        let root = &scratch[(n - 1) * BATCH_SIZE..];
        result[row..row + remaining].copy_from_slice(&root[..remaining]);
        row += BATCH_SIZE;
    }

    // Replace NaN and infinite entries.
    let (min, max) = min_max_finite(result);
    limit_to_range(result, min, max);
}

#[inline]
fn binary<T: Scalar>(
    current: &mut [T],
    operands: &[T],
    nodes: &[Node],
    i: usize,
    op: impl Fn(T, T) -> T,
) {
    let c1 = i - 1;
    let c2 = c1 - 1 - nodes[c1].length as usize;
    let a = &operands[c1 * BATCH_SIZE..(c1 + 1) * BATCH_SIZE];
    let b = &operands[c2 * BATCH_SIZE..(c2 + 1) * BATCH_SIZE];
    for ((r, &x), &y) in current.iter_mut().zip(a).zip(b) {
        *r = op(x, y);
    }
}

#[inline]
fn unary<T: Scalar>(current: &mut [T], operands: &[T], i: usize, op: impl Fn(T) -> T) {
    let c = i - 1;
    let a = &operands[c * BATCH_SIZE..(c + 1) * BATCH_SIZE];
    for (r, &x) in current.iter_mut().zip(a) {
        *r = op(x);
    }
}

/// Minimum and maximum over the finite entries of `values`.
///
/// When no entry is finite the sentinels `(f64::MAX, f64::MIN)` are
/// returned, whose midpoint is zero.
pub fn min_max_finite<T: Scalar>(values: &[T]) -> (T, T) {
    let mut min = T::from_f64(f64::MAX);
    let mut max = T::from_f64(f64::MIN);
    for v in values {
        if !v.is_finite() {
            continue;
        }
        if min > *v {
            min = *v;
        }
        if max < *v {
            max = *v;
        }
    }
    (min, max)
}

/// Clamp finite entries of `values` to `[min, max]` and replace
/// non-finite entries with the midpoint `(min + max) / 2`.
pub fn limit_to_range<T: Scalar>(values: &mut [T], min: T, max: T) {
    let mid = (min + max) / T::from_f64(2.0);
    for v in values.iter_mut() {
        *v = if v.is_finite() { v.clamp_s(min, max) } else { mid };
    }
}
