//! Linear (postfix) expression trees.

use crate::error::{Error, Result};
use crate::node::{Node, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An expression tree stored flat, in postfix order.
///
/// Every operator appears after its operands and the root is the final
/// element. The first operand of an operator at index `i` is at `i - 1`;
/// the second at `i - 2 - length(i - 1)`. Sibling subtrees are walked
/// leftwards by skipping `length + 1` nodes at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Build a tree from nodes in postfix order.
    ///
    /// Validates the structure and recomputes the cached subtree lengths
    /// and depths. Binary arithmetic nodes must have arity exactly 2;
    /// grammars producing higher-arity variadics are rejected here rather
    /// than silently misevaluated.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        let mut tree = Self { nodes };
        tree.update_nodes()?;
        Ok(tree)
    }

    /// Single-leaf tree.
    pub fn leaf(node: Node) -> Self {
        debug_assert!(node.is_leaf());
        Self { nodes: vec![node] }
    }

    /// Apply a unary function to a subtree.
    ///
    /// # Panics
    /// Panics if `op` is not a unary node type.
    pub fn unary(op: NodeType, child: Tree) -> Self {
        assert_eq!(op.arity(), 1, "{} is not unary", op.name());
        let mut nodes = child.nodes;
        nodes.push(Node::new(op));
        let mut tree = Self { nodes };
        tree.update_nodes().expect("child tree was well-formed");
        tree
    }

    /// Combine two subtrees under a binary operator.
    ///
    /// Operands are laid out right-to-left so that `lhs` is the operator's
    /// first argument (the node at `i - 1`).
    ///
    /// # Panics
    /// Panics if `op` is not a binary node type.
    pub fn binary(op: NodeType, lhs: Tree, rhs: Tree) -> Self {
        assert_eq!(op.arity(), 2, "{} is not binary", op.name());
        let mut nodes = rhs.nodes;
        nodes.extend(lhs.nodes);
        nodes.push(Node::new(op));
        let mut tree = Self { nodes };
        tree.update_nodes().expect("operand trees were well-formed");
        tree
    }

    /// The nodes in postfix order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to the nodes.
    ///
    /// Callers must not change the structure (types, arities) without
    /// re-running [`update_nodes`](Self::update_nodes).
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the tree (a single leaf has depth 1).
    pub fn depth(&self) -> usize {
        self.nodes.last().map_or(0, |n| n.depth as usize)
    }

    /// Recompute the cached `length` and `depth` of every node from the
    /// postfix structure, validating it along the way.
    pub fn update_nodes(&mut self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::Validation("tree must contain at least one node".into()));
        }
        for i in 0..self.nodes.len() {
            let node = self.nodes[i];
            if node.arity != node.node_type.arity() {
                return Err(Error::Validation(format!(
                    "node {} at index {} has arity {}, expected {}",
                    node.name(),
                    i,
                    node.arity,
                    node.node_type.arity()
                )));
            }
            if node.is_leaf() {
                self.nodes[i].length = 0;
                self.nodes[i].depth = 1;
                continue;
            }
            let mut length = 0usize;
            let mut depth = 0u16;
            let mut child = i.checked_sub(1);
            for _ in 0..node.arity {
                let c = child.ok_or_else(|| {
                    Error::Validation(format!(
                        "operator {} at index {} is missing operands",
                        node.name(),
                        i
                    ))
                })?;
                length += self.nodes[c].length as usize + 1;
                depth = depth.max(self.nodes[c].depth);
                child = c.checked_sub(self.nodes[c].length as usize + 1);
            }
            self.nodes[i].length = u16::try_from(length).map_err(|_| {
                Error::Validation(format!("subtree at index {} exceeds the node limit", i))
            })?;
            self.nodes[i].depth = depth + 1;
        }
        let root = self.nodes.len() - 1;
        if self.nodes[root].length as usize + 1 != self.nodes.len() {
            return Err(Error::Validation(
                "node sequence does not form a single expression".into(),
            ));
        }
        Ok(())
    }

    /// Indices of the direct children of the node at `i`, first operand
    /// first.
    pub fn child_indices(&self, i: usize) -> ChildIndices<'_> {
        ChildIndices {
            nodes: &self.nodes,
            next: i.checked_sub(1),
            remaining: self.nodes[i].arity,
        }
    }

    /// Extract the coefficient vector: one entry per constant (its value)
    /// and one per variable (its weight), in traversal order.
    pub fn coefficients(&self) -> Vec<f64> {
        self.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.value).collect()
    }

    /// Write a coefficient vector back, in the same traversal order used
    /// by [`coefficients`](Self::coefficients). The tree structure is not
    /// modified.
    ///
    /// # Panics
    /// Panics if `coefficients` does not match the number of leaves.
    pub fn set_coefficients(&mut self, coefficients: &[f64]) {
        let mut it = coefficients.iter();
        for node in self.nodes.iter_mut().filter(|n| n.is_leaf()) {
            node.value = *it.next().expect("coefficient vector too short");
        }
        assert!(it.next().is_none(), "coefficient vector too long");
    }
}

/// Iterator over the direct children of a node, first operand first.
pub struct ChildIndices<'a> {
    nodes: &'a [Node],
    next: Option<usize>,
    remaining: u16,
}

impl Iterator for ChildIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.checked_sub(self.nodes[current].length as usize + 1);
        Some(current)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "()");
        }
        self.fmt_node(f, self.nodes.len() - 1)
    }
}

impl Tree {
    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, i: usize) -> fmt::Result {
        let node = &self.nodes[i];
        match node.node_type {
            NodeType::Constant => write!(f, "{:.3}", node.value),
            NodeType::Variable => {
                if (node.value - 1.0).abs() < f64::EPSILON {
                    write!(f, "x{:04x}", node.hash_value & 0xFFFF)
                } else {
                    write!(f, "({:.3} * x{:04x})", node.value, node.hash_value & 0xFFFF)
                }
            }
            NodeType::Add | NodeType::Sub | NodeType::Mul | NodeType::Div => {
                let symbol = match node.node_type {
                    NodeType::Add => "+",
                    NodeType::Sub => "-",
                    NodeType::Mul => "*",
                    _ => "/",
                };
                let mut children = self.child_indices(i);
                let first = children.next().expect("binary node has two children");
                let second = children.next().expect("binary node has two children");
                write!(f, "(")?;
                self.fmt_node(f, first)?;
                write!(f, " {} ", symbol)?;
                self.fmt_node(f, second)?;
                write!(f, ")")
            }
            _ => {
                write!(f, "{}(", node.name())?;
                self.fmt_node(f, i - 1)?;
                write!(f, ")")
            }
        }
    }
}
