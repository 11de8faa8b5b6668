//! Expression-tree nodes.

use serde::{Deserialize, Serialize};

/// The closed set of node tags understood by the interpreter.
///
/// Binary arithmetic operators always take exactly two operands; the
/// unary group covers the transcendental/algebraic functions; constants
/// and variables are the terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Binary addition.
    Add,
    /// Binary subtraction.
    Sub,
    /// Binary multiplication.
    Mul,
    /// Binary division.
    Div,
    /// Natural logarithm.
    Log,
    /// Exponential.
    Exp,
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Square root.
    Sqrt,
    /// Signed cube root (real-valued on negative inputs).
    Cbrt,
    /// Square.
    Square,
    /// Numeric literal; `value` is the coefficient.
    Constant,
    /// Dataset column reference; `value` is the weight multiplier and
    /// `hash_value` identifies the column.
    Variable,
}

impl NodeType {
    /// Fixed arity for this node type.
    pub fn arity(self) -> u16 {
        match self {
            NodeType::Add | NodeType::Sub | NodeType::Mul | NodeType::Div => 2,
            NodeType::Log
            | NodeType::Exp
            | NodeType::Sin
            | NodeType::Cos
            | NodeType::Tan
            | NodeType::Sqrt
            | NodeType::Cbrt
            | NodeType::Square => 1,
            NodeType::Constant | NodeType::Variable => 0,
        }
    }

    /// True for terminal nodes (constants and variables).
    pub fn is_leaf(self) -> bool {
        self.arity() == 0
    }

    /// True for operators whose operand order does not matter.
    pub fn is_commutative(self) -> bool {
        matches!(self, NodeType::Add | NodeType::Mul)
    }

    /// Diagnostic name.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Add => "add",
            NodeType::Sub => "sub",
            NodeType::Mul => "mul",
            NodeType::Div => "div",
            NodeType::Log => "log",
            NodeType::Exp => "exp",
            NodeType::Sin => "sin",
            NodeType::Cos => "cos",
            NodeType::Tan => "tan",
            NodeType::Sqrt => "sqrt",
            NodeType::Cbrt => "cbrt",
            NodeType::Square => "square",
            NodeType::Constant => "constant",
            NodeType::Variable => "variable",
        }
    }
}

/// A single node of a linearized expression tree.
///
/// `length` is the number of nodes in the subtree rooted here, excluding
/// the node itself (a leaf has `length == 0`). `depth` is the height of
/// that subtree (a leaf has `depth == 1`). Both are maintained by
/// [`Tree::update_nodes`](crate::Tree::update_nodes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node tag.
    pub node_type: NodeType,
    /// Number of operands this node consumes.
    pub arity: u16,
    /// Subtree node count, excluding this node.
    pub length: u16,
    /// Subtree height, counting this node.
    pub depth: u16,
    /// Literal coefficient (constants) or weight multiplier (variables).
    pub value: f64,
    /// Column hash for variables; zero otherwise.
    pub hash_value: u64,
}

impl Node {
    /// Create a node of the given type with default value 1.0.
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            arity: node_type.arity(),
            length: 0,
            depth: 1,
            value: 1.0,
            hash_value: 0,
        }
    }

    /// Create a constant node holding `value`.
    pub fn constant(value: f64) -> Self {
        Self { value, ..Self::new(NodeType::Constant) }
    }

    /// Create a variable node referencing the column with `hash`, scaled
    /// by `weight`.
    pub fn variable(hash: u64, weight: f64) -> Self {
        Self { value: weight, hash_value: hash, ..Self::new(NodeType::Variable) }
    }

    /// True for terminals.
    pub fn is_leaf(&self) -> bool {
        self.arity == 0
    }

    /// True for constant nodes.
    pub fn is_constant(&self) -> bool {
        self.node_type == NodeType::Constant
    }

    /// True for variable nodes.
    pub fn is_variable(&self) -> bool {
        self.node_type == NodeType::Variable
    }

    /// Diagnostic name of the node tag.
    pub fn name(&self) -> &'static str {
        self.node_type.name()
    }
}
