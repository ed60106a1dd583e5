//! Symbolic expression graph.
//!
//! An [`Expr`] is a reference-counted node in a directed acyclic graph.
//! Cloning an expression shares the node, so intermediate results reused
//! by an algorithm (mass matrix entries, curve coefficients) are stored
//! once and evaluated once per [`Expr::evaluate_with`] call.
//!
//! Operations on constants are folded immediately, and the usual identities
//! (`x + 0`, `x * 1`, `x * 0`) are simplified on construction. A graph built
//! entirely from constants therefore collapses to a single constant node.
//!
//! ```
//! use sim_types::{Bindings, Evaluable, Expr};
//!
//! let q = Expr::symbol("q");
//! let length = Expr::constant(0.3) - q.scale(0.05);
//! let value = length.evaluate_with(&Bindings::new().bind(&q, 2.0)).unwrap();
//! assert!((value - 0.2).abs() < 1e-12);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Result, SymbolicError};
use crate::evaluable::{Evaluable, Representation};

static NEXT_SYMBOL_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnaryOp {
    Neg,
    Exp,
    Ln,
    Sqrt,
    Sin,
    Cos,
    Powi(i32),
}

impl UnaryOp {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Neg => -x,
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Powi(n) => x.powi(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

enum Node {
    Constant(f64),
    Symbol {
        id: usize,
        name: String,
    },
    Unary {
        op: UnaryOp,
        arg: Expr,
    },
    Binary {
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
    },
    Select {
        condition: Expr,
        if_positive: Expr,
        otherwise: Expr,
    },
}

/// A node in a symbolic expression graph.
#[derive(Clone)]
pub struct Expr(Rc<Node>);

impl Expr {
    fn from_node(node: Node) -> Self {
        Self(Rc::new(node))
    }

    /// A constant leaf.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::from_node(Node::Constant(value))
    }

    /// A fresh free variable.
    ///
    /// Each call creates a distinct symbol, even when names repeat.
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        let id = NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed);
        Self::from_node(Node::Symbol {
            id,
            name: name.into(),
        })
    }

    /// `n` fresh symbols named `{prefix}_0 .. {prefix}_{n-1}`.
    #[must_use]
    pub fn symbols(prefix: &str, n: usize) -> Vec<Self> {
        (0..n).map(|i| Self::symbol(format!("{prefix}_{i}"))).collect()
    }

    /// The constant value, if this node is a constant.
    #[must_use]
    pub fn as_constant(&self) -> Option<f64> {
        match *self.0 {
            Node::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The symbol name, if this node is a free variable.
    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        match &*self.0 {
            Node::Symbol { name, .. } => Some(name),
            _ => None,
        }
    }

    fn symbol_id(&self) -> Option<usize> {
        match *self.0 {
            Node::Symbol { id, .. } => Some(id),
            _ => None,
        }
    }

    fn is_constant(&self, value: f64) -> bool {
        self.as_constant() == Some(value)
    }

    fn unary(op: UnaryOp, arg: Self) -> Self {
        if let Some(x) = arg.as_constant() {
            return Self::constant(op.apply(x));
        }
        Self::from_node(Node::Unary { op, arg })
    }

    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        if let (Some(a), Some(b)) = (lhs.as_constant(), rhs.as_constant()) {
            return Self::constant(op.apply(a, b));
        }
        match op {
            BinaryOp::Add if lhs.is_constant(0.0) => return rhs,
            BinaryOp::Add | BinaryOp::Sub if rhs.is_constant(0.0) => return lhs,
            BinaryOp::Mul if lhs.is_constant(0.0) || rhs.is_constant(0.0) => {
                return Self::constant(0.0);
            }
            BinaryOp::Mul if lhs.is_constant(1.0) => return rhs,
            BinaryOp::Mul | BinaryOp::Div if rhs.is_constant(1.0) => return lhs,
            BinaryOp::Div if lhs.is_constant(0.0) => return Self::constant(0.0),
            _ => {}
        }
        Self::from_node(Node::Binary { op, lhs, rhs })
    }

    fn select(condition: Self, if_positive: Self, otherwise: Self) -> Self {
        if let Some(c) = condition.as_constant() {
            return if c > 0.0 { if_positive } else { otherwise };
        }
        Self::from_node(Node::Select {
            condition,
            if_positive,
            otherwise,
        })
    }

    /// Evaluate a closed expression.
    ///
    /// Fails with [`SymbolicError::FreeVariable`] if any symbol is reachable.
    pub fn evaluate(&self) -> Result<f64> {
        self.evaluate_with(&Bindings::new())
    }

    /// Evaluate with values bound to free variables.
    pub fn evaluate_with(&self, bindings: &Bindings) -> Result<f64> {
        let mut memo = HashMap::new();
        eval_node(self, bindings, &mut memo)
    }

    /// Number of distinct nodes reachable from this expression.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![self.clone()];
        while let Some(expr) = stack.pop() {
            if !seen.insert(Rc::as_ptr(&expr.0)) {
                continue;
            }
            stack.extend(expr.children());
        }
        seen.len()
    }

    /// Names of the free variables this expression depends on, sorted.
    #[must_use]
    pub fn free_symbols(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(expr) = stack.pop() {
            if !seen.insert(Rc::as_ptr(&expr.0)) {
                continue;
            }
            if let Some(name) = expr.symbol_name() {
                names.push(name.to_string());
            }
            stack.extend(expr.children());
        }
        names.sort();
        names.dedup();
        names
    }

    fn children(&self) -> Vec<Self> {
        match &*self.0 {
            Node::Constant(_) | Node::Symbol { .. } => Vec::new(),
            Node::Unary { arg, .. } => vec![arg.clone()],
            Node::Binary { lhs, rhs, .. } => vec![lhs.clone(), rhs.clone()],
            Node::Select {
                condition,
                if_positive,
                otherwise,
            } => vec![condition.clone(), if_positive.clone(), otherwise.clone()],
        }
    }
}

fn eval_node(expr: &Expr, bindings: &Bindings, memo: &mut HashMap<*const Node, f64>) -> Result<f64> {
    let key = Rc::as_ptr(&expr.0);
    if let Some(&value) = memo.get(&key) {
        return Ok(value);
    }
    let value = match &*expr.0 {
        Node::Constant(value) => *value,
        Node::Symbol { id, name } => bindings
            .values
            .get(id)
            .copied()
            .ok_or_else(|| SymbolicError::free_variable(name.clone()))?,
        Node::Unary { op, arg } => op.apply(eval_node(arg, bindings, memo)?),
        Node::Binary { op, lhs, rhs } => {
            let a = eval_node(lhs, bindings, memo)?;
            let b = eval_node(rhs, bindings, memo)?;
            op.apply(a, b)
        }
        Node::Select {
            condition,
            if_positive,
            otherwise,
        } => {
            if eval_node(condition, bindings, memo)? > 0.0 {
                eval_node(if_positive, bindings, memo)?
            } else {
                eval_node(otherwise, bindings, memo)?
            }
        }
    };
    memo.insert(key, value);
    Ok(value)
}

/// Values assigned to free variables for evaluation.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<usize, f64>,
}

impl Bindings {
    /// Empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `symbol` to `value`. Non-symbol expressions are ignored.
    #[must_use]
    pub fn bind(mut self, symbol: &Expr, value: f64) -> Self {
        self.insert(symbol, value);
        self
    }

    /// Bind every symbol in `symbols` to the matching entry of `values`.
    #[must_use]
    pub fn bind_all(mut self, symbols: &[Expr], values: &[f64]) -> Self {
        for (symbol, &value) in symbols.iter().zip(values) {
            self.insert(symbol, value);
        }
        self
    }

    /// Bind in place.
    pub fn insert(&mut self, symbol: &Expr, value: f64) {
        if let Some(id) = symbol.symbol_id() {
            self.values.insert(id, value);
        }
    }

    /// Number of bound symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no symbol is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.as_constant(), other.as_constant()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Constant(value) => write!(f, "{value}"),
            Node::Symbol { name, .. } => write!(f, "{name}"),
            Node::Unary { op, arg } => match op {
                UnaryOp::Neg => write!(f, "(-{arg})"),
                UnaryOp::Exp => write!(f, "exp({arg})"),
                UnaryOp::Ln => write!(f, "ln({arg})"),
                UnaryOp::Sqrt => write!(f, "sqrt({arg})"),
                UnaryOp::Sin => write!(f, "sin({arg})"),
                UnaryOp::Cos => write!(f, "cos({arg})"),
                UnaryOp::Powi(n) => write!(f, "pow({arg}, {n})"),
            },
            Node::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Node::Select {
                condition,
                if_positive,
                otherwise,
            } => write!(f, "select({condition} > 0, {if_positive}, {otherwise})"),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

impl Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Add, self, rhs)
    }
}

impl Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
}

impl Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
}

impl Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::binary(BinaryOp::Div, self, rhs)
    }
}

impl Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self {
        Self::unary(UnaryOp::Neg, self)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl Evaluable for Expr {
    const REPRESENTATION: Representation = Representation::Symbolic;

    fn constant(value: f64) -> Self {
        Self::constant(value)
    }

    fn exp(&self) -> Self {
        Self::unary(UnaryOp::Exp, self.clone())
    }

    fn ln(&self) -> Self {
        Self::unary(UnaryOp::Ln, self.clone())
    }

    fn sqrt(&self) -> Self {
        Self::unary(UnaryOp::Sqrt, self.clone())
    }

    fn sin(&self) -> Self {
        Self::unary(UnaryOp::Sin, self.clone())
    }

    fn cos(&self) -> Self {
        Self::unary(UnaryOp::Cos, self.clone())
    }

    fn powi(&self, n: i32) -> Self {
        Self::unary(UnaryOp::Powi(n), self.clone())
    }

    fn select_positive(condition: &Self, if_positive: Self, otherwise: Self) -> Self {
        Self::select(condition.clone(), if_positive, otherwise)
    }

    fn known_value(&self) -> Option<f64> {
        self.as_constant()
    }

    fn from_expr(expr: &Expr) -> Result<Self> {
        Ok(expr.clone())
    }

    fn into_expr(self) -> Expr {
        self
    }

    fn materialize(&self) -> Result<f64> {
        self.evaluate()
    }
}
