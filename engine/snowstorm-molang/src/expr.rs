//! Compiled expression trees.

use std::fmt;

use crate::context::Context;
use crate::function::MathFunction;

/// Arithmetic operator of a [`Expr::Binary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Applies the operator. Division by zero yields zero.
    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => {
                if rhs == 0.0 {
                    0.0
                } else {
                    lhs / rhs
                }
            }
        }
    }

    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }
}

/// An immutable Molang expression.
///
/// Trees are built by [`parse`](crate::parse) and never modified afterwards,
/// so one tree can be shared freely and evaluated against any number of
/// contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f32),
    /// Canonical (shorthand-expanded) variable name.
    Variable(String),
    Negate(Box<Self>),
    Binary {
        op: BinaryOp,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
    /// A call whose argument count matches the function's arity.
    Call {
        function: MathFunction,
        args: Vec<Self>,
    },
}

impl Default for Expr {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f32> for Expr {
    fn from(value: f32) -> Self {
        Self::Constant(value)
    }
}

impl Expr {
    /// The expression every malformed input degrades to.
    pub const ZERO: Self = Self::Constant(0.0);
    pub const ONE: Self = Self::Constant(1.0);

    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Negates an expression, folding constants.
    pub fn negate(inner: Self) -> Self {
        match inner {
            Self::Constant(value) => Self::Constant(-value),
            other => Self::Negate(Box::new(other)),
        }
    }

    /// Returns the value if this is a constant node.
    pub fn as_constant(&self) -> Option<f32> {
        match self {
            Self::Constant(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    /// Evaluates the tree. Never fails.
    pub fn evaluate(&self, ctx: &mut Context) -> f32 {
        match self {
            Self::Constant(value) => *value,
            Self::Variable(name) => ctx.resolve(name),
            Self::Negate(inner) => -inner.evaluate(ctx),
            Self::Binary { op, lhs, rhs } => {
                let lhs = lhs.evaluate(ctx);
                let rhs = rhs.evaluate(ctx);
                op.apply(lhs, rhs)
            }
            Self::Call { function, args } => {
                let mut values = [0.0f32; 3];
                for (slot, arg) in values.iter_mut().zip(args) {
                    *slot = arg.evaluate(ctx);
                }
                function.apply(&values[..args.len().min(values.len())], ctx)
            }
        }
    }

    /// Evaluates and interprets the result as a flag (non-zero is true).
    pub fn evaluate_bool(&self, ctx: &mut Context) -> bool {
        self.evaluate(ctx) != 0.0
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Variable(name) => f.write_str(name),
            Self::Negate(inner) => write!(f, "-({inner})"),
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Self::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
