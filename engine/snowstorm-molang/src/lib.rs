//! # snowstorm_molang - Molang expressions for particle effects
//!
//! A small, lenient implementation of the Molang expression language as used
//! by Bedrock-style particle definitions. Source text is compiled once into an
//! immutable [`Expr`] tree which is then evaluated many times against a
//! mutable [`Context`].
//!
//! ## Grammar
//!
//! - Arithmetic: `+`, `-`, `*`, `/` with the usual precedence and parentheses
//! - Unary minus
//! - Variables such as `variable.particle_age` (shorthands `v.`, `q.`, `t.`
//!   and `c.` are accepted)
//! - The `math.*` function set, see [`MathFunction`]
//!
//! Parsing never fails. Malformed input degrades to the constant zero, and
//! evaluation never fails either: division by zero yields zero and unknown
//! variables read as zero.
//!
//! ## Example
//!
//! ```
//! use snowstorm_molang::{Context, parse};
//!
//! let expr = parse("v.particle_age * 2 + math.clamp(v.speed, 0, 1)");
//!
//! let mut ctx = Context::with_seed(7);
//! ctx.set("variable.particle_age", 1.5);
//! ctx.set("variable.speed", 4.0);
//!
//! assert_eq!(expr.evaluate(&mut ctx), 4.0);
//! ```

pub mod context;
pub mod expr;
pub mod function;
pub mod names;
pub mod parser;

pub use context::Context;
pub use expr::{BinaryOp, Expr};
pub use function::MathFunction;
pub use parser::{parse, parse_json};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
