//! Lenient recursive-descent parser.
//!
//! ```text
//! expression := term (('+' | '-') term)*
//! term       := factor (('*' | '/') factor)*
//! factor     := '(' expression ')'
//!             | '-' factor
//!             | number
//!             | identifier
//!             | identifier '(' (expression (',' expression)*)? ')'
//! ```
//!
//! The parser never reports an error. Anything it cannot make sense of
//! becomes [`Expr::ZERO`]; text left over after the top-level expression is
//! ignored. A `-` is negation only when a letter or `(` follows it; any
//! other `-` starts a number literal, so `- 3` reads as zero.
//!
//! Nesting deeper than [`MAX_DEPTH`] factors is cut off: the innermost
//! factor becomes zero and the rest of the input is skipped.

use serde_json::Value;

use crate::expr::{BinaryOp, Expr};
use crate::function::MathFunction;
use crate::names;

/// Deepest nesting of groups, calls and negations the parser follows.
pub const MAX_DEPTH: usize = 256;

/// Compiles Molang source text into an expression tree.
pub fn parse(source: &str) -> Expr {
    let source = source.trim();
    if source.is_empty() {
        return Expr::ZERO;
    }

    let mut parser = Parser::new(source);
    let expr = parser.expression();

    parser.skip_whitespace();
    if let Some(rest) = parser.remaining() {
        log::debug!("Ignoring trailing Molang input {rest:?} in {source:?}");
    }
    expr
}

/// Compiles a JSON value found in a definition file.
///
/// Numbers become constants, strings are parsed, booleans map to 1 and 0.
/// Anything else is zero.
pub fn parse_json(value: &Value) -> Expr {
    match value {
        Value::Number(n) => n.as_f64().map_or(Expr::ZERO, |v| Expr::Constant(v as f32)),
        Value::String(s) => parse(s),
        Value::Bool(b) => Expr::Constant(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => Expr::ZERO,
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn remaining(&self) -> Option<&'a str> {
        let rest = &self.source[self.pos..];
        (!rest.is_empty()).then_some(rest)
    }

    fn take_while(&mut self, mut pred: impl FnMut(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&mut pred) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn expression(&mut self) -> Expr {
        let mut lhs = self.term();
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('+') => BinaryOp::Add,
                Some('-') => BinaryOp::Sub,
                _ => return lhs,
            };
            self.bump();
            let rhs = self.term();
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Expr {
        let mut lhs = self.factor();
        loop {
            self.skip_whitespace();
            let op = match self.peek() {
                Some('*') => BinaryOp::Mul,
                Some('/') => BinaryOp::Div,
                _ => return lhs,
            };
            self.bump();
            let rhs = self.factor();
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn factor(&mut self) -> Expr {
        if self.depth >= MAX_DEPTH {
            log::debug!(
                "Molang expression nested deeper than {MAX_DEPTH} levels in {:?}",
                self.source
            );
            self.pos = self.source.len();
            return Expr::ZERO;
        }

        self.depth += 1;
        let expr = self.nested_factor();
        self.depth -= 1;
        expr
    }

    fn nested_factor(&mut self) -> Expr {
        self.skip_whitespace();
        match self.peek() {
            None => Expr::ZERO,
            Some('(') => {
                self.bump();
                let inner = self.expression();
                self.skip_whitespace();
                if self.peek() == Some(')') {
                    self.bump();
                }
                inner
            }
            Some('-') => {
                if self
                    .peek_second()
                    .is_some_and(|c| c == '(' || names::is_identifier_start(c))
                {
                    self.bump();
                    Expr::negate(self.factor())
                } else {
                    self.number()
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if names::is_identifier_start(c) => self.identifier(),
            Some(c) => {
                self.bump();
                log::debug!("Unexpected character {c:?} in Molang expression");
                Expr::ZERO
            }
        }
    }

    fn number(&mut self) -> Expr {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c == '.' && !seen_dot {
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.bump();
        }

        let text = &self.source[start..self.pos];
        match text.parse::<f32>() {
            Ok(value) => Expr::Constant(value),
            Err(_) => {
                log::debug!("Invalid Molang number literal {text:?}");
                Expr::ZERO
            }
        }
    }

    fn identifier(&mut self) -> Expr {
        let raw = self.take_while(names::is_identifier_char);

        let checkpoint = self.pos;
        self.skip_whitespace();
        if self.peek() == Some('(') {
            self.bump();
            let args = self.arguments();
            return call(raw, args);
        }
        self.pos = checkpoint;

        if raw.eq_ignore_ascii_case("math.pi") {
            return Expr::Constant(std::f32::consts::PI);
        }
        Expr::Variable(names::normalize(raw).into_owned())
    }

    /// Parses a call's argument list; the opening parenthesis is consumed.
    fn arguments(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.bump();
            return args;
        }

        loop {
            args.push(self.expression());
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {
                    self.bump();
                    break;
                }
                _ => break,
            }
        }
        args
    }
}

fn call(name: &str, args: Vec<Expr>) -> Expr {
    let Some(function) = MathFunction::from_name(name) else {
        log::debug!("Unknown Molang function {name:?}");
        return Expr::ZERO;
    };
    if args.len() != function.arity() {
        log::debug!(
            "{function} expects {} argument(s), got {}",
            function.arity(),
            args.len()
        );
        return Expr::ZERO;
    }
    Expr::Call { function, args }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> f32 {
        parse(source).evaluate(&mut Context::with_seed(0))
    }

    #[test]
    fn test_blank_input_is_zero() {
        assert_eq!(parse(""), Expr::ZERO);
        assert_eq!(parse("   \t"), Expr::ZERO);
    }

    #[test]
    fn test_negative_literal_is_constant() {
        assert_eq!(parse("-2.5"), Expr::Constant(-2.5));
    }

    #[test]
    fn test_unary_minus_before_identifier_and_group() {
        let mut ctx = Context::with_seed(0);
        ctx.set("variable.x", 4.0);
        assert_eq!(parse("-v.x").evaluate(&mut ctx), -4.0);
        assert_eq!(parse("-(1+2)").evaluate(&mut ctx), -3.0);
    }

    #[test]
    fn test_minus_before_other_characters_starts_a_literal() {
        assert_eq!(parse("- 3"), Expr::ZERO);
        assert_eq!(parse("--2"), Expr::ZERO);
        assert_eq!(parse("-.5"), Expr::Constant(-0.5));
        assert_eq!(eval("4 + - 3"), 4.0);
    }

    #[test]
    fn test_deep_nesting_is_cut_off() {
        let deep = "(".repeat(10_000) + "1" + &")".repeat(10_000);
        assert_eq!(eval(&deep), 0.0);

        let negated = "-(".repeat(10_000) + "1" + &")".repeat(10_000);
        assert_eq!(eval(&negated), 0.0);
    }

    #[test]
    fn test_nesting_below_limit_is_kept() {
        let depth = MAX_DEPTH / 2;
        let nested = "(".repeat(depth) + "1 + 2" + &")".repeat(depth);
        assert_eq!(eval(&nested), 3.0);
    }

    #[test]
    fn test_binary_minus_is_not_folded() {
        assert_eq!(eval("5-3"), 2.0);
        assert_eq!(eval("5 - -3"), 8.0);
    }

    #[test]
    fn test_shorthand_variable_is_normalized() {
        assert_eq!(parse("v.size"), Expr::Variable("variable.size".into()));
        assert_eq!(parse("q.anim"), Expr::Variable("query.anim".into()));
    }

    #[test]
    fn test_math_pi() {
        assert_eq!(parse("math.pi"), Expr::Constant(std::f32::consts::PI));
    }

    #[test]
    fn test_function_names_ignore_case() {
        assert_eq!(eval("Math.Abs(-3)"), 3.0);
        assert_eq!(eval("math.max ( 1 , 2 )"), 2.0);
    }

    #[test]
    fn test_unknown_function_is_zero() {
        assert_eq!(parse("math.tan(45)"), Expr::ZERO);
        assert_eq!(eval("1 + math.nope(2)"), 1.0);
    }

    #[test]
    fn test_wrong_arity_is_zero() {
        assert_eq!(parse("math.sin(1, 2)"), Expr::ZERO);
        assert_eq!(parse("math.clamp(1)"), Expr::ZERO);
        assert_eq!(parse("math.abs()"), Expr::ZERO);
    }

    #[test]
    fn test_invalid_character_is_zero() {
        assert_eq!(eval("#"), 0.0);
        assert_eq!(eval("2 * #"), 0.0);
        assert_eq!(eval("2 + ?"), 2.0);
    }

    #[test]
    fn test_trailing_input_is_ignored() {
        assert_eq!(eval("2 + 3 )"), 5.0);
        assert_eq!(eval("7;"), 7.0);
        assert_eq!(eval("1.5.5"), 1.5);
    }

    #[test]
    fn test_unclosed_parenthesis_is_tolerated() {
        assert_eq!(eval("(1 + 2"), 3.0);
        assert_eq!(eval("math.min(4, 9"), 4.0);
    }

    #[test]
    fn test_lone_dot_is_zero() {
        assert_eq!(parse("."), Expr::ZERO);
    }

    #[test]
    fn test_parse_json_values() {
        assert_eq!(parse_json(&serde_json::json!(2.5)), Expr::Constant(2.5));
        assert_eq!(parse_json(&serde_json::json!(true)), Expr::ONE);
        assert_eq!(parse_json(&serde_json::json!(null)), Expr::ZERO);
        assert_eq!(parse_json(&serde_json::json!([1, 2])), Expr::ZERO);
        assert_eq!(
            parse_json(&serde_json::json!("v.x")),
            Expr::Variable("variable.x".into())
        );
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        assert_eq!(eval("é"), 0.0);
        assert_eq!(eval("é + 1"), 1.0);
        assert_eq!(eval("1 + ü"), 1.0);
    }
}
