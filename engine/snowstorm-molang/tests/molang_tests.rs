//! Integration tests for parsing and evaluating Molang expressions

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use snowstorm_molang::{Context, Expr, parse};
use test_case::test_case;

fn eval(source: &str) -> f32 {
    parse(source).evaluate(&mut Context::with_seed(0))
}

#[test_case("2+3*4", 14.0 ; "multiplication binds tighter")]
#[test_case("(2+3)*4", 20.0 ; "parentheses group")]
#[test_case("10 - 4 - 3", 3.0 ; "subtraction is left associative")]
#[test_case("8 / 4 / 2", 1.0 ; "division is left associative")]
#[test_case("-2 * -3", 6.0 ; "negative literals")]
#[test_case("2 * -(1 + 2)", -6.0 ; "negated group")]
#[test_case("1/0", 0.0 ; "division by zero")]
#[test_case("math.mod(7, 0)", 0.0 ; "mod by zero")]
#[test_case("math.floor(2.7) + math.ceil(2.2)", 5.0 ; "floor and ceil")]
#[test_case("math.pow(2, 10)", 1024.0 ; "pow")]
#[test_case("math.sqrt(16)", 4.0 ; "sqrt")]
#[test_case("math.min(3, -1) + math.max(3, -1)", 2.0 ; "min and max")]
#[test_case("math.lerp(0, 10, 0.25)", 2.5 ; "lerp")]
#[test_case("math.round(2.5) + math.trunc(-1.7)", 2.0 ; "round and trunc")]
#[test_case("", 0.0 ; "blank")]
fn test_evaluates(source: &str, expected: f32) {
    assert_eq!(eval(source), expected);
}

#[test]
fn test_shorthand_equivalence() {
    let mut ctx = Context::with_seed(0);
    ctx.set("variable.x", 12.5);
    assert_eq!(parse("v.x").evaluate(&mut ctx), parse("variable.x").evaluate(&mut ctx));
    assert_eq!(parse("v.x").evaluate(&mut ctx), 12.5);
}

#[test]
fn test_unknown_variable_reads_zero() {
    assert_eq!(eval("variable.missing + 1"), 1.0);
}

#[test]
fn test_random_call_stays_in_range() {
    let expr = parse("math.random(2, 4)");
    let mut ctx = Context::with_seed(77);
    for _ in 0..500 {
        let v = expr.evaluate(&mut ctx);
        assert!((2.0..4.0).contains(&v), "{v} out of range");
    }
}

#[test]
fn test_random_is_drawn_at_evaluation_time() {
    let expr = parse("math.random(0, 1)");
    let mut ctx = Context::with_seed(77);
    let first = expr.evaluate(&mut ctx);
    let second = expr.evaluate(&mut ctx);
    assert_ne!(first, second);
}

#[test]
fn test_bare_math_random_draws() {
    let expr = parse("math.random");
    let mut ctx = Context::with_seed(5);
    let v = expr.evaluate(&mut ctx);
    assert!((0.0..1.0).contains(&v));
}

#[test]
fn test_trees_are_reusable_across_contexts() {
    let expr = parse("v.a * 2");
    let mut a = Context::with_seed(0);
    let mut b = Context::with_seed(0);
    a.set("v.a", 1.0);
    b.set("v.a", 5.0);
    assert_eq!(expr.evaluate(&mut a), 2.0);
    assert_eq!(expr.evaluate(&mut b), 10.0);
}

#[test]
fn test_realistic_particle_expressions() {
    let mut ctx = Context::with_seed(0);
    ctx.set("variable.particle_age", 0.5);
    ctx.set("variable.particle_lifetime", 2.0);

    let fade = parse("1 - v.particle_age / v.particle_lifetime");
    assert_eq!(fade.evaluate(&mut ctx), 0.75);

    let wobble = parse("math.sin(v.particle_age * 180) * 0.5");
    assert!((wobble.evaluate(&mut ctx) - 0.5).abs() < 1e-6);
}

#[test]
fn test_parse_is_total() {
    for source in ["(", ")", "+", "*", "-", "math.", "1 +", "()", ",,", "v."] {
        let _ = eval(source);
    }
    assert_eq!(parse(")"), Expr::ZERO);
}

proptest! {
    #[test]
    fn prop_constant_round_trip(c in -1.0e6f32..1.0e6f32) {
        let mut ctx = Context::with_seed(0);
        prop_assert_eq!(parse(&c.to_string()).evaluate(&mut ctx), c);
    }

    #[test]
    fn prop_constant_ignores_context(c in any::<f32>().prop_filter("finite", |v| v.is_finite()), x in any::<f32>()) {
        let mut ctx = Context::with_seed(0);
        ctx.set("variable.x", x);
        prop_assert_eq!(parse(&c.to_string()).evaluate(&mut ctx), c);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(source in "\\PC{0,32}") {
        let _ = parse(&source).evaluate(&mut Context::with_seed(0));
    }
}
