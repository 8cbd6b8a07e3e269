//! Helpers for reading component configuration.

use serde_json::{Map, Value};
use snowstorm_molang::{Expr, parse_json};

pub(crate) type Object = Map<String, Value>;

/// Expression at `key`, if present.
pub(crate) fn expr(object: &Object, key: &str) -> Option<Expr> {
    object.get(key).map(parse_json)
}

/// Expression at `key`, or a constant default.
pub(crate) fn expr_or(object: &Object, key: &str, default: f32) -> Expr {
    expr(object, key).unwrap_or(Expr::Constant(default))
}

/// Fixed-size expression array such as `[x, y, z]`.
///
/// Arrays shorter than `N` are rejected; extra elements are ignored.
pub(crate) fn expr_array<const N: usize>(object: &Object, key: &str) -> Option<[Expr; N]> {
    let items = object.get(key)?.as_array()?;
    if items.len() < N {
        log::debug!("{key} needs {N} elements, got {}", items.len());
        return None;
    }
    Some(std::array::from_fn(|i| parse_json(&items[i])))
}

/// Boolean at `key`. Numbers count as true when non-zero.
pub(crate) fn bool_or(object: &Object, key: &str, default: bool) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => default,
    }
}

/// Plain number at `key`.
pub(crate) fn f32_or(object: &Object, key: &str, default: f32) -> f32 {
    object
        .get(key)
        .and_then(Value::as_f64)
        .map_or(default, |v| v as f32)
}

/// Plain number pair such as `[u, v]`.
pub(crate) fn f32_pair(object: &Object, key: &str) -> Option<[f32; 2]> {
    let items = object.get(key)?.as_array()?;
    match items.as_slice() {
        [a, b, ..] => Some([a.as_f64()? as f32, b.as_f64()? as f32]),
        _ => None,
    }
}
