//! Piecewise-linear curves driven by Molang inputs.

use serde_json::{Map, Value};
use snowstorm_molang::{Context, Expr, names, parse_json};

/// Interpolation mode declared by a curve.
///
/// Only linear interpolation is evaluated; other modes are recorded and
/// sampled linearly over their nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurveType {
    #[default]
    Linear,
    CatmullRom,
    Bezier,
    BezierChain,
}

impl CurveType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "catmull_rom" => Self::CatmullRom,
            "bezier" => Self::Bezier,
            "bezier_chain" => Self::BezierChain,
            "linear" => Self::Linear,
            other => {
                log::debug!("Unknown curve type {other:?}, using linear");
                Self::Linear
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::CatmullRom => "catmull_rom",
            Self::Bezier => "bezier",
            Self::BezierChain => "bezier_chain",
        }
    }
}

/// A sampled curve: `nodes` spread evenly over `[0, horizontal_range]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    kind: CurveType,
    input: Expr,
    horizontal_range: Expr,
    nodes: Vec<f32>,
}

impl Curve {
    /// Builds a curve. An empty node list is replaced by a single zero node.
    pub fn new(input: Expr, horizontal_range: Expr, nodes: Vec<f32>) -> Self {
        Self {
            kind: CurveType::Linear,
            input,
            horizontal_range,
            nodes: if nodes.is_empty() { vec![0.0] } else { nodes },
        }
    }

    /// Builds a curve from its JSON object. Non-objects yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let kind = object
            .get("type")
            .and_then(Value::as_str)
            .map_or(CurveType::Linear, CurveType::from_name);
        let input = object.get("input").map_or(Expr::ZERO, parse_json);
        let horizontal_range = object.get("horizontal_range").map_or(Expr::ONE, parse_json);
        let nodes = object.get("nodes").map(parse_nodes).unwrap_or_default();

        let mut curve = Self::new(input, horizontal_range, nodes);
        if kind != CurveType::Linear {
            log::debug!("{} curve will be sampled linearly", kind.name());
        }
        curve.kind = kind;
        Some(curve)
    }

    pub fn kind(&self) -> CurveType {
        self.kind
    }

    pub fn nodes(&self) -> &[f32] {
        &self.nodes
    }

    /// Evaluates the curve against a context.
    pub fn evaluate(&self, ctx: &mut Context) -> f32 {
        let input = self.input.evaluate(ctx);
        let range = self.horizontal_range.evaluate(ctx);
        let t = if range == 0.0 { 0.0 } else { input / range };
        self.sample(t)
    }

    /// Samples at a normalized position. `t` is clamped to `[0, 1]`.
    pub fn sample(&self, t: f32) -> f32 {
        let last = self.nodes.len() - 1;
        if last == 0 {
            return self.nodes[0];
        }

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * last as f32;
        let index = scaled.floor() as usize;
        if index >= last {
            return self.nodes[last];
        }

        let frac = scaled - index as f32;
        let (a, b) = (self.nodes[index], self.nodes[index + 1]);
        a + (b - a) * frac
    }
}

/// Node values from either an array or a `{ "0.25": value }` keyed object.
fn parse_nodes(value: &Value) -> Vec<f32> {
    match value {
        Value::Array(items) => items.iter().map(node_value).collect(),
        Value::Object(keyed) => {
            let mut points: Vec<(f32, f32)> = keyed
                .iter()
                .filter_map(|(key, node)| {
                    let position = key.trim().parse::<f32>().ok()?;
                    let value = match node {
                        Value::Object(point) => point.get("value").map_or_else(
                            || {
                                log::debug!("Curve node at {key} has no value, using 0");
                                0.0
                            },
                            node_value,
                        ),
                        other => node_value(other),
                    };
                    Some((position, value))
                })
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            points.into_iter().map(|(_, value)| value).collect()
        }
        _ => Vec::new(),
    }
}

fn node_value(value: &Value) -> f32 {
    let expr = parse_json(value);
    expr.as_constant().unwrap_or_else(|| {
        log::debug!("Curve node {value} is not constant, using 0");
        0.0
    })
}

/// The named curves of a definition, evaluated in declaration order.
///
/// Each curve's result is written into the context under its (canonical)
/// name, so later curves and component expressions can read earlier ones.
#[derive(Debug, Clone, Default)]
pub struct CurveSet {
    curves: Vec<(String, Curve)>,
}

impl CurveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from a definition's `curves` map, skipping non-objects.
    pub fn from_json(curves: &Map<String, Value>) -> Self {
        let mut set = Self::new();
        for (name, value) in curves {
            match Curve::from_json(value) {
                Some(curve) => set.insert(name, curve),
                None => log::debug!("Skipping malformed curve {name}"),
            }
        }
        set
    }

    /// Adds or replaces a curve.
    pub fn insert(&mut self, name: &str, curve: Curve) {
        let name = names::normalize(name).into_owned();
        if let Some(slot) = self.curves.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = curve;
        } else {
            self.curves.push((name, curve));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Curve> {
        let name = names::normalize(name);
        self.curves
            .iter()
            .find(|(n, _)| n.as_str() == &*name)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Curve)> {
        self.curves.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Evaluates every curve and publishes the results into `ctx`.
    pub fn apply(&self, ctx: &mut Context) {
        for (name, curve) in &self.curves {
            let value = curve.evaluate(ctx);
            ctx.set(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn linear(nodes: Vec<f32>) -> Curve {
        Curve::new(Expr::Variable("variable.t".into()), Expr::ONE, nodes)
    }

    #[test_case(0.0, 0.0 ; "start")]
    #[test_case(0.5, 5.0 ; "middle")]
    #[test_case(1.0, 10.0 ; "end")]
    #[test_case(2.0, 10.0 ; "clamped above")]
    #[test_case(-1.0, 0.0 ; "clamped below")]
    fn test_two_node_curve(t: f32, expected: f32) {
        let curve = linear(vec![0.0, 10.0]);
        let mut ctx = Context::with_seed(0);
        ctx.set("variable.t", t);
        assert_eq!(curve.evaluate(&mut ctx), expected);
    }

    #[test]
    fn test_single_node_is_constant() {
        let curve = linear(vec![4.0]);
        assert_eq!(curve.sample(0.0), 4.0);
        assert_eq!(curve.sample(0.7), 4.0);
    }

    #[test]
    fn test_empty_nodes_become_zero() {
        let curve = linear(Vec::new());
        assert_eq!(curve.nodes(), &[0.0]);
        assert_eq!(curve.sample(0.5), 0.0);
    }

    #[test]
    fn test_zero_range_maps_to_first_node() {
        let curve = Curve::new(Expr::Constant(5.0), Expr::ZERO, vec![1.0, 2.0]);
        assert_eq!(curve.evaluate(&mut Context::with_seed(0)), 1.0);
    }

    #[test]
    fn test_from_json_defaults() {
        let curve = Curve::from_json(&json!({})).unwrap();
        assert_eq!(curve.kind(), CurveType::Linear);
        assert_eq!(curve.nodes(), &[0.0]);
        assert_eq!(curve.evaluate(&mut Context::with_seed(0)), 0.0);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Curve::from_json(&json!([1, 2])).is_none());
        assert!(Curve::from_json(&json!("linear")).is_none());
    }

    #[test]
    fn test_three_nodes_end_exactly_on_last() {
        let curve = Curve::from_json(&json!({
            "nodes": [1, 2, 3],
            "horizontal_range": 1,
            "input": "variable.particle_age"
        }))
        .unwrap();
        let mut ctx = Context::with_seed(0);
        ctx.set("variable.particle_age", 1.0);
        assert_eq!(curve.evaluate(&mut ctx), 3.0);

        ctx.set("variable.particle_age", 0.25);
        assert_eq!(curve.evaluate(&mut ctx), 1.5);
    }

    #[test]
    fn test_keyed_nodes_are_sorted() {
        let curve = Curve::from_json(&json!({
            "type": "bezier_chain",
            "nodes": { "1.0": { "value": 8 }, "0.0": { "value": 2 }, "0.5": 4 }
        }))
        .unwrap();
        assert_eq!(curve.kind(), CurveType::BezierChain);
        assert_eq!(curve.nodes(), &[2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_non_constant_nodes_read_as_zero() {
        let curve = Curve::from_json(&json!({
            "nodes": [1, "v.height", "-4", { "value": 5 }]
        }))
        .unwrap();
        assert_eq!(curve.nodes(), &[1.0, 0.0, -4.0, 0.0]);

        let keyed = Curve::from_json(&json!({
            "nodes": { "0": { "value": "math.random(0, 1)" }, "1": { "easing": 2 } }
        }))
        .unwrap();
        assert_eq!(keyed.nodes(), &[0.0, 0.0]);
    }

    #[test]
    fn test_curve_set_publishes_in_order() {
        let mut map = Map::new();
        map.insert("v.first".into(), json!({ "input": 1, "nodes": [0, 4] }));
        map.insert(
            "variable.second".into(),
            json!({ "input": "v.first", "horizontal_range": 4, "nodes": [0, 100] }),
        );
        map.insert("variable.broken".into(), json!(3));

        let set = CurveSet::from_json(&map);
        assert_eq!(set.len(), 2);
        assert!(set.get("variable.first").is_some());

        let mut ctx = Context::with_seed(0);
        set.apply(&mut ctx);
        assert_eq!(ctx.get("variable.first"), 4.0);
        assert_eq!(ctx.get("variable.second"), 100.0);
    }
}
