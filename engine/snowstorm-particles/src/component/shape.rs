//! Emitter shape components
//!
//! Shapes run when a particle spawns. They move it away from the emitter
//! origin and give it an initial direction, which speed components later
//! scale. Every expression is evaluated in the new particle's context, so
//! `variable.particle_random_*` can vary placement per particle.

use std::f64::consts::TAU;

use glam::DVec3;
use rand::Rng;
use serde_json::Value;
use snowstorm_molang::{Context, Expr};

use super::ParticleComponent;
use super::json::{Object, bool_or, expr_array, expr_or};
use crate::error::Result;
use crate::particle::Particle;
use crate::variables;

const MIN_LENGTH: f64 = 0.001;

fn zero_vector() -> [Expr; 3] {
    std::array::from_fn(|_| Expr::ZERO)
}

fn vector_or_zero(obj: &Object, key: &str) -> [Expr; 3] {
    expr_array(obj, key).unwrap_or_else(zero_vector)
}

fn evaluate_vector(exprs: &[Expr; 3], ctx: &mut Context) -> DVec3 {
    DVec3::new(
        f64::from(exprs[0].evaluate(ctx)),
        f64::from(exprs[1].evaluate(ctx)),
        f64::from(exprs[2].evaluate(ctx)),
    )
}

fn random_unit(ctx: &mut Context) -> f64 {
    f64::from(ctx.random_f32())
}

/// Uniform value in `[-half, half]`.
fn random_span(ctx: &mut Context, half: f64) -> f64 {
    (random_unit(ctx) * 2.0 - 1.0) * half
}

/// How a shape sets the initial particle direction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Direction {
    /// Away from the shape center
    #[default]
    Outwards,
    /// Toward the shape center
    Inwards,
    /// Explicit `[x, y, z]` expressions
    Custom([Expr; 3]),
}

impl Direction {
    fn from_config(obj: &Object) -> Self {
        match obj.get("direction") {
            Some(Value::String(mode)) => match mode.as_str() {
                "outwards" => Self::Outwards,
                "inwards" => Self::Inwards,
                other => {
                    log::debug!("Unknown direction mode {other:?}, using outwards");
                    Self::Outwards
                }
            },
            Some(Value::Array(_)) => expr_array(obj, "direction").map_or(Self::Outwards, Self::Custom),
            _ => Self::Outwards,
        }
    }

    /// Direction for a particle whose outward vector from the center is
    /// `outward`. A zero outward vector leaves the velocity untouched.
    fn apply(&self, particle: &mut Particle, outward: DVec3) {
        match self {
            Self::Outwards => {
                if outward.length() > MIN_LENGTH {
                    particle.velocity = outward.normalize();
                }
            }
            Self::Inwards => {
                if outward.length() > MIN_LENGTH {
                    particle.velocity = -outward.normalize();
                }
            }
            Self::Custom(exprs) => {
                particle.velocity = evaluate_vector(exprs, particle.context_mut());
            }
        }
    }
}

/// `minecraft:emitter_shape_point`
#[derive(Debug, Clone)]
pub struct ShapePoint {
    offset: [Expr; 3],
    direction: [Expr; 3],
}

impl Default for ShapePoint {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            direction: zero_vector(),
        }
    }
}

impl ParticleComponent for ShapePoint {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.offset = vector_or_zero(obj, "offset");
        self.direction = vector_or_zero(obj, "direction");
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let offset = evaluate_vector(&self.offset, ctx);
        let direction = evaluate_vector(&self.direction, ctx);
        particle.position += offset;
        particle.velocity = direction;
        Ok(())
    }
}

/// `minecraft:emitter_shape_sphere`
#[derive(Debug, Clone)]
pub struct ShapeSphere {
    offset: [Expr; 3],
    radius: Expr,
    surface_only: bool,
    direction: Direction,
}

impl Default for ShapeSphere {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            radius: Expr::ONE,
            surface_only: false,
            direction: Direction::Outwards,
        }
    }
}

impl ParticleComponent for ShapeSphere {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.offset = vector_or_zero(obj, "offset");
        self.radius = expr_or(obj, "radius", 1.0);
        self.surface_only = bool_or(obj, "surface_only", false);
        self.direction = Direction::from_config(obj);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let radius = f64::from(self.radius.evaluate(ctx));

        let theta = random_unit(ctx) * TAU;
        let phi = (2.0 * random_unit(ctx) - 1.0).acos();
        let normal = DVec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos());
        let distance = if self.surface_only {
            radius
        } else {
            radius * random_unit(ctx).cbrt()
        };
        let offset = evaluate_vector(&self.offset, ctx);

        particle.position += offset + normal * distance;
        self.direction.apply(particle, normal);
        Ok(())
    }
}

/// `minecraft:emitter_shape_box`
#[derive(Debug, Clone)]
pub struct ShapeBox {
    offset: [Expr; 3],
    half_dimensions: [Expr; 3],
    surface_only: bool,
    direction: Direction,
}

impl Default for ShapeBox {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            half_dimensions: std::array::from_fn(|_| Expr::Constant(0.5)),
            surface_only: false,
            direction: Direction::Outwards,
        }
    }
}

impl ShapeBox {
    /// Random point on one of the six faces, with that face's normal.
    fn surface_point(ctx: &mut Context, half: DVec3) -> (DVec3, DVec3) {
        let face = ctx.rng_mut().random_range(0..6usize);
        let axis = face / 2;
        let sign = if face % 2 == 0 { 1.0 } else { -1.0 };

        let mut point = DVec3::new(
            random_span(ctx, half.x),
            random_span(ctx, half.y),
            random_span(ctx, half.z),
        );
        point[axis] = sign * half[axis];

        let mut normal = DVec3::ZERO;
        normal[axis] = sign;
        (point, normal)
    }
}

impl ParticleComponent for ShapeBox {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.offset = vector_or_zero(obj, "offset");
        self.half_dimensions = expr_array(obj, "half_dimensions")
            .unwrap_or_else(|| std::array::from_fn(|_| Expr::Constant(0.5)));
        self.surface_only = bool_or(obj, "surface_only", false);
        self.direction = Direction::from_config(obj);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let half = evaluate_vector(&self.half_dimensions, ctx);

        let (point, outward) = if self.surface_only {
            Self::surface_point(ctx, half)
        } else {
            let point = DVec3::new(
                random_span(ctx, half.x),
                random_span(ctx, half.y),
                random_span(ctx, half.z),
            );
            (point, point)
        };
        let offset = evaluate_vector(&self.offset, ctx);

        particle.position += offset + point;
        self.direction.apply(particle, outward);
        Ok(())
    }
}

/// `minecraft:emitter_shape_disc`
#[derive(Debug, Clone)]
pub struct ShapeDisc {
    offset: [Expr; 3],
    radius: Expr,
    plane_normal: [Expr; 3],
    surface_only: bool,
    direction: Direction,
}

impl Default for ShapeDisc {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            radius: Expr::ONE,
            plane_normal: [Expr::ZERO, Expr::ONE, Expr::ZERO],
            surface_only: false,
            direction: Direction::Outwards,
        }
    }
}

impl ShapeDisc {
    fn parse_normal(value: Option<&Value>, obj: &Object) -> [Expr; 3] {
        match value {
            Some(Value::String(axis)) => match axis.to_ascii_lowercase().as_str() {
                "x" => [Expr::ONE, Expr::ZERO, Expr::ZERO],
                "z" => [Expr::ZERO, Expr::ZERO, Expr::ONE],
                _ => [Expr::ZERO, Expr::ONE, Expr::ZERO],
            },
            Some(Value::Array(_)) => expr_array(obj, "plane_normal")
                .unwrap_or_else(|| [Expr::ZERO, Expr::ONE, Expr::ZERO]),
            _ => [Expr::ZERO, Expr::ONE, Expr::ZERO],
        }
    }

    /// Two unit vectors spanning the plane orthogonal to `normal`.
    fn basis(normal: DVec3) -> (DVec3, DVec3) {
        let reference = if normal.y.abs() > 0.9 { DVec3::X } else { DVec3::Y };
        let v = normal.cross(reference).normalize();
        let u = v.cross(normal);
        (u, v)
    }
}

impl ParticleComponent for ShapeDisc {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.offset = vector_or_zero(obj, "offset");
        self.radius = expr_or(obj, "radius", 1.0);
        self.plane_normal = Self::parse_normal(obj.get("plane_normal"), obj);
        self.surface_only = bool_or(obj, "surface_only", false);
        self.direction = Direction::from_config(obj);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let radius = f64::from(self.radius.evaluate(ctx));

        let angle = random_unit(ctx) * TAU;
        let distance = if self.surface_only {
            radius
        } else {
            radius * random_unit(ctx).sqrt()
        };

        let normal = evaluate_vector(&self.plane_normal, ctx);
        let normal = if normal.length() > MIN_LENGTH {
            normal.normalize()
        } else {
            DVec3::Y
        };
        let (u, v) = Self::basis(normal);
        let point = (u * angle.cos() + v * angle.sin()) * distance;
        let offset = evaluate_vector(&self.offset, ctx);

        particle.position += offset + point;
        self.direction.apply(particle, point);
        Ok(())
    }
}

/// `minecraft:emitter_shape_custom`
#[derive(Debug, Clone)]
pub struct ShapeCustom {
    offset: [Expr; 3],
    direction: [Expr; 3],
}

impl Default for ShapeCustom {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            direction: zero_vector(),
        }
    }
}

impl ParticleComponent for ShapeCustom {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.offset = vector_or_zero(obj, "offset");
        self.direction = vector_or_zero(obj, "direction");
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let offset = evaluate_vector(&self.offset, ctx);
        let direction = evaluate_vector(&self.direction, ctx);
        particle.position += offset;
        particle.velocity = direction;
        Ok(())
    }
}

/// `minecraft:emitter_shape_entity_aabb`
///
/// Bounds come from the `variable.entity_aabb_*` values the emitter publishes.
/// An axis with no extent falls back to a player-sized box.
#[derive(Debug, Clone, Default)]
pub struct ShapeEntityAabb {
    direction: Direction,
}

impl ShapeEntityAabb {
    const FALLBACK_MIN: [f32; 3] = [-0.3, 0.0, -0.3];
    const FALLBACK_MAX: [f32; 3] = [0.3, 1.8, 0.3];

    fn bounds(ctx: &Context) -> (DVec3, DVec3) {
        let mut min = DVec3::ZERO;
        let mut max = DVec3::ZERO;
        for axis in 0..3 {
            let (lo, hi) = (
                ctx.get(variables::ENTITY_AABB_MIN[axis]),
                ctx.get(variables::ENTITY_AABB_MAX[axis]),
            );
            let (lo, hi) = if lo == 0.0 && hi == 0.0 {
                (Self::FALLBACK_MIN[axis], Self::FALLBACK_MAX[axis])
            } else {
                (lo, hi)
            };
            min[axis] = f64::from(lo);
            max[axis] = f64::from(hi);
        }
        (min, max)
    }
}

impl ParticleComponent for ShapeEntityAabb {
    fn configure(&mut self, config: &Value) {
        if let Some(obj) = config.as_object() {
            self.direction = Direction::from_config(obj);
        }
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let (min, max) = Self::bounds(ctx);
        let extent = max - min;
        let point = DVec3::new(
            min.x + random_unit(ctx) * extent.x,
            min.y + random_unit(ctx) * extent.y,
            min.z + random_unit(ctx) * extent.z,
        );
        let center = (min + max) * 0.5;

        particle.position += point;
        self.direction.apply(particle, point - center);
        Ok(())
    }
}
