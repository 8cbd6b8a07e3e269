//! Particle initial-state and motion components

use glam::DVec3;
use serde_json::Value;
use snowstorm_molang::{Context, Expr, parse_json};

use super::ParticleComponent;
use super::json::{bool_or, expr, expr_array, expr_or};
use crate::error::Result;
use crate::particle::Particle;
use crate::variables;

fn evaluate_vector(exprs: &[Expr; 3], ctx: &mut Context) -> DVec3 {
    DVec3::new(
        f64::from(exprs[0].evaluate(ctx)),
        f64::from(exprs[1].evaluate(ctx)),
        f64::from(exprs[2].evaluate(ctx)),
    )
}

#[derive(Debug, Clone)]
enum Speed {
    /// Scales the shape's direction
    Scalar(Expr),
    /// Replaces the velocity outright
    Vector([Expr; 3]),
}

/// `minecraft:particle_initial_speed`
///
/// The component value is the speed itself: a number or expression scales
/// the direction set by the emitter shape, an `[x, y, z]` array sets the
/// velocity directly.
#[derive(Debug, Clone)]
pub struct InitialSpeed {
    speed: Speed,
}

impl Default for InitialSpeed {
    fn default() -> Self {
        Self {
            speed: Speed::Scalar(Expr::ONE),
        }
    }
}

impl ParticleComponent for InitialSpeed {
    fn configure(&mut self, config: &Value) {
        self.speed = match config {
            Value::Array(items) if items.len() >= 3 => {
                Speed::Vector(std::array::from_fn(|i| parse_json(&items[i])))
            }
            other => Speed::Scalar(parse_json(other)),
        };
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        match &self.speed {
            Speed::Scalar(magnitude) => {
                let speed = f64::from(magnitude.evaluate(particle.context_mut()));
                if particle.velocity.length() > 0.0001 {
                    particle.velocity = particle.velocity.normalize() * speed;
                }
            }
            Speed::Vector(exprs) => {
                particle.velocity = evaluate_vector(exprs, particle.context_mut());
            }
        }
        Ok(())
    }
}

/// `minecraft:particle_initial_spin`
#[derive(Debug, Clone, Default)]
pub struct InitialSpin {
    rotation: Expr,
    rotation_rate: Expr,
}

impl ParticleComponent for InitialSpin {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.rotation = expr_or(obj, "rotation", 0.0);
        self.rotation_rate = expr_or(obj, "rotation_rate", 0.0);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let ctx = particle.context_mut();
        let rotation = self.rotation.evaluate(ctx);
        let rate = self.rotation_rate.evaluate(ctx);
        particle.rotation = rotation;
        particle.rotation_rate = rate;
        Ok(())
    }
}

/// `minecraft:particle_motion_dynamic`: explicit Euler integration.
///
/// Each tick the particle moves by its current velocity, then the velocity
/// gains `linear_acceleration * dt` and is damped by drag. The damping factor
/// never drops below zero, so drag cannot reverse a particle.
#[derive(Debug, Clone)]
pub struct DynamicMotion {
    linear_acceleration: [Expr; 3],
    linear_drag: Expr,
    rotation_acceleration: Expr,
    rotation_drag: Expr,
}

impl Default for DynamicMotion {
    fn default() -> Self {
        Self {
            linear_acceleration: std::array::from_fn(|_| Expr::ZERO),
            linear_drag: Expr::ZERO,
            rotation_acceleration: Expr::ZERO,
            rotation_drag: Expr::ZERO,
        }
    }
}

impl ParticleComponent for DynamicMotion {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        if let Some(acceleration) = expr_array(obj, "linear_acceleration") {
            self.linear_acceleration = acceleration;
        }
        self.linear_drag = expr_or(obj, "linear_drag_coefficient", 0.0);
        self.rotation_acceleration = expr_or(obj, "rotation_acceleration", 0.0);
        self.rotation_drag = expr_or(obj, "rotation_drag_coefficient", 0.0);
    }

    fn on_particle_tick(&mut self, particle: &mut Particle, dt: f32) -> Result<()> {
        let step = f64::from(dt);
        particle.position += particle.velocity * step;

        let ctx = particle.context_mut();
        let acceleration = evaluate_vector(&self.linear_acceleration, ctx);
        let drag = self.linear_drag.evaluate(ctx);
        let spin_acceleration = self.rotation_acceleration.evaluate(ctx);
        let spin_drag = self.rotation_drag.evaluate(ctx);

        particle.velocity += acceleration * step;
        if drag > 0.0 {
            particle.velocity *= f64::from((1.0 - drag * dt).max(0.0));
        }

        particle.rotation_rate += spin_acceleration * dt;
        if spin_drag > 0.0 {
            particle.rotation_rate *= (1.0 - spin_drag * dt).max(0.0);
        }

        particle.publish_position();
        Ok(())
    }
}

/// `minecraft:particle_motion_parametric`: position, direction and rotation
/// given directly as functions of particle state.
#[derive(Debug, Clone, Default)]
pub struct ParametricMotion {
    relative_position: Option<[Expr; 3]>,
    direction: Option<[Expr; 3]>,
    rotation: Option<Expr>,
}

impl ParticleComponent for ParametricMotion {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.relative_position = expr_array(obj, "relative_position");
        self.direction = expr_array(obj, "direction");
        self.rotation = expr(obj, "rotation");
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        particle.spawn_position = particle.position;
        let spawn = particle.position;
        let ctx = particle.context_mut();
        ctx.set(variables::SPAWN_X, spawn.x as f32);
        ctx.set(variables::SPAWN_Y, spawn.y as f32);
        ctx.set(variables::SPAWN_Z, spawn.z as f32);
        Ok(())
    }

    fn on_particle_tick(&mut self, particle: &mut Particle, _dt: f32) -> Result<()> {
        if let Some(relative) = &self.relative_position {
            let offset = evaluate_vector(relative, particle.context_mut());
            particle.position = particle.spawn_position + offset;
        }
        if let Some(direction) = &self.direction {
            particle.velocity = evaluate_vector(direction, particle.context_mut());
        }
        if let Some(rotation) = &self.rotation {
            particle.rotation = rotation.evaluate(particle.context_mut());
        }
        particle.publish_position();
        Ok(())
    }
}

/// `minecraft:particle_motion_collision`
///
/// Collides against the ground plane `y = 0`. A particle about to sink below
/// it either expires or bounces, losing vertical speed by the coefficient of
/// restitution and horizontal speed by the collision drag.
#[derive(Debug, Clone)]
pub struct CollisionMotion {
    enabled: Expr,
    collision_radius: Expr,
    restitution: Expr,
    collision_drag: Expr,
    expire_on_contact: bool,
}

impl Default for CollisionMotion {
    fn default() -> Self {
        Self {
            enabled: Expr::ONE,
            collision_radius: Expr::Constant(0.1),
            restitution: Expr::ZERO,
            collision_drag: Expr::ZERO,
            expire_on_contact: false,
        }
    }
}

impl ParticleComponent for CollisionMotion {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.enabled = expr_or(obj, "enabled", 1.0);
        self.collision_radius = expr_or(obj, "collision_radius", 0.1);
        self.restitution = expr_or(obj, "coefficient_of_restitution", 0.0);
        self.collision_drag = expr_or(obj, "collision_drag", 0.0);
        self.expire_on_contact = bool_or(obj, "expire_on_contact", false);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        particle.context_mut().set(variables::HAS_COLLISION, 0.0);
        Ok(())
    }

    fn on_particle_tick(&mut self, particle: &mut Particle, dt: f32) -> Result<()> {
        let ctx = particle.context_mut();
        if !self.enabled.evaluate_bool(ctx) {
            return Ok(());
        }

        let radius = f64::from(self.collision_radius.evaluate(ctx));
        let predicted = particle.position.y + particle.velocity.y * f64::from(dt);
        if predicted - radius >= 0.0 {
            return Ok(());
        }

        if self.expire_on_contact {
            particle.kill();
            return Ok(());
        }

        let ctx = particle.context_mut();
        let restitution = f64::from(self.restitution.evaluate(ctx));
        let drag = f64::from(self.collision_drag.evaluate(ctx));
        ctx.set(variables::HAS_COLLISION, 1.0);

        particle.velocity.y = -particle.velocity.y * restitution;
        particle.position.y = radius;
        particle.velocity.x *= 1.0 - drag;
        particle.velocity.z *= 1.0 - drag;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn particle() -> Particle {
        let mut p = Particle::new(DVec3::ZERO, Context::with_seed(21));
        p.set_lifetime(100.0);
        p
    }

    #[test]
    fn test_initial_speed_scales_direction() {
        let mut speed = InitialSpeed::default();
        speed.configure(&json!(4));
        let mut p = particle();
        p.velocity = DVec3::new(0.0, 0.0, 0.5);
        speed.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.velocity, DVec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_initial_speed_without_direction() {
        let mut speed = InitialSpeed::default();
        speed.configure(&json!("2 + 3"));
        let mut p = particle();
        speed.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.velocity, DVec3::ZERO);
    }

    #[test]
    fn test_initial_speed_vector() {
        let mut speed = InitialSpeed::default();
        speed.configure(&json!([1, 2, "-3"]));
        let mut p = particle();
        speed.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.velocity, DVec3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn test_initial_spin() {
        let mut spin = InitialSpin::default();
        spin.configure(&json!({ "rotation": 45, "rotation_rate": "10 * 2" }));
        let mut p = particle();
        spin.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.rotation, 45.0);
        assert_eq!(p.rotation_rate, 20.0);
    }

    #[test]
    fn test_dynamic_integration_order() {
        let mut motion = DynamicMotion::default();
        motion.configure(&json!({ "linear_acceleration": [0, -10, 0] }));
        let mut p = particle();
        p.velocity = DVec3::new(1.0, 0.0, 0.0);

        motion.on_particle_tick(&mut p, 0.5).unwrap();
        // Position uses the velocity from before acceleration
        assert_eq!(p.position, DVec3::new(0.5, 0.0, 0.0));
        assert_eq!(p.velocity, DVec3::new(1.0, -5.0, 0.0));
        assert_eq!(p.context().get(variables::PARTICLE_X), 0.5);
    }

    #[test_case(0.5, 0.75 ; "partial damping")]
    #[test_case(4.0, 0.0 ; "clamped to zero")]
    #[test_case(100.0, 0.0 ; "never inverts")]
    fn test_dynamic_drag(drag: f32, expected: f64) {
        let mut motion = DynamicMotion::default();
        motion.configure(&json!({ "linear_drag_coefficient": drag }));
        let mut p = particle();
        p.velocity = DVec3::new(1.0, 0.0, 0.0);
        motion.on_particle_tick(&mut p, 0.5).unwrap();
        assert_eq!(p.velocity.x, expected);
    }

    #[test]
    fn test_dynamic_rotation() {
        let mut motion = DynamicMotion::default();
        motion.configure(&json!({ "rotation_acceleration": 10, "rotation_drag_coefficient": 1 }));
        let mut p = particle();
        motion.on_particle_tick(&mut p, 0.5).unwrap();
        assert_eq!(p.rotation_rate, 2.5);
    }

    #[test]
    fn test_parametric_relative_to_spawn() {
        let mut motion = ParametricMotion::default();
        motion.configure(&json!({
            "relative_position": [0, "v.particle_age * 2", 0],
            "direction": [1, 0, 0],
            "rotation": "v.particle_age * 90"
        }));
        let mut p = Particle::new(DVec3::new(3.0, 0.0, 0.0), Context::with_seed(2));
        p.set_lifetime(10.0);
        motion.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.context().get(variables::SPAWN_X), 3.0);

        p.update(0.5, &crate::curve::CurveSet::new());
        motion.on_particle_tick(&mut p, 0.5).unwrap();
        assert_eq!(p.position, DVec3::new(3.0, 1.0, 0.0));
        assert_eq!(p.velocity, DVec3::X);
        assert_eq!(p.rotation, 45.0);
    }

    #[test]
    fn test_collision_bounce() {
        let mut collision = CollisionMotion::default();
        collision.configure(&json!({
            "collision_radius": 0.5,
            "coefficient_of_restitution": 0.5,
            "collision_drag": 0.25
        }));
        let mut p = particle();
        collision.on_particle_spawn(&mut p).unwrap();
        assert_eq!(p.context().get(variables::HAS_COLLISION), 0.0);

        p.position = DVec3::new(0.0, 1.0, 0.0);
        p.velocity = DVec3::new(4.0, -2.0, 0.0);
        collision.on_particle_tick(&mut p, 0.5).unwrap();
        assert_eq!(p.position.y, 0.5);
        assert_eq!(p.velocity, DVec3::new(3.0, 1.0, 0.0));
        assert_eq!(p.context().get(variables::HAS_COLLISION), 1.0);
    }

    #[test]
    fn test_collision_expire_on_contact() {
        let mut collision = CollisionMotion::default();
        collision.configure(&json!({ "expire_on_contact": true }));
        let mut p = particle();
        p.velocity = DVec3::new(0.0, -1.0, 0.0);
        collision.on_particle_tick(&mut p, 0.5).unwrap();
        assert!(p.is_dead());
    }

    #[test]
    fn test_collision_disabled() {
        let mut collision = CollisionMotion::default();
        collision.configure(&json!({ "enabled": 0, "expire_on_contact": true }));
        let mut p = particle();
        p.velocity = DVec3::new(0.0, -1.0, 0.0);
        collision.on_particle_tick(&mut p, 0.5).unwrap();
        assert!(p.is_alive());
    }
}
