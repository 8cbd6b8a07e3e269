//! Emitter and particle lifetime components

use serde_json::Value;
use snowstorm_molang::Expr;

use super::ParticleComponent;
use super::json::{expr, expr_or};
use crate::emitter::EmitterState;
use crate::error::Result;
use crate::particle::Particle;

/// `minecraft:emitter_lifetime_once`: spawn for `active_time` seconds, then
/// expire once the last particle is gone.
#[derive(Debug, Clone)]
pub struct LifetimeOnce {
    active_time: Expr,
    started: bool,
}

impl Default for LifetimeOnce {
    fn default() -> Self {
        Self {
            active_time: Expr::Constant(10.0),
            started: false,
        }
    }
}

impl ParticleComponent for LifetimeOnce {
    fn configure(&mut self, config: &Value) {
        if let Some(obj) = config.as_object() {
            self.active_time = expr_or(obj, "active_time", 10.0);
        }
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        if !self.started {
            self.started = true;
            let active = self.active_time.evaluate(emitter.context_mut());
            emitter.set_max_lifetime(active);
            emitter.set_spawning(true);
        }

        if emitter.age() >= emitter.max_lifetime() {
            emitter.set_spawning(false);
            if emitter.particle_count() == 0 {
                emitter.mark_for_removal();
            }
        }
        Ok(())
    }
}

/// `minecraft:emitter_lifetime_looping`: alternate `active_time` seconds of
/// spawning with `sleep_time` seconds of rest, forever.
#[derive(Debug, Clone)]
pub struct LifetimeLooping {
    active_time: Expr,
    sleep_time: Expr,
}

impl Default for LifetimeLooping {
    fn default() -> Self {
        Self {
            active_time: Expr::Constant(10.0),
            sleep_time: Expr::ZERO,
        }
    }
}

impl ParticleComponent for LifetimeLooping {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.active_time = expr_or(obj, "active_time", 10.0);
        self.sleep_time = expr_or(obj, "sleep_time", 0.0);
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        let ctx = emitter.context_mut();
        let active = self.active_time.evaluate(ctx);
        let sleep = self.sleep_time.evaluate(ctx);
        emitter.set_max_lifetime(active);

        let total = active + sleep;
        if total <= 0.0 {
            return Ok(());
        }

        let age = emitter.age();
        emitter.set_spawning(age < active);
        if age >= total {
            log::trace!("Emitter {} starts a new loop", emitter.id());
            emitter.set_age(0.0);
            emitter.set_spawning(true);
            emitter.request_loop_reset();
        }
        Ok(())
    }
}

/// `minecraft:emitter_lifetime_expression`: spawning and expiry driven by
/// Molang conditions evaluated every tick.
#[derive(Debug, Clone)]
pub struct EmitterLifetimeExpression {
    activation: Expr,
    expiration: Expr,
}

impl Default for EmitterLifetimeExpression {
    fn default() -> Self {
        Self {
            activation: Expr::ONE,
            expiration: Expr::ZERO,
        }
    }
}

impl ParticleComponent for EmitterLifetimeExpression {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.activation = expr_or(obj, "activation_expression", 1.0);
        self.expiration = expr_or(obj, "expiration_expression", 0.0);
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        let ctx = emitter.context_mut();
        let active = self.activation.evaluate_bool(ctx);
        let expired = self.expiration.evaluate_bool(ctx);

        emitter.set_spawning(active);
        if expired {
            emitter.mark_for_removal();
        }
        Ok(())
    }
}

/// `minecraft:particle_lifetime_expression`
#[derive(Debug, Clone)]
pub struct ParticleLifetimeExpression {
    max_lifetime: Expr,
    expiration: Option<Expr>,
}

impl Default for ParticleLifetimeExpression {
    fn default() -> Self {
        Self {
            max_lifetime: Expr::ONE,
            expiration: None,
        }
    }
}

impl ParticleComponent for ParticleLifetimeExpression {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.max_lifetime = expr_or(obj, "max_lifetime", 1.0);
        self.expiration = expr(obj, "expiration_expression");
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        let lifetime = self.max_lifetime.evaluate(particle.context_mut());
        particle.set_lifetime(lifetime);
        Ok(())
    }

    fn on_particle_tick(&mut self, particle: &mut Particle, _dt: f32) -> Result<()> {
        if let Some(expiration) = &self.expiration
            && expiration.evaluate_bool(particle.context_mut())
        {
            particle.kill();
        }
        Ok(())
    }
}
