//! Emitter rate components

use serde_json::Value;
use snowstorm_molang::Expr;

use super::ParticleComponent;
use super::json::expr_or;
use crate::emitter::EmitterState;
use crate::error::Result;

fn capacity(value: f32) -> usize {
    if value.is_finite() && value > 0.0 {
        value.floor() as usize
    } else {
        0
    }
}

/// `minecraft:emitter_rate_steady`: a continuous stream of particles.
///
/// Fractional spawns accumulate across ticks so low rates still emit.
#[derive(Debug, Clone)]
pub struct RateSteady {
    spawn_rate: Expr,
    max_particles: Expr,
    accumulator: f32,
}

impl Default for RateSteady {
    fn default() -> Self {
        Self {
            spawn_rate: Expr::ZERO,
            max_particles: Expr::Constant(50.0),
            accumulator: 0.0,
        }
    }
}

impl ParticleComponent for RateSteady {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.spawn_rate = expr_or(obj, "spawn_rate", 0.0);
        self.max_particles = expr_or(obj, "max_particles", 50.0);
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, dt: f32) -> Result<()> {
        if !emitter.is_spawning() {
            return Ok(());
        }

        let ctx = emitter.context_mut();
        let rate = self.spawn_rate.evaluate(ctx);
        let max = capacity(self.max_particles.evaluate(ctx));
        emitter.set_max_particles(max);

        let current = emitter.particle_count();
        if rate <= 0.0 || current >= max {
            return Ok(());
        }

        self.accumulator += rate * dt;
        let whole = self.accumulator.floor();
        self.accumulator -= whole;

        let room = max.saturating_sub(current + emitter.pending_spawns());
        let count = (whole as usize).min(room);
        if count > 0 {
            emitter.request_spawn(count);
        }
        Ok(())
    }

    fn on_emitter_loop_reset(&mut self, _emitter: &mut EmitterState) {
        self.accumulator = 0.0;
    }
}

/// `minecraft:emitter_rate_instant`: one burst per emitter cycle.
#[derive(Debug, Clone)]
pub struct RateInstant {
    num_particles: Expr,
    fired: bool,
}

impl Default for RateInstant {
    fn default() -> Self {
        Self {
            num_particles: Expr::Constant(10.0),
            fired: false,
        }
    }
}

impl ParticleComponent for RateInstant {
    fn configure(&mut self, config: &Value) {
        if let Some(obj) = config.as_object() {
            self.num_particles = expr_or(obj, "num_particles", 10.0);
        }
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        if self.fired || !emitter.is_spawning() {
            return Ok(());
        }
        self.fired = true;

        let count = capacity(self.num_particles.evaluate(emitter.context_mut()));
        emitter.request_spawn(count);
        Ok(())
    }

    fn on_emitter_loop_reset(&mut self, _emitter: &mut EmitterState) {
        self.fired = false;
    }
}

/// `minecraft:emitter_rate_manual`: particles are only spawned on request
/// from outside; the component just caps the count.
#[derive(Debug, Clone)]
pub struct RateManual {
    max_particles: Expr,
}

impl Default for RateManual {
    fn default() -> Self {
        Self {
            max_particles: Expr::Constant(50.0),
        }
    }
}

impl ParticleComponent for RateManual {
    fn configure(&mut self, config: &Value) {
        if let Some(obj) = config.as_object() {
            self.max_particles = expr_or(obj, "max_particles", 50.0);
        }
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        let max = capacity(self.max_particles.evaluate(emitter.context_mut()));
        emitter.set_max_particles(max);
        Ok(())
    }
}
