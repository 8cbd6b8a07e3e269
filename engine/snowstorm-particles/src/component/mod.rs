//! Behaviour components attached to emitters.
//!
//! A definition lists components by identifier (`minecraft:emitter_rate_steady`
//! and so on). Each identifier maps to a type implementing
//! [`ParticleComponent`]; the emitter calls the hooks a component overrides at
//! fixed points of its tick.
//!
//! # Hook order within one emitter tick
//!
//! 1. [`on_emitter_tick`](ParticleComponent::on_emitter_tick) for every
//!    component, in definition order. Spawn and loop-reset requests made by a
//!    component are carried out before the next component runs.
//! 2. For every particle: [`on_particle_tick`](ParticleComponent::on_particle_tick)
//!    for every component, after the particle has aged and its curves were
//!    evaluated.
//!
//! [`on_particle_spawn`](ParticleComponent::on_particle_spawn) runs for every
//! component whenever a particle is created, and
//! [`on_particle_render`](ParticleComponent::on_particle_render) only when a
//! frame is rendered.

mod appearance;
mod json;
mod lifetime;
mod local_space;
mod motion;
mod rate;
mod registry;
mod shape;

use serde_json::Value;

use crate::emitter::EmitterState;
use crate::error::Result;
use crate::particle::Particle;

pub use appearance::{BillboardAppearance, LightingAppearance, TintingAppearance};
pub use lifetime::{EmitterLifetimeExpression, LifetimeLooping, LifetimeOnce, ParticleLifetimeExpression};
pub use local_space::LocalSpaceComponent;
pub use motion::{CollisionMotion, DynamicMotion, InitialSpeed, InitialSpin, ParametricMotion};
pub use rate::{RateInstant, RateManual, RateSteady};
pub use registry::{ComponentFactory, ComponentRegistry};
pub use shape::{Direction, ShapeBox, ShapeCustom, ShapeDisc, ShapeEntityAabb, ShapePoint, ShapeSphere};

/// Capability interface of an emitter component.
///
/// Only [`configure`](Self::configure) is required; every hook defaults to
/// doing nothing. Hooks that may fail return [`Result`]: an error aborts the
/// owning emitter's tick and the manager removes that emitter.
pub trait ParticleComponent: Send {
    /// Reads the component's own JSON value. Non-objects keep defaults.
    fn configure(&mut self, config: &Value);

    fn on_emitter_tick(&mut self, _emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        Ok(())
    }

    /// Called when a looping emitter starts a new cycle.
    fn on_emitter_loop_reset(&mut self, _emitter: &mut EmitterState) {}

    fn on_particle_spawn(&mut self, _particle: &mut Particle) -> Result<()> {
        Ok(())
    }

    fn on_particle_tick(&mut self, _particle: &mut Particle, _dt: f32) -> Result<()> {
        Ok(())
    }

    /// `frac` is the fraction of a tick elapsed since the last update.
    fn on_particle_render(&mut self, _particle: &mut Particle, _frac: f32) {}
}
