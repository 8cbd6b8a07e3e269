//! Emitter runtime state

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use glam::{DMat4, DVec3};
use serde::Serialize;
use snowstorm_molang::Context;

use crate::component::{ComponentRegistry, ParticleComponent};
use crate::config::DEFAULT_CAPACITY;
use crate::curve::CurveSet;
use crate::definition::{Material, ParticleDefinition};
use crate::error::{ParticleError, Result};
use crate::particle::Particle;
use crate::render::EmitterFrame;
use crate::variables;

/// Process-unique emitter handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EmitterId(u64);

impl EmitterId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Which parts of the emitter's motion particles inherit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LocalSpace: u8 {
        /// Particles move along with the emitter
        const POSITION = 1 << 0;
        /// Spawn offsets and directions are rotated by the emitter transform
        const ROTATION = 1 << 1;
        /// New particles inherit the emitter's velocity
        const VELOCITY = 1 << 2;
    }
}

/// Source of an emitter's world transform, typically a bone or locator of an
/// animated model.
///
/// Emitters only hold a weak reference: once the provider is dropped the
/// emitter stops tracking and keeps its last position.
pub trait TransformProvider: Send + Sync {
    /// Current world transform, or `None` if unavailable this tick.
    fn query_current_transform(&self) -> Option<DMat4>;
}

impl<F> TransformProvider for F
where
    F: Fn() -> Option<DMat4> + Send + Sync,
{
    fn query_current_transform(&self) -> Option<DMat4> {
        self()
    }
}

/// The part of an emitter that emitter-level component hooks may change.
///
/// Components cannot spawn particles directly from
/// [`on_emitter_tick`](ParticleComponent::on_emitter_tick); they request
/// spawns (and loop resets) here and the emitter carries them out as soon as
/// the requesting hook returns.
#[derive(Debug)]
pub struct EmitterState {
    id: EmitterId,
    age: f32,
    spawning: bool,
    position: DVec3,
    velocity: DVec3,
    local_space: LocalSpace,
    max_particles: usize,
    max_lifetime: f32,
    marked_for_removal: bool,
    particle_count: usize,
    pending_spawns: usize,
    loop_reset_requested: bool,
    context: Context,
}

impl EmitterState {
    fn new(mut context: Context) -> Self {
        for name in variables::EMITTER_RANDOM {
            let value = context.random_f32();
            context.set(name, value);
        }
        context.set(variables::EMITTER_AGE, 0.0);

        Self {
            id: EmitterId::next(),
            age: 0.0,
            spawning: true,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            local_space: LocalSpace::empty(),
            max_particles: DEFAULT_CAPACITY,
            max_lifetime: f32::MAX,
            marked_for_removal: false,
            particle_count: 0,
            pending_spawns: 0,
            loop_reset_requested: false,
            context,
        }
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Seconds since creation or since the last loop reset
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Sets the age and republishes `variable.emitter_age`.
    pub fn set_age(&mut self, age: f32) {
        self.age = age;
        self.context.set(variables::EMITTER_AGE, age);
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    pub fn set_spawning(&mut self, spawning: bool) {
        self.spawning = spawning;
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Movement over the last tick divided by its duration
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    pub fn local_space(&self) -> LocalSpace {
        self.local_space
    }

    pub fn set_local_space(&mut self, local_space: LocalSpace) {
        self.local_space = local_space;
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
    }

    pub fn max_lifetime(&self) -> f32 {
        self.max_lifetime
    }

    /// Sets the lifetime and publishes `variable.emitter_lifetime`.
    pub fn set_max_lifetime(&mut self, lifetime: f32) {
        self.max_lifetime = lifetime;
        self.context.set(variables::EMITTER_LIFETIME, lifetime);
    }

    /// Requests removal. The manager drops the emitter at the end of the tick.
    pub fn mark_for_removal(&mut self) {
        self.marked_for_removal = true;
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.marked_for_removal
    }

    /// Live particles, including those spawned earlier in this tick.
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Spawns requested but not yet carried out.
    pub fn pending_spawns(&self) -> usize {
        self.pending_spawns
    }

    /// Asks the emitter to spawn `count` particles once the current hook
    /// returns. Spawns beyond capacity are dropped.
    pub fn request_spawn(&mut self, count: usize) {
        self.pending_spawns = self.pending_spawns.saturating_add(count);
    }

    /// Asks the emitter to run every component's loop-reset hook.
    pub fn request_loop_reset(&mut self) {
        self.loop_reset_requested = true;
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }
}

struct ComponentSlot {
    identifier: String,
    component: Box<dyn ParticleComponent>,
}

/// A running instance of a particle definition.
pub struct Emitter {
    state: EmitterState,
    identifier: String,
    material: Material,
    texture: String,
    components: Vec<ComponentSlot>,
    curves: CurveSet,
    particles: Vec<Particle>,
    /// Position at the end of the previous tick
    anchor: DVec3,
    transform: Option<Weak<dyn TransformProvider>>,
    last_transform: Option<DMat4>,
    entity_bounds: Option<(DVec3, DVec3)>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.state.id)
            .field("identifier", &self.identifier)
            .field("age", &self.state.age)
            .field("position", &self.state.position)
            .field("components", &self.component_identifiers())
            .field("particles", &self.particles.len())
            .finish_non_exhaustive()
    }
}

impl Emitter {
    /// Creates an emitter with an OS-seeded random source.
    pub fn new(definition: &ParticleDefinition, registry: &ComponentRegistry) -> Self {
        Self::with_context(definition, registry, Context::new())
    }

    /// Creates an emitter whose randomness is reproducible.
    pub fn with_seed(definition: &ParticleDefinition, registry: &ComponentRegistry, seed: u64) -> Self {
        Self::with_context(definition, registry, Context::with_seed(seed))
    }

    /// Creates an emitter around an existing context.
    ///
    /// Components are instantiated from `registry` in definition order;
    /// identifiers the registry does not know are skipped.
    pub fn with_context(
        definition: &ParticleDefinition,
        registry: &ComponentRegistry,
        context: Context,
    ) -> Self {
        let mut components = Vec::new();
        for (identifier, config) in definition.components() {
            match registry.create(identifier) {
                Some(mut component) => {
                    component.configure(config);
                    components.push(ComponentSlot {
                        identifier: identifier.to_owned(),
                        component,
                    });
                }
                None => log::debug!("Skipping unknown component {identifier}"),
            }
        }

        Self {
            state: EmitterState::new(context),
            identifier: definition.identifier().to_owned(),
            material: definition.material(),
            texture: definition.texture().to_owned(),
            components,
            curves: CurveSet::from_json(&definition.particle_effect.curves),
            particles: Vec::new(),
            anchor: DVec3::ZERO,
            transform: None,
            last_transform: None,
            entity_bounds: None,
        }
    }

    pub fn id(&self) -> EmitterId {
        self.state.id
    }

    /// Identifier of the definition this emitter runs
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }

    pub fn state(&self) -> &EmitterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EmitterState {
        &mut self.state
    }

    pub fn context(&self) -> &Context {
        &self.state.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.state.context
    }

    pub fn age(&self) -> f32 {
        self.state.age
    }

    pub fn position(&self) -> DVec3 {
        self.state.position
    }

    /// Moves the emitter. Particles in local position space follow on the
    /// next tick.
    pub fn set_position(&mut self, position: DVec3) {
        self.state.position = position;
    }

    /// Places a freshly created emitter without dragging particles along.
    pub fn place(&mut self, position: DVec3) {
        self.state.position = position;
        self.anchor = position;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn max_particles(&self) -> usize {
        self.state.max_particles
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.state.max_particles = max;
    }

    pub fn is_marked_for_removal(&self) -> bool {
        self.state.marked_for_removal
    }

    pub fn mark_for_removal(&mut self) {
        self.state.marked_for_removal = true;
    }

    pub fn curves(&self) -> &CurveSet {
        &self.curves
    }

    /// Identifiers of the instantiated components, in hook order.
    pub fn component_identifiers(&self) -> Vec<&str> {
        self.components
            .iter()
            .map(|slot| slot.identifier.as_str())
            .collect()
    }

    /// Attaches the emitter to a transform source and snaps to it.
    pub fn set_transform_provider(&mut self, provider: &Arc<dyn TransformProvider>) {
        self.transform = Some(Arc::downgrade(provider));
        self.refresh_transform();
        self.anchor = self.state.position;
    }

    pub fn clear_transform_provider(&mut self) {
        self.transform = None;
    }

    /// Transform seen on the most recent successful query.
    pub fn last_transform(&self) -> Option<DMat4> {
        self.last_transform
    }

    /// Bounding box, relative to the emitter, published to new particles as
    /// `variable.entity_aabb_*`.
    pub fn set_entity_bounds(&mut self, min: DVec3, max: DVec3) {
        self.entity_bounds = Some((min, max));
    }

    /// Advances the emitter and all of its particles by `dt` seconds.
    ///
    /// An error means a component hook failed; the emitter is left in a
    /// partially updated state and should be discarded.
    pub fn tick(&mut self, dt: f32) -> Result<()> {
        self.refresh_transform();
        let delta = self.state.position - self.anchor;
        self.anchor = self.state.position;
        self.state.velocity = if dt > 0.0 {
            delta / f64::from(dt)
        } else {
            DVec3::ZERO
        };

        let age = self.state.age + dt;
        self.state.set_age(age);

        for index in 0..self.components.len() {
            let slot = &mut self.components[index];
            if let Err(err) = slot.component.on_emitter_tick(&mut self.state, dt) {
                return Err(attribute(&slot.identifier, err));
            }
            self.process_requests()?;
        }

        let follow = self.state.local_space.contains(LocalSpace::POSITION) && delta != DVec3::ZERO;
        let curves = &self.curves;
        let components = &mut self.components;
        let mut fault = None;

        self.particles.retain_mut(|particle| {
            if fault.is_some() {
                return true;
            }
            if follow {
                particle.translate(delta);
            }

            particle.update(dt, curves);
            if particle.is_dead() {
                return false;
            }

            for slot in components.iter_mut() {
                if let Err(err) = slot.component.on_particle_tick(particle, dt) {
                    fault = Some(attribute(&slot.identifier, err));
                    return true;
                }
            }
            particle.is_alive()
        });

        self.state.particle_count = self.particles.len();
        fault.map_or(Ok(()), Err)
    }

    /// Spawns one particle at the emitter position.
    ///
    /// Curves are evaluated into the new particle's context before any
    /// component sees it. Returns `Ok(false)` when the emitter is at capacity.
    pub fn spawn_particle(&mut self) -> Result<bool> {
        if self.particles.len() >= self.state.max_particles {
            return Ok(false);
        }

        let context = self.state.context.spawn_child();
        let mut particle = Particle::new(self.state.position, context);

        if let Some((min, max)) = self.entity_bounds {
            let ctx = particle.context_mut();
            for axis in 0..3 {
                ctx.set(variables::ENTITY_AABB_MIN[axis], min[axis] as f32);
                ctx.set(variables::ENTITY_AABB_MAX[axis], max[axis] as f32);
            }
        }

        self.curves.apply(particle.context_mut());

        for slot in &mut self.components {
            if let Err(err) = slot.component.on_particle_spawn(&mut particle) {
                return Err(attribute(&slot.identifier, err));
            }
        }

        self.apply_local_space(&mut particle);
        particle.previous_position = particle.position;
        particle.publish_position();

        self.particles.push(particle);
        self.state.particle_count = self.particles.len();
        Ok(true)
    }

    /// Runs render hooks and captures every particle's render state.
    pub fn render(&mut self, frac: f32) -> EmitterFrame {
        for particle in &mut self.particles {
            for slot in &mut self.components {
                slot.component.on_particle_render(particle, frac);
            }
        }

        EmitterFrame {
            id: self.state.id,
            identifier: self.identifier.clone(),
            material: self.material,
            texture: self.texture.clone(),
            particles: self.particles.iter().map(Particle::snapshot).collect(),
        }
    }

    fn process_requests(&mut self) -> Result<()> {
        if std::mem::take(&mut self.state.loop_reset_requested) {
            for slot in &mut self.components {
                slot.component.on_emitter_loop_reset(&mut self.state);
            }
        }

        let requested = std::mem::take(&mut self.state.pending_spawns);
        for _ in 0..requested {
            if !self.spawn_particle()? {
                break;
            }
        }
        Ok(())
    }

    fn apply_local_space(&self, particle: &mut Particle) {
        let local = self.state.local_space;
        if local.contains(LocalSpace::ROTATION)
            && let Some(transform) = self.last_transform
        {
            let offset = particle.position - self.state.position;
            particle.position = self.state.position + transform.transform_vector3(offset);
            particle.velocity = transform.transform_vector3(particle.velocity);
        }
        if local.contains(LocalSpace::VELOCITY) {
            particle.velocity += self.state.velocity;
        }
    }

    fn refresh_transform(&mut self) {
        let Some(weak) = &self.transform else {
            return;
        };
        match weak.upgrade() {
            Some(provider) => {
                if let Some(transform) = provider.query_current_transform() {
                    self.last_transform = Some(transform);
                    self.state.position = transform.w_axis.truncate();
                }
            }
            None => {
                log::debug!(
                    "Transform provider of emitter {} was dropped, keeping last position",
                    self.state.id
                );
                self.transform = None;
            }
        }
    }
}

/// Tags a hook error with the component that raised it.
fn attribute(identifier: &str, err: ParticleError) -> ParticleError {
    match err {
        ParticleError::ComponentFault { .. } => err,
        other => ParticleError::component(identifier, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(components: serde_json::Value) -> ParticleDefinition {
        serde_json::from_value(json!({
            "format_version": "1.10.0",
            "particle_effect": {
                "description": { "identifier": "test:emitter" },
                "components": components
            }
        }))
        .unwrap()
    }

    fn emitter(components: serde_json::Value) -> Emitter {
        Emitter::with_seed(&definition(components), &ComponentRegistry::builtin(), 1)
    }

    #[test]
    fn test_unknown_components_are_skipped() {
        let e = emitter(json!({
            "minecraft:emitter_rate_instant": { "num_particles": 1 },
            "minecraft:not_a_component": {},
        }));
        assert_eq!(e.component_identifiers(), vec!["minecraft:emitter_rate_instant"]);
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let mut e = emitter(json!({}));
        e.set_max_particles(2);
        assert!(e.spawn_particle().unwrap());
        assert!(e.spawn_particle().unwrap());
        assert!(!e.spawn_particle().unwrap());
        assert_eq!(e.particle_count(), 2);
    }

    #[test]
    fn test_tick_publishes_age() {
        let mut e = emitter(json!({}));
        e.tick(0.25).unwrap();
        e.tick(0.25).unwrap();
        assert_eq!(e.age(), 0.5);
        assert_eq!(e.context().get(variables::EMITTER_AGE), 0.5);
    }

    #[test]
    fn test_emitter_randoms_published() {
        let e = emitter(json!({}));
        for name in variables::EMITTER_RANDOM {
            assert!(e.context().contains(name));
        }
    }

    #[test]
    fn test_local_position_space_drags_particles() {
        let mut e = emitter(json!({ "minecraft:emitter_local_space": { "position": true } }));
        e.tick(0.05).unwrap();
        e.spawn_particle().unwrap();
        e.particles[0].lifetime = 100.0;

        e.set_position(DVec3::new(0.0, 3.0, 0.0));
        e.tick(0.05).unwrap();
        assert_eq!(e.particles()[0].position, DVec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_world_space_particles_stay_put() {
        let mut e = emitter(json!({}));
        e.spawn_particle().unwrap();
        e.particles[0].lifetime = 100.0;

        e.set_position(DVec3::new(0.0, 3.0, 0.0));
        e.tick(0.05).unwrap();
        assert_eq!(e.particles()[0].position, DVec3::ZERO);
    }

    #[test]
    fn test_transform_provider_tracks_and_releases() {
        let mut e = emitter(json!({}));
        let provider: Arc<dyn TransformProvider> =
            Arc::new(|| Some(DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0))));
        e.set_transform_provider(&provider);
        assert_eq!(e.position(), DVec3::new(1.0, 2.0, 3.0));
        assert!(e.last_transform().is_some());

        drop(provider);
        e.set_position(DVec3::new(9.0, 9.0, 9.0));
        e.tick(0.05).unwrap();
        assert_eq!(e.position(), DVec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_entity_bounds_reach_particles() {
        let mut e = emitter(json!({}));
        e.set_entity_bounds(DVec3::new(-1.0, 0.0, -1.0), DVec3::new(1.0, 2.0, 1.0));
        e.spawn_particle().unwrap();
        let ctx = e.particles()[0].context();
        assert_eq!(ctx.get("variable.entity_aabb_max_y"), 2.0);
        assert_eq!(ctx.get("variable.entity_aabb_min_x"), -1.0);
    }

    #[test]
    fn test_local_velocity_is_inherited() {
        let mut e = emitter(json!({ "minecraft:emitter_local_space": { "velocity": true } }));
        e.set_position(DVec3::new(1.0, 0.0, 0.0));
        e.tick(0.5).unwrap();
        e.spawn_particle().unwrap();
        assert_eq!(e.particles()[0].velocity, DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_render_frame() {
        let mut e = emitter(json!({}));
        e.spawn_particle().unwrap();
        let frame = e.render(0.5);
        assert_eq!(frame.id, e.id());
        assert_eq!(frame.identifier, "test:emitter");
        assert_eq!(frame.material, Material::Blend);
        assert_eq!(frame.particles.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = emitter(json!({}));
        let b = emitter(json!({}));
        assert_ne!(a.id(), b.id());
    }
}
