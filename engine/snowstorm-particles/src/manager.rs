//! Simulation manager owning every live emitter

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use glam::DVec3;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::component::ComponentRegistry;
use crate::config::SimulationConfig;
use crate::emitter::{Emitter, EmitterId};
use crate::error::{ParticleError, Result};
use crate::library::DefinitionLibrary;
use crate::render::EmitterFrame;

/// Emitters waiting to join the simulation.
///
/// Clones share the same queue, so a handle can be given to other threads;
/// queued emitters are merged at the start of the next
/// [`tick`](SimulationManager::tick).
#[derive(Clone, Default)]
pub struct SpawnQueue {
    inner: Arc<Mutex<Vec<Emitter>>>,
}

impl fmt::Debug for SpawnQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnQueue").field("len", &self.len()).finish()
    }
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, emitter: Emitter) {
        self.inner.lock().push(emitter);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Takes every queued emitter, in insertion order.
    pub fn drain(&self) -> Vec<Emitter> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

/// Snapshot of simulation size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EmitterStats {
    /// Live emitters
    pub emitters: usize,
    /// Emitters queued for the next tick
    pub pending: usize,
    /// Particles across all live emitters
    pub particles: usize,
    /// Ticks run so far
    pub ticks: u64,
}

impl fmt::Display for EmitterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} emitters ({} pending), {} particles after {} ticks",
            self.emitters, self.pending, self.particles, self.ticks
        )
    }
}

/// Drives all emitters of a scene at a fixed timestep.
///
/// A failing emitter, whether its tick returns an error or panics, is logged
/// and removed without disturbing the others.
pub struct SimulationManager {
    config: SimulationConfig,
    registry: Arc<ComponentRegistry>,
    library: Arc<DefinitionLibrary>,
    emitters: Vec<Emitter>,
    pending: SpawnQueue,
    tick_count: u64,
    seeds: Option<StdRng>,
}

impl fmt::Debug for SimulationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationManager")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl SimulationManager {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ParticleError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: SimulationConfig,
        registry: Arc<ComponentRegistry>,
        library: Arc<DefinitionLibrary>,
    ) -> Result<Self> {
        config.validate()?;
        let seeds = config.seed.map(StdRng::seed_from_u64);
        Ok(Self {
            config,
            registry,
            library,
            emitters: Vec::new(),
            pending: SpawnQueue::new(),
            tick_count: 0,
            seeds,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn library(&self) -> &Arc<DefinitionLibrary> {
        &self.library
    }

    /// Handle for queueing emitters from elsewhere.
    pub fn spawn_queue(&self) -> SpawnQueue {
        self.pending.clone()
    }

    /// Queues an emitter. It starts ticking with the next [`tick`](Self::tick).
    pub fn add(&self, emitter: Emitter) {
        self.pending.push(emitter);
    }

    /// Creates an emitter for `name` (identifier or alias) at the given
    /// position and makes it live immediately, bypassing the spawn queue.
    ///
    /// Returns `None` if the library has no such definition.
    pub fn spawn(&mut self, name: &str, x: f64, y: f64, z: f64) -> Option<EmitterId> {
        let Some(definition) = self.library.get(name) else {
            log::debug!("No particle definition named {name}");
            return None;
        };

        let mut emitter = match self.seeds.as_mut() {
            Some(seeds) => Emitter::with_seed(&definition, &self.registry, seeds.random()),
            None => Emitter::new(&definition, &self.registry),
        };
        emitter.set_max_particles(self.config.default_capacity);
        emitter.place(DVec3::new(x, y, z));

        let id = emitter.id();
        log::debug!("Spawned emitter {id} for {}", definition.identifier());
        self.emitters.push(emitter);
        Some(id)
    }

    /// Advances the simulation by one timestep.
    pub fn tick(&mut self) {
        let dt = self.config.timestep;
        self.emitters.extend(self.pending.drain());

        for emitter in &mut self.emitters {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| emitter.tick(dt)));
            let fault = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err,
                Err(payload) => ParticleError::EmitterPanicked(panic_message(payload.as_ref())),
            };
            log::error!(
                "Removing emitter {} ({}): {fault}",
                emitter.id(),
                emitter.identifier()
            );
            emitter.mark_for_removal();
        }

        self.emitters.retain(|emitter| !emitter.is_marked_for_removal());
        self.tick_count += 1;

        let interval = self.config.stats_interval;
        if interval > 0 && self.tick_count.is_multiple_of(interval) && !self.emitters.is_empty() {
            log::info!("{}", self.stats());
        }
    }

    /// Runs render hooks on every live emitter and collects their frames.
    pub fn render(&mut self, frac: f32) -> Vec<EmitterFrame> {
        self.emitters
            .iter_mut()
            .map(|emitter| emitter.render(frac))
            .collect()
    }

    /// Drops every live and queued emitter.
    pub fn clear(&mut self) {
        let stats = self.stats();
        self.emitters.clear();
        self.pending.clear();
        log::info!(
            "Cleared {} emitters and {} pending",
            stats.emitters,
            stats.pending
        );
    }

    pub fn emitter(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.iter().find(|emitter| emitter.id() == id)
    }

    pub fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|emitter| emitter.id() == id)
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    /// Number of live emitters, not counting queued ones.
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn stats(&self) -> EmitterStats {
        EmitterStats {
            emitters: self.emitters.len(),
            pending: self.pending.len(),
            particles: self.emitters.iter().map(Emitter::particle_count).sum(),
            ticks: self.tick_count,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ParticleDefinition;

    const SPARK: &str = r#"{
        "format_version": "1.10.0",
        "particle_effect": {
            "description": { "identifier": "test:spark" },
            "components": {
                "minecraft:emitter_rate_instant": { "num_particles": 3 },
                "minecraft:emitter_lifetime_once": { "active_time": 1 },
                "minecraft:particle_lifetime_expression": { "max_lifetime": 0.5 }
            }
        }
    }"#;

    fn manager(seed: Option<u64>) -> SimulationManager {
        let mut library = DefinitionLibrary::new();
        library.load_str(SPARK).unwrap();
        library.alias("spark", "test:spark");
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        SimulationManager::new(config, Arc::new(ComponentRegistry::builtin()), Arc::new(library)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            timestep: 0.0,
            ..SimulationConfig::default()
        };
        let result = SimulationManager::new(
            config,
            Arc::new(ComponentRegistry::new()),
            Arc::new(DefinitionLibrary::new()),
        );
        assert!(matches!(result, Err(ParticleError::InvalidConfig(_))));
    }

    #[test]
    fn test_spawn_unknown_definition() {
        let mut m = manager(None);
        assert_eq!(m.spawn("test:missing", 0.0, 0.0, 0.0), None);
        assert!(m.is_empty());
        assert_eq!(m.stats().pending, 0);
    }

    #[test]
    fn test_spawn_is_live_immediately() {
        let mut m = manager(Some(1));
        let id = m.spawn("spark", 1.0, 2.0, 3.0).unwrap();
        let emitter = m.emitter(id).unwrap();
        assert_eq!(emitter.position(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(emitter.particle_count(), 0);
        assert_eq!(m.len(), 1);
        assert_eq!(m.stats().pending, 0);

        m.tick();
        assert_eq!(m.emitter(id).unwrap().particle_count(), 3);
    }

    #[test]
    fn test_added_emitter_waits_for_tick() {
        let mut m = manager(None);
        let definition = ParticleDefinition::from_json_str(SPARK).unwrap();
        let emitter = Emitter::with_seed(&definition, m.registry(), 5);
        let id = emitter.id();
        m.add(emitter);
        assert!(m.emitter(id).is_none());
        assert_eq!(m.stats().pending, 1);

        m.tick();
        assert!(m.emitter(id).is_some());
        assert_eq!(m.stats().pending, 0);
    }

    #[test]
    fn test_emitter_lifecycle_ends_in_removal() {
        let mut m = manager(Some(2));
        m.spawn("test:spark", 0.0, 0.0, 0.0).unwrap();
        for _ in 0..40 {
            m.tick();
        }
        assert!(m.is_empty());
        assert_eq!(m.tick_count(), 40);
    }

    #[test]
    fn test_render_collects_frames() {
        let mut m = manager(Some(3));
        m.spawn("spark", 0.0, 0.0, 0.0).unwrap();
        m.tick();
        let frames = m.render(0.5);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].particles.len(), 3);
    }

    #[test]
    fn test_clear_drops_live_and_pending() {
        let mut m = manager(None);
        m.spawn("spark", 0.0, 0.0, 0.0).unwrap();
        m.tick();
        let definition = ParticleDefinition::from_json_str(SPARK).unwrap();
        m.add(Emitter::with_seed(&definition, m.registry(), 9));
        m.clear();
        assert_eq!(m.stats(), EmitterStats { ticks: 1, ..EmitterStats::default() });
    }

    #[test]
    fn test_add_prebuilt_emitter() {
        let m = manager(None);
        let definition = ParticleDefinition::from_json_str(SPARK).unwrap();
        let emitter = Emitter::with_seed(&definition, m.registry(), 9);
        m.add(emitter);
        assert_eq!(m.spawn_queue().len(), 1);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let randoms = |seed| {
            let mut m = manager(Some(seed));
            let id = m.spawn("spark", 0.0, 0.0, 0.0).unwrap();
            m.tick();
            m.emitter(id)
                .unwrap()
                .particles()
                .iter()
                .map(|p| p.context().get("variable.particle_random_1"))
                .collect::<Vec<_>>()
        };
        assert_eq!(randoms(11), randoms(11));
        assert_ne!(randoms(11), randoms(12));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "unknown panic");
    }
}
