//! # snowstorm_particles - Bedrock-style particle simulation
//!
//! Runs particle effects described by Bedrock `particle_effect` JSON
//! definitions. A [`ParticleDefinition`] lists behaviour components by
//! identifier; an [`Emitter`] instantiates them from a [`ComponentRegistry`]
//! and advances its particles at a fixed timestep, while a
//! [`SimulationManager`] owns every emitter of a scene.
//!
//! Rendering is left to the host. After each tick the manager hands out one
//! [`EmitterFrame`] per emitter with the position, size, UV, color and
//! facing of every particle.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use snowstorm_particles::{
//!     ComponentRegistry, DefinitionLibrary, SimulationConfig, SimulationManager,
//! };
//!
//! let mut library = DefinitionLibrary::new();
//! library.load_str(r#"{
//!     "format_version": "1.10.0",
//!     "particle_effect": {
//!         "description": { "identifier": "demo:puff" },
//!         "components": {
//!             "minecraft:emitter_rate_instant": { "num_particles": 5 },
//!             "minecraft:particle_lifetime_expression": { "max_lifetime": 2 },
//!             "minecraft:particle_motion_dynamic": { "linear_acceleration": [0, 1, 0] }
//!         }
//!     }
//! }"#)?;
//!
//! let mut manager = SimulationManager::new(
//!     SimulationConfig::default(),
//!     Arc::new(ComponentRegistry::builtin()),
//!     Arc::new(library),
//! )?;
//! manager.spawn("demo:puff", 0.0, 64.0, 0.0);
//! manager.tick();
//!
//! let frames = manager.render(0.0);
//! assert_eq!(frames[0].particles.len(), 5);
//! # Ok::<(), snowstorm_particles::ParticleError>(())
//! ```

pub mod component;
pub mod config;
pub mod curve;
pub mod definition;
pub mod emitter;
pub mod error;
pub mod library;
pub mod manager;
pub mod particle;
pub mod render;
pub mod variables;

pub use component::{ComponentRegistry, ParticleComponent};
pub use config::SimulationConfig;
pub use curve::{Curve, CurveSet, CurveType};
pub use definition::{Material, ParticleDefinition};
pub use emitter::{Emitter, EmitterId, EmitterState, LocalSpace, TransformProvider};
pub use error::{ParticleError, Result};
pub use library::DefinitionLibrary;
pub use manager::{EmitterStats, SimulationManager, SpawnQueue};
pub use particle::Particle;
pub use render::{EmitterFrame, FacingCameraMode, ParticleSnapshot, UvRect};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
