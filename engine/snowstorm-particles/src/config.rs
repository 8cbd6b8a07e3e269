//! Simulation settings.

use serde::{Deserialize, Serialize};

use crate::error::{ParticleError, Result};

/// Fixed timestep of the host game loop (20 ticks per second).
pub const DEFAULT_TIMESTEP: f32 = 0.05;
/// Particle capacity of an emitter no component has limited.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Ticks between two statistics log lines.
pub const DEFAULT_STATS_INTERVAL: u64 = 20;

/// Settings for a [`SimulationManager`](crate::SimulationManager).
///
/// Every field is optional in JSON:
///
/// ```
/// use snowstorm_particles::SimulationConfig;
///
/// let config = SimulationConfig::from_json_str(r#"{ "seed": 7 }"#).unwrap();
/// assert_eq!(config.timestep, 0.05);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds advanced by every tick
    pub timestep: f32,
    /// Initial particle capacity of new emitters
    pub default_capacity: usize,
    /// Log statistics every N ticks; 0 disables
    pub stats_interval: u64,
    /// Seed for reproducible simulations; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timestep: DEFAULT_TIMESTEP,
            default_capacity: DEFAULT_CAPACITY,
            stats_interval: DEFAULT_STATS_INTERVAL,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ParticleError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                self.timestep
            )));
        }
        Ok(())
    }
}
