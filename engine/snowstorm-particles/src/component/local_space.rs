use serde_json::Value;

use super::ParticleComponent;
use super::json::bool_or;
use crate::emitter::{EmitterState, LocalSpace};
use crate::error::Result;

/// `minecraft:emitter_local_space`: which emitter motion particles inherit.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSpaceComponent {
    flags: LocalSpace,
}

impl ParticleComponent for LocalSpaceComponent {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        self.flags.set(LocalSpace::POSITION, bool_or(obj, "position", false));
        self.flags.set(LocalSpace::ROTATION, bool_or(obj, "rotation", false));
        self.flags.set(LocalSpace::VELOCITY, bool_or(obj, "velocity", false));
    }

    fn on_emitter_tick(&mut self, emitter: &mut EmitterState, _dt: f32) -> Result<()> {
        emitter.set_local_space(self.flags);
        Ok(())
    }
}
