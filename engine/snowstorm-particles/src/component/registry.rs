use std::collections::HashMap;
use std::fmt;

use super::{
    BillboardAppearance, CollisionMotion, DynamicMotion, EmitterLifetimeExpression, InitialSpeed,
    InitialSpin, LifetimeLooping, LifetimeOnce, LightingAppearance, LocalSpaceComponent,
    ParametricMotion, ParticleComponent, ParticleLifetimeExpression, RateInstant, RateManual,
    RateSteady, ShapeBox, ShapeCustom, ShapeDisc, ShapeEntityAabb, ShapePoint, ShapeSphere,
    TintingAppearance,
};

/// Creates a fresh, unconfigured component.
pub type ComponentFactory = Box<dyn Fn() -> Box<dyn ParticleComponent> + Send + Sync>;

/// Maps component identifiers to constructors.
///
/// A registry is built once and handed to every emitter it should serve;
/// there is no process-wide instance.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("identifiers", &self.identifiers())
            .finish()
    }
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in `minecraft:` component.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_builtin();
        registry
    }

    /// Registers (or replaces) the constructor for `identifier`.
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ParticleComponent> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Box::new(factory));
    }

    /// Registers a component type through its [`Default`] implementation.
    pub fn register_default<C>(&mut self, identifier: impl Into<String>)
    where
        C: ParticleComponent + Default + 'static,
    {
        self.register(identifier, || Box::new(C::default()));
    }

    /// Creates an unconfigured component, or `None` for unknown identifiers.
    pub fn create(&self, identifier: &str) -> Option<Box<dyn ParticleComponent>> {
        self.factories.get(identifier).map(|factory| factory())
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn register_builtin(&mut self) {
        // Emitter rate
        self.register_default::<RateSteady>("minecraft:emitter_rate_steady");
        self.register_default::<RateInstant>("minecraft:emitter_rate_instant");
        self.register_default::<RateManual>("minecraft:emitter_rate_manual");

        // Emitter lifetime
        self.register_default::<LifetimeOnce>("minecraft:emitter_lifetime_once");
        self.register_default::<LifetimeLooping>("minecraft:emitter_lifetime_looping");
        self.register_default::<EmitterLifetimeExpression>("minecraft:emitter_lifetime_expression");
        self.register_default::<LocalSpaceComponent>("minecraft:emitter_local_space");

        // Emitter shape
        self.register_default::<ShapePoint>("minecraft:emitter_shape_point");
        self.register_default::<ShapeSphere>("minecraft:emitter_shape_sphere");
        self.register_default::<ShapeBox>("minecraft:emitter_shape_box");
        self.register_default::<ShapeDisc>("minecraft:emitter_shape_disc");
        self.register_default::<ShapeCustom>("minecraft:emitter_shape_custom");
        self.register_default::<ShapeEntityAabb>("minecraft:emitter_shape_entity_aabb");

        // Particle initial state and lifetime
        self.register_default::<ParticleLifetimeExpression>("minecraft:particle_lifetime_expression");
        self.register_default::<InitialSpeed>("minecraft:particle_initial_speed");
        self.register_default::<InitialSpin>("minecraft:particle_initial_spin");

        // Particle motion
        self.register_default::<DynamicMotion>("minecraft:particle_motion_dynamic");
        self.register_default::<ParametricMotion>("minecraft:particle_motion_parametric");
        self.register_default::<CollisionMotion>("minecraft:particle_motion_collision");

        // Particle appearance
        self.register_default::<BillboardAppearance>("minecraft:particle_appearance_billboard");
        self.register_default::<TintingAppearance>("minecraft:particle_appearance_tinting");
        self.register_default::<LightingAppearance>("minecraft:particle_appearance_lighting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct Marker;

    impl ParticleComponent for Marker {
        fn configure(&mut self, _config: &Value) {}
    }

    #[test]
    fn test_builtin_identifiers() {
        let registry = ComponentRegistry::builtin();
        assert_eq!(registry.len(), 22);
        assert!(registry.contains("minecraft:emitter_rate_steady"));
        assert!(registry.contains("minecraft:particle_appearance_lighting"));
        assert!(registry.create("minecraft:emitter_shape_disc").is_some());
    }

    #[test]
    fn test_unknown_identifier() {
        let registry = ComponentRegistry::builtin();
        assert!(registry.create("minecraft:particle_kill_plane").is_none());
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.is_empty());
        registry.register("demo:marker", || Box::new(Marker));
        assert!(registry.create("demo:marker").is_some());
        assert_eq!(registry.identifiers(), vec!["demo:marker"]);
    }
}
