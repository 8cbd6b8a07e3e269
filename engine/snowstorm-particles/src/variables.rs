//! Molang variable names published by the engine.

pub const EMITTER_AGE: &str = "variable.emitter_age";
pub const EMITTER_LIFETIME: &str = "variable.emitter_lifetime";
pub const EMITTER_RANDOM: [&str; 4] = [
    "variable.emitter_random_1",
    "variable.emitter_random_2",
    "variable.emitter_random_3",
    "variable.emitter_random_4",
];

pub const PARTICLE_AGE: &str = "variable.particle_age";
pub const PARTICLE_LIFETIME: &str = "variable.particle_lifetime";
pub const PARTICLE_RANDOM: [&str; 4] = [
    "variable.particle_random_1",
    "variable.particle_random_2",
    "variable.particle_random_3",
    "variable.particle_random_4",
];
pub const PARTICLE_X: &str = "variable.particle_x";
pub const PARTICLE_Y: &str = "variable.particle_y";
pub const PARTICLE_Z: &str = "variable.particle_z";
pub const PARTICLE_ROTATION: &str = "variable.particle_rotation";

/// Spawn position, recorded by parametric motion.
pub const SPAWN_X: &str = "variable.spawn_x";
pub const SPAWN_Y: &str = "variable.spawn_y";
pub const SPAWN_Z: &str = "variable.spawn_z";

/// Set to 1 once a particle has touched the ground plane.
pub const HAS_COLLISION: &str = "variable.has_collision";

pub const ENTITY_AABB_MIN: [&str; 3] = [
    "variable.entity_aabb_min_x",
    "variable.entity_aabb_min_y",
    "variable.entity_aabb_min_z",
];
pub const ENTITY_AABB_MAX: [&str; 3] = [
    "variable.entity_aabb_max_x",
    "variable.entity_aabb_max_y",
    "variable.entity_aabb_max_z",
];
