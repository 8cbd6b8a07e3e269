//! Individual particle representation

use glam::{DVec3, Vec2, Vec4};
use snowstorm_molang::Context;

use crate::curve::CurveSet;
use crate::render::{FacingCameraMode, ParticleSnapshot, UvRect};
use crate::variables;

/// Billboard size of a particle no appearance component has sized.
pub const DEFAULT_SIZE: f32 = 0.25;

/// A single simulated particle.
///
/// Kinematic and render fields are public so components can drive them.
/// Age and death are owned by the particle: age only grows, and once a
/// particle is dead it stays dead.
#[derive(Debug, Clone)]
pub struct Particle {
    /// World-space position
    pub position: DVec3,
    /// Position at the start of the current tick, for render interpolation
    pub previous_position: DVec3,
    /// Units per second
    pub velocity: DVec3,
    /// Position the particle was created at
    pub spawn_position: DVec3,
    /// Total lifespan in seconds
    pub lifetime: f32,
    pub size: Vec2,
    pub uv: UvRect,
    pub facing: FacingCameraMode,
    /// Degrees
    pub rotation: f32,
    /// Degrees per second
    pub rotation_rate: f32,
    /// RGBA in `[0, 1]`
    pub color: Vec4,
    pub lighting: bool,
    age: f32,
    dead: bool,
    context: Context,
}

impl Particle {
    /// Creates a particle at `position` with its own context.
    ///
    /// Lifetime starts out random in `[1, 3)` seconds until a lifetime
    /// component overrides it.
    pub fn new(position: DVec3, mut context: Context) -> Self {
        let lifetime = 1.0 + context.random_f32() * 2.0;
        for name in variables::PARTICLE_RANDOM {
            let value = context.random_f32();
            context.set(name, value);
        }
        context.set(variables::PARTICLE_AGE, 0.0);
        context.set(variables::PARTICLE_LIFETIME, lifetime);

        let mut particle = Self {
            position,
            previous_position: position,
            velocity: DVec3::ZERO,
            spawn_position: position,
            lifetime,
            size: Vec2::splat(DEFAULT_SIZE),
            uv: UvRect::FULL,
            facing: FacingCameraMode::default(),
            rotation: 0.0,
            rotation_rate: 0.0,
            color: Vec4::ONE,
            lighting: false,
            age: 0.0,
            dead: false,
            context,
        };
        particle.publish_position();
        particle
    }

    /// Seconds since spawn
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Marks the particle for removal at the end of the current tick.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Age as a fraction of lifetime, clamped to `[0, 1]`.
    #[inline]
    pub fn age_percent(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Replaces the lifetime and republishes it to the context.
    pub fn set_lifetime(&mut self, lifetime: f32) {
        self.lifetime = lifetime;
        self.context.set(variables::PARTICLE_LIFETIME, lifetime);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Shifts current and previous position together, so interpolation does
    /// not smear the move.
    pub fn translate(&mut self, delta: DVec3) {
        self.position += delta;
        self.previous_position += delta;
    }

    /// Advances the particle's own state by `dt` seconds.
    ///
    /// Stores the previous position, ages the particle and kills it once its
    /// lifetime is reached. A surviving particle then evaluates `curves` into
    /// its context and integrates rotation. Motion is left to components.
    pub fn update(&mut self, dt: f32, curves: &CurveSet) {
        if self.dead {
            return;
        }

        self.previous_position = self.position;
        self.age += dt;
        self.context.set(variables::PARTICLE_AGE, self.age);
        self.context.set(variables::PARTICLE_LIFETIME, self.lifetime);

        if self.age >= self.lifetime {
            self.dead = true;
            return;
        }

        curves.apply(&mut self.context);
        self.rotation += self.rotation_rate * dt;
        self.publish_position();
    }

    /// Writes position and rotation into the context.
    pub fn publish_position(&mut self) {
        self.context.set(variables::PARTICLE_X, self.position.x as f32);
        self.context.set(variables::PARTICLE_Y, self.position.y as f32);
        self.context.set(variables::PARTICLE_Z, self.position.z as f32);
        self.context.set(variables::PARTICLE_ROTATION, self.rotation);
    }

    pub fn snapshot(&self) -> ParticleSnapshot {
        ParticleSnapshot {
            previous_position: self.previous_position,
            position: self.position,
            size: self.size,
            uv: self.uv,
            rotation: self.rotation,
            color: self.color,
            facing: self.facing,
            lighting: self.lighting,
        }
    }
}
