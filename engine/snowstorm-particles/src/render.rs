//! Per-particle render attributes handed to an external renderer.

use glam::{DVec3, Vec2, Vec4};
use serde::Serialize;

use crate::definition::Material;
use crate::emitter::EmitterId;

/// How a billboard quad is oriented relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingCameraMode {
    #[default]
    RotateXyz,
    RotateY,
    LookatXyz,
    LookatY,
    LookatDirection,
    DirectionX,
    DirectionY,
    DirectionZ,
    EmitterTransformXy,
    EmitterTransformXz,
    EmitterTransformYz,
}

impl FacingCameraMode {
    /// Parses a `facing_camera_mode` value, case-insensitively.
    ///
    /// Unknown modes fall back to [`FacingCameraMode::RotateXyz`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "rotate_y" => Self::RotateY,
            "lookat_xyz" => Self::LookatXyz,
            "lookat_y" => Self::LookatY,
            "lookat_direction" => Self::LookatDirection,
            "direction_x" => Self::DirectionX,
            "direction_y" => Self::DirectionY,
            "direction_z" => Self::DirectionZ,
            "emitter_transform_xy" => Self::EmitterTransformXy,
            "emitter_transform_xz" => Self::EmitterTransformXz,
            "emitter_transform_yz" => Self::EmitterTransformYz,
            _ => Self::RotateXyz,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RotateXyz => "rotate_xyz",
            Self::RotateY => "rotate_y",
            Self::LookatXyz => "lookat_xyz",
            Self::LookatY => "lookat_y",
            Self::LookatDirection => "lookat_direction",
            Self::DirectionX => "direction_x",
            Self::DirectionY => "direction_y",
            Self::DirectionZ => "direction_z",
            Self::EmitterTransformXy => "emitter_transform_xy",
            Self::EmitterTransformXz => "emitter_transform_xz",
            Self::EmitterTransformYz => "emitter_transform_yz",
        }
    }
}

/// Normalized texture rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl UvRect {
    /// The whole texture.
    pub const FULL: Self = Self {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    /// Converts a pixel rectangle to normalized coordinates.
    ///
    /// Zero texture dimensions are treated as 1 so the result stays finite.
    pub fn from_pixels(origin: Vec2, size: Vec2, texture: Vec2) -> Self {
        let texture = texture.max(Vec2::ONE);
        let start = origin / texture;
        let end = (origin + size) / texture;
        Self {
            u0: start.x,
            v0: start.y,
            u1: end.x,
            v1: end.y,
        }
    }
}

/// Render state of one particle at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleSnapshot {
    pub previous_position: DVec3,
    pub position: DVec3,
    pub size: Vec2,
    pub uv: UvRect,
    /// Degrees
    pub rotation: f32,
    /// RGBA in `[0, 1]`
    pub color: Vec4,
    pub facing: FacingCameraMode,
    pub lighting: bool,
}

impl ParticleSnapshot {
    /// Position blended between the last two ticks, `frac` in `[0, 1]`.
    pub fn interpolated_position(&self, frac: f64) -> DVec3 {
        self.previous_position.lerp(self.position, frac)
    }
}

/// Everything a renderer needs to draw one emitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitterFrame {
    pub id: EmitterId,
    pub identifier: String,
    pub material: Material,
    pub texture: String,
    pub particles: Vec<ParticleSnapshot>,
}
