//! Particle appearance components

use glam::{Vec2, Vec4};
use serde_json::Value;
use snowstorm_molang::{Context, Expr, parse_json};

use super::ParticleComponent;
use super::json::{Object, bool_or, expr_array, expr_or, f32_or};
use crate::error::Result;
use crate::particle::{DEFAULT_SIZE, Particle};
use crate::render::{FacingCameraMode, UvRect};

const DEFAULT_TEXTURE_SIZE: f32 = 16.0;

fn evaluate_pair(exprs: &[Expr; 2], ctx: &mut Context) -> Vec2 {
    Vec2::new(exprs[0].evaluate(ctx), exprs[1].evaluate(ctx))
}

/// Animated UV selection inside a billboard's `uv` block.
#[derive(Debug, Clone)]
struct Flipbook {
    base_uv: [Expr; 2],
    size_uv: [Expr; 2],
    step_uv: [Expr; 2],
    frames_per_second: Expr,
    max_frame: Expr,
    stretch_to_lifetime: bool,
    looping: bool,
}

impl Flipbook {
    fn from_config(obj: &Object) -> Self {
        let size_uv = expr_array(obj, "size_UV").unwrap_or([Expr::ONE, Expr::ONE]);
        let step_uv = expr_array(obj, "step_UV").unwrap_or_else(|| [size_uv[0].clone(), Expr::ZERO]);
        Self {
            base_uv: expr_array(obj, "base_UV").unwrap_or([Expr::ZERO, Expr::ZERO]),
            size_uv,
            step_uv,
            frames_per_second: expr_or(obj, "frames_per_second", 8.0),
            max_frame: expr_or(obj, "max_frame", 1.0),
            stretch_to_lifetime: bool_or(obj, "stretch_to_lifetime", false),
            looping: bool_or(obj, "loop", false),
        }
    }

    /// Index of the frame to show, always in `[0, max_frame)`.
    fn frame(&self, particle: &mut Particle) -> f32 {
        let age = particle.age();
        let lifetime = particle.lifetime;
        let ctx = particle.context_mut();
        let max = self.max_frame.evaluate(ctx).floor();
        if max.is_nan() || max < 1.0 {
            return 0.0;
        }

        let raw = if self.stretch_to_lifetime {
            let progress = if lifetime > 0.0 { age / lifetime } else { 1.0 };
            (progress * max).floor()
        } else {
            (age * self.frames_per_second.evaluate(ctx)).floor()
        };

        if self.looping {
            raw.rem_euclid(max)
        } else {
            raw.clamp(0.0, max - 1.0)
        }
    }

    fn uv(&self, particle: &mut Particle, texture: Vec2) -> UvRect {
        let frame = self.frame(particle);
        let ctx = particle.context_mut();
        let base = evaluate_pair(&self.base_uv, ctx);
        let size = evaluate_pair(&self.size_uv, ctx);
        let step = evaluate_pair(&self.step_uv, ctx);
        UvRect::from_pixels(base + step * frame, size, texture)
    }
}

/// `minecraft:particle_appearance_billboard`: quad size, facing and texture
/// coordinates. Size is re-evaluated every tick; the flipbook frame is
/// picked whenever a frame is rendered.
#[derive(Debug, Clone)]
pub struct BillboardAppearance {
    size: [Expr; 2],
    facing: FacingCameraMode,
    texture_size: Vec2,
    uv: Option<([Expr; 2], [Expr; 2])>,
    flipbook: Option<Flipbook>,
}

impl Default for BillboardAppearance {
    fn default() -> Self {
        Self {
            size: [Expr::Constant(DEFAULT_SIZE), Expr::Constant(DEFAULT_SIZE)],
            facing: FacingCameraMode::LookatXyz,
            texture_size: Vec2::splat(DEFAULT_TEXTURE_SIZE),
            uv: None,
            flipbook: None,
        }
    }
}

impl BillboardAppearance {
    fn resize(&self, particle: &mut Particle) {
        let size = evaluate_pair(&self.size, particle.context_mut());
        particle.size = size;
    }

    fn select_frame(&self, particle: &mut Particle) {
        if let Some(flipbook) = &self.flipbook {
            particle.uv = flipbook.uv(particle, self.texture_size);
        }
    }
}

impl ParticleComponent for BillboardAppearance {
    fn configure(&mut self, config: &Value) {
        let Some(obj) = config.as_object() else {
            return;
        };
        if let Some(size) = expr_array(obj, "size") {
            self.size = size;
        }
        if let Some(mode) = obj.get("facing_camera_mode").and_then(Value::as_str) {
            self.facing = FacingCameraMode::from_name(mode);
        }

        let Some(uv) = obj.get("uv").and_then(Value::as_object) else {
            return;
        };
        self.texture_size = Vec2::new(
            f32_or(uv, "texture_width", DEFAULT_TEXTURE_SIZE),
            f32_or(uv, "texture_height", DEFAULT_TEXTURE_SIZE),
        );
        if let (Some(origin), Some(size)) = (expr_array(uv, "uv"), expr_array(uv, "uv_size")) {
            self.uv = Some((origin, size));
        }
        self.flipbook = uv
            .get("flipbook")
            .and_then(Value::as_object)
            .map(Flipbook::from_config);
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        particle.facing = self.facing;
        if self.flipbook.is_none()
            && let Some((origin, size)) = &self.uv
        {
            let ctx = particle.context_mut();
            let origin = evaluate_pair(origin, ctx);
            let size = evaluate_pair(size, ctx);
            particle.uv = UvRect::from_pixels(origin, size, self.texture_size);
        }
        self.resize(particle);
        self.select_frame(particle);
        Ok(())
    }

    fn on_particle_tick(&mut self, particle: &mut Particle, _dt: f32) -> Result<()> {
        self.resize(particle);
        Ok(())
    }

    fn on_particle_render(&mut self, particle: &mut Particle, _frac: f32) {
        self.select_frame(particle);
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GradientStop {
    key: f32,
    color: Vec4,
}

#[derive(Debug, Clone, Default)]
enum Tint {
    #[default]
    Unset,
    /// `[r, g, b]` or `[r, g, b, a]` expressions in `[0, 1]`
    Channels([Expr; 4]),
    /// Stops sorted by key, sampled at the interpolant
    Gradient { interpolant: Expr, stops: Vec<GradientStop> },
}

/// Parses `#RRGGBB` or `#AARRGGBB`.
fn parse_hex_color(text: &str) -> Option<Vec4> {
    let hex = text.strip_prefix('#')?;
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map(|byte| f32::from(byte) / 255.0)
    };
    match hex.len() {
        6 => Some(Vec4::new(channel(0)?, channel(2)?, channel(4)?, 1.0)),
        8 => Some(Vec4::new(channel(2)?, channel(4)?, channel(6)?, channel(0)?)),
        _ => None,
    }
}

/// A gradient stop color: a hex string or a plain `[r, g, b, a]` array.
fn parse_stop_color(value: &Value) -> Option<Vec4> {
    match value {
        Value::String(text) => parse_hex_color(text),
        Value::Array(items) if items.len() >= 3 => {
            let channel = |i: usize, default: f32| {
                items
                    .get(i)
                    .and_then(Value::as_f64)
                    .map_or(default, |v| v as f32)
            };
            Some(Vec4::new(
                channel(0, 1.0),
                channel(1, 1.0),
                channel(2, 1.0),
                channel(3, 1.0),
            ))
        }
        _ => None,
    }
}

fn parse_gradient(value: Option<&Value>) -> Vec<GradientStop> {
    let mut stops: Vec<GradientStop> = match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, color)| {
                let key = key.trim().parse::<f32>().ok()?;
                Some(GradientStop {
                    key,
                    color: parse_stop_color(color)?,
                })
            })
            .collect(),
        Some(Value::Array(items)) => {
            let last = items.len().saturating_sub(1).max(1) as f32;
            items
                .iter()
                .enumerate()
                .filter_map(|(i, color)| {
                    Some(GradientStop {
                        key: i as f32 / last,
                        color: parse_stop_color(color)?,
                    })
                })
                .collect()
        }
        _ => Vec::new(),
    };
    stops.sort_by(|a, b| a.key.total_cmp(&b.key));
    stops
}

fn sample_gradient(stops: &[GradientStop], t: f32) -> Vec4 {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Vec4::ONE;
    };
    if t.is_nan() || t <= first.key {
        return first.color;
    }
    if t >= last.key {
        return last.color;
    }

    let upper = stops
        .iter()
        .position(|stop| stop.key >= t)
        .unwrap_or(stops.len() - 1)
        .max(1);
    let (lo, hi) = (&stops[upper - 1], &stops[upper]);
    let span = hi.key - lo.key;
    let blend = if span > 0.0 {
        ((t - lo.key) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    lo.color.lerp(hi.color, blend)
}

/// `minecraft:particle_appearance_tinting`
///
/// Gradients are sampled at spawn and again whenever a frame is rendered, as
/// are channel expressions that are not constant.
#[derive(Debug, Clone, Default)]
pub struct TintingAppearance {
    tint: Tint,
}

impl TintingAppearance {
    fn apply(&self, particle: &mut Particle) {
        match &self.tint {
            Tint::Unset => {}
            Tint::Channels(channels) => {
                let ctx = particle.context_mut();
                let color = Vec4::new(
                    channels[0].evaluate(ctx),
                    channels[1].evaluate(ctx),
                    channels[2].evaluate(ctx),
                    channels[3].evaluate(ctx),
                );
                particle.color = color;
            }
            Tint::Gradient { interpolant, stops } => {
                let t = interpolant.evaluate(particle.context_mut());
                particle.color = sample_gradient(stops, t);
            }
        }
    }

    fn is_dynamic(&self) -> bool {
        match &self.tint {
            Tint::Unset => false,
            Tint::Channels(channels) => channels.iter().any(|c| !c.is_constant()),
            Tint::Gradient { .. } => true,
        }
    }
}

impl ParticleComponent for TintingAppearance {
    fn configure(&mut self, config: &Value) {
        let Some(color) = config.as_object().and_then(|obj| obj.get("color")) else {
            return;
        };
        self.tint = match color {
            Value::Array(items) if items.len() >= 3 => Tint::Channels([
                parse_json(&items[0]),
                parse_json(&items[1]),
                parse_json(&items[2]),
                items.get(3).map_or(Expr::ONE, parse_json),
            ]),
            Value::String(text) => match parse_hex_color(text) {
                Some(c) => Tint::Channels(c.to_array().map(Expr::Constant)),
                None => {
                    log::debug!("Ignoring malformed tint color {text:?}");
                    Tint::Unset
                }
            },
            Value::Object(obj) => {
                let stops = parse_gradient(obj.get("gradient"));
                if stops.is_empty() {
                    Tint::Unset
                } else {
                    Tint::Gradient {
                        interpolant: expr_or(obj, "interpolant", 0.0),
                        stops,
                    }
                }
            }
            _ => Tint::Unset,
        };
    }

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        self.apply(particle);
        Ok(())
    }

    fn on_particle_render(&mut self, particle: &mut Particle, _frac: f32) {
        if self.is_dynamic() {
            self.apply(particle);
        }
    }
}

/// `minecraft:particle_appearance_lighting`: marks particles as lit by the
/// environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightingAppearance;

impl ParticleComponent for LightingAppearance {
    fn configure(&mut self, _config: &Value) {}

    fn on_particle_spawn(&mut self, particle: &mut Particle) -> Result<()> {
        particle.lighting = true;
        Ok(())
    }
}
