//! Particle effect definition files.
//!
//! Definitions are decoded with serde. Component and curve bodies stay as raw
//! JSON so each component can interpret its own configuration when an emitter
//! is built.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ParticleError, Result};

/// Blend material requested by a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Material {
    /// Additive blending
    #[serde(rename = "particles_add")]
    Add,
    /// Alpha-tested, no blending
    #[serde(rename = "particles_alpha")]
    Alpha,
    /// Standard alpha blending
    #[default]
    #[serde(rename = "particles_blend")]
    Blend,
}

impl Material {
    /// Parses a material name. Unknown names fall back to [`Material::Blend`].
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "particles_add" => Self::Add,
            "particles_alpha" => Self::Alpha,
            _ => Self::Blend,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "particles_add",
            Self::Alpha => "particles_alpha",
            Self::Blend => "particles_blend",
        }
    }
}

impl From<String> for Material {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `basic_render_parameters` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderParameters {
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub texture: String,
}

/// `description` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub basic_render_parameters: RenderParameters,
}

/// `particle_effect` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleEffect {
    #[serde(default)]
    pub description: Description,
    /// Component identifier to raw configuration, in file order
    #[serde(default)]
    pub components: Map<String, Value>,
    /// Curve name to raw curve object, in file order
    #[serde(default)]
    pub curves: Map<String, Value>,
}

/// Root of a `.particle.json` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleDefinition {
    #[serde(default)]
    pub format_version: String,
    pub particle_effect: ParticleEffect,
}

impl ParticleDefinition {
    /// Decodes a definition from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Decodes a definition from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let definition: Self = serde_json::from_slice(bytes)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Decodes a definition from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let definition: Self = serde_json::from_reader(reader)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Reads and decodes a definition file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    fn validate(&self) -> Result<()> {
        if self.identifier().trim().is_empty() {
            return Err(ParticleError::InvalidDefinition(
                "particle_effect.description.identifier is missing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn identifier(&self) -> &str {
        &self.particle_effect.description.identifier
    }

    pub fn material(&self) -> Material {
        self.particle_effect
            .description
            .basic_render_parameters
            .material
    }

    pub fn texture(&self) -> &str {
        &self.particle_effect.description.basic_render_parameters.texture
    }

    /// Component identifiers and their raw configuration, in file order.
    pub fn components(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.particle_effect
            .components
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Curve names and their raw definitions, in file order.
    pub fn curves(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.particle_effect
            .curves
            .iter()
            .map(|(k, v)| (k.as_str(), v))
    }
}
