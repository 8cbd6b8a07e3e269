use std::io;
use thiserror::Error;

/// Error types for definition loading and emitter simulation
#[derive(Error, Debug)]
pub enum ParticleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Definition is well-formed JSON but not a usable particle effect
    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    /// Simulation settings are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A component hook failed while an emitter was ticking
    #[error("Component {component} failed: {reason}")]
    ComponentFault { component: String, reason: String },

    /// An emitter tick panicked and was contained
    #[error("Emitter panicked: {0}")]
    EmitterPanicked(String),
}

impl ParticleError {
    /// Wraps a hook failure with the identifier of the component that raised it.
    pub fn component(component: &str, source: impl std::fmt::Display) -> Self {
        Self::ComponentFault {
            component: component.to_owned(),
            reason: source.to_string(),
        }
    }
}

/// Result type for particle operations
pub type Result<T> = std::result::Result<T, ParticleError>;
