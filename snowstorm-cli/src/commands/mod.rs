//! Command implementations

pub mod effect;
pub mod molang;
