//! Shared utilities for the snowstorm CLI

pub mod io;
pub mod table;

pub use io::*;
pub use table::*;
