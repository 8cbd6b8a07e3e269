//! Definition discovery and loading

use anyhow::{Context, Result, bail};
use snowstorm_particles::{DefinitionLibrary, SimulationConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Lists the definition files under `path`.
///
/// A file is returned as-is. A directory is searched recursively for `*.json`,
/// in sorted order.
pub fn definition_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("No such file or directory: {}", path.display());
    }

    let pattern = path.join("**").join("*.json");
    let pattern = pattern
        .to_str()
        .with_context(|| format!("Path is not valid UTF-8: {}", path.display()))?;
    let mut paths = glob::glob(pattern)
        .with_context(|| format!("Invalid search pattern: {pattern}"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;
    paths.sort();
    Ok(paths)
}

/// Loads every definition under `path`.
///
/// When `path` is a directory, files that fail to decode are skipped with a
/// warning; a single file must decode.
pub fn load_library(path: &Path) -> Result<DefinitionLibrary> {
    let mut library = DefinitionLibrary::new();

    if path.is_file() {
        library
            .load_path(path)
            .with_context(|| format!("Failed to load particle definition: {}", path.display()))?;
        return Ok(library);
    }

    for file in definition_paths(path)? {
        match library.load_path(&file) {
            Ok(definition) => {
                log::debug!("Loaded {} from {}", definition.identifier(), file.display());
            }
            Err(e) => log::warn!("Skipping {}: {e}", file.display()),
        }
    }

    if library.is_empty() {
        bail!("No particle definitions found in {}", path.display());
    }
    Ok(library)
}

/// Reads a simulation config file, or returns the defaults.
pub fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    SimulationConfig::from_json_str(&json)
        .with_context(|| format!("Invalid simulation config: {}", path.display()))
}
