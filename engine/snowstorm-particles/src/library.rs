//! Loaded definitions, addressable by identifier or alias.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::definition::ParticleDefinition;
use crate::error::Result;

/// Identifier to definition map that spawn requests are resolved against.
///
/// Besides the identifier declared in the file, a definition may be reachable
/// through any number of aliases (typically a resource path or file stem).
#[derive(Debug, Clone, Default)]
pub struct DefinitionLibrary {
    definitions: HashMap<String, Arc<ParticleDefinition>>,
    aliases: HashMap<String, String>,
}

impl DefinitionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition under its identifier, replacing any previous one.
    pub fn insert(&mut self, definition: ParticleDefinition) -> Arc<ParticleDefinition> {
        let identifier = definition.identifier().to_owned();
        let definition = Arc::new(definition);
        if self
            .definitions
            .insert(identifier.clone(), Arc::clone(&definition))
            .is_some()
        {
            log::debug!("Replaced particle definition {identifier}");
        }
        definition
    }

    /// Makes `alias` resolve to the definition registered as `identifier`.
    ///
    /// Returns false if no such definition is loaded.
    pub fn alias(&mut self, alias: impl Into<String>, identifier: &str) -> bool {
        if !self.definitions.contains_key(identifier) {
            return false;
        }
        self.aliases.insert(alias.into(), identifier.to_owned());
        true
    }

    /// Decodes and inserts a definition from JSON text.
    pub fn load_str(&mut self, json: &str) -> Result<Arc<ParticleDefinition>> {
        Ok(self.insert(ParticleDefinition::from_json_str(json)?))
    }

    /// Loads a definition file and aliases it by its file stem.
    ///
    /// `snow.particle.json` is reachable as both its identifier and `snow`.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<Arc<ParticleDefinition>> {
        let path = path.as_ref();
        let definition = self.insert(ParticleDefinition::from_path(path)?);
        if let Some(stem) = file_alias(path) {
            self.alias(stem, definition.identifier());
        }
        Ok(definition)
    }

    /// Resolves an identifier or alias.
    pub fn get(&self, name: &str) -> Option<Arc<ParticleDefinition>> {
        self.definitions
            .get(name)
            .or_else(|| {
                self.aliases
                    .get(name)
                    .and_then(|identifier| self.definitions.get(identifier))
            })
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Identifiers of all loaded definitions, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn clear(&mut self) {
        self.definitions.clear();
        self.aliases.clear();
    }
}

fn file_alias(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_suffix(".particle.json")
        .or_else(|| name.strip_suffix(".json"))?;
    (!stem.is_empty()).then(|| stem.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(identifier: &str) -> String {
        format!(r#"{{"particle_effect": {{"description": {{"identifier": "{identifier}"}}}}}}"#)
    }

    #[test]
    fn test_lookup_by_identifier_and_alias() {
        let mut library = DefinitionLibrary::new();
        library.load_str(&definition("demo:smoke")).unwrap();
        assert!(library.alias("smoke", "demo:smoke"));
        assert!(!library.alias("fire", "demo:fire"));

        assert!(library.get("demo:smoke").is_some());
        assert!(library.get("smoke").is_some());
        assert!(library.get("fire").is_none());
    }

    #[test]
    fn test_reinsert_replaces() {
        let mut library = DefinitionLibrary::new();
        library.load_str(&definition("demo:a")).unwrap();
        library.load_str(&definition("demo:a")).unwrap();
        library.load_str(&definition("demo:b")).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.identifiers(), vec!["demo:a", "demo:b"]);
    }

    #[test]
    fn test_load_path_aliases_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rain.particle.json");
        std::fs::write(&path, definition("demo:rain")).unwrap();

        let mut library = DefinitionLibrary::new();
        library.load_path(&path).unwrap();
        assert!(library.contains("rain"));
        assert!(library.contains("demo:rain"));
    }

    #[test]
    fn test_file_alias() {
        assert_eq!(file_alias(Path::new("a/b/snow.particle.json")).as_deref(), Some("snow"));
        assert_eq!(file_alias(Path::new("fire.json")).as_deref(), Some("fire"));
        assert_eq!(file_alias(Path::new("notes.txt")), None);
    }
}
