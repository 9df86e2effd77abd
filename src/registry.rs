//! Model Registry
//!
//! Deduplicated, insertion-ordered store of the models one generation run
//! discovers. The first registration under a name wins; later ones are
//! no-ops. Lives exactly as long as the run that owns it.

use indexmap::IndexMap;

use crate::ir::ModelDefinition;

/// The models discovered in a single run, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `model` unless a model with the same name exists.
    ///
    /// Returns whether the model was inserted.
    pub fn add_if_absent(&mut self, model: ModelDefinition) -> bool {
        if self.models.contains_key(&model.name) {
            return false;
        }
        self.models.insert(model.name.clone(), model);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }

    /// Snapshot sorted by name, ascending
    pub fn all(&self) -> Vec<&ModelDefinition> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }

    /// Consume the registry, yielding models sorted by name
    pub fn into_sorted(self) -> Vec<ModelDefinition> {
        let mut models: Vec<_> = self.models.into_values().collect();
        models.sort_by(|a, b| a.name.cmp(&b.name));
        models
    }
}
