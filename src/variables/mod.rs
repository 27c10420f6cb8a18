//! Variable data model and the in-memory set of loaded variables.

pub mod types;

pub use types::{
    EntityId, EntityKey, EntityMeta, Observation, Variable, VariableDisplaySettings, VariableId,
    VariableSource, VariableValue, VariablesResponse, Year,
};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Source of revisions; shared by every set in the process.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Every variable loaded so far, keyed by variable id, plus the shared entity key.
///
/// `revision` is replaced with a process-wide unique value on every merge,
/// so two sets with different contents never share a revision. An empty
/// set has revision 0.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    variables: HashMap<VariableId, Variable>,
    entity_key: EntityKey,
    revision: u64,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a variables response into the set.
    ///
    /// Entity ids are taken from the `entityKey` map keys. Variables that
    /// reference entities missing from the key are kept; those entities
    /// fall back to their numeric id as a label.
    pub fn receive(&mut self, response: VariablesResponse) {
        for (id, mut meta) in response.entity_key {
            meta.id = id;
            self.entity_key.insert(id, meta);
        }

        for (id, mut variable) in response.variables {
            variable.id = id;
            let missing = variable
                .entities_uniq()
                .into_iter()
                .filter(|e| !self.entity_key.contains_key(e))
                .count();
            if missing > 0 {
                warn!(variable_id = id, missing, "Variable references unknown entities");
            }
            debug!(
                variable_id = id,
                observations = variable.years.len(),
                "Variable received"
            );
            self.variables.insert(id, variable);
        }

        self.revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(&id)
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.variables.contains_key(&id)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn entity_key(&self) -> &EntityKey {
        &self.entity_key
    }

    /// Display name for an entity, falling back to its id.
    pub fn entity_name(&self, id: EntityId) -> String {
        entity_label(&self.entity_key, id)
    }

    /// Entity names, sorted.
    pub fn available_entities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entity_key.values().map(|e| e.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

pub(crate) fn entity_label(key: &EntityKey, id: EntityId) -> String {
    key.get(&id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}
