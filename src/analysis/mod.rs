// Analysis module - decides which entities a rebind leaves unsupported

mod reachability;

pub use reachability::ReachabilityAnalyzer;

use crate::graph::{Document, EntityId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kinds protected from collection unless configured otherwise
pub const DEFAULT_IGNORED_KINDS: [&str; 2] = ["StructuralContext", "RepresentationContext"];

/// Entities and kinds that are never collected
///
/// Contexts are conventionally shared by every product in a document, so
/// losing them would break unrelated entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRules {
    entities: HashSet<EntityId>,
    kinds: Vec<String>,
}

impl IgnoreRules {
    /// No protection at all
    pub fn none() -> Self {
        Self {
            entities: HashSet::new(),
            kinds: Vec::new(),
        }
    }

    pub fn new(
        entities: impl IntoIterator<Item = EntityId>,
        kinds: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            entities: entities.into_iter().collect(),
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_entity(mut self, id: EntityId) -> Self {
        self.entities.insert(id);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kinds.push(kind.into());
        self
    }

    pub fn entities(&self) -> &HashSet<EntityId> {
        &self.entities
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Whether `id` is exempt, either by identity or because its kind is-a protected kind
    pub fn protects<D: Document + ?Sized>(&self, document: &D, id: EntityId) -> bool {
        self.entities.contains(&id) || self.kinds.iter().any(|kind| document.is_a(id, kind))
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_IGNORED_KINDS)
    }
}

/// Whether extra roots handed to the analyzer may be collected themselves
///
/// Extra roots always widen the support boundary. With `Collectible` an
/// extra root that is reachable from the root and otherwise unsupported is
/// deleted like any other dependent; `Protected` never deletes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtraRootPolicy {
    #[default]
    Collectible,
    Protected,
}

/// Outcome of a reachability analysis for one rebind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Entity the variable was bound to
    pub root: EntityId,

    /// Entities to delete, always including the root
    pub to_delete: HashSet<EntityId>,

    /// Breadth-first discovery order of the support boundary, root first.
    /// Deleting in reverse removes dependents before their dependencies.
    pub subgraph: Vec<EntityId>,
}

impl DeletionPlan {
    /// Entities removed on top of the root itself
    pub fn dependents(&self) -> usize {
        self.to_delete.len().saturating_sub(1)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.to_delete.contains(&id)
    }

    /// Members of the deletion set in safe deletion order
    pub fn deletion_order(&self) -> impl Iterator<Item = EntityId> + '_ {
        let mut emitted = HashSet::new();
        self.subgraph
            .iter()
            .rev()
            .copied()
            .filter(move |id| self.to_delete.contains(id) && emitted.insert(*id))
    }
}
