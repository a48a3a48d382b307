//! Entity graph primitives
//!
//! The collection policy only talks to documents through the [`Document`]
//! trait. [`Model`] is the in-memory implementation used by the script host
//! and the tests.

mod model;
mod schema;

pub use model::Model;
pub use schema::KindSchema;

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of an entity inside one document
///
/// Ids are assigned monotonically starting at 1. Id 0 never names a live
/// entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    pub const NULL: EntityId = EntityId(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique handle of a document instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0x1000);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An addressable node of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: String,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.kind)
    }
}

/// How [`Document::traverse`] walks outbound references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    pub breadth_first: bool,
    /// `None` walks the full closure, `Some(1)` stops at direct references
    pub max_depth: Option<usize>,
}

impl Traversal {
    /// Unbounded breadth-first walk
    pub fn breadth_first() -> Self {
        Self {
            breadth_first: true,
            max_depth: None,
        }
    }

    /// Unbounded depth-first (pre-order) walk
    pub fn depth_first() -> Self {
        Self {
            breadth_first: false,
            max_depth: None,
        }
    }

    /// Root plus its direct references
    pub fn direct() -> Self {
        Self::breadth_first().with_max_depth(1)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

impl Default for Traversal {
    fn default() -> Self {
        Self::breadth_first()
    }
}

/// Storage contract the collection policy is layered on
pub trait Document {
    /// Handle used by namespace bindings to refer to this document
    fn id(&self) -> DocumentId;

    /// Resolve an id; invalid or removed ids yield [`GraphError::StaleEntity`]
    fn by_id(&self, id: EntityId) -> Result<&Entity, GraphError>;

    fn contains(&self, id: EntityId) -> bool {
        self.by_id(id).is_ok()
    }

    /// Outbound references of an entity, in attribute order and without duplicates
    fn references(&self, id: EntityId) -> Vec<EntityId>;

    /// Walk from `root` visiting every entity at most once; the root comes first.
    /// A stale root yields an empty walk.
    fn traverse(&self, root: EntityId, traversal: Traversal) -> Vec<EntityId>;

    /// Entities holding a reference to `id`
    fn inverse(&self, id: EntityId) -> HashSet<EntityId>;

    /// Subtype-aware kind test
    fn is_a(&self, id: EntityId, kind: &str) -> bool;

    /// Delete a single entity. Fails with [`GraphError::StillReferenced`]
    /// while any live entity references it.
    fn remove(&mut self, id: EntityId) -> Result<(), GraphError>;

    /// Delete an entity together with every reference touching it
    fn purge(&mut self, id: EntityId) -> Result<(), GraphError>;

    /// Ids of every live entity, ascending
    fn ids(&self) -> Vec<EntityId>;

    /// Highest id currently held by a live entity (0 when empty)
    fn max_id(&self) -> u64;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn serialize(&self) -> Result<Vec<u8>, GraphError>;
}
