//! In-memory building-model document backed by a petgraph `StableDiGraph`
//!
//! Node indices stay valid across removals, which keeps the id → node
//! index map cheap to maintain while entities are deleted one at a time.
//! Edge weights record the attribute slot of a reference so traversals
//! follow references in the order they were declared.

use super::{Document, DocumentId, Entity, EntityId, KindSchema, Traversal};
use crate::error::GraphError;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Mutable entity graph
#[derive(Debug)]
pub struct Model {
    id: DocumentId,
    graph: StableDiGraph<Entity, usize>,
    index: HashMap<EntityId, NodeIndex>,
    /// Last id handed out; ids are never reused
    last_id: u64,
    schema: KindSchema,
}

/// On-disk form of a document
#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    entities: Vec<EntityRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntityRecord {
    id: EntityId,
    kind: String,
    #[serde(default)]
    references: Vec<EntityId>,
}

impl Model {
    pub fn new() -> Self {
        Self::with_schema(KindSchema::building())
    }

    pub fn with_schema(schema: KindSchema) -> Self {
        Self {
            id: DocumentId::next(),
            graph: StableDiGraph::new(),
            index: HashMap::new(),
            last_id: 0,
            schema,
        }
    }

    /// Rebuild a document from its serialized form
    pub fn from_json(bytes: &[u8], schema: KindSchema) -> Result<Self, GraphError> {
        let file: ModelFile = serde_json::from_slice(bytes)?;
        let mut model = Self::with_schema(schema);

        // Nodes first so forward references resolve
        for record in &file.entities {
            if record.id.is_null() {
                return Err(GraphError::StaleEntity(record.id));
            }
            // `u64::MAX` is never handed out, see `create`
            if record.id.0 == u64::MAX {
                return Err(GraphError::IdOutOfRange(record.id));
            }
            if model.index.contains_key(&record.id) {
                return Err(GraphError::DuplicateEntity(record.id));
            }
            model.insert_node(record.id, record.kind.clone());
        }
        for record in &file.entities {
            model.set_references(record.id, &record.references)?;
        }

        debug!(
            "Loaded document {} with {} entities",
            model.id,
            model.len()
        );
        Ok(model)
    }

    pub fn schema(&self) -> &KindSchema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut KindSchema {
        &mut self.schema
    }

    /// Add a new entity referencing `references` and return its id
    pub fn create(
        &mut self,
        kind: impl Into<String>,
        references: &[EntityId],
    ) -> Result<EntityId, GraphError> {
        let id = self
            .last_id
            .checked_add(1)
            .filter(|next| *next != u64::MAX)
            .map(EntityId)
            .ok_or(GraphError::IdsExhausted)?;
        self.check_targets(id, references)?;

        self.insert_node(id, kind.into());
        self.link(id, references);
        Ok(id)
    }

    /// Replace the outbound references of an existing entity
    pub fn set_references(
        &mut self,
        id: EntityId,
        references: &[EntityId],
    ) -> Result<(), GraphError> {
        let node = self.node(id)?;
        self.check_targets(id, references)?;

        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        for edge in outgoing {
            self.graph.remove_edge(edge);
        }
        self.link(id, references);
        Ok(())
    }

    /// All live entities ordered by id
    pub fn entities(&self) -> Vec<&Entity> {
        let mut entities: Vec<_> = self
            .index
            .values()
            .filter_map(|node| self.graph.node_weight(*node))
            .collect();
        entities.sort_by_key(|entity| entity.id);
        entities
    }

    fn insert_node(&mut self, id: EntityId, kind: String) {
        let node = self.graph.add_node(Entity { id, kind });
        self.index.insert(id, node);
        self.last_id = self.last_id.max(id.0);
    }

    fn link(&mut self, id: EntityId, references: &[EntityId]) {
        let Some(&source) = self.index.get(&id) else {
            return;
        };
        for (slot, target) in references.iter().enumerate() {
            if let Some(&target) = self.index.get(target) {
                self.graph.add_edge(source, target, slot);
            }
        }
    }

    fn check_targets(&self, source: EntityId, references: &[EntityId]) -> Result<(), GraphError> {
        match references
            .iter()
            .find(|target| **target != source && !self.index.contains_key(target))
        {
            Some(&target) => Err(GraphError::DanglingReference {
                source_id: source,
                target,
            }),
            None => Ok(()),
        }
    }

    fn node(&self, id: EntityId) -> Result<NodeIndex, GraphError> {
        self.index
            .get(&id)
            .copied()
            .ok_or(GraphError::StaleEntity(id))
    }

    fn drop_node(&mut self, id: EntityId, node: NodeIndex) {
        self.graph.remove_node(node);
        self.index.remove(&id);
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for Model {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn by_id(&self, id: EntityId) -> Result<&Entity, GraphError> {
        self.node(id)
            .and_then(|node| self.graph.node_weight(node).ok_or(GraphError::StaleEntity(id)))
    }

    fn references(&self, id: EntityId) -> Vec<EntityId> {
        let Ok(node) = self.node(id) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        edges.sort_by_key(|(slot, _)| *slot);

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .filter_map(|(_, target)| self.graph.node_weight(target).map(|e| e.id))
            .filter(|target| seen.insert(*target))
            .collect()
    }

    fn traverse(&self, root: EntityId, traversal: Traversal) -> Vec<EntityId> {
        if !self.contains(root) {
            return Vec::new();
        }

        let exhausted = |depth: usize| traversal.max_depth.is_some_and(|max| depth >= max);
        let mut order = Vec::new();

        if traversal.breadth_first {
            let mut seen = HashSet::from([root]);
            let mut queue = VecDeque::from([(root, 0usize)]);
            while let Some((id, depth)) = queue.pop_front() {
                order.push(id);
                if exhausted(depth) {
                    continue;
                }
                for next in self.references(id) {
                    if seen.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        } else {
            let mut seen = HashSet::new();
            let mut stack = vec![(root, 0usize)];
            while let Some((id, depth)) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                order.push(id);
                if exhausted(depth) {
                    continue;
                }
                for next in self.references(id).into_iter().rev() {
                    if !seen.contains(&next) {
                        stack.push((next, depth + 1));
                    }
                }
            }
        }

        order
    }

    fn inverse(&self, id: EntityId) -> HashSet<EntityId> {
        let Ok(node) = self.node(id) else {
            return HashSet::new();
        };
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .filter_map(|source| self.graph.node_weight(source).map(|e| e.id))
            .collect()
    }

    fn is_a(&self, id: EntityId, kind: &str) -> bool {
        self.by_id(id)
            .map(|entity| self.schema.is_a(&entity.kind, kind))
            .unwrap_or(false)
    }

    fn remove(&mut self, id: EntityId) -> Result<(), GraphError> {
        let node = self.node(id)?;
        let referrers = self.inverse(id).into_iter().filter(|r| *r != id).count();
        if referrers > 0 {
            let kind = self.by_id(id)?.kind.clone();
            return Err(GraphError::StillReferenced {
                id,
                kind,
                referrers,
            });
        }
        self.drop_node(id, node);
        Ok(())
    }

    fn purge(&mut self, id: EntityId) -> Result<(), GraphError> {
        let node = self.node(id)?;
        self.drop_node(id, node);
        Ok(())
    }

    fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.index.keys().copied().collect();
        ids.sort();
        ids
    }

    fn max_id(&self) -> u64 {
        self.index.keys().map(|id| id.0).max().unwrap_or(0)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn serialize(&self) -> Result<Vec<u8>, GraphError> {
        let file = ModelFile {
            entities: self
                .entities()
                .into_iter()
                .map(|entity| EntityRecord {
                    id: entity.id,
                    kind: entity.kind.clone(),
                    references: self.references(entity.id),
                })
                .collect(),
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (Model, EntityId, EntityId, EntityId) {
        let mut model = Model::new();
        let c = model.create("CartesianPoint", &[]).unwrap();
        let b = model.create("Polyline", &[c]).unwrap();
        let a = model.create("Wall", &[b]).unwrap();
        (model, a, b, c)
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (mut model, a, _, c) = chain();
        assert_eq!(c, EntityId(1));
        assert_eq!(a, EntityId(3));

        model.remove(a).unwrap();
        let d = model.create("Slab", &[]).unwrap();
        assert_eq!(d, EntityId(4));
    }

    #[test]
    fn test_create_rejects_missing_targets() {
        let mut model = Model::new();
        let err = model.create("Wall", &[EntityId(9)]).unwrap_err();
        assert!(matches!(err, GraphError::DanglingReference { .. }));
        assert!(model.is_empty());
    }

    #[test]
    fn test_traverse_breadth_first() {
        let mut model = Model::new();
        let leaf = model.create("CartesianPoint", &[]).unwrap();
        let left = model.create("Direction", &[leaf]).unwrap();
        let right = model.create("Direction", &[]).unwrap();
        let root = model.create("Axis2Placement3D", &[left, right]).unwrap();

        assert_eq!(
            model.traverse(root, Traversal::breadth_first()),
            vec![root, left, right, leaf]
        );
        assert_eq!(
            model.traverse(root, Traversal::depth_first()),
            vec![root, left, leaf, right]
        );
        assert_eq!(
            model.traverse(root, Traversal::direct()),
            vec![root, left, right]
        );
    }

    #[test]
    fn test_traverse_visits_shared_entities_once() {
        let mut model = Model::new();
        let shared = model.create("CartesianPoint", &[]).unwrap();
        let root = model.create("Polyline", &[shared, shared]).unwrap();

        assert_eq!(model.traverse(root, Traversal::breadth_first()), vec![root, shared]);
        assert!(model.traverse(EntityId(42), Traversal::breadth_first()).is_empty());
    }

    #[test]
    fn test_remove_refuses_referenced_entity() {
        let (mut model, a, b, _) = chain();

        let err = model.remove(b).unwrap_err();
        assert!(matches!(err, GraphError::StillReferenced { referrers: 1, .. }));

        model.remove(a).unwrap();
        model.remove(b).unwrap();
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_purge_drops_edges() {
        let (mut model, a, b, _) = chain();
        model.purge(b).unwrap();

        assert!(model.references(a).is_empty());
        assert!(matches!(model.by_id(b), Err(GraphError::StaleEntity(_))));
    }

    #[test]
    fn test_max_id_tracks_live_entities() {
        let (mut model, a, _, _) = chain();
        assert_eq!(model.max_id(), 3);
        model.remove(a).unwrap();
        assert_eq!(model.max_id(), 2);
    }

    #[test]
    fn test_json_round_trip_keeps_ids() {
        let (model, a, b, _) = chain();
        let bytes = model.serialize().unwrap();

        let loaded = Model::from_json(&bytes, KindSchema::building()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.references(a), vec![b]);
        assert_ne!(loaded.id(), model.id());
    }

    #[test]
    fn test_from_json_rejects_ids_without_headroom() {
        let json = br#"{"entities":[{"id":18446744073709551615,"kind":"Wall"}]}"#;
        let err = Model::from_json(json, KindSchema::new()).unwrap_err();
        assert!(matches!(err, GraphError::IdOutOfRange(EntityId(u64::MAX))));

        // One below the limit still loads, but nothing more can be created
        let json = br#"{"entities":[{"id":18446744073709551614,"kind":"Wall"}]}"#;
        let mut model = Model::from_json(json, KindSchema::new()).unwrap();
        assert!(matches!(
            model.create("Slab", &[]),
            Err(GraphError::IdsExhausted)
        ));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_ids_lists_live_entities_only() {
        let json = br#"{"entities":[{"id":300000000,"kind":"Wall"},{"id":1,"kind":"Slab"},{"id":7,"kind":"Slab"}]}"#;
        let mut model = Model::from_json(json, KindSchema::new()).unwrap();
        model.purge(EntityId(7)).unwrap();
        assert_eq!(model.ids(), vec![EntityId(1), EntityId(300000000)]);
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = br#"{"entities":[{"id":1,"kind":"Wall"},{"id":1,"kind":"Slab"}]}"#;
        let err = Model::from_json(json, KindSchema::new()).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEntity(EntityId(1))));
    }
}
