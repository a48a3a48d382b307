// Reachability analyzer - finds the entities that exist only to support a root
//
// 1. Walk the full closure of the root (plus extra roots): the support boundary
// 2. Starting from the root's direct references, accept a candidate when every
//    inbound reference to it comes from inside the boundary
// 3. Accepted candidates extend the search through their own references

use super::{DeletionPlan, ExtraRootPolicy, IgnoreRules};
use crate::error::GraphError;
use crate::graph::{Document, EntityId, Traversal};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Computes deletion plans for rebound entities
#[derive(Debug, Clone, Default)]
pub struct ReachabilityAnalyzer {
    rules: IgnoreRules,
    extra_roots: ExtraRootPolicy,
}

impl ReachabilityAnalyzer {
    pub fn new(rules: IgnoreRules) -> Self {
        Self {
            rules,
            extra_roots: ExtraRootPolicy::default(),
        }
    }

    pub fn with_extra_root_policy(mut self, policy: ExtraRootPolicy) -> Self {
        self.extra_roots = policy;
        self
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Compute which entities go away with `root`
    ///
    /// `extra_roots` count as part of the support boundary, so references
    /// from them never keep a candidate alive.
    pub fn plan<D: Document + ?Sized>(
        &self,
        document: &D,
        root: EntityId,
        extra_roots: &[EntityId],
    ) -> Result<DeletionPlan, GraphError> {
        if root.is_null() || !document.contains(root) {
            return Err(GraphError::StaleEntity(root));
        }

        let mut subgraph = document.traverse(root, Traversal::breadth_first());
        subgraph.extend(extra_roots.iter().copied());
        let boundary: HashSet<EntityId> = subgraph.iter().copied().collect();

        let mut to_delete = HashSet::from([root]);
        let mut considered = HashSet::from([root]);
        let mut queue: VecDeque<EntityId> = document.references(root).into();

        while let Some(candidate) = queue.pop_front() {
            // Cycles lead back to entities that were already judged
            if !considered.insert(candidate) {
                continue;
            }
            if !self.is_collectible(document, candidate, &boundary, extra_roots) {
                continue;
            }

            to_delete.insert(candidate);
            queue.extend(document.references(candidate));
        }

        debug!(
            "Root {} supports {} of {} reachable entities",
            root,
            to_delete.len() - 1,
            boundary.len().saturating_sub(1)
        );

        Ok(DeletionPlan {
            root,
            to_delete,
            subgraph,
        })
    }

    fn is_collectible<D: Document + ?Sized>(
        &self,
        document: &D,
        candidate: EntityId,
        boundary: &HashSet<EntityId>,
        extra_roots: &[EntityId],
    ) -> bool {
        if candidate.is_null() || !document.contains(candidate) {
            return false;
        }
        if self.rules.protects(document, candidate) {
            return false;
        }
        if self.extra_roots == ExtraRootPolicy::Protected && extra_roots.contains(&candidate) {
            return false;
        }
        document
            .inverse(candidate)
            .iter()
            .all(|referrer| boundary.contains(referrer))
    }
}
