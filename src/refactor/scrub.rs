// Reference scrubber - clears variables that would outlive their entity

use crate::graph::{DocumentId, EntityId};
use crate::session::{Binding, Namespace};
use std::collections::HashSet;
use tracing::debug;

/// Rebinds names pointing at doomed entities to [`Binding::Empty`]
pub struct ReferenceScrubber;

impl ReferenceScrubber {
    /// Clear every binding that refers to one of `doomed` in `document`.
    /// Returns the names that were cleared.
    pub fn scrub<N: Namespace + ?Sized>(
        namespace: &mut N,
        document: DocumentId,
        doomed: &HashSet<EntityId>,
    ) -> Vec<String> {
        let mut cleared = Vec::new();
        for name in namespace.names() {
            let hit = namespace
                .get(&name)
                .and_then(Binding::as_entity)
                .is_some_and(|entity| entity.document == document && doomed.contains(&entity.id));
            if hit {
                namespace.bind(&name, Binding::Empty);
                cleared.push(name);
            }
        }

        if !cleared.is_empty() {
            debug!("Cleared {} stale variables: {}", cleared.len(), cleared.join(", "));
        }
        cleared
    }

    /// Clear every entity binding that belongs to `document`
    pub fn scrub_document<N: Namespace + ?Sized>(namespace: &mut N, document: DocumentId) -> Vec<String> {
        let mut cleared = Vec::new();
        for name in namespace.names() {
            let hit = namespace
                .get(&name)
                .and_then(Binding::as_entity)
                .is_some_and(|entity| entity.document == document);
            if hit {
                namespace.bind(&name, Binding::Empty);
                cleared.push(name);
            }
        }
        cleared
    }
}
