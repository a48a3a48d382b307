//! Safe deletion of planned entities
//!
//! Entities are removed in reverse discovery order so dependents go before
//! the entities they reference. A refusal from the document only affects
//! the entity concerned; the rest of the batch still runs.

use crate::analysis::DeletionPlan;
use crate::error::GraphError;
use crate::graph::{Document, Entity, EntityId};
use tracing::{debug, warn};

/// What a deletion batch actually did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub removed: Vec<EntityId>,
    /// Entities left in place because something still references them
    pub kept: Vec<Entity>,
    /// Ids that no longer resolved when their turn came
    pub stale: Vec<EntityId>,
}

impl DeletionOutcome {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.kept.is_empty()
    }
}

/// Applies deletion plans to a document
pub struct SafeDeleter;

impl SafeDeleter {
    /// Delete every planned entity
    ///
    /// The first pass walks the plan's deletion order. Entities refused
    /// while a pending member still references them are retried once that
    /// member is gone; whatever is still refused when a pass makes no
    /// progress stays in the document.
    pub fn apply<D: Document + ?Sized>(document: &mut D, plan: &DeletionPlan) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();
        let mut pending: Vec<EntityId> = plan.deletion_order().collect();

        loop {
            let attempted = pending.len();
            let mut deferred = Vec::new();

            for id in pending {
                if !document.contains(id) {
                    debug!("Entity {} vanished before deletion", id);
                    outcome.stale.push(id);
                    continue;
                }
                match document.remove(id) {
                    Ok(()) => outcome.removed.push(id),
                    Err(_) => deferred.push(id),
                }
            }

            pending = deferred;
            if pending.is_empty() || pending.len() == attempted {
                break;
            }
        }

        for id in pending {
            let Ok(entity) = document.by_id(id).cloned() else {
                outcome.stale.push(id);
                continue;
            };
            match document.remove(id) {
                Ok(()) => outcome.removed.push(id),
                Err(GraphError::StillReferenced { referrers, .. }) => {
                    warn!(
                        entity = %entity.id,
                        kind = %entity.kind,
                        referrers,
                        "Could not delete entity {}: still referenced",
                        entity
                    );
                    outcome.kept.push(entity);
                }
                Err(err) => {
                    warn!(
                        entity = %entity.id,
                        kind = %entity.kind,
                        "Could not delete entity {}: {}",
                        entity,
                        err
                    );
                    outcome.kept.push(entity);
                }
            }
        }

        debug!(
            "Deleted {} entities ({} kept, {} stale)",
            outcome.removed.len(),
            outcome.kept.len(),
            outcome.stale.len()
        );
        outcome
    }

    /// Drop entities regardless of references between them
    ///
    /// Used when a whole document is discarded, where no ordering can
    /// protect anything.
    pub fn purge<D: Document + ?Sized>(
        document: &mut D,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::default();
        for id in ids {
            match document.purge(id) {
                Ok(()) => outcome.removed.push(id),
                Err(_) => outcome.stale.push(id),
            }
        }
        outcome
    }
}
