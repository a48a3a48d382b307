//! Rebind event detection
//!
//! The host hands every unit of top-level code to the session before it
//! runs. For each plain `name = expression` whose name is already bound,
//! the detector inspects the old value while it is still observable and
//! cleans up after it:
//!
//! - the active document itself: every entity goes, and so does the name
//! - an entity of the active document: the entity and whatever existed only
//!   to support it go, and stray names pointing at them are cleared
//!
//! Attribute, subscript and destructuring targets are left alone.

use crate::error::{GraphError, Result};
use crate::graph::{Document, DocumentId};
use crate::refactor::{ReferenceScrubber, SafeDeleter};
use crate::report::RebindReport;
use crate::session::{Binding, EntityRef, Namespace, Session};
use tracing::{debug, info};

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignTarget {
    /// `name = ...`
    Name(String),
    /// `object.attribute = ...`
    Attribute { object: String, attribute: String },
    /// `object[...] = ...`
    Subscript { object: String },
    /// `a, b = ...`
    Destructure(Vec<String>),
}

/// Assignments found in a unit of code about to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeUnit {
    pub targets: Vec<AssignTarget>,
}

impl CodeUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit made of a single `name = ...` assignment
    pub fn assignment(name: impl Into<String>) -> Self {
        Self::new().with_target(AssignTarget::Name(name.into()))
    }

    pub fn with_target(mut self, target: AssignTarget) -> Self {
        self.targets.push(target);
        self
    }

    /// Names assigned by plain `name = ...` statements, in source order
    pub fn simple_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(|target| match target {
            AssignTarget::Name(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

/// Reacts to names being rebound; installed once per session
#[derive(Debug, Clone, Copy)]
pub struct RebindDetector {
    _sealed: (),
}

impl RebindDetector {
    pub(crate) fn new() -> Self {
        Self { _sealed: () }
    }

    /// Handle every plain assignment of `unit` before it executes
    pub fn on_compile<D, N>(
        self,
        session: &mut Session<D>,
        namespace: &mut N,
        unit: &CodeUnit,
    ) -> Result<Vec<RebindReport>>
    where
        D: Document,
        N: Namespace + ?Sized,
    {
        let mut reports = Vec::new();
        for name in unit.simple_names() {
            if let Some(report) = self.on_rebind(session, namespace, name)? {
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Handle `name` being about to receive a new value
    pub fn on_rebind<D, N>(
        self,
        session: &mut Session<D>,
        namespace: &mut N,
        name: &str,
    ) -> Result<Option<RebindReport>>
    where
        D: Document,
        N: Namespace + ?Sized,
    {
        if !session.is_live() {
            return Ok(None);
        }
        let Some(old) = namespace.get(name).cloned() else {
            return Ok(None);
        };

        match old {
            Binding::Document(document) => {
                self.replace_document(session, namespace, name, document)
            }
            Binding::Entity(entity) => self.collect_entity(session, namespace, name, entity),
            Binding::Empty | Binding::Value(_) => Ok(None),
        }
    }

    fn replace_document<D, N>(
        self,
        session: &mut Session<D>,
        namespace: &mut N,
        name: &str,
        document_id: DocumentId,
    ) -> Result<Option<RebindReport>>
    where
        D: Document,
        N: Namespace + ?Sized,
    {
        let document = session.document()?;
        if document.id() != document_id {
            debug!("Variable \"{}\" holds an inactive document, skipping", name);
            return Ok(None);
        }

        let entities = document.ids();
        let count = entities.len();

        {
            let _pause = session.suspend();
            ReferenceScrubber::scrub_document(namespace, document_id);
            SafeDeleter::purge(session.document_mut()?, entities);
            namespace.bind(name, Binding::Empty);
        }

        info!(
            "Variable \"{}\" released document {} ({} entities)",
            name, document_id, count
        );
        Ok(Some(RebindReport::DocumentOverwritten {
            variable: name.to_string(),
            document: document_id,
            entities: count,
        }))
    }

    fn collect_entity<D, N>(
        self,
        session: &mut Session<D>,
        namespace: &mut N,
        name: &str,
        entity: EntityRef,
    ) -> Result<Option<RebindReport>>
    where
        D: Document,
        N: Namespace + ?Sized,
    {
        let document = session.document()?;
        if document.id() != entity.document {
            debug!(
                "Variable \"{}\" holds {} of an inactive document, skipping",
                name, entity.id
            );
            return Ok(None);
        }

        let analyzer = session.analyzer();
        let plan = match analyzer.plan(document, entity.id, session.extra_roots()) {
            Ok(plan) => plan,
            Err(GraphError::StaleEntity(id)) => {
                debug!("Variable \"{}\" holds stale entity {}, skipping", name, id);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        let kind = document.by_id(entity.id)?.kind.clone();

        let outcome = {
            let _pause = session.suspend();
            ReferenceScrubber::scrub(namespace, entity.document, &plan.to_delete);
            SafeDeleter::apply(session.document_mut()?, &plan)
        };

        info!(
            "Variable \"{}\" released {}/{} and {} dependents",
            name,
            entity.id,
            kind,
            plan.dependents()
        );
        Ok(Some(RebindReport::EntityOverwritten {
            variable: name.to_string(),
            root: entity.id,
            kind,
            dependents: plan.dependents(),
            kept: outcome.kept.len(),
        }))
    }
}
