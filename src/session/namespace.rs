//! Variable scopes observed by the rebind detector

use crate::graph::{DocumentId, EntityId};
use std::collections::BTreeMap;
use std::fmt;

/// Entity handle as held by a variable: the owning document plus the id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub document: DocumentId,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(document: DocumentId, id: EntityId) -> Self {
        Self { document, id }
    }
}

/// Value bound to a name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Binding {
    /// Absent value (`none`)
    #[default]
    Empty,
    /// A whole document
    Document(DocumentId),
    /// A single entity of a document
    Entity(EntityRef),
    /// Anything the collector does not care about
    Value(String),
}

impl Binding {
    pub fn as_entity(&self) -> Option<EntityRef> {
        match self {
            Binding::Entity(entity) => Some(*entity),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Binding::Empty)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Empty => write!(f, "none"),
            Binding::Document(id) => write!(f, "<document at {}>", id),
            Binding::Entity(entity) => write!(f, "{}", entity.id),
            Binding::Value(value) => write!(f, "{}", value),
        }
    }
}

/// Name to value mapping supplied by the host environment
pub trait Namespace {
    fn get(&self, name: &str) -> Option<&Binding>;

    /// Bound names in a stable order
    fn names(&self) -> Vec<String>;

    fn bind(&mut self, name: &str, value: Binding);

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Plain in-memory namespace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    bindings: BTreeMap<String, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Namespace for Scope {
    fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    fn names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }

    fn bind(&mut self, name: &str, value: Binding) {
        self.bindings.insert(name.to_string(), value);
    }
}
