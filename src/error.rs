//! Error types shared across the crate

use crate::graph::EntityId;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a [`Document`](crate::graph::Document)
#[derive(Debug, Error)]
pub enum GraphError {
    /// The id does not resolve to a live entity (never assigned, removed or invalidated)
    #[error("entity {0} does not exist in the document")]
    StaleEntity(EntityId),

    /// The entity still has inbound references from live entities
    #[error("entity {id}/{kind} is still referenced by {referrers} other entities")]
    StillReferenced {
        id: EntityId,
        kind: String,
        referrers: usize,
    },

    /// An entity would reference something that is not in the document
    #[error("entity {source_id} references missing entity {target}")]
    DanglingReference { source_id: EntityId, target: EntityId },

    /// A loaded id leaves no room for further ids
    #[error("entity id {0} is out of range")]
    IdOutOfRange(EntityId),

    /// Every id has been handed out
    #[error("no entity ids left in the document")]
    IdsExhausted,

    /// Two entities in one document claim the same id
    #[error("entity {0} is defined more than once")]
    DuplicateEntity(EntityId),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level error type for sessions, configuration and the script host
#[derive(Debug, Error, Diagnostic)]
pub enum ReapError {
    #[error("live editing needs a document but none was activated")]
    #[diagnostic(
        code(graphreap::misconfigured_session),
        help("activate the session with a document before rebinding entities")
    )]
    MisconfiguredSession,

    #[error(transparent)]
    #[diagnostic(code(graphreap::graph))]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    #[diagnostic(code(graphreap::io))]
    Io(#[from] std::io::Error),

    #[error("invalid configuration in {}: {}", .path.display(), .message)]
    #[diagnostic(code(graphreap::config))]
    Config { path: PathBuf, message: String },

    #[error("line {line}: {message}")]
    #[diagnostic(code(graphreap::script))]
    Script { line: usize, message: String },
}

impl ReapError {
    pub(crate) fn script(line: usize, message: impl Into<String>) -> Self {
        ReapError::Script {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T, E = ReapError> = std::result::Result<T, E>;
