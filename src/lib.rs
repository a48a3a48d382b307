//! graphreap - Reachability-based cleanup for live-edited entity graphs
//!
//! When a variable that held an entity is rebound, the entity and everything
//! it alone kept alive is deleted from the active document. When a variable
//! that held the whole document is rebound, every entity goes away.
//!
//! # Architecture
//!
//! The pipeline for a single code unit:
//! 1. **Observation** - The host reports the names a unit is about to assign
//! 2. **Detection** - [`RebindDetector`] looks up what each name held
//! 3. **Reachability Analysis** - [`ReachabilityAnalyzer`] finds the entities
//!    supported only by the old value
//! 4. **Scrubbing** - [`ReferenceScrubber`] clears names that would dangle
//! 5. **Deletion** - [`SafeDeleter`] removes the plan from the document
//! 6. **Reporting** - A [`RebindReport`] summarizes what happened

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod hook;
pub mod refactor;
pub mod report;
pub mod session;
pub mod shell;

pub use analysis::{DeletionPlan, ExtraRootPolicy, IgnoreRules, ReachabilityAnalyzer};
pub use config::Config;
pub use error::{GraphError, ReapError, Result};
pub use graph::{Document, DocumentId, Entity, EntityId, KindSchema, Model, Traversal};
pub use hook::{AssignTarget, CodeUnit, RebindDetector};
pub use refactor::{DeletionOutcome, ReferenceScrubber, SafeDeleter};
pub use report::{RebindReport, Reporter};
pub use session::{ActivationOptions, Binding, EntityRef, Namespace, Scope, Session};
pub use shell::{Output, Shell};
