//! Session state shared by the rebind detector and its host
//!
//! A [`Session`] owns the active document, the ignore lists, the live-editing
//! latch and the rebind detector. Activation may be repeated at will: the
//! detector is installed on the first call and later calls only replace the
//! configuration.

mod namespace;
mod suspend;

pub use namespace::{Binding, EntityRef, Namespace, Scope};
pub use suspend::{LiveSwitch, Suspension};

use crate::analysis::{ExtraRootPolicy, IgnoreRules, ReachabilityAnalyzer, DEFAULT_IGNORED_KINDS};
use crate::error::{ReapError, Result};
use crate::graph::{Document, EntityId, Model};
use crate::hook::{CodeUnit, RebindDetector};
use crate::report::RebindReport;
use std::path::Path;
use tracing::{debug, info};

/// Configuration applied by [`Session::activate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOptions {
    pub ignored_entities: Vec<EntityId>,
    pub ignored_kinds: Vec<String>,
    /// Entities that always count as part of a rebound entity's boundary
    pub extra_roots: Vec<EntityId>,
    pub extra_root_policy: ExtraRootPolicy,
    pub live_editing: bool,
}

impl ActivationOptions {
    pub fn new() -> Self {
        Self {
            ignored_entities: Vec::new(),
            ignored_kinds: DEFAULT_IGNORED_KINDS.iter().map(|k| k.to_string()).collect(),
            extra_roots: Vec::new(),
            extra_root_policy: ExtraRootPolicy::default(),
            live_editing: true,
        }
    }

    pub fn with_ignored_entities(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.ignored_entities = ids.into_iter().collect();
        self
    }

    pub fn with_ignored_kinds(mut self, kinds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra_roots(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.extra_roots = ids.into_iter().collect();
        self
    }

    pub fn with_extra_root_policy(mut self, policy: ExtraRootPolicy) -> Self {
        self.extra_root_policy = policy;
        self
    }

    pub fn with_live_editing(mut self, enabled: bool) -> Self {
        self.live_editing = enabled;
        self
    }
}

impl Default for ActivationOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide live-editing state
#[derive(Debug)]
pub struct Session<D: Document = Model> {
    document: Option<D>,
    ignore: IgnoreRules,
    extra_roots: Vec<EntityId>,
    extra_root_policy: ExtraRootPolicy,
    live: LiveSwitch,
    detector: Option<RebindDetector>,
}

impl<D: Document> Session<D> {
    pub fn new() -> Self {
        Self {
            document: None,
            ignore: IgnoreRules::default(),
            extra_roots: Vec::new(),
            extra_root_policy: ExtraRootPolicy::default(),
            live: LiveSwitch::default(),
            detector: None,
        }
    }

    /// Make `document` the active document and apply `options`
    ///
    /// Returns `true` when this call installed the rebind detector. Passing
    /// `None` is accepted here but fails with
    /// [`ReapError::MisconfiguredSession`] as soon as a rebind needs the
    /// document.
    pub fn activate(&mut self, document: Option<D>, options: ActivationOptions) -> bool {
        if let Some(document) = &document {
            info!(
                "Live editing document {} ({} entities)",
                document.id(),
                document.len()
            );
        }

        self.document = document;
        self.ignore = IgnoreRules::new(options.ignored_entities, options.ignored_kinds);
        self.extra_roots = options.extra_roots;
        self.extra_root_policy = options.extra_root_policy;
        self.live.set(options.live_editing);

        if self.detector.is_some() {
            debug!("Rebind detector already installed, configuration updated");
            return false;
        }
        self.detector = Some(RebindDetector::new());
        debug!("Rebind detector installed");
        true
    }

    pub fn hook_installed(&self) -> bool {
        self.detector.is_some()
    }

    pub fn document(&self) -> Result<&D> {
        self.document.as_ref().ok_or(ReapError::MisconfiguredSession)
    }

    pub fn document_mut(&mut self) -> Result<&mut D> {
        self.document.as_mut().ok_or(ReapError::MisconfiguredSession)
    }

    /// Hand the active document back, e.g. to re-activate it with new options
    pub fn take_document(&mut self) -> Option<D> {
        self.document.take()
    }

    pub fn ignore_rules(&self) -> &IgnoreRules {
        &self.ignore
    }

    pub fn extra_roots(&self) -> &[EntityId] {
        &self.extra_roots
    }

    pub fn extra_root_policy(&self) -> ExtraRootPolicy {
        self.extra_root_policy
    }

    /// Analyzer configured with the session's ignore lists
    pub fn analyzer(&self) -> ReachabilityAnalyzer {
        ReachabilityAnalyzer::new(self.ignore.clone()).with_extra_root_policy(self.extra_root_policy)
    }

    pub fn is_live(&self) -> bool {
        self.live.is_armed()
    }

    pub fn set_live_editing(&mut self, enabled: bool) {
        info!(
            "Live editing {}",
            if enabled { "enabled" } else { "disabled" }
        );
        self.live.set(enabled);
    }

    /// Disarm the detector until the guard is dropped
    pub fn suspend(&self) -> Suspension {
        self.live.suspend()
    }

    /// Feed a code unit that is about to run through the detector
    pub fn observe<N: Namespace + ?Sized>(
        &mut self,
        namespace: &mut N,
        unit: &CodeUnit,
    ) -> Result<Vec<RebindReport>> {
        let Some(detector) = self.detector else {
            return Ok(Vec::new());
        };
        detector.on_compile(self, namespace, unit)
    }

    /// Serialize the active document to `path`, returning the bytes written
    pub fn export(&self, path: &Path) -> Result<usize> {
        let _pause = self.suspend();
        let bytes = self.document()?.serialize()?;
        std::fs::write(path, &bytes)?;
        info!("Exported {} bytes to {}", bytes.len(), path.display());
        Ok(bytes.len())
    }
}

impl<D: Document> Default for Session<D> {
    fn default() -> Self {
        Self::new()
    }
}
