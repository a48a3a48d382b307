//! Configuration loading
//!
//! Settings come from a TOML or YAML file and are overridden by CLI flags.

use crate::analysis::{ExtraRootPolicy, DEFAULT_IGNORED_KINDS};
use crate::error::{ReapError, Result};
use crate::graph::{EntityId, KindSchema};
use crate::session::ActivationOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names probed by [`Config::from_default_locations`], in order
const DEFAULT_FILES: [&str; 4] = [
    ".graphreap.toml",
    ".graphreap.yml",
    ".graphreap.yaml",
    "graphreap.toml",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Kinds never collected; subtypes are protected as well
    pub ignored_kinds: Vec<String>,

    /// Entity ids never collected
    pub ignored_entities: Vec<u64>,

    /// Entity ids that always belong to a rebound entity's support boundary
    pub extra_roots: Vec<u64>,

    /// Whether extra roots may be collected themselves
    pub extra_root_policy: ExtraRootPolicy,

    /// Start with live editing enabled
    pub live_editing: bool,

    /// Extra subtype declarations (kind -> parent kind)
    pub kinds: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignored_kinds: DEFAULT_IGNORED_KINDS.iter().map(|k| k.to_string()).collect(),
            ignored_entities: Vec::new(),
            extra_roots: Vec::new(),
            extra_root_policy: ExtraRootPolicy::default(),
            live_editing: true,
            kinds: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load a config file; YAML for `.yml`/`.yaml`, TOML otherwise
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yml") | Some("yaml")
        );

        let parsed: std::result::Result<Self, String> = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ReapError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load the first config file found in `dir`, or the defaults
    pub fn from_default_locations(dir: &Path) -> Result<Self> {
        match Self::find_in(dir) {
            Some(path) => {
                debug!("Using config file {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn find_in(dir: &Path) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Building-model hierarchy extended with the configured declarations
    pub fn schema(&self) -> KindSchema {
        let mut schema = KindSchema::building();
        for (kind, parent) in &self.kinds {
            schema.declare(kind, parent);
        }
        schema
    }

    pub fn activation_options(&self) -> ActivationOptions {
        ActivationOptions::new()
            .with_ignored_entities(self.ignored_entities.iter().copied().map(EntityId))
            .with_ignored_kinds(self.ignored_kinds.iter().cloned())
            .with_extra_roots(self.extra_roots.iter().copied().map(EntityId))
            .with_extra_root_policy(self.extra_root_policy)
            .with_live_editing(self.live_editing)
    }
}
