mod colors;

use crate::graph::{DocumentId, EntityId};
use colored::Colorize;
use colors::StructureColors;
use std::fmt;

/// Summary of one rebind handled by the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebindReport {
    /// A variable holding an entity was rebound
    EntityOverwritten {
        variable: String,
        root: EntityId,
        kind: String,
        /// Entities removed along with the root
        dependents: usize,
        /// Planned entities the document refused to delete
        kept: usize,
    },
    /// A variable holding the active document was rebound
    DocumentOverwritten {
        variable: String,
        document: DocumentId,
        entities: usize,
    },
}

impl RebindReport {
    pub fn variable(&self) -> &str {
        match self {
            RebindReport::EntityOverwritten { variable, .. }
            | RebindReport::DocumentOverwritten { variable, .. } => variable,
        }
    }

    /// Entities the rebind accounted for, including the root
    pub fn entity_count(&self) -> usize {
        match self {
            RebindReport::EntityOverwritten { dependents, .. } => dependents + 1,
            RebindReport::DocumentOverwritten { entities, .. } => *entities,
        }
    }
}

/// "was overwritten" / "(+N other fully dependent entities) were overwritten"
fn overwritten_detail(dependents: usize) -> String {
    match dependents {
        0 => "was overwritten".to_string(),
        1 => "(+1 other fully dependent entity) were overwritten".to_string(),
        n => format!("(+{} other fully dependent entities) were overwritten", n),
    }
}

impl fmt::Display for RebindReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebindReport::EntityOverwritten {
                variable,
                root,
                kind,
                dependents,
                ..
            } => write!(
                f,
                "Variable \"{}\", containing {}/{} {}",
                variable,
                root,
                kind,
                overwritten_detail(*dependents)
            ),
            RebindReport::DocumentOverwritten {
                document, entities, ..
            } => write!(
                f,
                "Overwriting document at {} with {} entities",
                document, entities
            ),
        }
    }
}

/// Prints rebind summaries and shell messages to stdout
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress informational messages; rebind summaries are always shown
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn rebind(&self, report: &RebindReport) {
        match report {
            RebindReport::EntityOverwritten {
                variable,
                root,
                kind,
                dependents,
                kept,
            } => {
                println!(
                    "Variable {}, containing {} {}",
                    StructureColors::variable(&format!("\"{}\"", variable)),
                    StructureColors::entity(&format!("{}/{}", root, kind)),
                    overwritten_detail(*dependents)
                );
                if *kept > 0 {
                    println!(
                        "  {} {} still referenced elsewhere and kept",
                        StructureColors::count(&kept.to_string()),
                        if *kept == 1 { "entity is" } else { "entities are" }
                    );
                }
            }
            RebindReport::DocumentOverwritten {
                document, entities, ..
            } => {
                println!(
                    "Overwriting document at {} with {} entities",
                    StructureColors::entity(&document.to_string()),
                    StructureColors::count(&entities.to_string())
                );
            }
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}: {}", "error".red().bold(), message);
    }
}
