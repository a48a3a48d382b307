//! Scripting host driving a live-editing session
//!
//! Each line is handed to the rebind detector before any of its statements
//! run, the same way an interactive shell would report a cell at compile
//! time. Statements then execute against the session's active document.

mod parser;

pub use parser::{parse_line, Command, Expr, Operand, Statement};

use crate::config::Config;
use crate::error::{ReapError, Result};
use crate::graph::{Document, EntityId, Model};
use crate::hook::AssignTarget;
use crate::report::RebindReport;
use crate::session::{Binding, EntityRef, Namespace, Scope, Session};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something a line produced for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Rebind(RebindReport),
    Info(String),
}

/// Interpreter state: the session plus the variables it observes
pub struct Shell {
    session: Session<Model>,
    scope: Scope,
    config: Config,
    /// Directory relative paths in `load`/`export` resolve against
    base_dir: PathBuf,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(),
            scope: Scope::new(),
            config,
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn session(&self) -> &Session<Model> {
        &self.session
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run a whole script, stopping at the first failing line
    pub fn run_script(&mut self, source: &str) -> Result<Vec<Output>> {
        let mut outputs = Vec::new();
        for (index, line) in source.lines().enumerate() {
            outputs.extend(self.run_line(index + 1, line)?);
        }
        Ok(outputs)
    }

    /// Run a single line; blank lines and `#` comments do nothing
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Result<Vec<Output>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Vec::new());
        }

        let (statements, unit) =
            parse_line(line).map_err(|message| ReapError::script(line_no, message))?;

        let mut outputs: Vec<Output> = self
            .session
            .observe(&mut self.scope, &unit)?
            .into_iter()
            .map(Output::Rebind)
            .collect();

        for statement in statements {
            if let Some(output) = self.execute(line_no, statement)? {
                outputs.push(output);
            }
        }
        Ok(outputs)
    }

    fn execute(&mut self, line_no: usize, statement: Statement) -> Result<Option<Output>> {
        match statement {
            Statement::Assign { target, values } => {
                self.assign(line_no, target, values)?;
                Ok(None)
            }
            Statement::Command(command) => self.command(line_no, command),
        }
    }

    fn assign(&mut self, line_no: usize, target: AssignTarget, values: Vec<Expr>) -> Result<()> {
        match target {
            AssignTarget::Name(name) => {
                let value = self.single_value(line_no, values)?;
                let binding = self.evaluate(line_no, value)?;
                self.scope.bind(&name, binding);
            }
            AssignTarget::Attribute { object, attribute } => {
                if attribute != "refs" {
                    return Err(ReapError::script(
                        line_no,
                        format!("unknown attribute `{}`, only `refs` can be assigned", attribute),
                    ));
                }
                let entity = self.entity_of(line_no, &Operand::Name(object))?;
                let references = match self.single_value(line_no, values)? {
                    Expr::List(operands) => self.resolve_all(line_no, &operands)?,
                    Expr::None => Vec::new(),
                    _ => {
                        return Err(ReapError::script(line_no, "`refs` expects a list like [a, #2]"))
                    }
                };
                self.session
                    .document_mut()?
                    .set_references(entity, &references)?;
            }
            AssignTarget::Subscript { .. } => {
                return Err(ReapError::script(line_no, "subscript assignment is not supported"));
            }
            AssignTarget::Destructure(names) => {
                if names.len() != values.len() {
                    return Err(ReapError::script(
                        line_no,
                        format!("cannot unpack {} values into {} names", values.len(), names.len()),
                    ));
                }
                // Evaluate everything before binding anything
                let bindings = values
                    .into_iter()
                    .map(|value| self.evaluate(line_no, value))
                    .collect::<Result<Vec<_>>>()?;
                for (name, binding) in names.iter().zip(bindings) {
                    self.scope.bind(name, binding);
                }
            }
        }
        Ok(())
    }

    fn single_value(&self, line_no: usize, mut values: Vec<Expr>) -> Result<Expr> {
        match values.len() {
            1 => Ok(values.remove(0)),
            n => Err(ReapError::script(line_no, format!("expected one value, found {}", n))),
        }
    }

    fn evaluate(&mut self, line_no: usize, value: Expr) -> Result<Binding> {
        match value {
            Expr::New => {
                let model = Model::with_schema(self.config.schema());
                Ok(self.activate_document(model))
            }
            Expr::Load(path) => {
                let bytes = std::fs::read(self.resolve_path(&path))?;
                let model = Model::from_json(&bytes, self.config.schema())?;
                Ok(self.activate_document(model))
            }
            Expr::Create { kind, references } => {
                let references = self.resolve_all(line_no, &references)?;
                let document = self.session.document_mut()?;
                let id = document.create(kind, &references)?;
                Ok(Binding::Entity(EntityRef::new(document.id(), id)))
            }
            Expr::Operand(Operand::Name(name)) => self
                .scope
                .get(&name)
                .cloned()
                .ok_or_else(|| ReapError::script(line_no, format!("name `{}` is not defined", name))),
            Expr::Operand(Operand::Id(id)) => {
                let document = self.session.document()?;
                document.by_id(id)?;
                Ok(Binding::Entity(EntityRef::new(document.id(), id)))
            }
            Expr::List(_) => Err(ReapError::script(line_no, "lists can only be assigned to `.refs`")),
            Expr::None => Ok(Binding::Empty),
            Expr::Literal(text) => Ok(Binding::Value(text)),
        }
    }

    /// Make `model` the active document, keeping the configured ignore lists
    fn activate_document(&mut self, model: Model) -> Binding {
        let id = model.id();
        let mut options = self.config.activation_options();
        if self.session.hook_installed() {
            // A later `new`/`load` keeps whatever `live on|off` selected
            options.live_editing = self.session.is_live();
        }
        self.session.activate(Some(model), options);
        Binding::Document(id)
    }

    fn command(&mut self, line_no: usize, command: Command) -> Result<Option<Output>> {
        match command {
            Command::Activate { ignore } => {
                let ignored = self.resolve_all(line_no, &ignore)?;
                let options = self
                    .config
                    .activation_options()
                    .with_ignored_entities(ignored.iter().copied())
                    .with_live_editing(true);
                let document = self.session.take_document();
                self.session.activate(document, options);
                Ok(Some(Output::Info(format!(
                    "Live editing enabled ({} protected entities)",
                    ignored.len()
                ))))
            }
            Command::Export(path) => {
                let path = self.resolve_path(&path);
                let bytes = self.session.export(&path)?;
                Ok(Some(Output::Info(format!(
                    "Exported {} bytes to {}",
                    bytes,
                    path.display()
                ))))
            }
            Command::Live(enabled) => {
                self.session.set_live_editing(enabled);
                Ok(Some(Output::Info(format!(
                    "Live editing {}",
                    if enabled { "on" } else { "off" }
                ))))
            }
            Command::Show(name) => {
                let binding = self
                    .scope
                    .get(&name)
                    .ok_or_else(|| ReapError::script(line_no, format!("name `{}` is not defined", name)))?;
                Ok(Some(Output::Info(self.describe(&name, binding))))
            }
            Command::Stats => {
                let document = self.session.document()?;
                Ok(Some(Output::Info(format!(
                    "Document {}: {} entities, max id {}",
                    document.id(),
                    document.len(),
                    document.max_id()
                ))))
            }
        }
    }

    fn describe(&self, name: &str, binding: &Binding) -> String {
        let Binding::Entity(entity) = binding else {
            return format!("{} = {}", name, binding);
        };
        match self.session.document() {
            Ok(document) if document.id() == entity.document => match document.by_id(entity.id) {
                Ok(found) => {
                    let references: Vec<String> = document
                        .references(entity.id)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                    format!("{} = {} -> [{}]", name, found, references.join(", "))
                }
                Err(_) => format!("{} = {} (deleted)", name, entity.id),
            },
            _ => format!("{} = {} (inactive document)", name, entity.id),
        }
    }

    fn resolve_all(&self, line_no: usize, operands: &[Operand]) -> Result<Vec<EntityId>> {
        operands
            .iter()
            .map(|operand| self.entity_of(line_no, operand))
            .collect()
    }

    /// Resolve an operand to an entity of the active document
    fn entity_of(&self, line_no: usize, operand: &Operand) -> Result<EntityId> {
        let document = self.session.document()?;
        match operand {
            Operand::Id(id) => {
                document.by_id(*id)?;
                Ok(*id)
            }
            Operand::Name(name) => match self.scope.get(name) {
                Some(Binding::Entity(entity)) if entity.document == document.id() => {
                    debug!("Resolved `{}` to {}", name, entity.id);
                    Ok(entity.id)
                }
                Some(other) => Err(ReapError::script(
                    line_no,
                    format!("`{}` is {}, not an entity of the active document", name, other),
                )),
                None => Err(ReapError::script(line_no, format!("name `{}` is not defined", name))),
            },
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
