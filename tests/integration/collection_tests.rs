//! Integration tests for rebind-driven collection
//!
//! These drive a live session through the public API the way a host would:
//! a code unit is observed first, then its assignments are applied.

use graphreap::graph::{Document, EntityId, Model};
use graphreap::hook::CodeUnit;
use graphreap::session::{ActivationOptions, Binding, EntityRef, Namespace, Scope, Session};
use graphreap::{Config, Output, RebindReport, Shell};
use std::collections::HashSet;

/// Bind `name` to an entity of the session's document
fn bind(scope: &mut Scope, session: &Session, name: &str, id: EntityId) {
    let document = session.document().unwrap().id();
    scope.bind(name, Binding::Entity(EntityRef::new(document, id)));
}

/// Observe `name = <something new>` and then apply the new value
fn rebind(session: &mut Session, scope: &mut Scope, name: &str, value: Binding) -> Vec<RebindReport> {
    let reports = session
        .observe(scope, &CodeUnit::assignment(name))
        .unwrap();
    scope.bind(name, value);
    reports
}

fn live(model: Model) -> Session {
    let mut session = Session::new();
    session.activate(Some(model), ActivationOptions::default());
    session
}

/// Every name bound to an entity of the active document resolves
fn assert_no_dangling_names(session: &Session, scope: &Scope) {
    let document = session.document().unwrap();
    for (name, binding) in scope.iter() {
        if let Some(entity) = binding.as_entity() {
            if entity.document == document.id() {
                assert!(
                    document.contains(entity.id),
                    "variable {} points at deleted {}",
                    name,
                    entity.id
                );
            }
        }
    }
}

#[test]
fn test_rebinding_a_chain_deletes_all_of_it() {
    // A -> B -> C, only A is named
    let mut model = Model::new();
    let c = model.create("CartesianPoint", &[]).unwrap();
    let b = model.create("Polyline", &[c]).unwrap();
    let a = model.create("ShapeRepresentation", &[b]).unwrap();
    let mut session = live(model);
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", a);

    let reports = rebind(&mut session, &mut scope, "x", Binding::Value("5".into()));

    assert_eq!(session.document().unwrap().len(), 0);
    assert_eq!(reports.len(), 1);
    assert!(reports[0]
        .to_string()
        .contains("(+2 other fully dependent entities) were overwritten"));
    assert_eq!(reports[0].entity_count(), 3);
}

#[test]
fn test_shared_entity_survives() {
    // A -> B -> C and D -> B
    let mut model = Model::new();
    let c = model.create("CartesianPoint", &[]).unwrap();
    let b = model.create("Polyline", &[c]).unwrap();
    let a = model.create("ShapeRepresentation", &[b]).unwrap();
    let d = model.create("ShapeRepresentation", &[b]).unwrap();
    let mut session = live(model);
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", a);
    bind(&mut scope, &session, "y", d);

    let reports = rebind(&mut session, &mut scope, "x", Binding::Empty);

    let document = session.document().unwrap();
    assert!(!document.contains(a));
    assert!(document.contains(b));
    assert!(document.contains(c));
    assert!(document.contains(d));
    assert_eq!(reports[0].entity_count(), 1);
    assert_no_dangling_names(&session, &scope);
}

#[test]
fn test_rebinding_the_document_variable_empties_it() {
    let mut model = Model::new();
    let ids: Vec<EntityId> = (0..5)
        .map(|_| model.create("Wall", &[]).unwrap())
        .collect();
    let document_id = model.id();
    let mut session = live(model);
    let mut scope = Scope::new();
    scope.bind("model", Binding::Document(document_id));
    bind(&mut scope, &session, "w", ids[1]);

    // One entity was already purged behind the detector's back
    session.document_mut().unwrap().purge(ids[3]).unwrap();

    let reports = rebind(&mut session, &mut scope, "model", Binding::Value("1".into()));

    assert_eq!(session.document().unwrap().len(), 0);
    assert_eq!(
        reports,
        vec![RebindReport::DocumentOverwritten {
            variable: "model".to_string(),
            document: document_id,
            entities: 4,
        }]
    );
    assert_eq!(scope.get("w"), Some(&Binding::Empty));
}

#[test]
fn test_other_names_into_the_collected_subgraph_are_cleared() {
    let mut model = Model::new();
    let c = model.create("CartesianPoint", &[]).unwrap();
    let b = model.create("Polyline", &[c]).unwrap();
    let a = model.create("ShapeRepresentation", &[b]).unwrap();
    let mut session = live(model);
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", a);
    bind(&mut scope, &session, "point", c);
    scope.bind("label", Binding::Value("\"kept\"".into()));

    rebind(&mut session, &mut scope, "x", Binding::Empty);

    assert_eq!(scope.get("point"), Some(&Binding::Empty));
    assert_eq!(scope.get("label"), Some(&Binding::Value("\"kept\"".into())));
    assert_no_dangling_names(&session, &scope);
}

#[test]
fn test_collection_is_conservative() {
    // Every deleted entity other than the root was reachable from it and
    // referenced only from inside its reachable set
    let mut model = Model::new();
    let shared = model.create("CartesianPoint", &[]).unwrap();
    let own = model.create("CartesianPoint", &[]).unwrap();
    let line = model.create("Polyline", &[shared, own]).unwrap();
    let root = model.create("ShapeRepresentation", &[line]).unwrap();
    let other = model.create("Polyline", &[shared]).unwrap();

    let mut session = live(model);
    let before: HashSet<EntityId> = session.document().unwrap().entities().iter().map(|e| e.id).collect();
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", root);
    bind(&mut scope, &session, "y", other);

    rebind(&mut session, &mut scope, "x", Binding::Empty);

    let document = session.document().unwrap();
    let after: HashSet<EntityId> = document.entities().iter().map(|e| e.id).collect();
    let deleted: HashSet<EntityId> = before.difference(&after).copied().collect();
    assert_eq!(deleted, HashSet::from([root, line, own]));
    assert!(document.contains(shared));
    assert!(document.contains(other));
}

#[test]
fn test_context_kinds_are_protected_by_default() {
    let mut model = Model::new();
    let context = model.create("GeometricRepresentationContext", &[]).unwrap();
    let shape = model.create("ShapeRepresentation", &[context]).unwrap();
    let mut session = live(model);
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", shape);

    rebind(&mut session, &mut scope, "x", Binding::Empty);

    let document = session.document().unwrap();
    assert!(!document.contains(shape));
    assert!(document.contains(context));
}

#[test]
fn test_root_referenced_from_outside_is_kept() {
    // A -> B, and D -> A keeps A alive
    let mut model = Model::new();
    let b = model.create("CartesianPoint", &[]).unwrap();
    let a = model.create("Polyline", &[b]).unwrap();
    let d = model.create("ShapeRepresentation", &[a]).unwrap();
    let mut session = live(model);
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", a);

    let reports = rebind(&mut session, &mut scope, "x", Binding::Empty);

    let document = session.document().unwrap();
    assert!(document.contains(a));
    assert!(document.contains(b));
    assert!(document.contains(d));
    match &reports[0] {
        RebindReport::EntityOverwritten { root, kept, dependents, .. } => {
            assert_eq!(*root, a);
            assert_eq!(*dependents, 1);
            assert_eq!(*kept, 2);
        }
        other => panic!("unexpected report {:?}", other),
    }
}

#[test]
fn test_reactivation_is_idempotent() {
    let mut model = Model::new();
    let a = model.create("Wall", &[]).unwrap();
    let mut session = live(model);

    let document = session.take_document();
    assert!(!session.activate(document, ActivationOptions::default().with_ignored_entities([a])));

    assert!(session.hook_installed());
    assert!(session.ignore_rules().entities().contains(&a));

    // Still a single detector, so one rebind yields one report
    let mut scope = Scope::new();
    bind(&mut scope, &session, "x", a);
    let reports = rebind(&mut session, &mut scope, "x", Binding::Empty);
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_shell_script_end_to_end() {
    let mut shell = Shell::new(Config::default());
    let outputs = shell
        .run_script(
            "model = new\n\
             ctx = GeometricRepresentationContext()\n\
             p = CartesianPoint()\n\
             line = Polyline(p)\n\
             shape = ShapeRepresentation(line, ctx)\n\
             line = none\n\
             p = none\n\
             shape = Wall()\n\
             stats",
        )
        .unwrap();

    let rebinds: Vec<String> = outputs
        .iter()
        .filter_map(|output| match output {
            Output::Rebind(report) => Some(report.to_string()),
            Output::Info(_) => None,
        })
        .collect();
    assert!(rebinds
        .last()
        .unwrap()
        .contains("containing #4/ShapeRepresentation (+2 other fully dependent entities)"));

    // Context plus the new wall
    assert_eq!(shell.session().document().unwrap().len(), 2);
    assert_eq!(
        outputs.last(),
        Some(&Output::Info(
            format!("Document {}: 2 entities, max id 5", shell.session().document().unwrap().id())
        ))
    );
}
