//! CLI integration tests
//!
//! These run the compiled binary against scripts written to a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn graphreap() -> Command {
    let mut cmd = Command::cargo_bin("graphreap").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn write_script(dir: &Path, name: &str, source: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, source).unwrap();
    path
}

#[test]
fn test_help() {
    graphreap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--ignore-kind"))
        .stdout(predicate::str::contains("--export"));
}

#[test]
fn test_version() {
    graphreap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("graphreap"));
}

#[test]
fn test_script_reports_rebinds() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "chain.reap",
        "model = new\n\
         c = CartesianPoint()\n\
         b = Polyline(c)\n\
         x = ShapeRepresentation(b)\n\
         x = 5\n",
    );

    graphreap()
        .current_dir(dir.path())
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Variable \"x\", containing #3/ShapeRepresentation (+2 other fully dependent entities) were overwritten",
        ));
}

#[test]
fn test_document_rebind_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "doc.reap",
        "# two walls, then a fresh document\n\
         model = new\n\
         a = Wall()\n\
         b = Wall()\n\
         model = new\n\
         c = Slab()\n\
         export \"out.json\"\n",
    );

    graphreap()
        .current_dir(dir.path())
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 entities"));

    let exported = fs::read_to_string(dir.path().join("out.json")).unwrap();
    assert!(exported.contains("Slab"));
    assert!(!exported.contains("Wall"));
}

#[test]
fn test_no_live_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "off.reap",
        "model = new\nx = Wall()\nx = Slab()\nstats\n",
    );

    graphreap()
        .current_dir(dir.path())
        .arg("--no-live")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("overwritten").not())
        .stdout(predicate::str::contains("2 entities"));
}

#[test]
fn test_config_file_ignored_kinds() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".graphreap.toml"),
        "ignored_kinds = [\"GeometricItem\"]\n",
    )
    .unwrap();
    let script = write_script(
        dir.path(),
        "cfg.reap",
        "model = new\np = CartesianPoint()\nx = ShapeRepresentation(p)\np = none\nx = none\nstats\n",
    );

    graphreap()
        .current_dir(dir.path())
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entities"));
}

#[test]
fn test_protected_extra_root_survives_collection() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "roots.reap",
        "model = new\n\
         a = CartesianPoint(); b = Polyline(a)\n\
         x = ShapeRepresentation(b)\n\
         x = none\n\
         stats\n",
    );

    graphreap()
        .current_dir(dir.path())
        .args(["--extra-root", "2", "--protect-extra-roots"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("containing #3/ShapeRepresentation was overwritten"))
        .stdout(predicate::str::contains("2 entities"));

    graphreap()
        .current_dir(dir.path())
        .args(["--extra-root", "2"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("(+2 other fully dependent entities)"))
        .stdout(predicate::str::contains("0 entities"));
}

#[test]
fn test_externally_referenced_root_is_reported_as_kept() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "kept.reap",
        "model = new\n\
         a = Wall()\n\
         holder = RelAggregates(a)\n\
         a = none\n\
         stats\n",
    );

    graphreap()
        .current_dir(dir.path())
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("containing #1/Wall was overwritten"))
        .stdout(predicate::str::contains("1 entity is still referenced elsewhere and kept"))
        .stdout(predicate::str::contains("2 entities"))
        .stderr(predicate::str::contains("still referenced"));
}

#[test]
fn test_script_error_names_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "bad.reap", "model = new\nx = Wall(ghost)\n");

    graphreap()
        .current_dir(dir.path())
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_stdin_session_continues_after_errors() {
    let dir = tempfile::tempdir().unwrap();

    graphreap()
        .current_dir(dir.path())
        .write_stdin("model = new\nx = Wall(ghost)\nx = Wall()\nx = Slab()\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("line 2"))
        .stdout(predicate::str::contains("containing #1/Wall was overwritten"));
}

#[test]
fn test_missing_script_fails() {
    graphreap()
        .arg("/nonexistent/script.reap")
        .assert()
        .failure();
}
