// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rebuild-cycle behavior: startup builds, change reactions, self-write
//! suppression, and recovery from broken edits.

use rekindle::{Coordinator, Error, ModuleRegistry};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::timeout;

fn seed(dir: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

fn counting_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        let persisted = scope.persisted();
        let builds = persisted.get("builds").and_then(|v| v.as_i64()).unwrap_or(0);
        persisted.set("builds", json!(builds + 1));
        Ok(())
    });
    registry
}

#[test]
fn startup_executes_the_entry_graph() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("main.ts", "m"), ("util.ts", "u")]);

    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        let util = scope.require("./util")?.into_exports().unwrap();
        scope.persisted().set("answer", util.get("answer").unwrap());
        Ok(())
    });
    registry.register("/util.ts", |scope| {
        scope.exports().set("answer", json!(42));
        Ok(())
    });

    let coordinator = Coordinator::builder(dir.path()).executor(registry).build().unwrap();
    assert_eq!(coordinator.persisted().get("answer"), Some(json!(42)));
    assert!(coordinator.sandbox().is_some());
}

#[test]
fn missing_entry_is_fatal_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("other.ts", "o")]);

    let err = Coordinator::builder(dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::MissingEntry(entry) if entry == "/main"));
}

#[test]
fn entry_can_be_overridden() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("app/index.ts", "a")]);

    let mut registry = ModuleRegistry::new();
    registry.register("/app/index.ts", |scope| {
        scope.persisted().set("ran", json!(true));
        Ok(())
    });

    let coordinator =
        Coordinator::builder(dir.path()).entry("/app").executor(registry).build().unwrap();
    assert_eq!(coordinator.persisted().get("ran"), Some(json!(true)));
}

#[test]
fn external_change_rebuilds_and_reflects_disk() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("main.ts", "m"), ("note.txt", "first")]);

    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        let note = scope.require("./note.txt")?.into_node().unwrap();
        scope.persisted().set("note", json!(note.as_file().unwrap().text()));
        Ok(())
    });

    let coordinator = Coordinator::builder(dir.path()).executor(registry).build().unwrap();
    assert_eq!(coordinator.persisted().get("note"), Some(json!("first")));

    let note_path = dir.path().join("note.txt");
    fs::write(&note_path, "second").unwrap();
    assert!(coordinator.file_changed(&note_path).unwrap());
    assert_eq!(coordinator.persisted().get("note"), Some(json!("second")));
}

#[test]
fn self_writes_are_suppressed_once() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("main.ts", "m")]);

    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        let persisted = scope.persisted();
        let builds = persisted.get("builds").and_then(|v| v.as_i64()).unwrap_or(0);
        persisted.set("builds", json!(builds + 1));
        // later generations find the file already on disk
        if scope.dir().find("out.txt").is_none() {
            scope.dir().create_file("out.txt", b"generated".to_vec())?;
        }
        Ok(())
    });

    let coordinator = Coordinator::builder(dir.path()).executor(registry).build().unwrap();
    assert_eq!(coordinator.persisted().get("builds"), Some(json!(1)));
    assert_eq!(coordinator.suppressed().len(), 1);

    // the notification for the runtime's own write is consumed
    let out_path = dir.path().canonicalize().unwrap().join("out.txt");
    assert!(!coordinator.file_changed(&out_path).unwrap());
    assert_eq!(coordinator.persisted().get("builds"), Some(json!(1)));
    assert!(coordinator.suppressed().is_empty());

    // a second notification for the same path is a real change
    assert!(coordinator.file_changed(&out_path).unwrap());
    assert_eq!(coordinator.persisted().get("builds"), Some(json!(2)));
}

#[test]
fn broken_edit_recovers_on_the_next_change() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("main.ts", "fine")]);

    let mut registry = ModuleRegistry::new();
    registry.register("/main.ts", |scope| {
        if scope.file().text().contains("boom") {
            return Err(Error::Transform {
                file: scope.file().path(),
                reason: "boom".to_string(),
            });
        }
        let persisted = scope.persisted();
        let ok = persisted.get("ok_builds").and_then(|v| v.as_i64()).unwrap_or(0);
        persisted.set("ok_builds", json!(ok + 1));
        Ok(())
    });

    let coordinator = Coordinator::builder(dir.path()).executor(registry).build().unwrap();
    assert_eq!(coordinator.persisted().get("ok_builds"), Some(json!(1)));

    // a body failure is absorbed at the rebuild boundary
    let main_path = dir.path().join("main.ts");
    fs::write(&main_path, "boom").unwrap();
    assert!(coordinator.file_changed(&main_path).unwrap());
    assert_eq!(coordinator.persisted().get("ok_builds"), Some(json!(1)));
    // the broken generation is still current, ready for teardown
    assert!(coordinator.sandbox().is_some());

    fs::write(&main_path, "fine again").unwrap();
    assert!(coordinator.file_changed(&main_path).unwrap());
    assert_eq!(coordinator.persisted().get("ok_builds"), Some(json!(2)));
}

#[test]
fn entry_resolving_to_a_non_source_file_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    // an extensionless file wins exact-name resolution but is no module
    seed(dir.path(), &[("main", "not source")]);

    let err = Coordinator::builder(dir.path()).build().unwrap_err();
    assert!(matches!(err, Error::MissingEntry(_)));
}

#[tokio::test]
async fn watch_loop_rebuilds_on_external_edit() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path(), &[("main.ts", "m")]);

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let coordinator = Rc::new(
                Coordinator::builder(dir.path())
                    .debounce(Duration::from_millis(50))
                    .executor(counting_registry())
                    .build()
                    .unwrap(),
            );
            assert_eq!(coordinator.persisted().get("builds"), Some(json!(1)));

            let driver = Rc::clone(&coordinator);
            tokio::task::spawn_local(async move {
                let _ = driver.run().await;
            });
            // give the watcher backend time to come up
            tokio::time::sleep(Duration::from_millis(300)).await;
            fs::write(dir.path().join("main.ts"), "edited").unwrap();

            timeout(Duration::from_secs(5), async {
                loop {
                    let builds = coordinator
                        .persisted()
                        .get("builds")
                        .and_then(|v| v.as_i64())
                        .unwrap_or(0);
                    if builds >= 2 {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(25)).await;
                }
            })
            .await
            .expect("no rebuild within timeout");
        })
        .await;
}
