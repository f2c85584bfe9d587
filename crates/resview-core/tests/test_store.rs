#[allow(dead_code)]
mod common;

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;

use resview_core::category::Category;
use resview_core::error::ResViewError;
use resview_core::item::{ItemKind, ItemRef};
use resview_core::loader::{load_result_file, parse_result_file};
use resview_core::store::{QueryOptions, ResultStore, StoreChange, StoreChangeEvent, StoreListener};

use common::{build_result_text, load_extra, scenario_store};

#[derive(Default)]
struct Recorder {
    changes: Mutex<Vec<StoreChange>>,
}

impl StoreListener for Recorder {
    fn store_changed(&self, event: &StoreChangeEvent) {
        self.changes.lock().unwrap().push(event.change.clone());
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_result_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.sca");
    std::fs::write(&path, build_result_text("run-7", 2, 1, 1, 0, 0)).unwrap();

    let file = load_result_file(&path).unwrap();
    assert_eq!(file.runs, vec!["run-7".to_string()]);
    assert_eq!(file.records.len(), 4);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_result_file(&dir.path().join("nope.sca")).unwrap_err();
    assert!(matches!(err, ResViewError::Io(_)));
}

#[test]
fn test_parse_errors_name_the_line() {
    let err = parse_result_file("run r\nscalar Net x one\n").unwrap_err();
    assert!(err.to_string().contains("line 2"), "got: {err}");
    assert!(parse_result_file("bin 0 1\n").is_err());
    assert!(parse_result_file("launch Net x 1\n").is_err());
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    let file = parse_result_file("# header\n\nrun r\n  # indented\nscalar Net x 1\n").unwrap();
    assert_eq!(file.records.len(), 1);
}

// ---------------------------------------------------------------------------
// Store contents
// ---------------------------------------------------------------------------

#[test]
fn test_ids_follow_load_order() {
    let store = scenario_store();
    let ids = store.query(Category::All, &QueryOptions::default()).unwrap();
    let raw: Vec<u64> = ids.iter().map(|id| id.raw()).collect();
    let mut sorted = raw.clone();
    sorted.sort_unstable();
    assert_eq!(raw, sorted);
}

#[test]
fn test_category_queries_only_return_accepted_kinds() {
    let store = scenario_store();
    store
        .run_with_read_lock(|snapshot| {
            for category in Category::ALL {
                let ids = snapshot.query(category, &QueryOptions::default());
                assert!(!ids.is_empty());
                for id in ids.iter() {
                    let kind = snapshot.resolve(id).unwrap().kind();
                    assert!(category.accepts(kind), "{kind} in {category}");
                }
            }
        })
        .unwrap();
}

#[test]
fn test_field_ids_resolve_to_parent_values() {
    let store = scenario_store();
    let ids = store
        .query(Category::Scalars, &QueryOptions::with_fields(true))
        .unwrap();
    store
        .run_with_read_lock(|snapshot| {
            let fields: Vec<_> = ids.iter().filter(|id| id.is_field()).collect();
            assert_eq!(fields.len(), 14);
            for id in fields {
                let resolved = snapshot.resolve(id).unwrap();
                assert!(matches!(resolved, ItemRef::Field { .. }));
                assert_eq!(resolved.kind(), ItemKind::Scalar);
                let parent = snapshot.item(id.parent()).unwrap();
                assert!(parent.kind.has_fields());
                let field = id.field_kind().unwrap();
                assert_relative_eq!(resolved.value().unwrap(), parent.fields[&field]);
            }
        })
        .unwrap();
}

#[test]
fn test_reloading_a_label_replaces_its_items() {
    let store = scenario_store();
    load_extra(&store, "extra.sca", 4);
    load_extra(&store, "extra.sca", 1);
    let scalars = store
        .query(Category::Scalars, &QueryOptions::default())
        .unwrap();
    assert_eq!(scalars.len(), 4);
}

#[test]
fn test_unload_and_clear() {
    let store = scenario_store();
    load_extra(&store, "extra.sca", 2);
    assert!(store.unload_file("extra.sca").unwrap());
    assert!(!store.unload_file("extra.sca").unwrap());
    assert_eq!(
        store
            .run_with_read_lock(|s| s.file_labels().join(","))
            .unwrap(),
        "scenario.sca"
    );

    store.clear().unwrap();
    assert_eq!(store.run_with_read_lock(|s| s.item_count()).unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[test]
fn test_mutations_notify_listeners() {
    let store = ResultStore::new();
    let recorder = Arc::new(Recorder::default());
    let id = store.subscribe(recorder.clone());

    load_extra(&store, "a.sca", 1);
    store.unload_file("missing.sca").unwrap();
    store.unload_file("a.sca").unwrap();
    store.clear().unwrap();
    assert!(store.unsubscribe(id));
    load_extra(&store, "b.sca", 1);

    let changes = recorder.changes.lock().unwrap();
    assert_eq!(
        *changes,
        vec![
            StoreChange::FileLoaded {
                label: "a.sca".to_string(),
                items: 1
            },
            StoreChange::FileUnloaded {
                label: "a.sca".to_string()
            },
            StoreChange::Cleared,
        ]
    );
    assert_eq!(store.generation(), 4);
}

#[test]
fn test_disposed_store_rejects_everything() {
    let store = scenario_store();
    let recorder = Arc::new(Recorder::default());
    store.subscribe(recorder.clone());

    store.dispose();
    store.dispose();

    assert!(matches!(
        store.query(Category::All, &QueryOptions::default()),
        Err(ResViewError::StoreUnavailable)
    ));
    assert!(store.clear().is_err());
    assert_eq!(*recorder.changes.lock().unwrap(), vec![StoreChange::Disposed]);
}
