use serde_json::json;
use sheetbook_core::{
    detect, load_workspace_snapshot, save_workspace_snapshot, CellUpdate, FixedClock,
    PersistError, SequentialIdGenerator, StoreOptions, WorkspaceStore,
};
use std::fs;
use std::path::Path;

const T0: &str = "2024-01-01T00:00:00.000Z";

fn write_fixture(dir: &Path, book_id_in_file: &str) {
    fs::create_dir_all(dir.join("books")).unwrap();
    let workspace = json!({
        "schemaVersion": 1,
        "workspace": {
            "id": "ws-1",
            "name": "Home",
            "createdAt": T0,
            "updatedAt": T0,
            "settings": { "theme": "dark", "sidebarWidth": 240, "pinned": ["book-001"] }
        },
        "folders": [],
        "books": [{
            "id": "book-001",
            "name": "Budget",
            "folderId": null,
            "order": 0,
            "dataPath": "books/book-001.json",
            "activeSheetId": "sheet-001",
            "createdAt": T0,
            "updatedAt": T0
        }]
    });
    let book = json!({
        "schemaVersion": 1,
        "book": {
            "id": book_id_in_file,
            "name": "Budget",
            "createdAt": T0,
            "updatedAt": T0,
            "properties": {}
        },
        "sheets": [{
            "id": "sheet-001",
            "name": "Sheet",
            "gridSize": { "rows": 100, "cols": 26 },
            "settings": {},
            "rows": { "2": { "B": { "value": "hi", "type": "string", "comment": "note" } } }
        }]
    });
    fs::write(
        dir.join("workspace.json"),
        serde_json::to_string_pretty(&workspace).unwrap(),
    )
    .unwrap();
    fs::write(
        dir.join("books").join("book-001.json"),
        serde_json::to_string_pretty(&book).unwrap(),
    )
    .unwrap();
}

#[test]
fn load_resolves_books_relative_to_workspace() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-001");

    let snapshot = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap();

    assert_eq!(snapshot.books.len(), 1);
    assert!(snapshot.books[0].file_path.ends_with("book-001.json"));
    let document = snapshot.book_document("book-001").unwrap();
    let cell = document.sheet("sheet-001").unwrap().cell("2", "B").unwrap();
    assert_eq!(cell.comment.as_deref(), Some("note"));
    assert_eq!(
        snapshot.index().workspace.settings.extra.get("pinned"),
        Some(&json!(["book-001"]))
    );
    assert!(detect(&snapshot).is_empty());
}

#[test]
fn edits_survive_a_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-001");
    let snapshot = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap();
    let mut store = WorkspaceStore::with_dependencies(
        snapshot,
        StoreOptions::default(),
        Box::new(SequentialIdGenerator::new().starting_after("book", 1)),
        Box::new(FixedClock::new("2024-06-01T12:00:00.000Z")),
    );
    store
        .apply_cell_updates(&[CellUpdate::new("3", "C", "42")])
        .unwrap();
    store.create_book(Some("Ledger")).unwrap();

    save_workspace_snapshot(store.snapshot()).unwrap();
    let reloaded = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap();

    assert_eq!(reloaded.index(), store.snapshot().index());
    assert_eq!(reloaded.books.len(), 2);
    assert_eq!(
        reloaded.book_document("book-001"),
        store.snapshot().book_document("book-001")
    );
    assert!(dir.path().join("books").join("book-002.json").exists());
    let raw = fs::read_to_string(dir.path().join("workspace.json")).unwrap();
    assert!(raw.ends_with('\n'));
    assert!(raw.contains("\"pinned\""));
}

#[test]
fn mismatched_ids_still_load_for_reconciliation() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-xyz");

    let snapshot = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap();

    let issues = detect(&snapshot);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "book-id-mismatch:book-001:book-xyz");
}

#[test]
fn schema_violation_names_the_offending_file() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-001");
    let bad_book = json!({
        "schemaVersion": 1,
        "book": {
            "id": "book-001",
            "name": "Budget",
            "createdAt": T0,
            "updatedAt": T0,
            "properties": {}
        },
        "sheets": [{
            "id": "sheet-001",
            "name": "Sheet",
            "gridSize": { "rows": 100, "cols": 26 },
            "settings": {},
            "rows": { "1": { "A": { "value": "text", "type": "number" } } }
        }]
    });
    let book_path = dir.path().join("books").join("book-001.json");
    fs::write(&book_path, bad_book.to_string()).unwrap();

    let err = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap_err();

    match err {
        PersistError::Invalid { path, source } => {
            assert_eq!(path, book_path);
            assert!(!source.errors.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_canonical_cell_keys_are_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-001");
    let book_path = dir.path().join("books").join("book-001.json");
    let mut raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&book_path).unwrap()).unwrap();
    raw["sheets"][0]["rows"] = json!({ "02": { "b": { "value": "hi", "type": "string" } } });
    fs::write(&book_path, raw.to_string()).unwrap();

    let err = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap_err();

    match err {
        PersistError::Invalid { path, source } => {
            assert_eq!(path, book_path);
            assert_eq!(source.errors.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_book_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "book-001");
    fs::remove_file(dir.path().join("books").join("book-001.json")).unwrap();

    let err = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap_err();

    assert!(matches!(err, PersistError::Io { .. }));
}

#[test]
fn malformed_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("workspace.json"), "{ not json").unwrap();

    let err = load_workspace_snapshot(dir.path().join("workspace.json")).unwrap_err();

    assert!(matches!(err, PersistError::Json { .. }));
}
