use serde_json::{json, Value};
use sheetbook_core::{
    detect, BookDocument, IssueKind, OrderIssueReason, Severity, Snapshot, WorkspaceIndex,
};

const T0: &str = "2024-01-01T00:00:00.000Z";

fn reference(id: &str, data_path: &str, folder_id: Value, order: Value) -> Value {
    json!({
        "id": id,
        "name": id,
        "folderId": folder_id,
        "order": order,
        "dataPath": data_path,
        "createdAt": T0,
        "updatedAt": T0
    })
}

fn book(id: &str, sheet_ids: &[&str]) -> BookDocument {
    let sheets: Vec<Value> = sheet_ids
        .iter()
        .map(|sheet_id| {
            json!({
                "id": sheet_id,
                "name": sheet_id,
                "gridSize": { "rows": 100, "cols": 26 },
                "settings": {},
                "rows": {}
            })
        })
        .collect();
    serde_json::from_value(json!({
        "schemaVersion": 1,
        "book": { "id": id, "name": id, "createdAt": T0, "updatedAt": T0, "properties": {} },
        "sheets": sheets
    }))
    .unwrap()
}

fn snapshot(folders: Value, refs: Vec<Value>, books: Vec<(&str, BookDocument)>) -> Snapshot {
    let index: WorkspaceIndex = serde_json::from_value(json!({
        "schemaVersion": 1,
        "workspace": {
            "id": "ws-1",
            "name": "Home",
            "createdAt": T0,
            "updatedAt": T0,
            "settings": {}
        },
        "folders": folders,
        "books": refs
    }))
    .unwrap();
    Snapshot::new(
        "/data/ws/workspace.json",
        index,
        books
            .into_iter()
            .map(|(path, document)| (path.to_string(), document))
            .collect(),
    )
}

#[test]
fn consistent_snapshot_has_no_issues() {
    let snap = snapshot(
        json!([{ "id": "folder-1", "name": "Work", "parentId": null, "order": 0 }]),
        vec![
            reference("book-001", "books/book-001.json", json!(null), json!(0)),
            reference("book-002", "books/book-002.json", json!("folder-1"), json!(0)),
        ],
        vec![
            ("/data/ws/books/book-001.json", book("book-001", &["sheet-001"])),
            ("/data/ws/books/book-002.json", book("book-002", &["sheet-002"])),
        ],
    );

    assert!(detect(&snap).is_empty());
}

#[test]
fn id_mismatch_reports_both_ids() {
    let snap = snapshot(
        json!([]),
        vec![reference("book-xyz", "books/book-001.json", json!(null), json!(0))],
        vec![("/data/ws/books/book-001.json", book("book-001", &["sheet-001"]))],
    );

    let issues = detect(&snap);
    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.id, "book-id-mismatch:book-xyz:book-001");
    match &issue.kind {
        IssueKind::BookIdMismatch {
            book_ref_id,
            book_file_id,
            workspace_index,
            book_file_path,
        } => {
            assert_eq!(book_ref_id, "book-xyz");
            assert_eq!(book_file_id, "book-001");
            assert_eq!(*workspace_index, 0);
            assert_eq!(book_file_path, "/data/ws/books/book-001.json");
        }
        other => panic!("unexpected issue: {other:?}"),
    }
}

#[test]
fn data_path_match_tolerates_separator_style() {
    let snap = snapshot(
        json!([]),
        vec![reference("book-001", "books\\book-001.json", json!(null), json!(0))],
        vec![("C:\\ws\\books\\book-001.json", book("book-001", &["sheet-001"]))],
    );

    assert!(detect(&snap).is_empty());
}

#[test]
fn falls_back_to_id_lookup_when_path_does_not_match() {
    let snap = snapshot(
        json!([]),
        vec![{
            let mut value = reference("book-001", "books/renamed.json", json!(null), json!(0));
            value["activeSheetId"] = json!("gone");
            value
        }],
        vec![("/data/ws/books/book-001.json", book("book-001", &["sheet-001"]))],
    );

    let issues = detect(&snap);
    assert_eq!(issues.len(), 1);
    assert!(matches!(
        &issues[0].kind,
        IssueKind::MissingActiveSheet { available_sheet_ids, .. }
            if available_sheet_ids == &vec!["sheet-001".to_string()]
    ));
}

#[test]
fn missing_active_sheet_and_folder_are_warnings() {
    let snap = snapshot(
        json!([]),
        vec![{
            let mut value =
                reference("book-001", "books/book-001.json", json!("folder-x"), json!(0));
            value["activeSheetId"] = json!("missing-sheet");
            value
        }],
        vec![("/data/ws/books/book-001.json", book("book-001", &["sheet-001"]))],
    );

    let issues = detect(&snap);
    let ids: Vec<&str> = issues.iter().map(|issue| issue.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "missing-active-sheet:book-001:missing-sheet",
            "missing-folder-reference:book-001:folder-x"
        ]
    );
    assert!(issues
        .iter()
        .all(|issue| issue.severity == Severity::Warning));
}

#[test]
fn non_finite_order_is_flagged() {
    let snap = snapshot(
        json!([]),
        vec![reference("book-001", "books/book-001.json", json!(null), json!(null))],
        vec![("/data/ws/books/book-001.json", book("book-001", &["sheet-001"]))],
    );

    let issues = detect(&snap);
    assert_eq!(issues.len(), 1);
    assert!(matches!(
        issues[0].kind,
        IssueKind::InvalidOrder {
            reason: OrderIssueReason::NonFinite,
            ..
        }
    ));
}

#[test]
fn triple_collision_flags_first_holder_once() {
    let snap = snapshot(
        json!([]),
        vec![
            reference("book-a", "books/book-a.json", json!(null), json!(0)),
            reference("book-b", "books/book-b.json", json!(null), json!(0)),
            reference("book-c", "books/book-c.json", json!(null), json!(0)),
            reference("book-d", "books/book-d.json", json!(null), json!(1)),
        ],
        vec![
            ("/data/ws/books/book-a.json", book("book-a", &[])),
            ("/data/ws/books/book-b.json", book("book-b", &[])),
            ("/data/ws/books/book-c.json", book("book-c", &[])),
            ("/data/ws/books/book-d.json", book("book-d", &[])),
        ],
    );

    let issues = detect(&snap);
    let ids: Vec<&str> = issues.iter().map(|issue| issue.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "invalid-order:book-a:root",
            "invalid-order:book-b:root",
            "invalid-order:book-c:root"
        ]
    );
}

#[test]
fn same_order_in_different_folders_is_not_a_collision() {
    let snap = snapshot(
        json!([{ "id": "folder-1", "name": "Work", "parentId": null, "order": 0 }]),
        vec![
            reference("book-a", "books/book-a.json", json!(null), json!(0)),
            reference("book-b", "books/book-b.json", json!("folder-1"), json!(0)),
        ],
        vec![
            ("/data/ws/books/book-a.json", book("book-a", &[])),
            ("/data/ws/books/book-b.json", book("book-b", &[])),
        ],
    );

    assert!(detect(&snap).is_empty());
}

#[test]
fn repeated_detection_yields_identical_issues() {
    let snap = snapshot(
        json!([]),
        vec![
            reference("book-xyz", "books/book-001.json", json!("nowhere"), json!(3)),
            reference("book-b", "books/book-b.json", json!("nowhere"), json!(3)),
        ],
        vec![
            ("/data/ws/books/book-001.json", book("book-001", &["sheet-001"])),
            ("/data/ws/books/book-b.json", book("book-b", &[])),
        ],
    );

    let first = detect(&snap);
    let second = detect(&snap);
    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}
