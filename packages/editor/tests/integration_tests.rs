//! Integration tests for editor crate

use proptree_editor::{
    ChangeDisposition, DocumentId, DocumentStore, EditAction, EditOutcome, MemoryStore,
    PathKey, RenderPatch, Session, SessionOptions, SessionState, Value, View,
};
use proptree_inference::SemanticType;
use proptree_renderer::WidgetKind;
use serde_json::json;
use std::time::{Duration, Instant};

fn path(p: &str) -> PathKey {
    PathKey::parse(p).unwrap()
}

fn open(doc: serde_json::Value) -> (Session<MemoryStore>, DocumentId, Instant) {
    let id = DocumentId::from("notes.json");
    let store = MemoryStore::new().with_document(id.clone(), doc);
    let mut session = Session::new(store, SessionOptions::default())
        .with_today(chrono::NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
    let now = Instant::now();
    session.select(Some(id.clone()), now);
    (session, id, now)
}

fn stored(session: &Session<MemoryStore>, id: &DocumentId) -> Value {
    session.store().get_document(id).unwrap()
}

#[test]
fn test_edit_session_workflow() {
    let (mut session, id, now) = open(json!({
        "title": "Draft",
        "tags": ["a"],
        "meta": { "draft": true }
    }));

    // Commit text, flip a toggle, add a field, append an item
    assert!(session
        .apply(
            EditAction::CommitText {
                path: path("title"),
                input: "Final".to_string()
            },
            now
        )
        .is_applied());
    assert!(session
        .apply(
            EditAction::SetToggle {
                path: path("meta.draft"),
                checked: false
            },
            now
        )
        .is_applied());
    assert!(session
        .apply(EditAction::AddField { parent: path("meta") }, now)
        .is_applied());
    assert!(session
        .apply(EditAction::AppendItem { list: path("tags") }, now)
        .is_applied());

    assert_eq!(
        stored(&session, &id),
        Value::from(json!({
            "title": "Final",
            "tags": ["a", "new item"],
            "meta": { "draft": false, "new_field": "" }
        }))
    );

    // Rendered tree follows the writes without a full refresh
    let tree = session.tree().unwrap();
    assert!(tree.find(&path("meta.new_field")).is_some());
    assert_eq!(tree.find(&path("tags")).unwrap().children.len(), 2);
}

#[test]
fn test_rename_keeps_position_and_fold_state() {
    let (mut session, id, now) = open(json!({
        "a": 1,
        "group": { "x": 1 },
        "c": 3
    }));

    session.apply(EditAction::ToggleFold { path: path("group") }, now);
    let outcome = session.apply(
        EditAction::Rename {
            path: path("group"),
            new_key: "renamed".to_string(),
        },
        now,
    );
    assert!(matches!(
        outcome,
        EditOutcome::Applied {
            patch: Some(RenderPatch::Renamed { widgets: 2, .. }),
            ..
        }
    ));

    let doc = stored(&session, &id);
    let keys: Vec<_> = doc.as_record().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["a", "renamed", "c"]);

    let renamed = session.tree().unwrap().find(&path("renamed")).unwrap();
    assert!(renamed.is_collapsed());
    assert_eq!(renamed.children[0].path, path("renamed.x"));
}

#[test]
fn test_rename_onto_existing_key_is_rejected() {
    let (mut session, id, now) = open(json!({ "a": 1, "b": 2 }));
    let outcome = session.apply(
        EditAction::Rename {
            path: path("a"),
            new_key: "b".to_string(),
        },
        now,
    );
    assert!(matches!(outcome, EditOutcome::Rejected(_)));
    assert_eq!(stored(&session, &id), Value::from(json!({ "a": 1, "b": 2 })));
}

#[test]
fn test_remove_record_from_list_splices() {
    let (mut session, id, now) = open(json!({
        "authors": [{ "name": "Ada" }, { "name": "Grace" }, { "name": "Joan" }]
    }));
    session.apply(EditAction::ToggleFold { path: path("authors.2") }, now);

    let outcome = session.apply(EditAction::Remove { path: path("authors.0") }, now);
    assert!(outcome.is_applied());

    assert_eq!(
        stored(&session, &id),
        Value::from(json!({ "authors": [{ "name": "Grace" }, { "name": "Joan" }] }))
    );

    // The collapsed element moved from index 2 to index 1
    let authors = session.tree().unwrap().find(&path("authors")).unwrap();
    assert_eq!(authors.children.len(), 2);
    assert!(authors.children[1].is_collapsed());
    assert!(!authors.children[0].is_collapsed());
}

#[test]
fn test_list_element_commit_reclassifies() {
    let (mut session, id, now) = open(json!({ "values": ["hello"] }));

    let outcome = session.apply(
        EditAction::CommitText {
            path: path("values.0"),
            input: "123".to_string(),
        },
        now,
    );

    match outcome {
        EditOutcome::Applied {
            type_changed,
            patch: Some(RenderPatch::Replaced { widget, .. }),
            ..
        } => {
            assert!(type_changed);
            assert_eq!(widget.declared, SemanticType::Number);
        }
        other => panic!("expected a type change, got {:?}", other),
    }
    assert_eq!(stored(&session, &id), Value::from(json!({ "values": [123] })));
}

#[test]
fn test_emptied_number_field_is_deleted() {
    let (mut session, id, now) = open(json!({ "count": 4, "name": "x" }));
    session.apply(
        EditAction::CommitText {
            path: path("count"),
            input: "".to_string(),
        },
        now,
    );
    assert_eq!(stored(&session, &id), Value::from(json!({ "name": "x" })));
    assert!(session.tree().unwrap().find(&path("count")).is_none());
}

#[test]
fn test_append_continues_date_sequence() {
    let (mut session, id, now) = open(json!({
        "weeks": ["2024-01-01", "2024-01-08", "2024-01-15"]
    }));
    session.apply(EditAction::AppendItem { list: path("weeks") }, now);
    assert_eq!(
        path("weeks.3").resolve(&stored(&session, &id)),
        Some(&Value::from("2024-01-22"))
    );
}

#[test]
fn test_external_edit_then_own_write() {
    let (mut session, id, start) = open(json!({ "a": "x" }));
    let later = start + Duration::from_millis(500);

    // Outside writer changes the document
    session
        .store()
        .write_external(&id, json!({ "a": "x", "b": "y" }))
        .unwrap();
    for notified in session.store().take_notifications() {
        assert!(matches!(
            session.content_changed(&notified, later),
            ChangeDisposition::Scheduled(_)
        ));
    }

    // Our own write lands before the refresh fires
    session.apply(
        EditAction::CommitText {
            path: path("a"),
            input: "z".to_string(),
        },
        later,
    );
    for notified in session.store().take_notifications() {
        assert_eq!(
            session.content_changed(&notified, later),
            ChangeDisposition::Suppressed
        );
    }

    // The external change still gets rendered
    let refresh = session
        .poll(later + Duration::from_millis(300))
        .expect("refresh is due");
    assert!(!refresh.patches.is_empty());
    assert!(session.tree().unwrap().find(&path("b")).is_some());
}

#[test]
fn test_rebinding_switches_documents() {
    let store = MemoryStore::new()
        .with_document("one", json!({ "a": 1 }))
        .with_document("two", json!({ "l": [1, 2] }));
    let mut session = Session::new(store, SessionOptions::default());
    let now = Instant::now();

    session.select(Some(DocumentId::from("one")), now);
    session.select(Some(DocumentId::from("two")), now);

    assert_eq!(session.state(), SessionState::Bound(DocumentId::from("two")));
    match session.view() {
        View::Tree { tree, .. } => {
            assert!(matches!(tree.roots[0].kind, WidgetKind::List { .. }));
        }
        other => panic!("expected tree, got {:?}", other),
    }

    // Notifications for the old document are ignored
    assert_eq!(
        session.content_changed(&DocumentId::from("one"), now + Duration::from_secs(1)),
        ChangeDisposition::NotBound
    );
}

#[test]
fn test_list_document_root() {
    let (mut session, id, now) = open(json!([{ "a": 1 }, { "a": 2 }]));
    let outcome = session.apply(EditAction::Remove { path: path("0") }, now);
    assert!(outcome.is_applied());
    assert_eq!(stored(&session, &id), Value::from(json!([{ "a": 2 }])));
    assert_eq!(session.tree().unwrap().roots.len(), 1);
}
