//! A patched tree must look exactly like a fresh render of the new document

use proptree_common::{PathKey, Value};
use proptree_renderer::{diff_trees, RenderOptions, Renderer, WidgetPatch};
use serde_json::json;

fn path(p: &str) -> PathKey {
    PathKey::parse(p).unwrap()
}

fn assert_patch_matches_render(before: serde_json::Value, after: serde_json::Value, at: &str) {
    let before = Value::from(before);
    let after = Value::from(after);

    let mut renderer = Renderer::new(RenderOptions::default().with_type_labels(true));
    let mut patched = renderer.render(&before);
    renderer.patch_node(&mut patched, &after, &path(at)).unwrap();

    let fresh = renderer.render(&after);
    let patches: Vec<WidgetPatch> = diff_trees(&patched, &fresh);
    assert!(patches.is_empty(), "patched tree differs: {:?}", patches);
}

#[test]
fn test_type_change_patch() {
    assert_patch_matches_render(
        json!({ "a": 1, "b": "text", "c": true }),
        json!({ "a": 1, "b": "[[text]]", "c": true }),
        "b",
    );
}

#[test]
fn test_added_field_patch() {
    assert_patch_matches_render(
        json!({ "meta": { "x": 1, "z": 3 } }),
        json!({ "meta": { "x": 1, "y": "2024-01-01", "z": 3 } }),
        "meta.y",
    );
}

#[test]
fn test_removed_field_patch() {
    assert_patch_matches_render(
        json!({ "a": 1, "b": [1, 2], "c": 3 }),
        json!({ "a": 1, "c": 3 }),
        "b",
    );
}

#[test]
fn test_appended_element_patch() {
    assert_patch_matches_render(
        json!({ "rows": [{ "n": 1 }] }),
        json!({ "rows": [{ "n": 1 }, { "n": 2 }] }),
        "rows.1",
    );
}

#[test]
fn test_container_rebuild_after_splice() {
    let before = Value::from(json!({ "l": ["a", "b", "c"] }));
    let after = Value::from(json!({ "l": ["a", "c"] }));

    let mut renderer = Renderer::default();
    let mut tree = renderer.render(&before);
    renderer.forget_list_element(&path("l"), 1);
    renderer.rebuild_subtree(&mut tree, &after, &path("l")).unwrap();

    assert!(diff_trees(&tree, &renderer.render(&after)).is_empty());
}

#[test]
fn test_first_record_element_marks_list_of_records() {
    assert_patch_matches_render(
        json!({ "rows": [] }),
        json!({ "rows": [{ "new_field": "new item" }] }),
        "rows.0",
    );
}

#[test]
fn test_element_changed_to_record_marks_list_of_records() {
    assert_patch_matches_render(
        json!({ "rows": ["a"] }),
        json!({ "rows": [{ "a": "a" }] }),
        "rows.0",
    );
}

#[test]
fn test_last_record_changed_to_primitive_clears_list_of_records() {
    assert_patch_matches_render(
        json!({ "rows": [{ "n": 1 }] }),
        json!({ "rows": ["n"] }),
        "rows.0",
    );
}
