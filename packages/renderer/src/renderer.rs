//! # Tree Renderer
//!
//! Walks a document snapshot depth-first and builds the widget tree.
//!
//! ## Dispatch
//!
//! Each value is dispatched on its runtime shape:
//! - primitive → field with a leaf editor
//! - list → list widget whose elements are fields, groups or nested lists
//! - record → foldable group
//!
//! ## Render modes
//!
//! - **Full subtree build** recreates every descendant under a path.
//! - **Single-node patch** swaps exactly one widget at its sibling position,
//!   inserting or removing it when the document gained or lost the path.
//!   Siblings and ancestors keep their widgets and fold state.
//!
//! Fold state lives here, keyed by path, so it survives rebuilds.

use crate::elements::Editor;
use crate::error::{RenderError, RenderResult};
use crate::options::RenderOptions;
use crate::widget::{Affordance, Widget, WidgetId, WidgetKind, WidgetTree};
use proptree_common::{parse_index, PathKey, Record, Value};
use proptree_inference::{infer, InferenceOptions};
use serde::Serialize;
use std::collections::HashMap;

/// Localized change to a rendered tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "patch", rename_all = "kebab-case")]
pub enum RenderPatch {
    /// Everything under `path` was recreated (root path = whole tree)
    Rebuilt { path: PathKey },
    Replaced {
        path: PathKey,
        index: usize,
        widget: Widget,
    },
    Inserted {
        path: PathKey,
        index: usize,
        widget: Widget,
    },
    Removed { path: PathKey, index: usize },
    /// Widgets under `from` now live under `to`
    Renamed {
        from: PathKey,
        to: PathKey,
        widgets: usize,
    },
}

pub struct Renderer {
    options: RenderOptions,
    /// Collapsed state per group path
    folds: HashMap<PathKey, bool>,
    next_id: WidgetId,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            folds: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Build the whole tree for a document snapshot
    pub fn render(&mut self, doc: &Value) -> WidgetTree {
        let roots = match doc {
            Value::Record(record) => self.build_record(&PathKey::root(), record, 0),
            Value::List(items) => self.build_list(&PathKey::root(), items, 0),
            _ => {
                tracing::warn!("document root is a primitive, nothing to render");
                Vec::new()
            }
        };
        let tree = WidgetTree { roots };
        tracing::debug!(widgets = tree.len(), "rendered document");
        tree
    }

    /// Full subtree build: recreate every descendant of the widget at `path`
    pub fn rebuild_subtree(
        &mut self,
        tree: &mut WidgetTree,
        doc: &Value,
        path: &PathKey,
    ) -> RenderResult<RenderPatch> {
        if path.is_root() {
            *tree = self.render(doc);
            return Ok(RenderPatch::Rebuilt { path: path.clone() });
        }

        let value = path
            .resolve(doc)
            .ok_or_else(|| RenderError::NotInDocument(path.clone()))?;
        let in_list = parent_is_list(doc, path);
        let depth = tree
            .find(path)
            .map(|w| w.depth)
            .ok_or_else(|| RenderError::NotRendered(path.clone()))?;

        let fresh = self.build(path, value, depth, in_list);
        let widget = tree
            .find_mut(path)
            .ok_or_else(|| RenderError::NotRendered(path.clone()))?;
        let id = widget.id;
        *widget = Widget { id, ..fresh };

        tracing::debug!(path = %path, "rebuilt subtree");
        Ok(RenderPatch::Rebuilt { path: path.clone() })
    }

    /// Single-node patch of the widget at `path`
    pub fn patch_node(
        &mut self,
        tree: &mut WidgetTree,
        doc: &Value,
        path: &PathKey,
    ) -> RenderResult<RenderPatch> {
        if path.is_root() {
            return self.rebuild_subtree(tree, doc, path);
        }
        if self.options.is_hidden(path) {
            return Err(RenderError::Hidden(path.clone()));
        }

        let value = path.resolve(doc);
        let existing = tree.position(path);

        let patch = match (existing, value) {
            (Some(index), Some(value)) => {
                let depth = tree.find(path).map(|w| w.depth).unwrap_or(0);
                let widget = self.build(path, value, depth, parent_is_list(doc, path));
                let siblings = tree
                    .siblings_mut(path)
                    .ok_or_else(|| RenderError::NotRendered(path.clone()))?;
                siblings[index] = widget.clone();
                tracing::debug!(path = %path, index, "replaced widget");
                Ok(RenderPatch::Replaced {
                    path: path.clone(),
                    index,
                    widget,
                })
            }
            (Some(index), None) => {
                let siblings = tree
                    .siblings_mut(path)
                    .ok_or_else(|| RenderError::NotRendered(path.clone()))?;
                siblings.remove(index);
                self.forget(path);
                tracing::debug!(path = %path, index, "removed widget");
                Ok(RenderPatch::Removed {
                    path: path.clone(),
                    index,
                })
            }
            (None, Some(value)) => {
                let parent = path.parent().unwrap_or_default();
                let depth = if parent.is_root() {
                    0
                } else {
                    tree.find(&parent)
                        .map(|w| w.depth + 1)
                        .ok_or_else(|| RenderError::NotRendered(parent.clone()))?
                };
                let index = self.document_position(doc, path);
                let widget = self.build(path, value, depth, parent_is_list(doc, path));
                let siblings = tree
                    .siblings_mut(path)
                    .ok_or_else(|| RenderError::NotRendered(parent.clone()))?;
                let index = index.min(siblings.len());
                siblings.insert(index, widget.clone());
                tracing::debug!(path = %path, index, "inserted widget");
                Ok(RenderPatch::Inserted {
                    path: path.clone(),
                    index,
                    widget,
                })
            }
            (None, None) => Err(RenderError::NotRendered(path.clone())),
        }?;

        self.sync_parent_list(tree, doc, path);
        Ok(patch)
    }

    /// A changed element can flip whether its list holds only records
    fn sync_parent_list(&self, tree: &mut WidgetTree, doc: &Value, path: &PathKey) {
        let Some(parent) = path.parent().filter(|p| !p.is_root()) else {
            return;
        };
        let Some(live) = parent.resolve(doc) else {
            return;
        };
        if let Some(widget) = tree.find_mut(&parent) {
            if let WidgetKind::List { of_records } = &mut widget.kind {
                *of_records = live.is_list_of_records();
            }
        }
    }

    /// Flip the fold state of a group. Returns the new collapsed state.
    pub fn toggle_fold(&mut self, tree: &mut WidgetTree, path: &PathKey) -> RenderResult<bool> {
        let widget = tree
            .find_mut(path)
            .ok_or_else(|| RenderError::NotRendered(path.clone()))?;
        match &mut widget.kind {
            WidgetKind::Group { collapsed } => {
                *collapsed = !*collapsed;
                self.folds.insert(path.clone(), *collapsed);
                Ok(*collapsed)
            }
            _ => Err(RenderError::NotRendered(path.clone())),
        }
    }

    pub fn is_collapsed(&self, path: &PathKey) -> bool {
        self.folds.get(path).copied().unwrap_or(false)
    }

    /// Move widgets and fold state from `old` to `new` after a key rename
    pub fn rename(&mut self, tree: &mut WidgetTree, old: &PathKey, new: &PathKey) -> usize {
        let folds = std::mem::take(&mut self.folds);
        self.folds = folds
            .into_iter()
            .map(|(path, collapsed)| {
                let path = path.with_prefix_replaced(old, new).unwrap_or(path);
                (path, collapsed)
            })
            .collect();
        tree.rewrite_prefix(old, new)
    }

    /// Shift fold state after removing element `index` from the list at
    /// `list`: later elements move down by one.
    pub fn forget_list_element(&mut self, list: &PathKey, index: usize) {
        let depth = list.len();
        let folds = std::mem::take(&mut self.folds);
        self.folds = folds
            .into_iter()
            .filter_map(|(path, collapsed)| {
                if !path.starts_with(list) || path.len() <= depth {
                    return Some((path, collapsed));
                }
                let segments = path.segments();
                match parse_index(&segments[depth]) {
                    Some(i) if i == index => None,
                    Some(i) if i > index => {
                        let mut shifted = segments.to_vec();
                        shifted[depth] = (i - 1).to_string();
                        PathKey::from_segments(shifted).ok().map(|p| (p, collapsed))
                    }
                    _ => Some((path, collapsed)),
                }
            })
            .collect();
    }

    fn forget(&mut self, path: &PathKey) {
        self.folds.retain(|p, _| !p.starts_with(path));
    }

    fn next_id(&mut self) -> WidgetId {
        self.next_id += 1;
        self.next_id
    }

    /// Dispatch one value into the matching sub-renderer
    fn build(&mut self, path: &PathKey, value: &Value, depth: usize, in_list: bool) -> Widget {
        let inferred = infer(value, &InferenceOptions::syntax_only());

        let (kind, children, mut affordances) = match value {
            Value::List(items) => (
                WidgetKind::List {
                    of_records: value.is_list_of_records(),
                },
                self.build_list(path, items, depth + 1),
                vec![Affordance::AddItem],
            ),
            Value::Record(record) => (
                WidgetKind::Group {
                    collapsed: self.is_collapsed(path),
                },
                self.build_record(path, record, depth + 1),
                vec![Affordance::AddField, Affordance::ToggleFold],
            ),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => (
                WidgetKind::Field {
                    editor: Editor::for_value(value, &inferred),
                },
                Vec::new(),
                Vec::new(),
            ),
        };

        affordances.push(Affordance::ChangeType);
        if in_list {
            affordances.push(Affordance::RemoveItem);
        } else {
            affordances.extend([Affordance::RenameField, Affordance::RemoveField]);
        }

        Widget {
            id: self.next_id(),
            path: path.clone(),
            label: path.leaf().unwrap_or_default().to_string(),
            depth,
            declared: inferred.ty,
            type_label: self
                .options
                .show_type_labels
                .then(|| inferred.ty.name().to_string()),
            kind,
            affordances,
            children,
        }
    }

    fn build_record(&mut self, path: &PathKey, record: &Record, depth: usize) -> Vec<Widget> {
        let mut widgets = Vec::with_capacity(record.len());
        for (key, value) in record {
            let child = path.child(key);
            if self.options.is_hidden(&child) {
                continue;
            }
            widgets.push(self.build(&child, value, depth, false));
        }
        widgets
    }

    fn build_list(&mut self, path: &PathKey, items: &[Value], depth: usize) -> Vec<Widget> {
        let mut widgets = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let child = path.child(index);
            if self.options.is_hidden(&child) {
                continue;
            }
            widgets.push(self.build(&child, item, depth, true));
        }
        widgets
    }

    /// Sibling index a path would occupy in the rendered parent
    fn document_position(&self, doc: &Value, path: &PathKey) -> usize {
        let parent = path.parent().unwrap_or_default();
        let leaf = path.leaf().unwrap_or_default();
        match parent.resolve(doc) {
            Some(Value::Record(record)) => record
                .keys()
                .take_while(|k| k.as_str() != leaf)
                .filter(|k| !self.options.is_hidden(&parent.child(k)))
                .count(),
            Some(Value::List(items)) => parse_index(leaf)
                .map(|index| {
                    (0..index.min(items.len()))
                        .filter(|i| !self.options.is_hidden(&parent.child(i)))
                        .count()
                })
                .unwrap_or(items.len()),
            _ => 0,
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

fn parent_is_list(doc: &Value, path: &PathKey) -> bool {
    path.parent()
        .and_then(|parent| parent.resolve(doc))
        .map(|parent| matches!(parent, Value::List(_)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptree_inference::SemanticType;
    use serde_json::json;

    fn path(p: &str) -> PathKey {
        PathKey::parse(p).unwrap()
    }

    fn sample() -> Value {
        Value::from(json!({
            "title": "Notes",
            "due": "2024-02-01",
            "tags": ["a", "[[B]]"],
            "authors": [
                { "name": "Ada" },
                { "name": "Grace" }
            ],
            "meta": { "draft": true }
        }))
    }

    #[test]
    fn test_render_dispatches_by_shape() {
        let mut renderer = Renderer::default();
        let tree = renderer.render(&sample());

        assert_eq!(tree.roots.len(), 5);
        let title = tree.find(&path("title")).unwrap();
        assert!(matches!(title.kind, WidgetKind::Field { .. }));
        assert_eq!(tree.find(&path("due")).unwrap().declared, SemanticType::Date);

        let tags = tree.find(&path("tags")).unwrap();
        assert_eq!(tags.kind, WidgetKind::List { of_records: false });
        assert_eq!(tags.children.len(), 2);
        assert_eq!(tags.children[1].declared, SemanticType::Link);

        let authors = tree.find(&path("authors")).unwrap();
        assert_eq!(authors.kind, WidgetKind::List { of_records: true });
        assert!(authors.children[0].has(Affordance::RemoveItem));
        assert!(!authors.children[0].has(Affordance::RemoveField));

        let meta = tree.find(&path("meta")).unwrap();
        assert_eq!(meta.kind, WidgetKind::Group { collapsed: false });
        assert_eq!(meta.children[0].depth, 1);
    }

    #[test]
    fn test_hidden_paths_are_skipped() {
        let options = RenderOptions::default().with_hidden([path("meta"), path("tags.0")]);
        let mut renderer = Renderer::new(options);
        let tree = renderer.render(&sample());

        assert!(tree.find(&path("meta")).is_none());
        assert!(tree.find(&path("meta.draft")).is_none());
        let tags = tree.find(&path("tags")).unwrap();
        assert_eq!(tags.children.len(), 1);
        assert_eq!(tags.children[0].path, path("tags.1"));
    }

    #[test]
    fn test_type_labels_are_optional() {
        let mut renderer = Renderer::new(RenderOptions::default().with_type_labels(true));
        let tree = renderer.render(&sample());
        assert_eq!(
            tree.find(&path("due")).unwrap().type_label.as_deref(),
            Some("date")
        );

        let mut plain = Renderer::default();
        assert!(plain.render(&sample()).find(&path("due")).unwrap().type_label.is_none());
    }

    #[test]
    fn test_patch_replaces_in_place_and_keeps_siblings() {
        let mut renderer = Renderer::default();
        let mut doc = sample();
        let mut tree = renderer.render(&doc);
        let sibling_ids: Vec<_> = tree.roots.iter().map(|w| w.id).collect();

        *path("due").resolve_mut(&mut doc).unwrap() = Value::from("soon");
        let patch = renderer.patch_node(&mut tree, &doc, &path("due")).unwrap();

        match patch {
            RenderPatch::Replaced { index, widget, .. } => {
                assert_eq!(index, 1);
                assert_eq!(widget.declared, SemanticType::String);
            }
            other => panic!("expected replace, got {:?}", other),
        }
        assert_eq!(tree.roots[0].id, sibling_ids[0]);
        assert_eq!(tree.roots[2].id, sibling_ids[2]);
        assert_ne!(tree.roots[1].id, sibling_ids[1]);
    }

    #[test]
    fn test_patch_inserts_at_document_position() {
        let mut renderer = Renderer::default();
        let mut doc = Value::from(json!({ "a": 1, "c": 3 }));
        let mut tree = renderer.render(&doc);

        doc = Value::from(json!({ "a": 1, "b": 2, "c": 3 }));
        let patch = renderer.patch_node(&mut tree, &doc, &path("b")).unwrap();

        assert!(matches!(patch, RenderPatch::Inserted { index: 1, .. }));
        let labels: Vec<_> = tree.roots.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_patch_removes_missing_node() {
        let mut renderer = Renderer::default();
        let mut tree = renderer.render(&Value::from(json!({ "a": 1, "b": 2 })));
        let doc = Value::from(json!({ "a": 1 }));

        let patch = renderer.patch_node(&mut tree, &doc, &path("b")).unwrap();
        assert_eq!(
            patch,
            RenderPatch::Removed {
                path: path("b"),
                index: 1
            }
        );
        assert_eq!(tree.roots.len(), 1);
    }

    #[test]
    fn test_fold_state_survives_rebuild_of_parent() {
        let mut renderer = Renderer::default();
        let doc = sample();
        let mut tree = renderer.render(&doc);

        assert!(renderer.toggle_fold(&mut tree, &path("authors.1")).unwrap());
        renderer.patch_node(&mut tree, &doc, &path("authors")).unwrap();

        assert!(tree.find(&path("authors.1")).unwrap().is_collapsed());
        assert!(!tree.find(&path("authors.0")).unwrap().is_collapsed());
    }

    #[test]
    fn test_fold_state_shifts_with_list_removal() {
        let mut renderer = Renderer::default();
        let doc = sample();
        let mut tree = renderer.render(&doc);
        renderer.toggle_fold(&mut tree, &path("authors.1")).unwrap();

        renderer.forget_list_element(&path("authors"), 0);
        assert!(renderer.is_collapsed(&path("authors.0")));
        assert!(!renderer.is_collapsed(&path("authors.1")));
    }

    #[test]
    fn test_rename_rewrites_descendant_paths() {
        let mut renderer = Renderer::default();
        let mut tree = renderer.render(&sample());
        renderer.toggle_fold(&mut tree, &path("meta")).unwrap();

        let moved = renderer.rename(&mut tree, &path("meta"), &path("info"));
        assert_eq!(moved, 2);

        let info = tree.find(&path("info")).unwrap();
        assert_eq!(info.label, "info");
        assert_eq!(info.children[0].path, path("info.draft"));
        assert!(renderer.is_collapsed(&path("info")));
    }

    #[test]
    fn test_rebuild_subtree_keeps_container_identity() {
        let mut renderer = Renderer::default();
        let mut doc = sample();
        let mut tree = renderer.render(&doc);
        let id = tree.find(&path("tags")).unwrap().id;

        if let Some(Value::List(items)) = path("tags").resolve_mut(&mut doc) {
            items.push(Value::from("c"));
        }
        renderer.rebuild_subtree(&mut tree, &doc, &path("tags")).unwrap();

        let tags = tree.find(&path("tags")).unwrap();
        assert_eq!(tags.id, id);
        assert_eq!(tags.children.len(), 3);
    }
}
