use crate::elements::Editor;
use crate::widget::{Widget, WidgetKind, WidgetTree};
use proptree_common::PathKey;
use serde::Serialize;
use std::mem::discriminant;

/// Edit to a rendered tree, addressed by sibling indices from the roots
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum WidgetPatch {
    Create { at: Vec<usize>, widget: Widget },
    Remove { at: Vec<usize> },
    Replace { at: Vec<usize>, widget: Widget },
    UpdateEditor { at: Vec<usize>, editor: Editor },
    UpdatePath {
        at: Vec<usize>,
        path: PathKey,
        label: String,
    },
    UpdateTypeLabel {
        at: Vec<usize>,
        type_label: Option<String>,
    },
    UpdateFold { at: Vec<usize>, collapsed: bool },
}

// Diff two widget trees and generate patches
pub fn diff_trees(old: &WidgetTree, new: &WidgetTree) -> Vec<WidgetPatch> {
    diff_siblings(&old.roots, &new.roots, &[])
}

fn diff_siblings(old: &[Widget], new: &[Widget], at: &[usize]) -> Vec<WidgetPatch> {
    let mut patches = Vec::new();
    let mut removals = Vec::new();

    let max_len = old.len().max(new.len());
    for i in 0..max_len {
        let mut child_at = at.to_vec();
        child_at.push(i);

        match (old.get(i), new.get(i)) {
            (None, Some(widget)) => patches.push(WidgetPatch::Create {
                at: child_at,
                widget: widget.clone(),
            }),
            // Removed from the back so earlier indices stay valid
            (Some(_), None) => removals.push(WidgetPatch::Remove { at: child_at }),
            (Some(old_widget), Some(new_widget)) => {
                patches.extend(diff_widget(old_widget, new_widget, child_at));
            }
            (None, None) => {}
        }
    }

    removals.reverse();
    patches.extend(removals);
    patches
}

fn diff_widget(old: &Widget, new: &Widget, at: Vec<usize>) -> Vec<WidgetPatch> {
    if !same_shape(old, new) {
        // Different widget kind or type - replace entire node
        return vec![WidgetPatch::Replace {
            at,
            widget: new.clone(),
        }];
    }

    let mut patches = Vec::new();

    if old.path != new.path || old.label != new.label {
        patches.push(WidgetPatch::UpdatePath {
            at: at.clone(),
            path: new.path.clone(),
            label: new.label.clone(),
        });
    }

    if old.type_label != new.type_label {
        patches.push(WidgetPatch::UpdateTypeLabel {
            at: at.clone(),
            type_label: new.type_label.clone(),
        });
    }

    match (&old.kind, &new.kind) {
        (WidgetKind::Field { editor: old_editor }, WidgetKind::Field { editor: new_editor }) => {
            if old_editor != new_editor {
                patches.push(WidgetPatch::UpdateEditor {
                    at,
                    editor: new_editor.clone(),
                });
            }
        }
        (WidgetKind::Group { collapsed: was }, WidgetKind::Group { collapsed: now }) => {
            if was != now {
                patches.push(WidgetPatch::UpdateFold {
                    at: at.clone(),
                    collapsed: *now,
                });
            }
            patches.extend(diff_siblings(&old.children, &new.children, &at));
        }
        _ => patches.extend(diff_siblings(&old.children, &new.children, &at)),
    }

    patches
}

fn same_shape(a: &Widget, b: &Widget) -> bool {
    discriminant(&a.kind) == discriminant(&b.kind)
        && a.declared == b.declared
        && a.affordances == b.affordances
        && match (&a.kind, &b.kind) {
            (WidgetKind::List { of_records: x }, WidgetKind::List { of_records: y }) => x == y,
            _ => true,
        }
}
