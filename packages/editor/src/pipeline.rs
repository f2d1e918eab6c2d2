//! # Editing Pipeline
//!
//! Turns a widget action into the mutation to write and the part of the
//! view to re-render afterwards:
//!
//! ```text
//! EditAction + live document → Plan { mutation, render target }
//! ```
//!
//! Planning reads the live document, never the rendered tree, so a value
//! changed by another writer since the last render is what gets edited.

use crate::errors::EditorError;
use crate::mutations::Mutation;
use chrono::NaiveDate;
use proptree_common::{ContainerKind, PathKey, Record, Value};
use proptree_inference::{
    array_default_on, coerce, convert, infer_type, Coercion, InferenceOptions, SemanticType,
};
use proptree_inference::array_default::NEW_FIELD;
use serde::{Deserialize, Serialize};

/// Actions a host can trigger on a rendered widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum EditAction {
    /// Text committed from a leaf editor
    CommitText { path: PathKey, input: String },

    SetToggle { path: PathKey, checked: bool },

    /// Add a field to the record at `parent` (root for top level)
    AddField { parent: PathKey },

    AppendItem { list: PathKey },

    /// Remove a record field or a list element
    Remove { path: PathKey },

    Rename { path: PathKey, new_key: String },

    ChangeType {
        path: PathKey,
        #[serde(rename = "type")]
        ty: SemanticType,
    },

    ToggleFold { path: PathKey },
}

impl EditAction {
    pub fn path(&self) -> &PathKey {
        match self {
            EditAction::CommitText { path, .. }
            | EditAction::SetToggle { path, .. }
            | EditAction::Remove { path }
            | EditAction::Rename { path, .. }
            | EditAction::ChangeType { path, .. }
            | EditAction::ToggleFold { path } => path,
            EditAction::AddField { parent } => parent,
            EditAction::AppendItem { list } => list,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditAction::CommitText { .. } => "commit-text",
            EditAction::SetToggle { .. } => "set-toggle",
            EditAction::AddField { .. } => "add-field",
            EditAction::AppendItem { .. } => "append-item",
            EditAction::Remove { .. } => "remove",
            EditAction::Rename { .. } => "rename",
            EditAction::ChangeType { .. } => "change-type",
            EditAction::ToggleFold { .. } => "toggle-fold",
        }
    }
}

/// Part of the view to update once the write lands
#[derive(Debug, Clone, PartialEq)]
pub enum RenderTarget {
    /// Single-node patch at this path
    Node(PathKey),

    /// Full rebuild of a container after an element was removed
    RemovedElement { list: PathKey, index: usize },

    /// Move widgets from one key to another
    Renamed { from: PathKey, to: PathKey },
}

/// Mutation to write plus what to re-render
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub mutation: Mutation,
    pub target: RenderTarget,
    /// Present for committed text
    pub coercion: Option<Coercion>,
}

/// Inputs that do not come from the document itself
#[derive(Debug, Clone, Copy)]
pub struct PlanContext {
    /// Type the widget was rendered with, when known
    pub declared: Option<SemanticType>,
    /// Parent shape the widget was rendered under
    pub rendered_parent: Option<ContainerKind>,
    pub today: NaiveDate,
}

/// Plan a mutating action. Returns `None` for view-only actions.
pub fn plan(action: &EditAction, doc: &Value, ctx: PlanContext) -> Result<Option<Plan>, EditorError> {
    let plan = match action {
        EditAction::ToggleFold { .. } => return Ok(None),

        EditAction::CommitText { path, input } => {
            let current = live(doc, path)?;
            let declared = ctx
                .declared
                .unwrap_or_else(|| infer_type(current, &InferenceOptions::syntax_only()));
            let options = if parent_kind(doc, path) == Some(ContainerKind::List) {
                InferenceOptions::conversion()
            } else {
                InferenceOptions::syntax_only()
            };
            let coercion = coerce(declared, current, input, &options).map_err(|source| {
                EditorError::InvalidTypeConversion {
                    path: path.clone(),
                    source,
                }
            })?;
            Plan {
                mutation: Mutation::Set {
                    path: path.clone(),
                    value: Some(coercion.converted.clone()),
                    ty: coercion.detected,
                },
                target: RenderTarget::Node(path.clone()),
                coercion: Some(coercion),
            }
        }

        EditAction::SetToggle { path, checked } => {
            live(doc, path)?;
            Plan {
                mutation: Mutation::set(path.clone(), *checked, SemanticType::Boolean),
                target: RenderTarget::Node(path.clone()),
                coercion: None,
            }
        }

        EditAction::AddField { parent } => {
            let record = match live(doc, parent)? {
                Value::Record(record) => record,
                other => return Err(mismatch(parent, "record", other)),
            };
            let path = parent.child(unique_key(record, NEW_FIELD));
            Plan {
                mutation: Mutation::set(path.clone(), "", SemanticType::String),
                target: RenderTarget::Node(path),
                coercion: None,
            }
        }

        EditAction::AppendItem { list } => {
            let items = match live(doc, list)? {
                Value::List(items) => items,
                other => return Err(mismatch(list, "list", other)),
            };
            let default = array_default_on(items, ctx.today);
            let path = list.child(items.len());
            Plan {
                mutation: Mutation::Set {
                    path: path.clone(),
                    value: Some(default.value),
                    ty: default.ty,
                },
                target: RenderTarget::Node(path),
                coercion: None,
            }
        }

        EditAction::Remove { path } => {
            let parent = path.parent().unwrap_or_default();
            let expected = ctx.rendered_parent.or_else(|| parent_kind(doc, path));
            let target = match (expected, path.leaf().and_then(proptree_common::parse_index)) {
                (Some(ContainerKind::List), Some(index)) => RenderTarget::RemovedElement {
                    list: parent,
                    index,
                },
                _ => RenderTarget::Node(path.clone()),
            };
            Plan {
                mutation: Mutation::Delete {
                    path: path.clone(),
                    expected_parent: expected,
                },
                target,
                coercion: None,
            }
        }

        EditAction::Rename { path, new_key } => Plan {
            mutation: Mutation::rename(path.clone(), new_key.clone()),
            target: RenderTarget::Renamed {
                from: path.clone(),
                to: path.with_leaf(new_key.clone()),
            },
            coercion: None,
        },

        EditAction::ChangeType { path, ty } => {
            let current = live(doc, path)?;
            let converted = convert(current, *ty).map_err(|source| {
                EditorError::InvalidTypeConversion {
                    path: path.clone(),
                    source,
                }
            })?;
            Plan {
                mutation: Mutation::Set {
                    path: path.clone(),
                    value: Some(converted),
                    ty: *ty,
                },
                target: RenderTarget::Node(path.clone()),
                coercion: None,
            }
        }
    };

    Ok(Some(plan))
}

/// Shape of the container holding `path` in the live document
pub fn parent_kind(doc: &Value, path: &PathKey) -> Option<ContainerKind> {
    path.parent()?.resolve(doc)?.container_kind()
}

/// `base`, or `base_2`, `base_3`... whichever is free first
pub fn unique_key(record: &Record, base: &str) -> String {
    if !record.contains_key(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|key| !record.contains_key(key))
        .unwrap_or_else(|| base.to_string())
}

fn live<'a>(doc: &'a Value, path: &PathKey) -> Result<&'a Value, EditorError> {
    path.resolve(doc)
        .ok_or_else(|| EditorError::NotInDocument(path.clone()))
}

fn mismatch(path: &PathKey, expected: &str, found: &Value) -> EditorError {
    EditorError::Mutation(crate::mutations::MutationError::StructuralMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        found: found
            .container_kind()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "primitive".to_string()),
    })
}
