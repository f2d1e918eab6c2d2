//! # Path-Addressed Mutations
//!
//! SET / DELETE / RENAME against an in-memory document tree.
//!
//! ## Mutation Semantics
//!
//! ### Set
//! - Encodes the value in the canonical stored form of its semantic type
//! - Missing intermediate containers are created as empty records
//! - NaN, an empty record or no value at all behaves as Delete
//! - On a list, index == len appends
//!
//! ### Delete
//! - List parent: removes the element, later indices shift down
//! - Record parent: removes the key, other keys keep their order
//! - Deleting something already gone is a no-op
//!
//! ### Rename
//! - Same ordinal position, same value, all other keys untouched
//!
//! Whether a segment is a key or an index is decided by the live parent
//! container, never by the segment text.

use proptree_common::{parse_index, ContainerKind, PathError, PathKey, Record, Value};
use proptree_inference::{encode_value, InferenceError, SemanticType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Path-addressed mutations over a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Mutation {
    Set {
        path: PathKey,
        value: Option<Value>,
        #[serde(rename = "type")]
        ty: SemanticType,
    },

    Delete {
        path: PathKey,
        /// Parent shape observed when the action was issued
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_parent: Option<ContainerKind>,
    },

    Rename {
        path: PathKey,
        new_key: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Malformed path: {0}")]
    MalformedPath(#[from] PathError),

    #[error("Structural mismatch at '{path}': expected {expected}, found {found}")]
    StructuralMismatch {
        path: PathKey,
        expected: String,
        found: String,
    },

    #[error("Invalid type conversion: {0}")]
    InvalidTypeConversion(#[from] InferenceError),

    #[error("Key '{key}' already exists next to '{path}'")]
    KeyExists { path: PathKey, key: String },

    #[error("Nothing to rename at '{0}'")]
    NotFound(PathKey),
}

/// What a successful mutation did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationEffect {
    Set,
    Deleted,
    Renamed,
    Unchanged,
}

impl Mutation {
    pub fn set(path: PathKey, value: impl Into<Value>, ty: SemanticType) -> Self {
        Mutation::Set {
            path,
            value: Some(value.into()),
            ty,
        }
    }

    pub fn delete(path: PathKey) -> Self {
        Mutation::Delete {
            path,
            expected_parent: None,
        }
    }

    pub fn rename(path: PathKey, new_key: impl Into<String>) -> Self {
        Mutation::Rename {
            path,
            new_key: new_key.into(),
        }
    }

    pub fn path(&self) -> &PathKey {
        match self {
            Mutation::Set { path, .. } | Mutation::Delete { path, .. } | Mutation::Rename { path, .. } => path,
        }
    }

    /// Get a debug name for this mutation
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Set { .. } => "set",
            Mutation::Delete { .. } => "delete",
            Mutation::Rename { .. } => "rename",
        }
    }

    /// Apply mutation to a document tree
    pub fn apply(&self, doc: &mut Value) -> Result<MutationEffect, MutationError> {
        match self {
            Mutation::Set { path, value, ty } => Self::apply_set(doc, path, value.as_ref(), *ty),
            Mutation::Delete {
                path,
                expected_parent,
            } => Self::apply_delete(doc, path, *expected_parent),
            Mutation::Rename { path, new_key } => Self::apply_rename(doc, path, new_key),
        }
    }

    fn apply_set(
        doc: &mut Value,
        path: &PathKey,
        value: Option<&Value>,
        ty: SemanticType,
    ) -> Result<MutationEffect, MutationError> {
        let (parent_path, leaf) = split(path)?;

        let encoded = match value {
            Some(value) => Some(encode_value(ty, value)?),
            None => None,
        };
        let encoded = match encoded {
            Some(v) if !v.is_vacant() => v,
            _ => return Self::apply_delete(doc, path, None),
        };

        let parent = ensure_container(doc, &parent_path)?;
        match parent {
            Value::Record(map) => {
                if map.get(leaf) == Some(&encoded) {
                    return Ok(MutationEffect::Unchanged);
                }
                map.insert(leaf.to_string(), encoded);
                Ok(MutationEffect::Set)
            }
            Value::List(items) => {
                let index = list_index(leaf, items.len() + 1)?;
                if index == items.len() {
                    items.push(encoded);
                } else if items[index] == encoded {
                    return Ok(MutationEffect::Unchanged);
                } else {
                    items[index] = encoded;
                }
                Ok(MutationEffect::Set)
            }
            other => Err(mismatch(&parent_path, "container", other)),
        }
    }

    fn apply_delete(
        doc: &mut Value,
        path: &PathKey,
        expected_parent: Option<ContainerKind>,
    ) -> Result<MutationEffect, MutationError> {
        let (parent_path, leaf) = split(path)?;

        let Some(parent) = parent_path.resolve_mut(doc) else {
            return Ok(MutationEffect::Unchanged);
        };

        if let Some(expected) = expected_parent {
            if parent.container_kind() != Some(expected) {
                return Err(mismatch(&parent_path, &expected.to_string(), parent));
            }
        }

        match parent {
            Value::List(items) => {
                let index = list_index(leaf, items.len())?;
                items.remove(index);
                Ok(MutationEffect::Deleted)
            }
            Value::Record(map) => Ok(match map.shift_remove(leaf) {
                Some(_) => MutationEffect::Deleted,
                None => MutationEffect::Unchanged,
            }),
            other => Err(mismatch(&parent_path, "container", other)),
        }
    }

    fn apply_rename(
        doc: &mut Value,
        path: &PathKey,
        new_key: &str,
    ) -> Result<MutationEffect, MutationError> {
        let (parent_path, old_key) = split(path)?;
        if new_key.is_empty() || new_key.contains('.') {
            return Err(PathError::EmptySegment {
                path: parent_path.child(new_key).to_string(),
                position: path.len() - 1,
            }
            .into());
        }

        let parent = parent_path
            .resolve_mut(doc)
            .ok_or_else(|| MutationError::NotFound(path.clone()))?;
        let Value::Record(map) = parent else {
            return Err(mismatch(&parent_path, "record", parent));
        };

        if !map.contains_key(old_key) {
            return Err(MutationError::NotFound(path.clone()));
        }
        if old_key == new_key {
            return Ok(MutationEffect::Unchanged);
        }
        if map.contains_key(new_key) {
            return Err(MutationError::KeyExists {
                path: path.clone(),
                key: new_key.to_string(),
            });
        }

        let renamed: Record = std::mem::take(map)
            .into_iter()
            .map(|(key, value)| {
                if key == old_key {
                    (new_key.to_string(), value)
                } else {
                    (key, value)
                }
            })
            .collect();
        *map = renamed;
        Ok(MutationEffect::Renamed)
    }
}

fn split(path: &PathKey) -> Result<(PathKey, &str), MutationError> {
    match (path.parent(), path.leaf()) {
        (Some(parent), Some(leaf)) => Ok((parent, leaf)),
        _ => Err(PathError::Empty.into()),
    }
}

fn list_index(segment: &str, len: usize) -> Result<usize, MutationError> {
    let index = parse_index(segment).ok_or_else(|| PathError::NotAnIndex {
        segment: segment.to_string(),
    })?;
    if index >= len {
        return Err(PathError::IndexOutOfRange {
            segment: segment.to_string(),
            len,
        }
        .into());
    }
    Ok(index)
}

fn shape_name(value: &Value) -> String {
    match value.container_kind() {
        Some(kind) => kind.to_string(),
        None => "primitive".to_string(),
    }
}

fn mismatch(path: &PathKey, expected: &str, found: &Value) -> MutationError {
    MutationError::StructuralMismatch {
        path: path.clone(),
        expected: expected.to_string(),
        found: shape_name(found),
    }
}

/// Walk to the container at `path`, creating missing records on the way
fn ensure_container<'a>(doc: &'a mut Value, path: &PathKey) -> Result<&'a mut Value, MutationError> {
    let mut current = doc;
    let mut walked = PathKey::root();
    for segment in path.segments() {
        current = match current {
            Value::Record(map) => map
                .entry(segment.clone())
                .or_insert_with(Value::empty_record),
            Value::List(items) => {
                let index = list_index(segment, items.len())?;
                &mut items[index]
            }
            other => return Err(mismatch(&walked, "container", other)),
        };
        walked = walked.child(segment);
    }
    Ok(current)
}
