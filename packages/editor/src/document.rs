//! # Document Store Hook
//!
//! The editor never owns documents. It reads snapshots and submits edits
//! through [`DocumentStore`], which the host implements.
//!
//! ## Contract
//!
//! - `get_document` returns a snapshot, or `None` when the id is unknown
//! - `apply_edit` runs the edit against the stored document atomically:
//!   if the edit fails nothing is written
//! - A store emits a content-changed notification only for edits that
//!   actually changed the document

use crate::errors::StoreError;
use crate::mutations::MutationError;
use proptree_common::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Identifier of a document inside a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Whether an edit modified the stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteOutcome {
    Changed,
    Unchanged,
}

/// Edit callback run against a mutable copy of a document
pub type Edit<'a> = dyn FnMut(&mut Value) -> Result<(), MutationError> + 'a;

pub trait DocumentStore {
    fn get_document(&self, id: &DocumentId) -> Option<Value>;

    fn apply_edit(&self, id: &DocumentId, edit: &mut Edit<'_>) -> Result<WriteOutcome, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn get_document(&self, id: &DocumentId) -> Option<Value> {
        (**self).get_document(id)
    }

    fn apply_edit(&self, id: &DocumentId, edit: &mut Edit<'_>) -> Result<WriteOutcome, StoreError> {
        (**self).apply_edit(id, edit)
    }
}

/// Run `edit` on a copy of `current`. Returns the new document only when
/// the edit succeeded and changed something.
pub fn edit_copy(current: &Value, edit: &mut Edit<'_>) -> Result<Option<Value>, StoreError> {
    let mut draft = current.clone();
    edit(&mut draft)?;
    if &draft == current {
        Ok(None)
    } else {
        Ok(Some(draft))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: HashMap<DocumentId, Value>,
    notifications: Vec<DocumentId>,
}

/// In-memory store for tests and embedding. Records one notification per
/// changing write, drained with [`MemoryStore::take_notifications`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: impl Into<DocumentId>, doc: impl Into<Value>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.documents.insert(id.into(), doc.into());
        }
        self
    }

    /// Replace a document as an outside writer would
    pub fn write_external(&self, id: &DocumentId, doc: impl Into<Value>) -> Result<(), StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        state.documents.insert(id.clone(), doc.into());
        state.notifications.push(id.clone());
        Ok(())
    }

    pub fn remove(&self, id: &DocumentId) -> Result<Option<Value>, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.documents.remove(id))
    }

    /// Notifications emitted since the last call, oldest first
    pub fn take_notifications(&self) -> Vec<DocumentId> {
        match self.state.lock() {
            Ok(mut state) => std::mem::take(&mut state.notifications),
            Err(_) => Vec::new(),
        }
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl DocumentStore for MemoryStore {
    fn get_document(&self, id: &DocumentId) -> Option<Value> {
        self.state.lock().ok()?.documents.get(id).cloned()
    }

    fn apply_edit(&self, id: &DocumentId, edit: &mut Edit<'_>) -> Result<WriteOutcome, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        let current = state
            .documents
            .get(id)
            .ok_or_else(|| StoreError::Missing(id.clone()))?;

        match edit_copy(current, edit)? {
            Some(next) => {
                state.documents.insert(id.clone(), next);
                state.notifications.push(id.clone());
                Ok(WriteOutcome::Changed)
            }
            None => Ok(WriteOutcome::Unchanged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::Mutation;
    use proptree_common::PathKey;
    use proptree_inference::SemanticType;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new().with_document("doc", json!({ "a": 1, "l": [1, 2] }))
    }

    #[test]
    fn test_failed_edit_writes_nothing() {
        let store = store();
        let id = DocumentId::from("doc");

        // First mutation succeeds on the draft, second fails
        let result = store.apply_edit(&id, &mut |doc| {
            Mutation::set(PathKey::parse("b")?, "x", SemanticType::String).apply(doc)?;
            Mutation::delete(PathKey::parse("l.7")?).apply(doc)?;
            Ok(())
        });

        assert!(matches!(result, Err(StoreError::Mutation(_))));
        assert_eq!(
            store.get_document(&id),
            Some(Value::from(json!({ "a": 1, "l": [1, 2] })))
        );
        assert!(store.take_notifications().is_empty());
    }

    #[test]
    fn test_unchanged_edit_does_not_notify() {
        let store = store();
        let id = DocumentId::from("doc");

        let outcome = store
            .apply_edit(&id, &mut |doc| {
                Mutation::set(PathKey::parse("a")?, 1.0, SemanticType::Number).apply(doc)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Unchanged);
        assert!(store.take_notifications().is_empty());
    }

    #[test]
    fn test_changed_edit_notifies_once() {
        let store = store();
        let id = DocumentId::from("doc");

        store
            .apply_edit(&id, &mut |doc| {
                Mutation::set(PathKey::parse("a")?, 2.0, SemanticType::Number).apply(doc)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(store.take_notifications(), vec![id.clone()]);
        assert!(store.take_notifications().is_empty());
    }

    #[test]
    fn test_missing_document() {
        let store = MemoryStore::new();
        let result = store.apply_edit(&DocumentId::from("nope"), &mut |_| Ok(()));
        assert!(matches!(result, Err(StoreError::Missing(_))));
    }
}
