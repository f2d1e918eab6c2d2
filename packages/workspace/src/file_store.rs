//! Directory of JSON documents exposed as a [`DocumentStore`].
//!
//! A document id is the document's path relative to the root, with `/`
//! separators (`notes/today.json`). Writes go to a temp file in the same
//! directory and are renamed over the original, so readers never observe a
//! half-written document.

use proptree_common::Value;
use proptree_editor::{edit_copy, DocumentId, DocumentStore, Edit, StoreError, WriteOutcome};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

const EXTENSION: &str = "json";

pub struct FileStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles from this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a document id. Ids escaping the root are rejected.
    pub fn path_of(&self, id: &DocumentId) -> Result<PathBuf, StoreError> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || relative.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            return Err(StoreError::Missing(id.clone()));
        }
        Ok(self.root.join(relative))
    }

    /// Document id for a file under the root
    pub fn id_for(&self, path: &Path) -> Option<DocumentId> {
        document_id(&self.root, path)
    }

    /// Every document under the root, sorted by id
    pub fn list(&self) -> io::Result<Vec<DocumentId>> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                if let Some(id) = self.id_for(entry.path()) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Write a new document, replacing any existing one
    pub fn create(&self, id: &DocumentId, doc: &Value) -> Result<(), StoreError> {
        let path = self.path_of(id)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        write_atomic(&path, doc)
    }

    fn read(&self, id: &DocumentId) -> Result<Value, StoreError> {
        let path = self.path_of(id)?;
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(id.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&source)?)
    }
}

impl DocumentStore for FileStore {
    fn get_document(&self, id: &DocumentId) -> Option<Value> {
        match self.read(id) {
            Ok(doc) => Some(doc),
            Err(StoreError::Missing(_)) => None,
            Err(e) => {
                tracing::warn!(document = %id, error = %e, "failed to read document");
                None
            }
        }
    }

    fn apply_edit(&self, id: &DocumentId, edit: &mut Edit<'_>) -> Result<WriteOutcome, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let current = self.read(id)?;

        match edit_copy(&current, edit)? {
            Some(next) => {
                write_atomic(&self.path_of(id)?, &next)?;
                tracing::debug!(document = %id, "wrote document");
                Ok(WriteOutcome::Changed)
            }
            None => Ok(WriteOutcome::Unchanged),
        }
    }
}

/// Relative `/`-joined id for a `.json` file under `root`
pub fn document_id(root: &Path, path: &Path) -> Option<DocumentId> {
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return None;
    }
    let relative = path.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    Some(DocumentId::new(segments?.join("/")))
}

fn write_atomic(path: &Path, doc: &Value) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    file.write_all(json.as_bytes())?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptree_common::PathKey;
    use proptree_editor::Mutation;
    use proptree_inference::SemanticType;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip_preserves_key_order() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::from("doc.json");

        let doc = Value::from(json!({ "z": 1, "a": [true, "[[x]]"], "m": { "k": 2.5 } }));
        store.create(&id, &doc).unwrap();

        assert_eq!(store.get_document(&id), Some(doc));
    }

    #[test]
    fn test_failed_edit_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::from("doc.json");
        store.create(&id, &Value::from(json!({ "l": [1] }))).unwrap();
        let before = fs::read_to_string(dir.path().join("doc.json")).unwrap();

        let result = store.apply_edit(&id, &mut |doc| {
            Mutation::set(PathKey::parse("x")?, "y", SemanticType::String).apply(doc)?;
            Mutation::delete(PathKey::parse("l.5")?).apply(doc)?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(dir.path().join("doc.json")).unwrap(), before);
    }

    #[test]
    fn test_edit_writes_changes() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::from("nested/doc.json");
        store.create(&id, &Value::from(json!({ "n": 1 }))).unwrap();

        let outcome = store
            .apply_edit(&id, &mut |doc| {
                Mutation::set(PathKey::parse("n")?, 2.0, SemanticType::Number).apply(doc)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Changed);
        assert_eq!(store.get_document(&id), Some(Value::from(json!({ "n": 2 }))));
    }

    #[test]
    fn test_missing_document() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = DocumentId::from("absent.json");

        assert_eq!(store.get_document(&id), None);
        assert!(matches!(
            store.apply_edit(&id, &mut |_| Ok(())),
            Err(StoreError::Missing(_))
        ));
    }

    #[test]
    fn test_ids_cannot_escape_root() {
        let store = FileStore::new("/tmp/docs");
        assert!(store.path_of(&DocumentId::from("../secret.json")).is_err());
        assert!(store.path_of(&DocumentId::from("/etc/passwd.json")).is_err());
        assert!(store.path_of(&DocumentId::from("notes.txt")).is_err());
    }

    #[test]
    fn test_list_finds_nested_documents() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.create(&DocumentId::from("b.json"), &Value::empty_record()).unwrap();
        store.create(&DocumentId::from("a/c.json"), &Value::empty_record()).unwrap();
        fs::write(dir.path().join("readme.md"), "ignored").unwrap();

        let ids = store.list().unwrap();
        assert_eq!(ids, vec![DocumentId::from("a/c.json"), DocumentId::from("b.json")]);
    }
}
