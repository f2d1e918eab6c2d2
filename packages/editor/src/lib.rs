//! # proptree Editor
//!
//! Editing engine for a document tree held by an external store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: DocumentStore + change notifications  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Session                             │
//! │  - Bind / rebind / close one document       │
//! │  - Debounce refreshes, swallow own echoes   │
//! │  - Plan actions into path mutations         │
//! │  - Apply mutations all-or-nothing           │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ renderer: document → widget tree + patches  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The store is the source of truth**: widgets are derived views
//! 2. **Re-resolve before writing**: every action reads the live value
//! 3. **Shape decides meaning**: a path segment is an index only under a list
//! 4. **Quiet recovery**: failed edits are logged no-ops, never panics
//!
//! ## Usage
//!
//! ```rust
//! use proptree_common::PathKey;
//! use proptree_editor::{DocumentId, EditAction, MemoryStore, Session, SessionOptions};
//! use std::time::Instant;
//!
//! let store = MemoryStore::new().with_document("notes", serde_json::json!({ "title": "Draft" }));
//! let mut session = Session::new(store, SessionOptions::default());
//! session.select(Some(DocumentId::from("notes")), Instant::now());
//!
//! let outcome = session.apply(
//!     EditAction::CommitText {
//!         path: PathKey::parse("title").unwrap(),
//!         input: "Final".to_string(),
//!     },
//!     Instant::now(),
//! );
//! assert!(outcome.is_applied());
//! ```

mod debounce;
mod document;
mod errors;
mod mutations;
mod pipeline;
mod session;

pub use debounce::{Debouncer, EchoSuppressor, RefreshGuard};
pub use document::{edit_copy, DocumentId, DocumentStore, Edit, MemoryStore, WriteOutcome};
pub use errors::{EditorError, StoreError};
pub use mutations::{Mutation, MutationEffect, MutationError};
pub use pipeline::{parent_kind, plan, unique_key, EditAction, Plan, PlanContext, RenderTarget};
pub use session::{
    ChangeDisposition, EditOutcome, Refresh, Session, SessionOptions, SessionState, View,
};

// Re-export common types for convenience
pub use proptree_common::{PathKey, Value};
pub use proptree_renderer::{RenderOptions, RenderPatch, WidgetPatch, WidgetTree};
