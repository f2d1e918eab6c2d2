//! Error types for the editor

use crate::document::DocumentId;
use crate::mutations::MutationError;
use proptree_common::PathKey;
use proptree_inference::InferenceError;
use proptree_renderer::RenderError;
use thiserror::Error;

/// Failures reported by a [`crate::DocumentStore`]
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document '{0}' does not exist")]
    Missing(DocumentId),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Document store lock was poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum EditorError {
    /// The bound document no longer exists in the store
    #[error("Document '{0}' is missing")]
    DocumentMissing(DocumentId),

    #[error("No document is bound")]
    NotBound,

    #[error("Invalid type conversion at '{path}': {source}")]
    InvalidTypeConversion {
        path: PathKey,
        #[source]
        source: InferenceError,
    },

    #[error("Nothing at '{0}' in the live document")]
    NotInDocument(PathKey),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl From<StoreError> for EditorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Missing(id) => EditorError::DocumentMissing(id),
            StoreError::Mutation(mutation) => EditorError::from(mutation),
            other => EditorError::Store(other),
        }
    }
}

impl EditorError {
    /// The document changed shape since the action was issued
    pub fn is_structural_mismatch(&self) -> bool {
        matches!(
            self,
            EditorError::Mutation(MutationError::StructuralMismatch { .. })
        )
    }
}
