use proptree_common::PathKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("No widget is rendered at '{0}'")]
    NotRendered(PathKey),

    #[error("Path '{0}' is hidden from this view")]
    Hidden(PathKey),

    #[error("Path '{0}' does not exist in the document")]
    NotInDocument(PathKey),
}

pub type RenderResult<T> = Result<T, RenderError>;
