use thiserror::Error;

/// Errors produced while parsing or resolving a [`crate::PathKey`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Empty segment at position {position} in '{path}'")]
    EmptySegment { path: String, position: usize },

    #[error("Index '{segment}' out of range for list of length {len}")]
    IndexOutOfRange { segment: String, len: usize },

    #[error("Segment '{segment}' does not address a list element")]
    NotAnIndex { segment: String },
}

pub type PathResult<T> = Result<T, PathError>;
