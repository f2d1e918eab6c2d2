use crate::types::SemanticType;
use thiserror::Error;

/// Errors that can occur while encoding or converting values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("'{input}' cannot be stored as {target}")]
    InvalidTypeConversion { input: String, target: SemanticType },

    #[error("{0} values are not edited as text")]
    NotTextEditable(SemanticType),
}

pub type InferenceResult<T> = Result<T, InferenceError>;
