//! # proptree Inference Engine
//!
//! Recovers semantic types that the document store cannot express natively
//! and converts between them.
//!
//! ## Features
//!
//! - **Syntax inference**: `[[link]]`, `[text](url)`, `YYYY-MM-DD`, `$formula$`
//! - **Conversion mode**: list element edits reclassify `"42"` and `"true"`
//! - **Coercion**: committed editor text is re-encoded or changes the node's type
//! - **Array defaults**: appended elements continue number and date sequences
//!
//! ## Example
//!
//! ```rust
//! use proptree_common::Value;
//! use proptree_inference::{infer, InferenceOptions, SemanticType};
//!
//! let inferred = infer(&Value::from("[[Page A]]"), &InferenceOptions::default());
//! assert_eq!(inferred.ty, SemanticType::Link);
//! assert_eq!(inferred.display, "Page A");
//! ```

pub mod array_default;
pub mod coercion;
pub mod error;
pub mod inference;
pub mod options;
pub mod types;

// Re-export main types for convenience
pub use array_default::{array_default, array_default_on, placeholder, ArrayDefault};
pub use coercion::{coerce, convert, Coercion};
pub use error::{InferenceError, InferenceResult};
pub use inference::{
    encode, encode_value, formula_source, infer, infer_str, infer_type, is_calendar_date,
    link_target, parse_external_link, parse_number,
};
pub use options::InferenceOptions;
pub use types::{Inferred, SemanticType};
