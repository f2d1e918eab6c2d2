//! # proptree common
//!
//! Shared data model for the property tree editor: the persisted [`Value`]
//! union and dot-joined [`PathKey`] addresses.

pub mod error;
pub mod path;
pub mod value;

pub use error::*;
pub use path::*;
pub use value::*;
