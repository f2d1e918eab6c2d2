//! # proptree Renderer
//!
//! Builds the editor's widget tree from a document snapshot and patches it
//! incrementally.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document snapshot (Value)                   │
//! └─────────────────────────────────────────────┘
//!                     ↓  Renderer::render / patch_node
//! ┌─────────────────────────────────────────────┐
//! │ WidgetTree: fields, lists, foldable groups  │
//! └─────────────────────────────────────────────┘
//!                     ↓  diff_trees
//! ┌─────────────────────────────────────────────┐
//! │ WidgetPatch stream for the host UI          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Widgets are derived views. The document is the source of truth and every
//! action re-reads it.

mod differ;
mod elements;
mod error;
mod options;
mod renderer;
mod widget;

pub use differ::{diff_trees, WidgetPatch};
pub use elements::{external_link_input, toggle_input, Editor};
pub use error::{RenderError, RenderResult};
pub use options::RenderOptions;
pub use renderer::{RenderPatch, Renderer};
pub use widget::{Affordance, Widget, WidgetId, WidgetKind, WidgetTree};
