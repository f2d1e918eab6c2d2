use proptree_common::PathKey;
use std::collections::BTreeSet;

/// Configuration options for rendering
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Paths rendered nowhere in this view (their subtrees included)
    pub hidden: BTreeSet<PathKey>,

    /// Attach inferred type labels next to values. Cosmetic only.
    pub show_type_labels: bool,
}

impl RenderOptions {
    pub fn with_hidden<I: IntoIterator<Item = PathKey>>(mut self, paths: I) -> Self {
        self.hidden.extend(paths);
        self
    }

    pub fn with_type_labels(mut self, show: bool) -> Self {
        self.show_type_labels = show;
        self
    }

    pub fn is_hidden(&self, path: &PathKey) -> bool {
        self.hidden.contains(path)
    }
}
