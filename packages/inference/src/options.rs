/// Configuration options for type inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Reclassify plain text that looks like a boolean or a number.
    ///
    /// Only enabled for edits on list elements. A single field whose user
    /// types "42" stays a string unless this is on.
    pub conversion_mode: bool,
}

impl InferenceOptions {
    /// Options for list element edits
    pub fn conversion() -> Self {
        Self {
            conversion_mode: true,
        }
    }

    /// Options for everything else (syntax-only inference)
    pub fn syntax_only() -> Self {
        Self {
            conversion_mode: false,
        }
    }
}
