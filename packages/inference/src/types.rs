use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type recovered from a value's runtime shape and string syntax.
///
/// Never persisted. Always re-derived from the live value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    String,
    Number,
    Boolean,
    /// `YYYY-MM-DD`
    Date,
    /// `[[target]]`
    Link,
    /// `[text](url)`
    ExternalLink,
    /// `$source$`
    Formula,
    Array,
    Object,
    Unknown,
}

impl SemanticType {
    pub const ALL: [SemanticType; 10] = [
        SemanticType::String,
        SemanticType::Number,
        SemanticType::Boolean,
        SemanticType::Date,
        SemanticType::Link,
        SemanticType::ExternalLink,
        SemanticType::Formula,
        SemanticType::Array,
        SemanticType::Object,
        SemanticType::Unknown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Number => "number",
            SemanticType::Boolean => "boolean",
            SemanticType::Date => "date",
            SemanticType::Link => "link",
            SemanticType::ExternalLink => "external-link",
            SemanticType::Formula => "formula",
            SemanticType::Array => "array",
            SemanticType::Object => "object",
            SemanticType::Unknown => "unknown",
        }
    }

    /// Leaf types a user edits through a single editor widget
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            SemanticType::Array | SemanticType::Object | SemanticType::Unknown
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| format!("unknown type '{}'", s))
    }
}

/// Result of inferring a single value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inferred {
    #[serde(rename = "type")]
    pub ty: SemanticType,

    /// Text shown in the editor: links without brackets, formulas without
    /// `$`, numbers and booleans in their textual form.
    pub display: String,
}

impl Inferred {
    pub fn new(ty: SemanticType, display: impl Into<String>) -> Self {
        Self {
            ty,
            display: display.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for ty in SemanticType::ALL {
            assert_eq!(ty.name().parse::<SemanticType>(), Ok(ty));
        }
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&SemanticType::ExternalLink).unwrap();
        assert_eq!(json, "\"external-link\"");
    }
}
