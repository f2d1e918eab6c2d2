//! Leaf editors for primitive fields.
//!
//! Each editor holds the text it shows and knows how to turn the user's
//! committed input back into the text handed to coercion.

use proptree_common::Value;
use proptree_inference::{is_calendar_date, parse_external_link, Inferred, SemanticType};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "editor", rename_all = "kebab-case")]
pub enum Editor {
    Text { value: String },
    Number { value: String },
    Toggle { checked: bool },
    Date { value: String, valid: bool },
    Link { target: String },
    ExternalLink { text: String, url: String },
    Formula { source: String },
}

impl Editor {
    /// Editor for a primitive value with its inferred type
    pub fn for_value(value: &Value, inferred: &Inferred) -> Self {
        match inferred.ty {
            SemanticType::Number => Editor::Number {
                value: inferred.display.clone(),
            },
            SemanticType::Boolean => Editor::Toggle {
                checked: value.as_bool().unwrap_or(false),
            },
            SemanticType::Date => Editor::Date {
                valid: is_calendar_date(&inferred.display),
                value: inferred.display.clone(),
            },
            SemanticType::Link => Editor::Link {
                target: inferred.display.clone(),
            },
            SemanticType::ExternalLink => {
                let (text, url) = parse_external_link(&inferred.display).unwrap_or(("", ""));
                Editor::ExternalLink {
                    text: text.to_string(),
                    url: url.to_string(),
                }
            }
            SemanticType::Formula => Editor::Formula {
                source: inferred.display.clone(),
            },
            _ => Editor::Text {
                value: inferred.display.clone(),
            },
        }
    }

    /// Type this editor edits
    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Editor::Text { .. } => SemanticType::String,
            Editor::Number { .. } => SemanticType::Number,
            Editor::Toggle { .. } => SemanticType::Boolean,
            Editor::Date { .. } => SemanticType::Date,
            Editor::Link { .. } => SemanticType::Link,
            Editor::ExternalLink { .. } => SemanticType::ExternalLink,
            Editor::Formula { .. } => SemanticType::Formula,
        }
    }

    /// Text currently shown in the editor
    pub fn text(&self) -> String {
        match self {
            Editor::Text { value } | Editor::Number { value } | Editor::Date { value, .. } => {
                value.clone()
            }
            Editor::Toggle { checked } => checked.to_string(),
            Editor::Link { target } => target.clone(),
            Editor::ExternalLink { text, url } => external_link_input(text, url),
            Editor::Formula { source } => source.clone(),
        }
    }
}

/// Commit text for an external link edited as separate text and url fields
pub fn external_link_input(text: &str, url: &str) -> String {
    format!("[{}]({})", text, url)
}

/// Commit text for a toggle
pub fn toggle_input(checked: bool) -> String {
    checked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptree_inference::{infer, InferenceOptions};

    fn editor_for(value: Value) -> Editor {
        let inferred = infer(&value, &InferenceOptions::syntax_only());
        Editor::for_value(&value, &inferred)
    }

    #[test]
    fn test_editor_dispatch() {
        assert_eq!(
            editor_for(Value::from("[[Home]]")),
            Editor::Link {
                target: "Home".to_string()
            }
        );
        assert_eq!(
            editor_for(Value::from("[docs](https://d.example)")),
            Editor::ExternalLink {
                text: "docs".to_string(),
                url: "https://d.example".to_string()
            }
        );
        assert_eq!(editor_for(Value::Bool(true)), Editor::Toggle { checked: true });
        assert_eq!(
            editor_for(Value::Number(2.5)),
            Editor::Number {
                value: "2.5".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_calendar_date_is_flagged() {
        match editor_for(Value::from("2024-02-30")) {
            Editor::Date { valid, .. } => assert!(!valid),
            other => panic!("expected date editor, got {:?}", other),
        }
    }

    #[test]
    fn test_external_link_text_round_trips() {
        let editor = editor_for(Value::from("[a](b)"));
        assert_eq!(editor.text(), "[a](b)");
        assert_eq!(editor.semantic_type(), SemanticType::ExternalLink);
    }
}
