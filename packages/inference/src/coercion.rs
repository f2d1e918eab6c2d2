//! # Type Coercion
//!
//! Reconciles committed editor text with the type the node was rendered
//! with, and converts live values for the explicit "change type" action.

use crate::error::{InferenceError, InferenceResult};
use crate::inference::{encode, infer, infer_str, parse_number};
use crate::options::InferenceOptions;
use crate::types::SemanticType;
use proptree_common::{Record, Value};
use serde::Serialize;

/// Outcome of reconciling user input with a node's declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coercion {
    /// Type the input was classified as
    pub detected: SemanticType,

    /// Canonical stored form to persist
    pub converted: Value,

    /// The node must be re-rendered with a different editor
    pub type_changed: bool,

    /// Persisting `converted` would not change the document
    pub unchanged: bool,
}

/// Reconcile committed text against the node's declared type.
///
/// Returns [`InferenceError::InvalidTypeConversion`] when the text cannot be
/// stored; callers keep the previous value in that case.
pub fn coerce(
    declared: SemanticType,
    current: &Value,
    input: &str,
    options: &InferenceOptions,
) -> InferenceResult<Coercion> {
    // Typed fields outside a list keep their type: text that does not parse
    // is rejected instead of silently turning the field into a string.
    if !options.conversion_mode
        && matches!(declared, SemanticType::Number | SemanticType::Boolean)
    {
        let converted = encode(declared, input)?;
        return Ok(finish(declared, declared, converted, current));
    }

    let detected = infer_str(input, options).ty;

    if detected == declared {
        let converted = encode(declared, input)?;
        return Ok(finish(declared, detected, converted, current));
    }

    // Link and formula editors show their value without delimiters, so plain
    // text committed there is the display form of the declared type.
    if detected == SemanticType::String
        && matches!(declared, SemanticType::Link | SemanticType::Formula)
    {
        let converted = encode(declared, input)?;
        return Ok(finish(declared, declared, converted, current));
    }

    let converted = encode(detected, input)?;
    Ok(finish(declared, detected, converted, current))
}

fn finish(declared: SemanticType, detected: SemanticType, converted: Value, current: &Value) -> Coercion {
    let type_changed = detected != declared;
    let unchanged = !type_changed && same_value(&converted, current);
    Coercion {
        detected,
        converted,
        type_changed,
        unchanged,
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

/// Convert a live value to another semantic type (the "change type"
/// affordance). Scalars wrap into a one-element list; lists convert their
/// first element.
pub fn convert(value: &Value, target: SemanticType) -> InferenceResult<Value> {
    let invalid = || InferenceError::InvalidTypeConversion {
        input: value.to_display_string(),
        target,
    };

    match (value, target) {
        (_, SemanticType::Unknown) => Ok(value.clone()),

        (Value::List(_), SemanticType::Array) | (Value::Record(_), SemanticType::Object) => {
            Ok(value.clone())
        }
        (_, SemanticType::Array) => Ok(Value::List(vec![value.clone()])),
        (_, SemanticType::Object) => {
            let mut record = Record::new();
            record.insert("value".to_string(), value.clone());
            Ok(Value::Record(record))
        }

        (Value::List(items), _) => match items.first() {
            Some(first) => convert(first, target),
            None => convert(&Value::String(String::new()), target),
        },
        (Value::Record(_), _) => Err(invalid()),

        (Value::Bool(b), SemanticType::Number) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        (Value::Number(n), SemanticType::Boolean) => Ok(Value::Bool(*n != 0.0)),

        (_, SemanticType::Number) => {
            let text = display_text(value);
            parse_number(&text).map(Value::Number).ok_or_else(invalid)
        }
        (_, SemanticType::Boolean) => match display_text(value).trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        (_, _) => encode(target, &display_text(value)).map_err(|_| invalid()),
    }
}

/// Text of a leaf with its syntax delimiters removed
fn display_text(value: &Value) -> String {
    infer(value, &InferenceOptions::syntax_only()).display
}
