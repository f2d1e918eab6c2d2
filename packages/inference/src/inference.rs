use crate::error::{InferenceError, InferenceResult};
use crate::options::InferenceOptions;
use crate::types::{Inferred, SemanticType};
use chrono::NaiveDate;
use proptree_common::{format_number, Value};
use regex::Regex;
use std::sync::LazyLock;

static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]*)\]\(([^)]*)\)$").expect("valid regex"));

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Infer the semantic type and display text of a value
pub fn infer(value: &Value, options: &InferenceOptions) -> Inferred {
    match value {
        Value::String(s) => infer_str(s, options),
        Value::Number(n) => Inferred::new(SemanticType::Number, format_number(*n)),
        Value::Bool(b) => Inferred::new(SemanticType::Boolean, b.to_string()),
        Value::List(_) => Inferred::new(SemanticType::Array, value.to_display_string()),
        Value::Record(_) => Inferred::new(SemanticType::Object, value.to_display_string()),
    }
}

/// Type only, without building the display text
pub fn infer_type(value: &Value, options: &InferenceOptions) -> SemanticType {
    infer(value, options).ty
}

/// Classify a string leaf. First matching rule wins.
pub fn infer_str(s: &str, options: &InferenceOptions) -> Inferred {
    if options.conversion_mode {
        if s == "true" || s == "false" {
            return Inferred::new(SemanticType::Boolean, s);
        }
        if let Some(n) = parse_number(s) {
            return Inferred::new(SemanticType::Number, format_number(n));
        }
    }

    if let Some(target) = link_target(s) {
        return Inferred::new(SemanticType::Link, target);
    }

    if EXTERNAL_LINK.is_match(s) {
        return Inferred::new(SemanticType::ExternalLink, s);
    }

    if DATE.is_match(s) {
        return Inferred::new(SemanticType::Date, s);
    }

    if let Some(source) = formula_source(s) {
        return Inferred::new(SemanticType::Formula, source);
    }

    Inferred::new(SemanticType::String, s)
}

/// Parse user text as a finite number. Blank text is not a number.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Inner text of `[[target]]`
pub fn link_target(s: &str) -> Option<&str> {
    if s.len() >= 4 && s.starts_with("[[") && s.ends_with("]]") {
        Some(&s[2..s.len() - 2])
    } else {
        None
    }
}

/// `(text, url)` of a markdown link `[text](url)`
pub fn parse_external_link(s: &str) -> Option<(&str, &str)> {
    let caps = EXTERNAL_LINK.captures(s)?;
    let text = caps.get(1)?.as_str();
    let url = caps.get(2)?.as_str();
    Some((text, url))
}

/// Inner source of `$source$`
pub fn formula_source(s: &str) -> Option<&str> {
    if s.len() >= 2 && s.starts_with('$') && s.ends_with('$') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

pub fn is_date(s: &str) -> bool {
    DATE.is_match(s)
}

/// `YYYY-MM-DD` that also names a real day
pub fn is_calendar_date(s: &str) -> bool {
    is_date(s) && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok()
}

/// Encode user text into the canonical stored form of `ty`.
///
/// Links and formulas accept their display text (delimiters are added) as
/// well as already-delimited text. An empty number field encodes to NaN,
/// which the mutation protocol treats as a deletion.
pub fn encode(ty: SemanticType, text: &str) -> InferenceResult<Value> {
    let invalid = || InferenceError::InvalidTypeConversion {
        input: text.to_string(),
        target: ty,
    };

    match ty {
        SemanticType::String => Ok(Value::string(text)),
        SemanticType::Number => {
            if text.trim().is_empty() {
                return Ok(Value::Number(f64::NAN));
            }
            parse_number(text).map(Value::Number).ok_or_else(invalid)
        }
        SemanticType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        SemanticType::Date => {
            let trimmed = text.trim();
            if is_calendar_date(trimmed) {
                Ok(Value::string(trimmed))
            } else {
                Err(invalid())
            }
        }
        SemanticType::Link => {
            let inner = link_target(text).unwrap_or(text);
            Ok(Value::String(format!("[[{}]]", inner)))
        }
        SemanticType::ExternalLink => {
            if EXTERNAL_LINK.is_match(text) {
                Ok(Value::string(text))
            } else {
                Ok(Value::String(format!("[{}]({})", text, text)))
            }
        }
        SemanticType::Formula => {
            let inner = formula_source(text).unwrap_or(text);
            Ok(Value::String(format!("${}$", inner)))
        }
        SemanticType::Array | SemanticType::Object | SemanticType::Unknown => {
            Err(InferenceError::NotTextEditable(ty))
        }
    }
}

/// Encode an arbitrary value into the canonical stored form of `ty`.
///
/// Strings go through [`encode`]; native values already of the right shape
/// pass through unchanged; anything else is converted.
pub fn encode_value(ty: SemanticType, value: &Value) -> InferenceResult<Value> {
    match (ty, value) {
        (_, Value::String(s)) if ty.is_leaf() => encode(ty, s),
        (SemanticType::Number, Value::Number(_))
        | (SemanticType::Boolean, Value::Bool(_))
        | (SemanticType::Array, Value::List(_))
        | (SemanticType::Object, Value::Record(_))
        | (SemanticType::Unknown, _) => Ok(value.clone()),
        _ => crate::coercion::convert(value, ty),
    }
}
