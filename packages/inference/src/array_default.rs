//! # Array Default Heuristic
//!
//! Picks the type and value of an element appended to a list, continuing
//! arithmetic sequences of numbers and dates where the list has one.
//! Existing elements are only read.

use crate::inference::{infer_type, is_date, DATE_FORMAT};
use crate::options::InferenceOptions;
use crate::types::SemanticType;
use chrono::{Duration, Local, NaiveDate};
use proptree_common::{Record, Value};
use serde::Serialize;

pub const NEW_ITEM: &str = "new item";
pub const NEW_FIELD: &str = "new_field";
pub const NEW_LINK: &str = "[[new link]]";
pub const NEW_EXTERNAL_LINK: &str = "[new link](https://)";
pub const NEW_FORMULA: &str = "$new formula$";

/// Type and value for an element appended to a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayDefault {
    #[serde(rename = "type")]
    pub ty: SemanticType,
    pub value: Value,
}

/// Default for a new element, using the local date as "today"
pub fn array_default(items: &[Value]) -> ArrayDefault {
    array_default_on(items, Local::now().date_naive())
}

/// Default for a new element with an explicit "today"
pub fn array_default_on(items: &[Value], today: NaiveDate) -> ArrayDefault {
    let Some(last) = items.last() else {
        return ArrayDefault {
            ty: SemanticType::String,
            value: Value::string(NEW_ITEM),
        };
    };

    let options = InferenceOptions::syntax_only();
    let types: Vec<SemanticType> = items.iter().map(|v| infer_type(v, &options)).collect();
    let ty = if types.iter().all(|t| *t == types[0]) {
        types[0]
    } else {
        infer_type(last, &options)
    };

    let value = match ty {
        SemanticType::Number => next_number(items),
        SemanticType::Boolean => next_boolean(items),
        SemanticType::Date => next_date(items, today),
        SemanticType::Object => next_record(items, today),
        other => placeholder(other, today),
    };

    ArrayDefault { ty, value }
}

/// Fixed placeholder for a fresh value of the given type
pub fn placeholder(ty: SemanticType, today: NaiveDate) -> Value {
    match ty {
        SemanticType::String | SemanticType::Unknown => Value::string(NEW_ITEM),
        SemanticType::Number => Value::Number(0.0),
        SemanticType::Boolean => Value::Bool(false),
        SemanticType::Date => Value::String(today.format(DATE_FORMAT).to_string()),
        SemanticType::Link => Value::string(NEW_LINK),
        SemanticType::ExternalLink => Value::string(NEW_EXTERNAL_LINK),
        SemanticType::Formula => Value::string(NEW_FORMULA),
        SemanticType::Array => Value::List(vec![Value::string(NEW_ITEM)]),
        SemanticType::Object => {
            let mut record = Record::new();
            record.insert(NEW_FIELD.to_string(), Value::string(NEW_ITEM));
            Value::Record(record)
        }
    }
}

/// Common difference of a sequence, if every step is equal
fn common_difference(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let step = values[1] - values[0];
    let tolerance = 1e-9 * step.abs().max(1.0);
    values
        .windows(2)
        .all(|w| ((w[1] - w[0]) - step).abs() <= tolerance)
        .then_some(step)
}

fn next_number(items: &[Value]) -> Value {
    let numbers: Vec<f64> = items.iter().filter_map(Value::as_number).collect();
    match (common_difference(&numbers), numbers.last()) {
        (Some(step), Some(last)) => Value::Number(last + step),
        _ => Value::Number(0.0),
    }
}

fn next_boolean(items: &[Value]) -> Value {
    let last = items.iter().rev().find_map(Value::as_bool);
    Value::Bool(last.map(|b| !b).unwrap_or(false))
}

fn next_date(items: &[Value], today: NaiveDate) -> Value {
    let dates: Vec<NaiveDate> = items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| is_date(s))
        .filter_map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
        .collect();

    let day_numbers: Vec<f64> = dates
        .iter()
        .map(|d| d.signed_duration_since(NaiveDate::MIN).num_days() as f64)
        .collect();

    let next = common_difference(&day_numbers)
        .zip(dates.last())
        .and_then(|(step, last)| last.checked_add_signed(Duration::days(step as i64)));

    placeholder_date(next.unwrap_or(today))
}

fn placeholder_date(date: NaiveDate) -> Value {
    Value::String(date.format(DATE_FORMAT).to_string())
}

/// New record shaped like the last record in the list
fn next_record(items: &[Value], today: NaiveDate) -> Value {
    let template = items.iter().rev().find_map(Value::as_record);
    match template {
        Some(record) if !record.is_empty() => {
            let options = InferenceOptions::syntax_only();
            let fresh: Record = record
                .iter()
                .map(|(key, value)| (key.clone(), placeholder(infer_type(value, &options), today)))
                .collect();
            Value::Record(fresh)
        }
        _ => placeholder(SemanticType::Object, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn default_for(json: serde_json::Value) -> ArrayDefault {
        match Value::from(json) {
            Value::List(items) => array_default_on(&items, today()),
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_list() {
        let result = default_for(json!([]));
        assert_eq!(result.ty, SemanticType::String);
        assert_eq!(result.value, Value::from("new item"));
    }

    #[test]
    fn test_ascending_sequence() {
        let result = default_for(json!([1, 2, 3, 4, 5]));
        assert_eq!(result.ty, SemanticType::Number);
        assert_eq!(result.value, Value::Number(6.0));
    }

    #[test]
    fn test_descending_sequence() {
        assert_eq!(default_for(json!([10, 9, 8, 7])).value, Value::Number(6.0));
    }

    #[test]
    fn test_constant_sequence_repeats() {
        assert_eq!(default_for(json!([3, 3, 3, 3])).value, Value::Number(3.0));
    }

    #[test]
    fn test_irregular_numbers_fall_back_to_zero() {
        assert_eq!(default_for(json!([1, 3, 7, 2, 9])).value, Value::Number(0.0));
        assert_eq!(default_for(json!([5])).value, Value::Number(0.0));
    }

    #[test]
    fn test_fractional_steps() {
        assert_eq!(default_for(json!([0.1, 0.2, 0.3])).value, Value::Number(0.4));
    }

    #[test]
    fn test_weekly_dates() {
        let result = default_for(json!(["2024-01-01", "2024-01-08", "2024-01-15"]));
        assert_eq!(result.ty, SemanticType::Date);
        assert_eq!(result.value, Value::from("2024-01-22"));
    }

    #[test]
    fn test_irregular_dates_use_today() {
        let result = default_for(json!(["2024-01-01", "2024-01-03", "2024-01-10"]));
        assert_eq!(result.value, Value::from("2024-06-01"));
    }

    #[test]
    fn test_mixed_types_follow_last_element() {
        let result = default_for(json!(["a", 1, true, "[[L]]"]));
        assert_eq!(result.ty, SemanticType::Link);
        assert_eq!(result.value, Value::from("[[new link]]"));
    }

    #[test]
    fn test_boolean_alternates() {
        assert_eq!(default_for(json!([true, false, true])).value, Value::Bool(false));
        assert_eq!(default_for(json!(["x", false])).value, Value::Bool(true));
    }

    #[test]
    fn test_syntax_placeholders() {
        assert_eq!(default_for(json!(["$a$", "$b$"])).value, Value::from("$new formula$"));
        assert_eq!(
            default_for(json!(["[a](https://a.example)"])).value,
            Value::from("[new link](https://)")
        );
        assert_eq!(default_for(json!(["alpha", "beta"])).value, Value::from("new item"));
    }

    #[test]
    fn test_numeric_strings_are_not_numbers() {
        let result = default_for(json!(["1", "2"]));
        assert_eq!(result.ty, SemanticType::String);
        assert_eq!(result.value, Value::from("new item"));
    }

    #[test]
    fn test_record_elements_copy_shape() {
        let result = default_for(json!([
            { "name": "Ada", "born": "1815-12-10", "score": 3 }
        ]));
        assert_eq!(result.ty, SemanticType::Object);
        assert_eq!(
            result.value,
            Value::from(json!({ "name": "new item", "born": "2024-06-01", "score": 0 }))
        );
    }

    #[test]
    fn test_existing_elements_untouched() {
        let items = vec![Value::Number(1.0), Value::Number(2.0)];
        let before = items.clone();
        let _ = array_default_on(&items, today());
        assert_eq!(items, before);
    }
}
