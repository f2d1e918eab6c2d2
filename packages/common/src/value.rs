use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered key/value container. Insertion order is the display order.
pub type Record = IndexMap<String, Value>;

/// A node in the persisted document tree.
///
/// The backing store only understands this union. Richer semantic types
/// (dates, links, formulas) are string syntax conventions layered on top.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Record(Record),
}

/// Runtime shape of a container value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    List,
    Record,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::List => write!(f, "list"),
            ContainerKind::Record => write!(f, "record"),
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn empty_record() -> Self {
        Value::Record(Record::new())
    }

    /// Container shape, `None` for primitives
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Value::List(_) => Some(ContainerKind::List),
            Value::Record(_) => Some(ContainerKind::Record),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.container_kind().is_none()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    /// True for the values the mutation protocol treats as "no value":
    /// NaN numbers and empty records.
    pub fn is_vacant(&self) -> bool {
        match self {
            Value::Number(n) => n.is_nan(),
            Value::Record(map) => map.is_empty(),
            _ => false,
        }
    }

    /// True if every element of a list is a record (and the list is non-empty)
    pub fn is_list_of_records(&self) -> bool {
        match self {
            Value::List(items) => {
                !items.is_empty() && items.iter().all(|v| matches!(v, Value::Record(_)))
            }
            _ => false,
        }
    }

    /// Resolve one path segment against this container's live shape.
    ///
    /// Lists interpret the segment as an index, records as a key. The same
    /// text `"2"` may therefore mean either, depending on the document.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::List(items) => parse_index(segment).and_then(|i| items.get(i)),
            Value::Record(map) => map.get(segment),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, segment: &str) -> Option<&mut Value> {
        match self {
            Value::List(items) => parse_index(segment).and_then(move |i| items.get_mut(i)),
            Value::Record(map) => map.get_mut(segment),
            _ => None,
        }
    }

    /// Textual form used by editors and labels
    pub fn to_display_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => format!("[{} items]", items.len()),
            Value::Record(map) => format!("{{{} fields}}", map.len()),
        }
    }
}

/// Parse a list index segment. Only plain ASCII digits are accepted.
pub fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Render a number the way a human would type it: integral values have no
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::String(s) => serializer.serialize_str(s),
            Value::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::List(items) => items.serialize(serializer),
            Value::Record(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(json))
    }
}

/// JSON `null` has no counterpart in the store's union and loads as an
/// empty string, which is what an empty field looks like in the editor.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::String(String::new()),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Record(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Value::Record(map)
    }
}
