use crate::error::{PathError, PathResult};
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Address of a value inside a document, serialized as `a.b.2.c`.
///
/// Segments are plain text. Whether `2` is a list index or a record key is
/// decided by the parent container in the live document, never here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// The document root (no segments)
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from already-split segments, rejecting empty ones
    pub fn from_segments<I, S>(segments: I) -> PathResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(PathError::EmptySegment {
                path: segments.join("."),
                position,
            });
        }
        Ok(Self { segments })
    }

    /// Parse a dot-joined path. The empty string is rejected; use
    /// [`PathKey::root`] to address the whole document.
    pub fn parse(text: &str) -> PathResult<Self> {
        if text.is_empty() {
            return Err(PathError::Empty);
        }
        Self::from_segments(text.split('.'))
    }

    /// Append a key or index segment
    pub fn child(&self, segment: impl fmt::Display) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment-wise prefix test (`a.b` is a prefix of `a.b.c`, not of `a.bc`)
    pub fn starts_with(&self, prefix: &PathKey) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Replace `old` with `new` at the front of this path. Returns `None`
    /// when `old` is not a prefix.
    pub fn with_prefix_replaced(&self, old: &PathKey, new: &PathKey) -> Option<Self> {
        if !self.starts_with(old) {
            return None;
        }
        let mut segments = new.segments.clone();
        segments.extend_from_slice(&self.segments[old.segments.len()..]);
        Some(Self { segments })
    }

    /// Same parent, different leaf
    pub fn with_leaf(&self, leaf: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => *last = leaf.into(),
            None => segments.push(leaf.into()),
        }
        Self { segments }
    }

    /// Look the path up in a document
    pub fn resolve<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(doc, |current, segment| current.child(segment))
    }

    pub fn resolve_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = doc;
        for segment in &self.segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for PathKey {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathKey::parse(s)
    }
}

impl Serialize for PathKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.is_empty() {
            return Ok(PathKey::root());
        }
        PathKey::parse(&text).map_err(serde::de::Error::custom)
    }
}
