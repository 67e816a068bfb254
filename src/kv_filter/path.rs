// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Immutable JSON paths for located values

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step in a path: an object field or an array index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(idx) => write!(f, "{}", idx),
            PathSegment::Field(name) => f.write_str(name),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

#[derive(Debug)]
struct PathNode {
    parent: Option<Arc<PathNode>>,
    segment: PathSegment,
}

/// Location of a value inside a document.
///
/// Paths are persistent: `append` returns a new path whose prefix is shared
/// with the original, so sibling paths built during a walk reuse the same
/// parent nodes and no existing path ever changes.
#[derive(Clone, Default)]
pub struct JsonPath {
    tail: Option<Arc<PathNode>>,
    len: usize,
}

impl JsonPath {
    /// Empty path (the document root)
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new path with `segment` added at the end
    pub fn append(&self, segment: impl Into<PathSegment>) -> Self {
        Self {
            tail: Some(Arc::new(PathNode {
                parent: self.tail.clone(),
                segment: segment.into(),
            })),
            len: self.len + 1,
        }
    }

    /// Return a new path with every segment of `segments` added in order
    pub fn append_all<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        segments
            .into_iter()
            .fold(self.clone(), |path, segment| path.append(segment))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.tail.as_deref().map(|node| &node.segment)
    }

    /// Segments from the root to the leaf
    pub fn segments(&self) -> Vec<&PathSegment> {
        let mut out = Vec::with_capacity(self.len);
        let mut node = self.tail.as_deref();
        while let Some(current) = node {
            out.push(&current.segment);
            node = current.parent.as_deref();
        }
        out.reverse();
        out
    }

    /// Segments rendered as strings (indices in decimal)
    pub fn to_strings(&self) -> Vec<String> {
        self.segments().iter().map(|s| s.to_string()).collect()
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_strings().join("->"))
    }
}

impl fmt::Debug for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.segments()).finish()
    }
}

impl PartialEq for JsonPath {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.segments() == other.segments()
    }
}

impl Eq for JsonPath {}

impl<S: Into<PathSegment>> FromIterator<S> for JsonPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        JsonPath::new().append_all(iter)
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let segments = self.segments();
        let mut seq = serializer.serialize_seq(Some(segments.len()))?;
        for segment in segments {
            seq.serialize_element(segment)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let segments = Vec::<PathSegment>::deserialize(deserializer)?;
        Ok(segments.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_does_not_mutate() {
        let root = JsonPath::new().append("obj");
        let a = root.append("password");
        let b = root.append(3usize);

        assert_eq!(root.to_strings(), vec!["obj"]);
        assert_eq!(a.to_strings(), vec!["obj", "password"]);
        assert_eq!(b.to_strings(), vec!["obj", "3"]);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_display() {
        let path: JsonPath = vec![PathSegment::from("kv2"), "find_val".into(), 0usize.into()]
            .into_iter()
            .collect();
        assert_eq!(path.to_string(), "kv2->find_val->0");
        assert_eq!(JsonPath::new().to_string(), "");
    }

    #[test]
    fn test_serialize_as_array() {
        let path = JsonPath::new().append("arr").append(1usize);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["arr",1]"#);

        let back: JsonPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn test_equality_by_segments() {
        let a = JsonPath::new().append("a").append("b");
        let b = JsonPath::new().append_all(["a", "b"]);
        assert_eq!(a, b);
        assert_ne!(a, JsonPath::new().append("a"));
        assert_eq!(a.last(), Some(&PathSegment::Field("b".to_string())));
    }
}
