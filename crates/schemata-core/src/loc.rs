//! # Source Locations
//!
//! A [`Loc`] identifies where in an external tree a decoded value came from.
//! Locations form a persistent linked path: each child holds a reference to
//! its parent plus one [`PathSegment`], so cloning is a reference-count bump
//! and building a child never copies the parent path.
//!
//! Equality and hashing are structural over the source name, the path
//! segments, and the optional line/column. Two values decoded from the same
//! external position therefore carry equal locations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// One step from a container to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Key of a mapping entry or struct field.
    Key(String),
    /// Index of a sequence item.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => write!(f, "{}", escape_pointer(k)),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

#[derive(Debug)]
struct LocNode {
    source: Option<Arc<str>>,
    parent: Option<Loc>,
    segment: Option<PathSegment>,
    line: Option<usize>,
    col: Option<usize>,
}

/// Position of a value inside an external representation.
#[derive(Clone)]
pub struct Loc(Arc<LocNode>);

impl Loc {
    /// The root of an anonymous tree.
    pub fn root() -> Self {
        Self(Arc::new(LocNode {
            source: None,
            parent: None,
            segment: None,
            line: None,
            col: None,
        }))
    }

    /// The root of a tree read from a named source (file name, URI, ...).
    pub fn source(name: impl AsRef<str>) -> Self {
        Self(Arc::new(LocNode {
            source: Some(Arc::from(name.as_ref())),
            parent: None,
            segment: None,
            line: None,
            col: None,
        }))
    }

    /// Location of a child reached through `segment`.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        Self(Arc::new(LocNode {
            source: self.0.source.clone(),
            parent: Some(self.clone()),
            segment: Some(segment.into()),
            line: None,
            col: None,
        }))
    }

    /// Location of the mapping entry or struct field `key`.
    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// Location of the sequence item at `index`.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    /// Same path, annotated with a textual position supplied by the
    /// serialization layer.
    pub fn with_position(&self, line: usize, col: usize) -> Self {
        Self(Arc::new(LocNode {
            source: self.0.source.clone(),
            parent: self.0.parent.clone(),
            segment: self.0.segment.clone(),
            line: Some(line),
            col: Some(col),
        }))
    }

    /// Name of the source this location belongs to, if any.
    pub fn source_name(&self) -> Option<&str> {
        self.0.source.as_deref()
    }

    /// Line number, when the serialization layer provided one.
    pub fn line(&self) -> Option<usize> {
        self.0.line
    }

    /// Column number, when the serialization layer provided one.
    pub fn col(&self) -> Option<usize> {
        self.0.col
    }

    /// The last path segment, or `None` for a root.
    pub fn segment(&self) -> Option<&PathSegment> {
        self.0.segment.as_ref()
    }

    /// Parent location, or `None` for a root.
    pub fn parent(&self) -> Option<&Loc> {
        self.0.parent.as_ref()
    }

    /// Whether this location is a tree root.
    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    /// Number of segments between the root and this location.
    pub fn depth(&self) -> usize {
        self.ancestors().filter(|l| l.0.segment.is_some()).count()
    }

    /// Path segments from the root down to this location.
    pub fn path(&self) -> Vec<PathSegment> {
        let mut path: Vec<PathSegment> = self
            .ancestors()
            .filter_map(|l| l.0.segment.clone())
            .collect();
        path.reverse();
        path
    }

    /// RFC 6901 JSON Pointer for this location (`""` for the root).
    pub fn pointer(&self) -> String {
        self.path().iter().map(|s| format!("/{s}")).collect()
    }

    /// Whether `self` lies at or below `other` within the same source.
    pub fn starts_with(&self, other: &Loc) -> bool {
        self.ancestors().any(|l| l == other)
    }

    fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }
}

struct Ancestors<'a> {
    next: Option<&'a Loc>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Loc;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.0.parent.as_ref();
        Some(current)
    }
}

impl Default for Loc {
    fn default() -> Self {
        Self::root()
    }
}

impl PartialEq for Loc {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.source == other.0.source
            && self.0.line == other.0.line
            && self.0.col == other.0.col
            && self.path() == other.path()
    }
}

impl Eq for Loc {}

impl Hash for Loc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.source.hash(state);
        self.path().hash(state);
        self.0.line.hash(state);
        self.0.col.hash(state);
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Loc({self})")
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.0.source {
            write!(f, "{source}")?;
            if let (Some(line), Some(col)) = (self.0.line, self.0.col) {
                write!(f, ":{line}:{col}")?;
            }
            write!(f, ":")?;
        }
        let pointer = self.pointer();
        if pointer.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{pointer}")
        }
    }
}

impl Serialize for Loc {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Loc", 4)?;
        s.serialize_field("source", &self.0.source.as_deref())?;
        s.serialize_field("pointer", &self.pointer())?;
        s.serialize_field("line", &self.0.line)?;
        s.serialize_field("col", &self.0.col)?;
        s.end()
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
