//! Dotted key paths and the traversal rules shared by hierarchical backends.
//!
//! A path like `"window.size.width"` addresses nested objects. Reading and
//! writing deliberately disagree when a scalar sits in the way:
//!
//! - [`lookup`] is strict: a present non-object segment is a
//!   [`TypeMismatch`](CommonsError::TypeMismatch), while an absent one just
//!   yields `None`.
//! - [`insert`] is lenient: absent segments are created as empty objects and a
//!   scalar in the way aborts the write without touching anything.

use crate::error::CommonsError;

/// A validated, non-empty key path split on `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath<'a> {
    raw: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> KeyPath<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, CommonsError> {
        if raw.is_empty() {
            return Err(CommonsError::InvalidPath {
                path: raw.into(),
                reason: "path is empty".into(),
            });
        }
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CommonsError::InvalidPath {
                path: raw.into(),
                reason: "path contains an empty segment".into(),
            });
        }
        Ok(Self { raw, segments })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// All segments but the last.
    pub fn parents(&self) -> &[&'a str] {
        &self.segments[..self.segments.len() - 1]
    }

    pub fn leaf(&self) -> &'a str {
        self.segments[self.segments.len() - 1]
    }
}

/// An object node of a value tree (a JSON object, a TOML table).
pub(crate) trait Tree {
    type Value;

    fn child(&self, key: &str) -> Option<&Self::Value>;

    fn child_mut(&mut self, key: &str) -> Option<&mut Self::Value>;

    fn put(&mut self, key: &str, value: Self::Value);

    fn as_tree(value: &Self::Value) -> Option<&Self>;

    fn as_tree_mut(value: &mut Self::Value) -> Option<&mut Self>;

    fn empty_tree() -> Self::Value;
}

/// Walk `path` from `root`.
///
/// `Ok(None)` when any segment is absent, [`CommonsError::TypeMismatch`] when
/// a parent segment exists but isn't an object.
pub(crate) fn lookup<'t, T: Tree>(
    root: &'t T,
    path: &KeyPath<'_>,
) -> Result<Option<&'t T::Value>, CommonsError> {
    let mut current = root;
    for segment in path.parents() {
        let Some(value) = current.child(segment) else {
            return Ok(None);
        };
        current = T::as_tree(value).ok_or_else(|| CommonsError::TypeMismatch {
            path: path.as_str().into(),
            segment: (*segment).into(),
        })?;
    }
    Ok(current.child(path.leaf()))
}

/// Assign `value` at `path`, creating missing parents.
///
/// Returns `false`, leaving `root` untouched, when a parent segment exists but
/// isn't an object. Parents are only ever created after the last existing one,
/// so an aborted write never leaves half-built objects behind.
pub(crate) fn insert<T: Tree>(root: &mut T, path: &KeyPath<'_>, value: T::Value) -> bool {
    let mut current = root;
    for segment in path.parents() {
        if current.child(segment).is_none() {
            current.put(segment, T::empty_tree());
        }
        match current.child_mut(segment).and_then(T::as_tree_mut) {
            Some(next) => current = next,
            None => return false,
        }
    }
    current.put(path.leaf(), value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn tree(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {other:?}"),
        }
    }

    #[test]
    fn parse_single_segment() {
        let path = KeyPath::parse("port").unwrap();
        assert!(!path.is_nested());
        assert_eq!(path.leaf(), "port");
        assert!(path.parents().is_empty());
    }

    #[test]
    fn parse_nested() {
        let path = KeyPath::parse("a.b.c").unwrap();
        assert!(path.is_nested());
        assert_eq!(path.segments(), &["a", "b", "c"]);
        assert_eq!(path.parents(), &["a", "b"]);
        assert_eq!(path.leaf(), "c");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            KeyPath::parse(""),
            Err(CommonsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        for raw in ["a..b", ".a", "a.", "."] {
            assert!(
                matches!(KeyPath::parse(raw), Err(CommonsError::InvalidPath { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn lookup_nested_value() {
        let root = tree(json!({"a": {"b": {"c": 42}}}));
        let path = KeyPath::parse("a.b.c").unwrap();
        assert_eq!(lookup(&root, &path).unwrap(), Some(&json!(42)));
    }

    #[test]
    fn lookup_missing_parent_is_none() {
        let root = tree(json!({"x": 1}));
        let path = KeyPath::parse("a.b.c").unwrap();
        assert_eq!(lookup(&root, &path).unwrap(), None);
    }

    #[test]
    fn lookup_scalar_parent_is_type_mismatch() {
        let root = tree(json!({"a": {"b": "s"}}));
        let path = KeyPath::parse("a.b.c").unwrap();
        match lookup(&root, &path) {
            Err(CommonsError::TypeMismatch { segment, path }) => {
                assert_eq!(segment, "b");
                assert_eq!(path, "a.b.c");
            }
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn insert_creates_parents() {
        let mut root = Map::new();
        let path = KeyPath::parse("a.b.c").unwrap();
        assert!(insert(&mut root, &path, json!(42)));
        assert_eq!(Value::Object(root), json!({"a": {"b": {"c": 42}}}));
    }

    #[test]
    fn insert_keeps_siblings() {
        let mut root = tree(json!({"a": {"keep": true}}));
        let path = KeyPath::parse("a.b").unwrap();
        assert!(insert(&mut root, &path, json!(2)));
        assert_eq!(Value::Object(root), json!({"a": {"keep": true, "b": 2}}));
    }

    #[test]
    fn insert_replaces_leaf_wholesale() {
        let mut root = tree(json!({"a": {"b": {"deep": 1}}}));
        let path = KeyPath::parse("a.b").unwrap();
        assert!(insert(&mut root, &path, json!("flat")));
        assert_eq!(Value::Object(root), json!({"a": {"b": "flat"}}));
    }

    #[test]
    fn insert_blocked_by_scalar_is_noop() {
        let mut root = tree(json!({"a": 1}));
        let path = KeyPath::parse("a.b.c").unwrap();
        assert!(!insert(&mut root, &path, json!(2)));
        assert_eq!(Value::Object(root), json!({"a": 1}));
    }
}
