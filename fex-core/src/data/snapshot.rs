//! Typed snapshot tree
//!
//! JSON replies are converted into an explicit sum type so the translator
//! pattern-matches on shape instead of probing untyped values.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::Category;

/// Scalar leaf of a snapshot tree
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

/// Node of a snapshot tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(BTreeMap<String, Node>),
    Sequence(Vec<Node>),
    Scalar(Scalar),
}

static EMPTY_MAPPING: BTreeMap<String, Node> = BTreeMap::new();

impl Node {
    /// View as a mapping
    ///
    /// Lua serialises an empty table as `[]`, so an empty sequence reads as
    /// an empty mapping.
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Sequence(items) if items.is_empty() => Some(&EMPTY_MAPPING),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Numeric value; booleans read as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Scalar(Scalar::Number(n)) => Some(*n),
            Node::Scalar(Scalar::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    /// Null, or a mapping/sequence with no entries
    pub fn is_empty(&self) -> bool {
        match self {
            Node::Mapping(map) => map.is_empty(),
            Node::Sequence(items) => items.is_empty(),
            Node::Scalar(Scalar::Null) => true,
            Node::Scalar(_) => false,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => n
                .as_f64()
                .map(|f| Node::Scalar(Scalar::Number(f)))
                .unwrap_or(Node::Scalar(Scalar::Null)),
            Value::String(s) => Node::Scalar(Scalar::Text(s)),
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                Node::Mapping(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
        }
    }
}

/// Parsed state document for one category
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub category: Category,
    pub root: Node,
}

impl Snapshot {
    pub fn new(category: Category, root: Node) -> Self {
        Self { category, root }
    }

    /// Build from an already parsed `metrics` payload
    pub fn from_json(category: Category, metrics: Value) -> Self {
        Self::new(category, Node::from(metrics))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
