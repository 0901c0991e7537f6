//! Shared value types: categories, commands, replies and metric records

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named slice of simulation state, fetched and translated independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Time,
    Player,
    Launches,
    Research,
    Production,
    Entities,
    Pollution,
}

impl Category {
    /// All categories in the order `/metrics/all` renders them
    pub const ALL: [Category; 7] = [
        Category::Time,
        Category::Player,
        Category::Launches,
        Category::Research,
        Category::Production,
        Category::Entities,
        Category::Pollution,
    ];

    /// Path segment and log label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Time => "time",
            Category::Player => "player",
            Category::Launches => "launches",
            Category::Research => "research",
            Category::Production => "production",
            Category::Entities => "entities",
            Category::Pollution => "pollution",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a path segment names no category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// An immutable remote command: a name for logs and the literal payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub payload: &'static str,
}

/// Raw body of the reply matched to one request id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub request_id: i32,
    pub body: Vec<u8>,
}

impl RawReply {
    pub fn new(request_id: i32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            request_id,
            body: body.into(),
        }
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Exposition type of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Static descriptor of one metric family
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Label keys, fixed per metric
    pub labels: &'static [&'static str],
}

/// Flattened (name, labels, value) unit ready for exposition
///
/// `label_values` is positional against `desc.labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub desc: &'static MetricDesc,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl MetricRecord {
    pub fn new(desc: &'static MetricDesc, label_values: Vec<String>, value: f64) -> Self {
        debug_assert_eq!(desc.labels.len(), label_values.len());
        Self {
            desc,
            label_values,
            value,
        }
    }

    pub fn name(&self) -> &'static str {
        self.desc.name
    }

    /// Ordered (key, value) label pairs
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc
            .labels
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Label value for `key`, if the family declares it
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}
