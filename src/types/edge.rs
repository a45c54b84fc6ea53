//! Edge types for roadmap graphs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::NodeId;

/// Identifier of an edge, unique within a single graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create an edge id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stroke pattern of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Continuous stroke.
    #[default]
    Solid,
    /// Dashed stroke.
    Dashed,
    /// Dotted stroke.
    Dotted,
}

/// Arrowhead placement on an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowKind {
    /// No arrowheads.
    #[default]
    None,
    /// Arrowhead at the target end.
    End,
    /// Arrowhead at the source end.
    Start,
    /// Arrowheads at both ends.
    Both,
}

/// Visual style of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeStyle {
    /// Stroke pattern.
    pub line: LineKind,
    /// Stroke color.
    pub color: String,
    /// Stroke width.
    pub thickness: f64,
    /// Arrowhead placement.
    pub arrow: ArrowKind,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            line: LineKind::Solid,
            color: "#2b78e4".to_string(),
            thickness: 2.0,
            arrow: ArrowKind::None,
        }
    }
}

/// Directed connection between two nodes.
///
/// Endpoints are not required to exist; dangling edges are tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Edge identifier.
    pub id: EdgeId,
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Visual style.
    #[serde(default)]
    pub style: EdgeStyle,
}

impl Edge {
    /// Create an edge with the default style.
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            style: EdgeStyle::default(),
        }
    }

    /// Replace the style.
    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }
}
