//! Node types for roadmap graphs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Default node width when a node carries no explicit size.
pub const DEFAULT_NODE_WIDTH: f64 = 120.0;

/// Default node height when a node carries no explicit size.
pub const DEFAULT_NODE_HEIGHT: f64 = 60.0;

/// Identifier of a node, unique within a single graph.
///
/// Two nodes with the same id in different snapshots are the same node
/// observed at different times.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Top-left position of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Rendered size of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in canvas units.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Height in canvas units.
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_width() -> f64 {
    DEFAULT_NODE_WIDTH
}

fn default_height() -> f64 {
    DEFAULT_NODE_HEIGHT
}

impl Size {
    /// Create a size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
        }
    }
}

/// Orientation of a divider line node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrientation {
    /// Horizontal divider.
    #[default]
    Horizontal,
    /// Vertical divider.
    Vertical,
}

/// Kind-specific payload of a node.
///
/// Every field has a default so that sparse input normalizes to one
/// canonical value; diff equality compares this normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeContent {
    /// Roadmap title banner.
    Title {
        /// Title text.
        #[serde(default)]
        label: String,
    },
    /// Primary topic.
    Topic {
        /// Topic label.
        #[serde(default)]
        label: String,
        /// Fill color.
        #[serde(default)]
        color: Option<String>,
    },
    /// Secondary topic attached to a topic.
    Subtopic {
        /// Subtopic label.
        #[serde(default)]
        label: String,
        /// Fill color.
        #[serde(default)]
        color: Option<String>,
    },
    /// Free-form paragraph of text.
    Paragraph {
        /// Paragraph body.
        #[serde(default)]
        text: String,
    },
    /// Clickable button linking elsewhere.
    Button {
        /// Button caption.
        #[serde(default)]
        label: String,
        /// Target URL.
        #[serde(default)]
        url: Option<String>,
        /// Fill color.
        #[serde(default)]
        color: Option<String>,
    },
    /// Checklist item.
    Todo {
        /// Item text.
        #[serde(default)]
        label: String,
        /// Whether the item is checked.
        #[serde(default)]
        done: bool,
    },
    /// Divider line.
    Line {
        /// Line orientation.
        #[serde(default)]
        orientation: LineOrientation,
        /// Stroke color.
        #[serde(default)]
        color: Option<String>,
    },
    /// Plain text label without a frame.
    Label {
        /// Label text.
        #[serde(default)]
        text: String,
    },
    /// Inline hyperlink.
    Link {
        /// Link caption.
        #[serde(default)]
        label: String,
        /// Target URL.
        #[serde(default)]
        url: Option<String>,
    },
    /// A kind without a dedicated variant, kept verbatim (including its
    /// `kind` entry) so the node survives a save and its edits still show
    /// up in diffs.
    #[serde(untagged)]
    Other(BTreeMap<String, Value>),
}

/// Kind tags that have a dedicated [`NodeContent`] variant.
pub const KNOWN_NODE_KINDS: [&str; 9] = [
    "title",
    "topic",
    "subtopic",
    "paragraph",
    "button",
    "todo",
    "line",
    "label",
    "link",
];

impl NodeContent {
    /// Kind tag.
    pub fn kind(&self) -> &str {
        match self {
            Self::Title { .. } => "title",
            Self::Topic { .. } => "topic",
            Self::Subtopic { .. } => "subtopic",
            Self::Paragraph { .. } => "paragraph",
            Self::Button { .. } => "button",
            Self::Todo { .. } => "todo",
            Self::Line { .. } => "line",
            Self::Label { .. } => "label",
            Self::Link { .. } => "link",
            Self::Other(properties) => properties
                .get("kind")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }

    /// The text a reader would identify this node by, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Title { label }
            | Self::Topic { label, .. }
            | Self::Subtopic { label, .. }
            | Self::Button { label, .. }
            | Self::Todo { label, .. }
            | Self::Link { label, .. } => Some(label),
            Self::Paragraph { text } | Self::Label { text } => Some(text),
            Self::Line { .. } => None,
            Self::Other(properties) => ["label", "text"]
                .iter()
                .find_map(|key| properties.get(*key).and_then(Value::as_str)),
        }
    }

    /// Whether this content came from a usable kind tag.
    ///
    /// Catch-all content needs a string `kind` naming no dedicated variant;
    /// a known kind lands here only when its fields have the wrong types.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Other(properties) => matches!(
                properties.get("kind").and_then(Value::as_str),
                Some(kind) if !KNOWN_NODE_KINDS.contains(&kind)
            ),
            _ => true,
        }
    }

    /// Convenience constructor for a topic.
    pub fn topic(label: impl Into<String>) -> Self {
        Self::Topic {
            label: label.into(),
            color: None,
        }
    }
}

/// A node in a roadmap graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier.
    pub id: NodeId,
    /// Kind and kind-specific properties.
    #[serde(flatten)]
    pub content: NodeContent,
    /// Top-left position.
    pub position: Position,
    /// Size, defaulted when absent.
    #[serde(default)]
    pub size: Size,
}

impl Node {
    /// Create a node with default size.
    pub fn new(id: impl Into<NodeId>, content: NodeContent, position: Position) -> Self {
        Self {
            id: id.into(),
            content,
            position,
            size: Size::default(),
        }
    }

    /// Set an explicit size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Human-readable text for change review.
    ///
    /// Falls back to `Untitled <kind>` when the node has no text.
    pub fn display_text(&self) -> String {
        match self.content.text().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Untitled {}", self.content.kind()),
        }
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
