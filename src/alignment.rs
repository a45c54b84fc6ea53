//! Alignment guides and snapping for interactive node dragging.
//!
//! Called once per pointer-move frame, so every function here is a single
//! O(n) pass over the other nodes. [`compute_snap_delta`] does not allocate.
//!
//! ## Geometry
//!
//! ```text
//! left = x          right  = x + width    center_x = x + width / 2
//! top  = y          bottom = y + height   center_y = y + height / 2
//! ```
//!
//! Each of the moving node's three x anchors is compared with each of the
//! other node's three x anchors (vertical guides), and likewise for y
//! (horizontal guides). A match is any pair closer than the threshold.

use serde::{Deserialize, Serialize};

use crate::types::{Node, NodeId, Size};

/// Default snap distance in canvas pixels.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 8.0;

/// Alignment settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Maximum distance (exclusive) at which anchors are considered aligned.
    pub threshold: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Constant x; aligns left/right/center_x.
    Vertical,
    /// Constant y; aligns top/bottom/center_y.
    Horizontal,
}

/// Which edge (or center) of a node along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Left or top edge.
    Start,
    /// Horizontal or vertical center.
    Center,
    /// Right or bottom edge.
    End,
}

/// Axis-aligned bounds of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRect {
    /// Left edge.
    pub left: f64,
    /// Right edge.
    pub right: f64,
    /// Top edge.
    pub top: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Horizontal center.
    pub center_x: f64,
    /// Vertical center.
    pub center_y: f64,
}

impl NodeRect {
    /// Bounds of a node, or `None` if its position is not finite.
    ///
    /// A non-finite or non-positive size falls back to the default size.
    pub fn of(node: &Node) -> Option<Self> {
        if !node.position.is_finite() {
            return None;
        }
        let default = Size::default();
        let width = usable_extent(node.size.width, default.width);
        let height = usable_extent(node.size.height, default.height);
        let (x, y) = (node.position.x, node.position.y);

        Some(Self {
            left: x,
            right: x + width,
            top: y,
            bottom: y + height,
            center_x: x + width / 2.0,
            center_y: y + height / 2.0,
        })
    }

    fn anchors(&self, axis: Axis) -> [(Anchor, f64); 3] {
        match axis {
            Axis::Vertical => [
                (Anchor::Start, self.left),
                (Anchor::Center, self.center_x),
                (Anchor::End, self.right),
            ],
            Axis::Horizontal => [
                (Anchor::Start, self.top),
                (Anchor::Center, self.center_y),
                (Anchor::End, self.bottom),
            ],
        }
    }
}

fn usable_extent(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// A transient alignment hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    /// Orientation.
    pub axis: Axis,
    /// x for vertical guides, y for horizontal guides (the other node's anchor).
    pub coordinate: f64,
    /// Node the guide aligns to.
    pub owner_id: NodeId,
    /// Anchor on the moving node.
    pub moving_anchor: Anchor,
    /// Anchor on the owner node.
    pub target_anchor: Anchor,
}

/// Translation that snaps a dropped node onto the nearest guides.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapDelta {
    /// Horizontal correction.
    pub dx: f64,
    /// Vertical correction.
    pub dy: f64,
}

impl SnapDelta {
    /// Whether neither axis snapped.
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }

    /// Translate a node by this delta. Size is untouched.
    pub fn apply(&self, node: &mut Node) {
        node.position.x += self.dx;
        node.position.y += self.dy;
    }
}

/// Guide lines between `moving` and every other node within `threshold`.
///
/// The moving node itself (same id) and nodes without finite geometry are
/// skipped.
pub fn compute_guide_lines<'a, I>(moving: &Node, others: I, threshold: f64) -> Vec<GuideLine>
where
    I: IntoIterator<Item = &'a Node>,
{
    let Some(rect) = NodeRect::of(moving) else {
        return Vec::new();
    };

    let mut guides = Vec::new();
    for other in others {
        if other.id == moving.id {
            continue;
        }
        let Some(other_rect) = NodeRect::of(other) else {
            continue;
        };

        for axis in [Axis::Vertical, Axis::Horizontal] {
            for (moving_anchor, value) in rect.anchors(axis) {
                for (target_anchor, target) in other_rect.anchors(axis) {
                    if (value - target).abs() < threshold {
                        guides.push(GuideLine {
                            axis,
                            coordinate: target,
                            owner_id: other.id.clone(),
                            moving_anchor,
                            target_anchor,
                        });
                    }
                }
            }
        }
    }
    guides
}

/// Per-axis correction toward the closest guide within `threshold`.
///
/// For each axis the candidate with the smallest absolute offset wins (the
/// first one found on ties); an axis with no candidate yields 0.
pub fn compute_snap_delta<'a, I>(moving: &Node, others: I, threshold: f64) -> SnapDelta
where
    I: IntoIterator<Item = &'a Node>,
{
    let Some(rect) = NodeRect::of(moving) else {
        return SnapDelta::default();
    };

    let mut best_x: Option<f64> = None;
    let mut best_y: Option<f64> = None;

    for other in others {
        if other.id == moving.id {
            continue;
        }
        let Some(other_rect) = NodeRect::of(other) else {
            continue;
        };

        closest_offset(
            &mut best_x,
            rect.anchors(Axis::Vertical),
            other_rect.anchors(Axis::Vertical),
            threshold,
        );
        closest_offset(
            &mut best_y,
            rect.anchors(Axis::Horizontal),
            other_rect.anchors(Axis::Horizontal),
            threshold,
        );
    }

    SnapDelta {
        dx: best_x.map_or(0.0, |offset| -offset),
        dy: best_y.map_or(0.0, |offset| -offset),
    }
}

fn closest_offset(
    best: &mut Option<f64>,
    moving: [(Anchor, f64); 3],
    other: [(Anchor, f64); 3],
    threshold: f64,
) {
    for (_, value) in moving {
        for (_, target) in other {
            let offset = value - target;
            if offset.abs() < threshold && best.map_or(true, |b| offset.abs() < b.abs()) {
                *best = Some(offset);
            }
        }
    }
}
