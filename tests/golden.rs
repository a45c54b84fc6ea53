//! Golden tests for the roadmap kernel.
//!
//! These pin the exact output of the pure engines: diff records, ranking
//! order and tiers, and snap deltas.

use roadmap_kernel::{
    compute_guide_lines, compute_snap_delta, diff, rank, AuthorId, Axis, ChangeAction, Edge,
    EntityType, GraphSnapshot, Node, NodeContent, Position, QualityTier, RankedVersion, RoadmapId,
    Size, Version, VoteCounts, DEFAULT_SNAP_THRESHOLD,
};
use serde_json::json;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn make_topic(id: &str, label: &str) -> Node {
    Node::new(id, NodeContent::topic(label), Position::new(0.0, 0.0))
}

fn make_box(id: &str, x: f64, y: f64) -> Node {
    Node::new(id, NodeContent::topic(id), Position::new(x, y)).with_size(Size::new(100.0, 40.0))
}

fn make_version(author: &str, up: u32, down: u32) -> Version {
    let mut version = Version::new(
        AuthorId::new(author),
        RoadmapId::new("rust"),
        GraphSnapshot::new(),
        "",
    );
    version.vote_counts = VoteCounts::new(up, down);
    version
}

// ─────────────────────────────────────────────────────────────────────────────
// Diff
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_diff_golden_wire_format() {
    let g0 = GraphSnapshot::from_parts([make_topic("A", "X")], Vec::<Edge>::new());
    let g1 = GraphSnapshot::from_parts(
        [make_topic("A", "Y"), make_topic("B", "Z")],
        Vec::<Edge>::new(),
    );

    let wire = serde_json::to_value(diff(&g0, &g1)).unwrap();

    assert_eq!(
        wire,
        json!([
            {
                "entity_type": "node", "action": "add", "entity_id": "B",
                "before": null, "after": "Z"
            },
            {
                "entity_type": "node", "action": "modify", "entity_id": "A",
                "before": "X", "after": "Y"
            }
        ])
    );
}

#[test]
fn test_diff_golden_full_ordering() {
    let g0 = GraphSnapshot::from_parts(
        [make_topic("a", "Alpha"), make_topic("b", "Beta"), make_topic("c", "Gamma")],
        [Edge::new("e1", "a", "b"), Edge::new("e2", "b", "c")],
    );
    let g1 = GraphSnapshot::from_parts(
        [make_topic("a", "Alpha 2"), make_topic("b", "Beta"), make_topic("d", "Delta")],
        [Edge::new("e1", "a", "b"), Edge::new("e3", "b", "d")],
    );

    let phases: Vec<(EntityType, ChangeAction, String)> = diff(&g0, &g1)
        .iter()
        .map(|r| (r.entity_type, r.action, r.entity_id.clone()))
        .collect();

    assert_eq!(
        phases,
        vec![
            (EntityType::Node, ChangeAction::Add, "d".to_string()),
            (EntityType::Node, ChangeAction::Modify, "a".to_string()),
            (EntityType::Node, ChangeAction::Remove, "c".to_string()),
            (EntityType::Connection, ChangeAction::Add, "e3".to_string()),
            (EntityType::Connection, ChangeAction::Remove, "e2".to_string()),
        ]
    );
}

#[test]
fn test_diff_edge_labels_use_both_snapshots() {
    let g0 = GraphSnapshot::from_parts(
        [make_topic("a", "Basics"), make_topic("b", "Ownership")],
        [Edge::new("e1", "a", "b")],
    );
    let g1 = GraphSnapshot::from_parts([make_topic("a", "Basics")], Vec::<Edge>::new());

    let changes = diff(&g0, &g1);
    let removed = changes.removed_edges();

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].before.as_deref(), Some("Basics → Ownership"));
}

#[test]
fn test_diff_from_lenient_json() {
    let baseline = GraphSnapshot::from_json(&json!({
        "nodes": {
            "a": { "kind": "topic", "label": "Basics", "position": { "x": 0.0, "y": 0.0 } }
        }
    }))
    .unwrap();
    let current = GraphSnapshot::from_json(&json!({
        "nodes": [
            { "id": "a", "kind": "topic", "label": "Basics", "position": { "x": 0.0, "y": 0.0 },
              "size": { "width": 120.0, "height": 60.0 } },
            { "id": "broken", "kind": "no-such-kind" }
        ]
    }))
    .unwrap();

    // Explicit default size equals the absent size; the malformed node is skipped.
    assert!(diff(&baseline, &current).is_empty());
}

#[test]
fn test_diff_sees_edits_to_unknown_kinds() {
    let graph = |label: &str| {
        json!({
            "nodes": [
                { "id": "a", "kind": "topic", "label": "Basics",
                  "position": { "x": 0.0, "y": 0.0 } },
                { "id": "b", "kind": "checklist", "label": label,
                  "position": { "x": 0.0, "y": 90.0 } }
            ]
        })
    };
    let baseline = GraphSnapshot::from_json(&graph("Ship it")).unwrap();
    let current = GraphSnapshot::from_json(&graph("Ship it twice")).unwrap();

    assert_eq!(baseline.nodes.len(), 2);

    let changes = diff(&baseline, &current);
    let modified = changes.modified_nodes();
    assert_eq!(changes.len(), 1);
    assert_eq!(modified[0].entity_id, "b");
    assert_eq!(modified[0].before.as_deref(), Some("Ship it"));
    assert_eq!(modified[0].after.as_deref(), Some("Ship it twice"));

    assert!(diff(&baseline, &baseline).is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Ranking
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ranking_golden_scores_and_tiers() {
    let ranked = rank(&[make_version("bob", 2, 0), make_version("alice", 9, 1)]);

    assert_eq!(ranked[0].version.author_id.as_str(), "alice");
    assert_eq!(ranked[0].positive_ratio, 0.9);
    assert_eq!(ranked[0].score, 9.0);
    assert_eq!(ranked[0].quality_tier, QualityTier::Excellent);
    assert_eq!(ranked[0].rank, 1);

    assert_eq!(ranked[1].quality_tier, QualityTier::Normal);
    assert_eq!(ranked[1].rank, 2);
}

#[test]
fn test_ranking_is_repeatable() {
    let versions: Vec<Version> = (0..20)
        .map(|i| make_version(&format!("author-{i}"), i % 7, i % 3))
        .collect();

    let first = rank(&versions);
    let second = rank(&versions);

    let ids = |r: &[RankedVersion]| r.iter().map(|v| v.version.id).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first, second);
}

// ─────────────────────────────────────────────────────────────────────────────
// Alignment
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_snap_golden_left_edges() {
    let moving = make_box("m", 100.0, 0.0);
    let others = [make_box("o", 104.0, 500.0)];

    let delta = compute_snap_delta(&moving, &others, DEFAULT_SNAP_THRESHOLD);
    assert_eq!(delta.dx, 4.0);
    assert_eq!(delta.dy, 0.0);

    let mut dropped = moving.clone();
    delta.apply(&mut dropped);
    assert_eq!(dropped.position.x, 104.0);
}

#[test]
fn test_guides_follow_the_other_node() {
    let moving = make_box("m", 100.0, 0.0);
    let others = [make_box("o", 104.0, 500.0), make_box("far", 900.0, 900.0)];

    let guides = compute_guide_lines(&moving, &others, DEFAULT_SNAP_THRESHOLD);

    assert!(!guides.is_empty());
    assert!(guides.iter().all(|g| g.owner_id.as_str() == "o"));
    assert!(guides.iter().all(|g| g.axis == Axis::Vertical));
    assert!(guides.iter().any(|g| g.coordinate == 104.0));
}
