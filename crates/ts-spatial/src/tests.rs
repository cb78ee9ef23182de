//! Unit tests for ts-spatial.
//!
//! All tests use hand-crafted maps so they run without loading any map file.

#[cfg(test)]
mod helpers {
    use std::collections::{HashMap, HashSet};

    use ts_core::{MapId, NodeId};

    use crate::map::{Map, Node, NodeKind};

    fn node(id: &str, x: f32, y: f32, kind: NodeKind, edges: &[&str]) -> Node {
        Node {
            id: NodeId::new(id),
            x,
            y,
            kind,
            connected_to: edges.iter().map(|e| NodeId::new(*e)).collect(),
            leads_to: None,
            label: None,
        }
    }

    /// A 3x2 grid of waypoints:
    /// ```text
    /// n0 - n1 - n2
    /// n3 -      n4
    /// ```
    /// Shortest path n0→n4 by Euclidean distance goes via n1,n2 (3 unit
    /// hops) rather than via n3 (which has no edge onward to n4).
    pub fn grid_map() -> Map {
        let n0 = node("n0", 0.0, 0.0, NodeKind::Waypoint, &["n1", "n3"]);
        let n1 = node("n1", 1.0, 0.0, NodeKind::Waypoint, &["n0", "n2"]);
        let n2 = node("n2", 2.0, 0.0, NodeKind::Waypoint, &["n1", "n4"]);
        let n3 = node("n3", 0.0, 1.0, NodeKind::Waypoint, &["n0"]);
        let n4 = node("n4", 2.0, 1.0, NodeKind::Waypoint, &["n2"]);

        let mut nodes = HashMap::new();
        for n in [n0, n1, n2, n3, n4] {
            nodes.insert(n.id.clone(), n);
        }

        Map {
            id: MapId::new("grid"),
            width: 3,
            height: 2,
            background_color: "#000000".to_string(),
            spawn_node_id: NodeId::new("n0"),
            nodes,
            obstacles: vec![],
        }
    }

    pub fn empty_blocked() -> HashSet<NodeId> {
        HashSet::new()
    }
}

#[cfg(test)]
mod router {
    use ts_core::NodeId;

    use super::helpers::{empty_blocked, grid_map};
    use crate::router::{DijkstraRouter, Router};

    #[test]
    fn finds_shortest_path() {
        let map = grid_map();
        let path = DijkstraRouter
            .route(&map, NodeId::new("n0"), NodeId::new("n4"), &empty_blocked())
            .unwrap();
        assert_eq!(
            path,
            vec!["n0", "n1", "n2", "n4"].into_iter().map(NodeId::new).collect::<Vec<_>>()
        );
    }

    #[test]
    fn same_node_is_trivial_path() {
        let map = grid_map();
        let path = DijkstraRouter
            .route(&map, NodeId::new("n1"), NodeId::new("n1"), &empty_blocked())
            .unwrap();
        assert_eq!(path, vec![NodeId::new("n1")]);
    }

    #[test]
    fn unreachable_returns_empty_not_error() {
        let map = grid_map();
        // n3 only connects back to n0, so blocking n0 isolates n3 from n4.
        let mut blocked = empty_blocked();
        blocked.insert(NodeId::new("n0"));
        let path = DijkstraRouter
            .route(&map, NodeId::new("n3"), NodeId::new("n4"), &blocked)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn blocked_node_allowed_as_explicit_goal() {
        let map = grid_map();
        let mut blocked = empty_blocked();
        blocked.insert(NodeId::new("n4"));
        let path = DijkstraRouter
            .route(&map, NodeId::new("n0"), NodeId::new("n4"), &blocked)
            .unwrap();
        assert!(!path.is_empty(), "blocked goal node must still be reachable");
    }

    #[test]
    fn unknown_node_is_an_error() {
        let map = grid_map();
        let err = DijkstraRouter
            .route(&map, NodeId::new("ghost"), NodeId::new("n4"), &empty_blocked())
            .unwrap_err();
        assert!(matches!(err, crate::SpatialError::NodeNotFound(_, _)));
    }
}

#[cfg(test)]
mod entrance_routing {
    use std::collections::HashMap;

    use ts_core::{MapId, NodeId};

    use crate::entrance::plan_route;
    use crate::map::{Map, Node, NodeKind};
    use crate::router::DijkstraRouter;

    /// Two one-node maps linked by a symmetric entrance pair.
    fn two_map_world() -> HashMap<MapId, Map> {
        let map_a = MapId::new("a");
        let map_b = MapId::new("b");

        let door_a = Node {
            id: NodeId::new("door_a"),
            x: 1.0,
            y: 0.0,
            kind: NodeKind::Entrance,
            connected_to: [NodeId::new("start")].into_iter().collect(),
            leads_to: Some((map_b.clone(), NodeId::new("door_b"))),
            label: None,
        };
        let start = Node {
            id: NodeId::new("start"),
            x: 0.0,
            y: 0.0,
            kind: NodeKind::Waypoint,
            connected_to: [NodeId::new("door_a")].into_iter().collect(),
            leads_to: None,
            label: None,
        };
        let door_b = Node {
            id: NodeId::new("door_b"),
            x: 0.0,
            y: 0.0,
            kind: NodeKind::Entrance,
            connected_to: [NodeId::new("goal")].into_iter().collect(),
            leads_to: Some((map_a.clone(), NodeId::new("door_a"))),
            label: None,
        };
        let goal = Node {
            id: NodeId::new("goal"),
            x: 1.0,
            y: 0.0,
            kind: NodeKind::Waypoint,
            connected_to: [NodeId::new("door_b")].into_iter().collect(),
            leads_to: None,
            label: None,
        };

        let mut a_nodes = HashMap::new();
        a_nodes.insert(start.id.clone(), start);
        a_nodes.insert(door_a.id.clone(), door_a);
        let mut b_nodes = HashMap::new();
        b_nodes.insert(door_b.id.clone(), door_b);
        b_nodes.insert(goal.id.clone(), goal);

        let a = Map {
            id: map_a.clone(),
            width: 2,
            height: 1,
            background_color: "#fff".into(),
            spawn_node_id: NodeId::new("start"),
            nodes: a_nodes,
            obstacles: vec![],
        };
        let b = Map {
            id: map_b.clone(),
            width: 2,
            height: 1,
            background_color: "#fff".into(),
            spawn_node_id: NodeId::new("door_b"),
            nodes: b_nodes,
            obstacles: vec![],
        };

        let mut maps = HashMap::new();
        maps.insert(map_a, a);
        maps.insert(map_b, b);
        maps
    }

    #[test]
    fn routes_across_a_single_entrance() {
        let maps = two_map_world();
        let segments = plan_route(
            &maps,
            &DijkstraRouter,
            &MapId::new("a"),
            &NodeId::new("start"),
            &MapId::new("b"),
            &NodeId::new("goal"),
        )
        .unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].map_id, MapId::new("a"));
        assert_eq!(segments[0].exit_entrance_id, Some(NodeId::new("door_a")));
        assert_eq!(segments[1].map_id, MapId::new("b"));
        assert_eq!(segments[1].exit_entrance_id, None);
        assert_eq!(segments[1].path.last(), Some(&NodeId::new("goal")));
    }

    #[test]
    fn same_map_request_is_a_single_segment() {
        let maps = two_map_world();
        let segments = plan_route(
            &maps,
            &DijkstraRouter,
            &MapId::new("a"),
            &NodeId::new("start"),
            &MapId::new("a"),
            &NodeId::new("door_a"),
        )
        .unwrap();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].exit_entrance_id.is_none());
    }

    #[test]
    fn unreachable_cross_map_is_an_error() {
        let mut maps = two_map_world();
        // Sever the link.
        maps.get_mut(&MapId::new("a")).unwrap().nodes.get_mut(&NodeId::new("door_a")).unwrap().leads_to = None;
        let err = plan_route(
            &maps,
            &DijkstraRouter,
            &MapId::new("a"),
            &NodeId::new("start"),
            &MapId::new("b"),
            &NodeId::new("goal"),
        )
        .unwrap_err();
        assert!(matches!(err, crate::SpatialError::NoEntranceRoute { .. }));
    }
}
