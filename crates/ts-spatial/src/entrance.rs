//! Cross-map routing over the entrance graph: a breadth-first search whose
//! nodes are entrance ids and whose edges are (a) same-map reachability
//! between entrances and (b) `leadsTo` links between maps.
//!
//! Rather than materializing a literal entrance-only graph up front, the BFS
//! frontier here is `(MapId, NodeId)` — "standing at this node, having just
//! arrived" — and same-map reachability to every entrance on the current map
//! is computed lazily via [`crate::router::Router`]. The two approaches visit
//! the same state space: an entrance-graph edge exists exactly when an
//! in-map path to that entrance exists, so this is the within-map router
//! applied at each frontier node rather than a second graph structure.

use std::collections::{HashMap, HashSet, VecDeque};

use ts_core::{MapId, NodeId};

use crate::map::Map;
use crate::router::Router;
use crate::{SpatialError, SpatialResult};

/// One leg of a cross-map route: a path within a single map, optionally
/// ending at the entrance used to leave it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSegment {
    pub map_id: MapId,
    pub path: Vec<NodeId>,
    /// `None` on the final segment, which ends at the true destination node
    /// rather than an entrance.
    pub exit_entrance_id: Option<NodeId>,
}

impl RouteSegment {
    /// A segment whose path length is under 2 is a pure transition: no
    /// in-map travel, just a teleport through an entrance, handled entirely
    /// by `ts-mobility`'s map-transition state machine.
    pub fn is_pure_transition(&self) -> bool {
        self.path.len() < 2
    }
}

/// Plan a route between two maps as a sequence of [`RouteSegment`]s.
///
/// Falls back to a single same-map segment when `from_map == to_map`.
pub fn plan_route(
    maps: &HashMap<MapId, Map>,
    router: &dyn Router,
    from_map: &MapId,
    from_node: &NodeId,
    to_map: &MapId,
    to_node: &NodeId,
) -> SpatialResult<Vec<RouteSegment>> {
    if from_map == to_map {
        let map = maps
            .get(from_map)
            .ok_or_else(|| SpatialError::MapNotFound(from_map.clone()))?;
        let path = router.route(map, from_node.clone(), to_node.clone(), &HashSet::new())?;
        if path.is_empty() {
            return Err(SpatialError::NoEntranceRoute {
                from_map: from_map.clone(),
                from_node: from_node.clone(),
                to_map: to_map.clone(),
                to_node: to_node.clone(),
            });
        }
        return Ok(vec![RouteSegment { map_id: from_map.clone(), path, exit_entrance_id: None }]);
    }

    type St = (MapId, NodeId);

    let start: St = (from_map.clone(), from_node.clone());
    let mut visited: HashSet<St> = HashSet::new();
    let mut queue: VecDeque<St> = VecDeque::new();
    // Predecessor state and the segment that was traversed to arrive here.
    let mut prev: HashMap<St, (St, RouteSegment)> = HashMap::new();

    visited.insert(start.clone());
    queue.push_back(start);

    let mut goal: Option<(St, RouteSegment)> = None;

    'bfs: while let Some((cmap, cnode)) = queue.pop_front() {
        let map = maps
            .get(&cmap)
            .ok_or_else(|| SpatialError::MapNotFound(cmap.clone()))?;

        if &cmap == to_map {
            let path = router.route(map, cnode.clone(), to_node.clone(), &HashSet::new())?;
            if !path.is_empty() {
                goal = Some((
                    (cmap.clone(), cnode.clone()),
                    RouteSegment { map_id: cmap.clone(), path, exit_entrance_id: None },
                ));
                break 'bfs;
            }
        }

        for entrance in map.entrance_nodes() {
            let Some((next_map, next_node)) = entrance.leads_to.clone() else { continue };
            let path = router.route(map, cnode.clone(), entrance.id.clone(), &HashSet::new())?;
            if path.is_empty() {
                continue;
            }
            let next_state: St = (next_map, next_node);
            if visited.insert(next_state.clone()) {
                let seg = RouteSegment {
                    map_id: cmap.clone(),
                    path,
                    exit_entrance_id: Some(entrance.id.clone()),
                };
                prev.insert(next_state.clone(), ((cmap.clone(), cnode.clone()), seg));
                queue.push_back(next_state);
            }
        }
    }

    let Some((goal_state, final_segment)) = goal else {
        return Err(SpatialError::NoEntranceRoute {
            from_map: from_map.clone(),
            from_node: from_node.clone(),
            to_map: to_map.clone(),
            to_node: to_node.clone(),
        });
    };

    let mut segments = vec![final_segment];
    let mut cur = goal_state;
    while let Some((pstate, seg)) = prev.get(&cur) {
        segments.push(seg.clone());
        cur = pstate.clone();
    }
    segments.reverse();
    Ok(segments)
}
