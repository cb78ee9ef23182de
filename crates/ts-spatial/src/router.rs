//! Within-map pathfinding.
//!
//! Dijkstra over the node graph, edge weight = Euclidean distance between
//! node positions. The teacher's `dt-spatial::router` keys its priority queue
//! on integer millisecond costs, so a plain `BinaryHeap<Reverse<(u32, NodeId)>>`
//! suffices there; here edge weight is a continuous pixel distance, so the
//! queue key wraps an `f32` with `total_cmp` instead of relying on `Ord`,
//! keeping the same tie-break-by-`NodeId` determinism.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ts_core::NodeId;

use crate::map::Map;
use crate::{SpatialError, SpatialResult};

/// Priority queue key: total-ordered by cost, then by node id, matching
/// the deterministic tie-break: equal-cost nodes order by `NodeId`.
#[derive(Clone, Debug)]
struct QueueKey(f32, NodeId);

impl PartialEq for QueueKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}
impl Eq for QueueKey {}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0).then_with(|| self.1.cmp(&other.1))
    }
}

/// Pluggable within-map router. `ts-behavior`/`ts-mobility` depend on this
/// trait rather than `DijkstraRouter` directly, the way `dt-sim` depends on
/// `dt_spatial::Router` rather than a concrete implementation.
pub trait Router: Send + Sync {
    /// Compute a path of node ids from `from` to `to`, inclusive of both
    /// endpoints. Returns an empty vec if no path exists rather than an
    /// error — unreachability is a normal outcome callers check for, not a
    /// fault.
    fn route(
        &self,
        map: &Map,
        from: NodeId,
        to: NodeId,
        blocked: &HashSet<NodeId>,
    ) -> SpatialResult<Vec<NodeId>>;
}

/// Standard Dijkstra's algorithm, the default [`Router`].
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(
        &self,
        map: &Map,
        from: NodeId,
        to: NodeId,
        blocked: &HashSet<NodeId>,
    ) -> SpatialResult<Vec<NodeId>> {
        dijkstra(map, from, to, blocked)
    }
}

fn dijkstra(
    map: &Map,
    from: NodeId,
    to: NodeId,
    blocked: &HashSet<NodeId>,
) -> SpatialResult<Vec<NodeId>> {
    if !map.nodes.contains_key(&from) {
        return Err(SpatialError::NodeNotFound(from, map.id.clone()));
    }
    if !map.nodes.contains_key(&to) {
        return Err(SpatialError::NodeNotFound(to, map.id.clone()));
    }
    if from == to {
        return Ok(vec![from]);
    }

    let mut dist: HashMap<NodeId, f32> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<QueueKey>> = BinaryHeap::new();

    dist.insert(from.clone(), 0.0);
    heap.push(Reverse(QueueKey(0.0, from.clone())));

    while let Some(Reverse(QueueKey(cost, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(&prev, to));
        }
        if cost > *dist.get(&node).unwrap_or(&f32::MAX) {
            continue;
        }

        let Some(current) = map.nodes.get(&node) else { continue };
        let mut neighbors: Vec<&NodeId> = current.connected_to.iter().collect();
        neighbors.sort();
        for neighbor in neighbors {
            // Blocked nodes are non-traversable except as the explicit goal.
            if blocked.contains(neighbor) && neighbor != &to {
                continue;
            }
            let Some(neighbor_node) = map.nodes.get(neighbor) else { continue };
            let step = current.position().distance(&neighbor_node.position());
            let new_cost = cost + step;
            let better = new_cost < *dist.get(neighbor).unwrap_or(&f32::MAX);
            if better {
                dist.insert(neighbor.clone(), new_cost);
                prev.insert(neighbor.clone(), node.clone());
                heap.push(Reverse(QueueKey(new_cost, neighbor.clone())));
            }
        }
    }

    Ok(vec![])
}

fn reconstruct(prev: &HashMap<NodeId, NodeId>, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to.clone()];
    let mut cur = to;
    while let Some(p) = prev.get(&cur) {
        path.push(p.clone());
        cur = p.clone();
    }
    path.reverse();
    path
}
