use std::collections::VecDeque;
use std::collections::hash_map::Entry;

use crate::collections::FxHashMap;
use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::{trace_path, validate_endpoints, Heuristic, PathPlanner, Route, SearchNode};

use log::{debug, trace};


/// Fringe Search
/// https://en.wikipedia.org/wiki/Fringe_search
///
/// Works through a list of nodes instead of a priority queue. Nodes above the current
/// f-threshold wait in `later` and the threshold is raised to the cheapest of them once
/// `now` runs dry. The threshold never passes the optimal cost before the goal is
/// reached, so the first goal accepted is optimal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fringe;

impl PathPlanner for Fringe {
    fn name(&self) -> &'static str {
        "fringe"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;

        let heuristic = Heuristic::Manhattan(goal);
        let origin = SearchNode::origin(world.tile_at(start.x, start.y), start, heuristic.estimate(start));

        let mut seen: FxHashMap<u32, SearchNode> = FxHashMap::default();
        seen.insert(origin.tile.id, origin);
        let mut now = VecDeque::from([origin]);
        let mut later = VecDeque::new();
        let mut threshold = origin.combined_priority();
        let mut expanded = 0;
        let mut round = 0;

        loop {
            let mut next_threshold = SearchNode::INF;

            while let Some(node) = now.pop_front() {
                if is_stale(&seen, &node) {
                    continue;
                }

                let priority = node.combined_priority();
                if priority > threshold {
                    next_threshold = next_threshold.min(priority);
                    later.push_back(node);
                    continue;
                }

                if node.position == goal {
                    let path = trace_path(world, &node, |id| seen.get(&id).copied())?;
                    let route = Route::new(world, path, expanded);
                    debug!("fringe: {} -> {} costs {} after {} expansions in {} rounds", start, goal, route.cost, expanded, round + 1);
                    return Ok(route);
                }

                expanded += 1;
                for child in relax_neighbors(world, &heuristic, &mut seen, &node) {
                    now.push_front(child);
                }
            }

            if later.is_empty() {
                debug!("fringe: {} -> {} unreachable after {} expansions", start, goal, expanded);
                return Err(PathPlannerError::NoPathFound);
            }

            round += 1;
            trace!("fringe: round {} raises threshold {} -> {} with {} deferred", round, threshold, next_threshold, later.len());
            threshold = next_threshold;
            std::mem::swap(&mut now, &mut later);
        }
    }
}


/// A queued copy that a cheaper route has since replaced
fn is_stale(seen: &FxHashMap<u32, SearchNode>, node: &SearchNode) -> bool {
    seen.get(&node.tile.id).is_some_and(|best| best.best_cost < node.best_cost)
}


/// Relax the neighbours of `node` into `seen`, returning the ones that improved
fn relax_neighbors(world: &World, heuristic: &Heuristic, seen: &mut FxHashMap<u32, SearchNode>, node: &SearchNode) -> Vec<SearchNode> {
    let mut improved = Vec::with_capacity(4);
    for (position, tile) in world.neighbors(node.position) {
        let candidate = node.best_cost.saturating_add(tile.cost);
        match seen.entry(tile.id) {
            Entry::Occupied(mut entry) => {
                if entry.get_mut().relax(candidate, node.position) {
                    improved.push(*entry.get());
                }
            }
            Entry::Vacant(entry) => {
                let reached = SearchNode::reached(tile, position, heuristic.estimate(position), candidate, node.position);
                improved.push(*entry.insert(reached));
            }
        }
    }
    improved
}
