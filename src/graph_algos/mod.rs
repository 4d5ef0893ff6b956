pub mod dijkstra;
pub mod a_star;
pub mod bidirectional;
pub mod fringe;
mod frontier;
mod priority_queue;
mod search_node;
mod shortest_path;

pub use frontier::{Direction, Frontier, Heuristic};
pub use priority_queue::IndexedPriorityQueue;
pub use search_node::SearchNode;
pub use shortest_path::path_cost;

pub(crate) use frontier::trace_closed;
pub(crate) use shortest_path::{erase_loops, splice, trace_path};

use crate::collections::FxIndexMap;
use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;

/// Finalized nodes of one search, keyed by tile id
/// Iteration order is expansion order
pub type ClosedSet = FxIndexMap<u32, SearchNode>;


/// A planned path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub path: Vec<Point>, // start to goal, both included
    pub cost: u32, // sum of the costs of every tile after the start
    pub expanded: usize, // node expansions over all workers
}

impl Route {
    pub fn new(world: &World, path: Vec<Point>, expanded: usize) -> Self {
        let cost = path_cost(world, &path);
        Self { path, cost, expanded }
    }

    /// Route of a search whose start is its goal
    pub fn trivial(point: Point) -> Self {
        Self { path: vec![point], cost: 0, expanded: 0 }
    }

    pub fn start(&self) -> Option<Point> {
        self.path.first().copied()
    }

    pub fn goal(&self) -> Option<Point> {
        self.path.last().copied()
    }

    /// True if every step moves to an adjacent open tile and the cost adds up
    pub fn is_valid(&self, world: &World) -> bool {
        !self.path.is_empty()
            && self.path.iter().all(|point| world.is_open(*point))
            && self.path.windows(2).all(|pair| pair[0].is_adjacent(&pair[1]))
            && path_cost(world, &self.path) == self.cost
    }
}


/// A shortest path strategy
pub trait PathPlanner {
    /// Short name, used for reporting
    fn name(&self) -> &'static str;

    /// Plan a route from `start` to `goal`
    /// Both endpoints are validated before any search work starts
    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError>;
}


/// Reject endpoints that are outside of the world or on a wall
pub(crate) fn validate_endpoints(world: &World, start: Point, goal: Point) -> Result<(), PathPlannerError> {
    world.validate_endpoint(start)?;
    world.validate_endpoint(goal)?;
    Ok(())
}
