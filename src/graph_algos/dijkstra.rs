use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::{validate_endpoints, ClosedSet, Direction, Frontier, Heuristic, PathPlanner, Route};

use log::debug;


/// Dijkstra's Algorithm
/// https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm
#[derive(Clone, Copy, Debug, Default)]
pub struct Dijkstra;

impl PathPlanner for Dijkstra {
    fn name(&self) -> &'static str {
        "dijkstra"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        dijkstra(world, start, goal)
    }
}


/// Identify the shortest path using Dijkstra's Algorithm
/// From the start tile, expand tiles in order of cost until the goal is popped
pub fn dijkstra(world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
    validate_endpoints(world, start, goal)?;

    let mut frontier = Frontier::new(world, start, Heuristic::Zero, Direction::Forward);

    // Loop over each node to visit, removing the cheapest node
    while let Some(node) = frontier.pop() {
        // Popped nodes are final, the goal's cost can't improve any more
        if node.position == goal {
            let route = frontier.route_to(&node)?;
            debug!("dijkstra: {} -> {} costs {} after {} expansions", start, goal, route.cost, route.expanded);
            return Ok(route);
        }
        frontier.expand(&node);
    }

    debug!("dijkstra: {} -> {} unreachable after {} expansions", start, goal, frontier.expanded());
    Err(PathPlannerError::NoPathFound)
}


/// Returns a full map of the world, includes every reachable tile with its cheapest cost from `start`
pub fn dijkstra_costs(world: &World, start: Point) -> Result<ClosedSet, PathPlannerError> {
    world.validate_endpoint(start)?;

    let mut frontier = Frontier::new(world, start, Heuristic::Zero, Direction::Forward);
    while let Some(node) = frontier.pop() {
        frontier.expand(&node);
    }
    Ok(frontier.into_closed())
}
