use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::{validate_endpoints, Direction, Frontier, Heuristic, PathPlanner, Route};

use log::debug;


/// A* Algorithm
/// https://en.wikipedia.org/wiki/A*_search_algorithm
///
/// Tiles are ordered by best cost plus the Manhattan distance to the goal.
/// Every open tile costs at least 1, so the estimate never overestimates and never
/// drops by more than a step costs: the first time the goal is popped its cost is final.
#[derive(Clone, Copy, Debug, Default)]
pub struct AStar;

impl PathPlanner for AStar {
    fn name(&self) -> &'static str {
        "aStar"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;

        let mut frontier = Frontier::new(world, start, Heuristic::Manhattan(goal), Direction::Forward);

        while let Some(node) = frontier.pop() {
            // Check if we've reached the goal
            if node.position == goal {
                let route = frontier.route_to(&node)?;
                debug!("aStar: {} -> {} costs {} after {} expansions", start, goal, route.cost, route.expanded);
                return Ok(route);
            }
            frontier.expand(&node);
        }

        debug!("aStar: {} -> {} unreachable after {} expansions", start, goal, frontier.expanded());
        Err(PathPlannerError::NoPathFound)
    }
}
