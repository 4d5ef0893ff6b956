use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::{ClosedSet, IndexedPriorityQueue, Route, SearchNode};
use super::shortest_path::trace_path;


/// Estimate of the remaining cost from a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristic {
    Zero, // Dijkstra
    Manhattan(Point), // target of the search
}

impl Heuristic {
    pub fn estimate(&self, point: Point) -> u32 {
        match self {
            Heuristic::Zero => 0,
            Heuristic::Manhattan(target) => point.manhattan(target),
        }
    }
}


/// Which way a frontier walks the grid
/// Entering a tile costs that tile's cost. A reverse frontier walks the moves backwards,
/// so relaxing from a tile costs the tile being left and its best costs are
/// the remaining cost towards its origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    pub fn index(&self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}


/// One search direction: an open queue, its closed-set and a heuristic
/// Owned by a single thread
pub struct Frontier<'w> {
    world: &'w World,
    heuristic: Heuristic,
    direction: Direction,
    open: IndexedPriorityQueue,
    closed: ClosedSet,
    relaxed: Vec<SearchNode>, // nodes improved by the last expansion
}

impl<'w> Frontier<'w> {

    /// Frontier seeded with `origin` at cost 0
    /// The origin must be an open tile inside the world
    pub fn new(world: &'w World, origin: Point, heuristic: Heuristic, direction: Direction) -> Self {
        let mut open = IndexedPriorityQueue::new(world.width());
        let tile = world.tile_at(origin.x, origin.y);
        open.push(SearchNode::origin(tile, origin, heuristic.estimate(origin)));

        Self {
            world,
            heuristic,
            direction,
            open,
            closed: ClosedSet::default(),
            relaxed: Vec::new(),
        }
    }

    /// Pop the cheapest open node and move it to the closed-set
    pub fn pop(&mut self) -> Option<SearchNode> {
        let node = self.open.pop()?;
        self.closed.insert(node.tile.id, node);
        Some(node)
    }

    /// Relax every open neighbour of `node` that is not closed yet
    /// The improved neighbours are available from `last_relaxed` until the next call
    pub fn expand(&mut self, node: &SearchNode) {
        self.relaxed.clear();
        for (position, tile) in self.world.neighbors(node.position) {
            if self.closed.contains_key(&tile.id) {
                continue;
            }

            let step = match self.direction {
                Direction::Forward => tile.cost,
                Direction::Reverse => node.tile.cost,
            };
            let candidate = node.best_cost.saturating_add(step);

            if self.open.contains(position.x, position.y) {
                if self.open.decrease_cost(position.x, position.y, candidate, node.position) {
                    if let Some(improved) = self.open.get(position.x, position.y) {
                        self.relaxed.push(*improved);
                    }
                }
            } else {
                let discovered = SearchNode::reached(tile, position, self.heuristic.estimate(position), candidate, node.position);
                self.open.push(discovered);
                self.relaxed.push(discovered);
            }
        }
    }

    pub fn last_relaxed(&self) -> &[SearchNode] {
        &self.relaxed
    }

    /// Combined priority of the next node to pop, INF once exhausted
    pub fn peek_priority(&self) -> u32 {
        self.open.peek_priority()
    }

    /// Best known record for a tile, closed or still queued
    pub fn node(&self, point: Point) -> Option<&SearchNode> {
        let id = self.world.id_of(point);
        self.closed.get(&id).or_else(|| self.open.get(point.x, point.y))
    }

    pub fn best_cost(&self, point: Point) -> Option<u32> {
        self.node(point).map(|node| node.best_cost)
    }

    pub fn is_closed(&self, point: Point) -> bool {
        self.closed.contains_key(&self.world.id_of(point))
    }

    /// Number of nodes expanded so far
    pub fn expanded(&self) -> usize {
        self.closed.len()
    }

    pub fn into_closed(self) -> ClosedSet {
        self.closed
    }

    /// Chain of points from the origin to `end`
    pub fn trace(&self, end: &SearchNode) -> Result<Vec<Point>, PathPlannerError> {
        trace_closed(self.world, &self.closed, end)
    }

    /// Route from the origin to `end`
    pub fn route_to(&self, end: &SearchNode) -> Result<Route, PathPlannerError> {
        let path = self.trace(end)?;
        Ok(Route::new(self.world, path, self.expanded()))
    }

    #[cfg(test)]
    pub(crate) fn open(&self) -> &IndexedPriorityQueue {
        &self.open
    }
}


/// Trace a predecessor chain through a closed-set
pub(crate) fn trace_closed(world: &World, closed: &ClosedSet, end: &SearchNode) -> Result<Vec<Point>, PathPlannerError> {
    trace_path(world, end, |id| closed.get(&id).copied())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_relaxation_adds_entered_tile_cost() {
        let world = World::from_rows(&["152"]).unwrap();
        let mut frontier = Frontier::new(&world, Point::new(0, 0), Heuristic::Zero, Direction::Forward);

        let origin = frontier.pop().unwrap();
        frontier.expand(&origin);
        assert_eq!(frontier.best_cost(Point::new(1, 0)), Some(5));
        assert_eq!(frontier.last_relaxed().len(), 1);

        let middle = frontier.pop().unwrap();
        frontier.expand(&middle);
        assert_eq!(frontier.best_cost(Point::new(2, 0)), Some(7));
        assert!(frontier.is_closed(Point::new(1, 0)));
        frontier.open().check_invariants().unwrap();
    }

    #[test]
    fn test_reverse_relaxation_adds_left_tile_cost() {
        let world = World::from_rows(&["152"]).unwrap();
        let mut frontier = Frontier::new(&world, Point::new(2, 0), Heuristic::Zero, Direction::Reverse);

        let origin = frontier.pop().unwrap();
        frontier.expand(&origin);
        // moving (1,0) -> (2,0) forwards enters the cost 2 tile
        assert_eq!(frontier.best_cost(Point::new(1, 0)), Some(2));

        let middle = frontier.pop().unwrap();
        frontier.expand(&middle);
        assert_eq!(frontier.best_cost(Point::new(0, 0)), Some(7));
    }

    #[test]
    fn test_expand_keeps_cheaper_queued_cost() {
        let world = World::from_rows(&[
            "19",
            "11",
        ]).unwrap();
        let mut frontier = Frontier::new(&world, Point::new(0, 0), Heuristic::Zero, Direction::Forward);
        let origin = frontier.pop().unwrap();
        frontier.expand(&origin);

        // (0,1) is cheapest, then reaching (1,1) from it costs 2
        let below = frontier.pop().unwrap();
        assert_eq!(below.position, Point::new(0, 1));
        frontier.expand(&below);
        let corner = frontier.pop().unwrap();
        assert_eq!(corner.position, Point::new(1, 1));
        frontier.expand(&corner);

        // (1,0) was queued at 9 from the origin, 9 from (1,1) is no better
        let node = frontier.node(Point::new(1, 0)).unwrap();
        assert_eq!(node.best_cost, 9);
        assert_eq!(node.predecessor, Point::new(0, 0));
    }
}
