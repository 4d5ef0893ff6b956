use crate::geometry::Point;
use crate::world::Tile;


/// Per-tile search bookkeeping
/// best_cost only ever decreases once set, the predecessor changes together with it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchNode {
    pub tile: Tile,
    pub position: Point,
    pub best_cost: u32, // cost of the best known route from the search origin, INF until reached
    pub heuristic: u32, // estimated remaining cost, 0 for Dijkstra
    pub predecessor: Point, // equal to position for the search origin
}

impl SearchNode {
    pub const INF: u32 = u32::MAX;

    /// Node discovered but not yet reached
    pub fn new(tile: Tile, position: Point, heuristic: u32) -> Self {
        Self {
            tile,
            position,
            best_cost: Self::INF,
            heuristic,
            predecessor: position,
        }
    }

    /// Origin of a search, reached at no cost
    pub fn origin(tile: Tile, position: Point, heuristic: u32) -> Self {
        Self { best_cost: 0, ..Self::new(tile, position, heuristic) }
    }

    /// Node reached from `predecessor` at `best_cost`
    pub fn reached(tile: Tile, position: Point, heuristic: u32, best_cost: u32, predecessor: Point) -> Self {
        Self { best_cost, predecessor, ..Self::new(tile, position, heuristic) }
    }

    /// best_cost + heuristic, saturating at INF
    pub fn combined_priority(&self) -> u32 {
        self.best_cost.saturating_add(self.heuristic)
    }

    pub fn is_origin(&self) -> bool {
        self.predecessor == self.position
    }

    /// Lower the best cost if `cost` is strictly smaller
    /// Returns true if the node changed
    pub fn relax(&mut self, cost: u32, predecessor: Point) -> bool {
        if cost < self.best_cost {
            self.best_cost = cost;
            self.predecessor = predecessor;
            true
        } else {
            false
        }
    }
}
