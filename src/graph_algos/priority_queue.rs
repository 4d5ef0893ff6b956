//! Binary min-heap over [`SearchNode`]s with decrease-key.
//!
//! Entries live in an arena, the heap orders arena slots and a handle table maps
//! tile ids to slots. Every heap move rewrites the moved entry's cached heap index,
//! so a tile can be found and re-sifted in O(log n) after its cost drops.
//!
//! Ties on combined priority are broken by insertion order: of two entries with
//! equal priority the one pushed first is popped first. A decrease-key keeps the
//! entry's original insertion order.

use crate::collections::FxHashMap;
use crate::errors::PathPlannerError;
use crate::geometry::Point;
use super::SearchNode;


/// Arena entry
#[derive(Clone, Copy, Debug)]
struct Handle {
    node: SearchNode,
    heap_index: usize, // position of this slot in the heap array
    sequence: u64, // insertion order, used to break ties
}

impl Handle {
    fn key(&self) -> (u32, u64) {
        (self.node.combined_priority(), self.sequence)
    }
}


/// Mutable indexed priority queue
#[derive(Clone, Debug)]
pub struct IndexedPriorityQueue {
    width: u32, // world width, turns (x, y) into tile ids
    arena: Vec<Handle>,
    free_slots: Vec<usize>,
    heap: Vec<usize>,
    handles: FxHashMap<u32, usize>, // tile id -> arena slot
    next_sequence: u64,
}

impl IndexedPriorityQueue {

    /// Empty queue for a world of the given width
    pub fn new(width: u32) -> Self {
        Self {
            width,
            arena: Vec::new(),
            free_slots: Vec::new(),
            heap: Vec::new(),
            handles: FxHashMap::default(),
            next_sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every queued node, tie-breaking restarts from scratch
    pub fn clear(&mut self) {
        self.arena.clear();
        self.free_slots.clear();
        self.heap.clear();
        self.handles.clear();
        self.next_sequence = 0;
    }

    /// Insert a node
    /// Returns false and leaves the queue untouched if the tile is already queued,
    /// use `decrease_cost` for those
    pub fn push(&mut self, node: SearchNode) -> bool {
        if self.handles.contains_key(&node.tile.id) {
            return false;
        }

        let handle = Handle {
            node,
            heap_index: self.heap.len(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.arena[slot] = handle;
                slot
            }
            None => {
                self.arena.push(handle);
                self.arena.len() - 1
            }
        };

        self.handles.insert(node.tile.id, slot);
        self.heap.push(slot);
        self.sift_up(self.heap.len() - 1);
        true
    }

    /// Remove and return the node with the smallest combined priority
    pub fn pop(&mut self) -> Option<SearchNode> {
        let top = *self.heap.first()?;
        let last = self.heap.pop()?;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.arena[last].heap_index = 0;
            self.sift_down(0);
        }

        let node = self.arena[top].node;
        self.handles.remove(&node.tile.id);
        self.free_slots.push(top);
        Some(node)
    }

    /// Node with the smallest combined priority
    pub fn peek(&self) -> Option<&SearchNode> {
        self.heap.first().map(|&slot| &self.arena[slot].node)
    }

    /// Combined priority of the next node, INF when empty
    pub fn peek_priority(&self) -> u32 {
        self.peek().map_or(SearchNode::INF, SearchNode::combined_priority)
    }

    /// Lower the best cost of a queued tile
    /// Absent tiles and non-improving costs are ignored, returns true if the node changed
    pub fn decrease_cost(&mut self, x: u32, y: u32, best_cost: u32, predecessor: Point) -> bool {
        let Some(slot) = self.slot(x, y) else {
            return false;
        };
        if !self.arena[slot].node.relax(best_cost, predecessor) {
            return false;
        }
        // priority can only have dropped
        self.sift_up(self.arena[slot].heap_index);
        true
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.slot(x, y).is_some()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&SearchNode> {
        self.slot(x, y).map(|slot| &self.arena[slot].node)
    }

    /// Verify heap ordering and handle table consistency
    pub fn check_invariants(&self) -> Result<(), PathPlannerError> {
        if self.handles.len() != self.heap.len() {
            return Err(PathPlannerError::HeapInvariantViolation(format!(
                "{} handles for {} heap entries", self.handles.len(), self.heap.len()
            )));
        }

        for (position, &slot) in self.heap.iter().enumerate() {
            let handle = &self.arena[slot];
            if handle.heap_index != position {
                return Err(PathPlannerError::HeapInvariantViolation(format!(
                    "slot {slot} caches heap index {} but sits at {position}", handle.heap_index
                )));
            }
            if self.handles.get(&handle.node.tile.id) != Some(&slot) {
                return Err(PathPlannerError::HeapInvariantViolation(format!(
                    "tile {} is not mapped to slot {slot}", handle.node.tile.id
                )));
            }
            if position > 0 {
                let parent = &self.arena[self.heap[parent(position)]];
                if parent.node.combined_priority() > handle.node.combined_priority() {
                    return Err(PathPlannerError::HeapInvariantViolation(format!(
                        "parent priority {} above child priority {} at {position}",
                        parent.node.combined_priority(), handle.node.combined_priority()
                    )));
                }
            }
        }
        Ok(())
    }

    // columns past the width would alias a tile of another row
    fn slot(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width {
            return None;
        }
        self.handles.get(&(y * self.width + x)).copied()
    }

    fn less(&self, a: usize, b: usize) -> bool {
        self.arena[self.heap[a]].key() < self.arena[self.heap[b]].key()
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.arena[self.heap[a]].heap_index = a;
        self.arena[self.heap[b]].heap_index = b;
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = parent(index);
            if !self.less(index, parent) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        loop {
            let left = left_child(index);
            if left >= self.heap.len() {
                break;
            }
            let right = right_child(index);
            let smallest = if right < self.heap.len() && self.less(right, left) { right } else { left };
            if !self.less(smallest, index) {
                break;
            }
            self.swap(index, smallest);
            index = smallest;
        }
    }
}

fn left_child(index: usize) -> usize {
    2 * index + 1
}

fn right_child(index: usize) -> usize {
    2 * index + 2
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Tile;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    const WIDTH: u32 = 16;

    fn node(x: u32, y: u32, cost: u32) -> SearchNode {
        let tile = Tile { cost: 1, id: y * WIDTH + x };
        SearchNode::reached(tile, Point::new(x, y), 0, cost, Point::new(x, y))
    }

    #[test]
    fn test_pops_in_priority_order() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        for (x, cost) in [(0, 9), (1, 3), (2, 7), (3, 1), (4, 5)] {
            assert!(queue.push(node(x, 0, cost)));
        }
        assert_eq!(queue.peek().map(|n| n.best_cost), Some(1));

        let costs: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|n| n.best_cost).collect();
        assert_eq!(costs, vec![1, 3, 5, 7, 9]);
        assert!(queue.is_empty());
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.peek_priority(), SearchNode::INF);
    }

    #[test]
    fn test_push_rejects_duplicate_tiles() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        assert!(queue.push(node(2, 3, 10)));
        assert!(!queue.push(node(2, 3, 1)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(2, 3).map(|n| n.best_cost), Some(10));
    }

    #[test]
    fn test_clear_empties_and_restarts_tie_breaking() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        queue.push(node(0, 0, 2));
        queue.push(node(1, 0, 4));
        queue.clear();
        assert!(queue.is_empty());
        assert!(!queue.contains(0, 0));
        assert_eq!(queue.peek_priority(), SearchNode::INF);
        queue.check_invariants().unwrap();

        for x in [4, 2, 6] {
            assert!(queue.push(node(x, 0, 3)));
        }
        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|n| n.position.x).collect();
        assert_eq!(order, vec![4, 2, 6]);
    }

    #[test]
    fn test_lookups_past_the_width_miss() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        queue.push(node(1, 1, 3));
        assert!(queue.contains(1, 1));
        assert!(!queue.contains(WIDTH + 1, 0));
        assert_eq!(queue.get(WIDTH + 1, 0), None);
        assert!(!queue.decrease_cost(WIDTH + 1, 0, 1, Point::new(0, 0)));
        assert_eq!(queue.get(1, 1).map(|n| n.best_cost), Some(3));
    }

    #[test]
    fn test_decrease_cost_reorders_and_ignores_increases() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        queue.push(node(0, 0, 4));
        queue.push(node(1, 0, 6));
        queue.push(node(2, 0, 8));

        assert!(!queue.decrease_cost(0, 0, 5, Point::new(9, 9)));
        assert!(!queue.decrease_cost(7, 7, 0, Point::new(9, 9)));
        assert!(queue.decrease_cost(2, 0, 2, Point::new(2, 1)));
        queue.check_invariants().unwrap();

        let top = queue.pop().unwrap();
        assert_eq!(top.position, Point::new(2, 0));
        assert_eq!(top.predecessor, Point::new(2, 1));
        assert_eq!(queue.get(0, 0).map(|n| n.best_cost), Some(4));
    }

    #[test]
    fn test_equal_priorities_pop_in_insertion_order() {
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        for x in [5, 1, 9, 3] {
            queue.push(node(x, 1, 4));
        }
        // a decrease to an equal priority keeps the original order
        queue.push(node(0, 2, 6));
        queue.decrease_cost(0, 2, 4, Point::new(0, 1));

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|n| n.position.x).collect();
        assert_eq!(order, vec![5, 1, 9, 3, 0]);
    }

    #[test]
    fn test_heap_invariant_under_random_operations() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut queue = IndexedPriorityQueue::new(WIDTH);
        let mut last_popped = 0;
        let mut costs: FxHashMap<u32, u32> = FxHashMap::default();

        for _ in 0..5_000 {
            let x = rng.random_range(0..WIDTH);
            let y = rng.random_range(0..WIDTH);
            match rng.random_range(0..3) {
                0 => {
                    let cost = last_popped + rng.random_range(0..100);
                    if queue.push(node(x, y, cost)) {
                        costs.insert(y * WIDTH + x, cost);
                    }
                }
                1 => {
                    if let Some(popped) = queue.pop() {
                        // costs never drop below what was already popped in this test
                        assert!(popped.best_cost >= last_popped);
                        last_popped = popped.best_cost;
                        costs.remove(&popped.tile.id);
                    }
                }
                _ => {
                    let before = queue.get(x, y).map(|n| n.best_cost);
                    let target = last_popped + rng.random_range(0..100);
                    queue.decrease_cost(x, y, target, Point::new(0, 0));
                    if let Some(before) = before {
                        let after = queue.get(x, y).unwrap().best_cost;
                        assert!(after <= before);
                        assert_eq!(after, before.min(target));
                        costs.insert(y * WIDTH + x, after);
                    }
                }
            }
            queue.check_invariants().unwrap();
            assert_eq!(queue.len(), costs.len());
        }
    }
}
