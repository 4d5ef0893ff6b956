//! Shared state of the parallel planners.
//!
//! Every structure here is touched by several workers at once. Everything else a
//! worker uses (queues, closed-sets, deques) stays private to that worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;

use crate::collections::{FxDashMap, FxHashMap, FxHashSet};
use crate::graph_algos::bidirectional::Meeting;
use crate::graph_algos::{Direction, SearchNode};


/// Cooperative cancellation flag shared by a caller and the workers of a search
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every search holding this token to stop at its next checkpoint
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}


/// What a worker does after registering a claim
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Claim {
    Expand,
    Stop,
}


/// Meeting state of a parallel bidirectional search
/// All fields live behind one lock, a worker holds it only while claiming a popped node.
pub(crate) struct MeetingBoard {
    state: Mutex<BoardState>,
    cancel: CancelToken,
}

#[derive(Default)]
struct BoardState {
    claims: FxHashMap<u32, [Option<u32>; 2]>, // tile id -> best cost per direction
    meeting: Meeting,
    finished: bool,
    cancelled: bool,
}

/// Final state of a board once both workers stopped
#[derive(Clone, Copy, Debug)]
pub(crate) struct BoardOutcome {
    pub meeting: Meeting,
    pub cancelled: bool,
}

impl MeetingBoard {
    pub fn new(cancel: CancelToken) -> Self {
        Self { state: Mutex::new(BoardState::default()), cancel }
    }

    /// Register a node popped by the `direction` side
    /// Stops the caller once a cheaper meeting is impossible, or the search was cancelled.
    pub fn claim(&self, direction: Direction, node: &SearchNode) -> Claim {
        let mut state = self.state.lock();
        if state.finished {
            return Claim::Stop;
        }
        if self.cancel.is_cancelled() {
            state.cancelled = true;
            state.finished = true;
            return Claim::Stop;
        }
        // the popped node is the cheapest this side has left
        if node.combined_priority() >= state.meeting.cost {
            state.finished = true;
            return Claim::Stop;
        }

        let slots = state.claims.entry(node.tile.id).or_default();
        slots[direction.index()] = Some(node.best_cost);
        let other = slots[direction.opposite().index()];
        state.meeting.consider(node, other);
        Claim::Expand
    }

    pub fn outcome(&self) -> BoardOutcome {
        let state = self.state.lock();
        BoardOutcome { meeting: state.meeting, cancelled: state.cancelled }
    }
}


/// Closed tiles shared by every parallel fringe worker
/// A claim is a tile reached at a cost, only the cheapest claim per tile survives.
pub(crate) struct ClaimTable {
    claims: FxDashMap<u32, SearchNode>,
}

impl ClaimTable {
    pub fn new() -> Self {
        Self { claims: FxDashMap::default() }
    }

    /// Atomically record `node` if its tile is unclaimed or claimed at a higher cost
    /// Returns true if this call won the tile
    pub fn claim(&self, node: SearchNode) -> bool {
        match self.claims.entry(node.tile.id) {
            Entry::Occupied(mut entry) => {
                if node.best_cost < entry.get().best_cost {
                    entry.insert(node);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(node);
                true
            }
        }
    }

    pub fn get(&self, id: u32) -> Option<SearchNode> {
        self.claims.get(&id).map(|node| *node)
    }

    /// False once a cheaper claim replaced the one `node` was queued with
    pub fn is_current(&self, node: &SearchNode) -> bool {
        self.claims
            .get(&node.tile.id)
            .is_none_or(|best| best.best_cost >= node.best_cost)
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }
}


/// Tiles closed by the workers of a divided search, tagged by segment
pub(crate) struct SegmentClaims {
    claimed: Mutex<FxHashSet<(usize, u32)>>,
    cancel: CancelToken,
}

impl SegmentClaims {
    pub fn new(cancel: CancelToken) -> Self {
        Self { claimed: Mutex::new(FxHashSet::default()), cancel }
    }

    /// Register tile `id` as closed by `segment`
    /// Returns true if the following segment closed it already
    pub fn claim(&self, segment: usize, id: u32) -> bool {
        let mut claimed = self.claimed.lock();
        claimed.insert((segment, id));
        claimed.contains(&(segment + 1, id))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::world::Tile;
    use std::thread;

    fn node(id: u32, cost: u32, heuristic: u32) -> SearchNode {
        let position = Point::new(id, 0);
        SearchNode::reached(Tile { cost: 1, id }, position, heuristic, cost, Point::new(0, 0))
    }

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let copy = token.clone();
        assert!(!copy.is_cancelled());
        token.cancel();
        assert!(copy.is_cancelled());
    }

    #[test]
    fn test_meeting_board_records_cheapest_meeting() {
        let board = MeetingBoard::new(CancelToken::new());
        assert_eq!(board.claim(Direction::Forward, &node(3, 4, 0)), Claim::Expand);
        assert_eq!(board.claim(Direction::Reverse, &node(3, 5, 0)), Claim::Expand);
        assert_eq!(board.outcome().meeting.cost, 9);
        assert_eq!(board.outcome().meeting.point, Some(Point::new(3, 0)));

        assert_eq!(board.claim(Direction::Forward, &node(4, 2, 0)), Claim::Expand);
        assert_eq!(board.claim(Direction::Reverse, &node(4, 3, 0)), Claim::Expand);
        assert_eq!(board.outcome().meeting.cost, 5);

        // a popped priority of 5 can't beat the meeting, both sides stop
        assert_eq!(board.claim(Direction::Forward, &node(6, 3, 2)), Claim::Stop);
        assert_eq!(board.claim(Direction::Reverse, &node(7, 0, 0)), Claim::Stop);
        assert!(!board.outcome().cancelled);
    }

    #[test]
    fn test_meeting_board_stops_on_cancel() {
        let cancel = CancelToken::new();
        let board = MeetingBoard::new(cancel.clone());
        cancel.cancel();
        assert_eq!(board.claim(Direction::Forward, &node(1, 1, 0)), Claim::Stop);
        assert!(board.outcome().cancelled);
    }

    #[test]
    fn test_claim_table_keeps_cheapest() {
        let table = ClaimTable::new();
        assert!(table.claim(node(2, 10, 0)));
        assert!(!table.claim(node(2, 10, 0)));
        assert!(!table.claim(node(2, 12, 0)));
        assert!(table.claim(node(2, 7, 0)));
        assert_eq!(table.get(2).map(|n| n.best_cost), Some(7));
        assert!(!table.is_current(&node(2, 10, 0)));
        assert!(table.is_current(&node(2, 7, 0)));
        assert!(table.is_current(&node(9, 1, 0)));
    }

    #[test]
    fn test_claim_table_under_contention() {
        let table = ClaimTable::new();
        let won: usize = thread::scope(|scope| {
            let handles: Vec<_> = (0..8u32)
                .map(|worker| {
                    let table = &table;
                    scope.spawn(move || {
                        (0..100u32).filter(|id| table.claim(node(*id, 100 - worker, 0))).count()
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).sum()
        });

        assert_eq!(table.len(), 100);
        for id in 0..100 {
            assert_eq!(table.get(id).map(|n| n.best_cost), Some(93));
        }
        // every tile is won at least once and at most once per worker
        assert!((100..=800).contains(&won));
    }

    #[test]
    fn test_segment_claims_detect_the_next_segment() {
        let claims = SegmentClaims::new(CancelToken::new());
        assert!(!claims.claim(1, 40));
        assert!(claims.claim(0, 40));
        assert!(!claims.claim(1, 41));
        assert!(!claims.claim(2, 41));
        assert!(!claims.is_cancelled());
    }
}
