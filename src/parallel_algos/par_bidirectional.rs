use std::thread;

use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::graph_algos::{splice, trace_closed, validate_endpoints, ClosedSet, Direction, Frontier, Heuristic, PathPlanner, Route};
use crate::world::World;
use super::sync::{CancelToken, Claim, MeetingBoard};

use log::debug;


/// Bidirectional A* with one thread per direction
///
/// Each thread owns its frontier. The threads only meet on a [`MeetingBoard`], where
/// every popped node is claimed before it gets expanded. The first thread that pops a
/// node whose priority can't beat the best meeting ends the search for both.
#[derive(Clone, Debug, Default)]
pub struct ParallelBidirectionalAStar {
    cancel: CancelToken,
}

impl ParallelBidirectionalAStar {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl PathPlanner for ParallelBidirectionalAStar {
    fn name(&self) -> &'static str {
        "parBidir"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;
        if start == goal {
            return Ok(Route::trivial(start));
        }

        let board = MeetingBoard::new(self.cancel.clone());
        let (forward, reverse) = thread::scope(|scope| {
            let forward = scope.spawn(|| search_side(world, start, Heuristic::Manhattan(goal), Direction::Forward, &board));
            let reverse = scope.spawn(|| search_side(world, goal, Heuristic::Manhattan(start), Direction::Reverse, &board));
            (forward.join(), reverse.join())
        });
        let forward = forward.map_err(|_| PathPlannerError::WorkerPanicked("forward search"))?;
        let reverse = reverse.map_err(|_| PathPlannerError::WorkerPanicked("reverse search"))?;

        let outcome = board.outcome();
        if outcome.cancelled {
            return Err(PathPlannerError::Cancelled);
        }
        let expanded = forward.len() + reverse.len();
        let Some(point) = outcome.meeting.point else {
            debug!("parBidir: {} -> {} unreachable after {} expansions", start, goal, expanded);
            return Err(PathPlannerError::NoPathFound);
        };

        let path = splice(
            trace_to(world, &forward, point, "forward")?,
            trace_to(world, &reverse, point, "reverse")?,
        );
        let route = Route::new(world, path, expanded);
        debug!("parBidir: {} -> {} meets at {}, costs {} after {} expansions", start, goal, point, route.cost, expanded);
        Ok(route)
    }
}


/// Run one direction until the board stops it or its queue runs dry
fn search_side(world: &World, origin: Point, heuristic: Heuristic, direction: Direction, board: &MeetingBoard) -> ClosedSet {
    let mut frontier = Frontier::new(world, origin, heuristic, direction);
    while let Some(node) = frontier.pop() {
        if board.claim(direction, &node) == Claim::Stop {
            break;
        }
        frontier.expand(&node);
    }
    frontier.into_closed()
}


fn trace_to(world: &World, closed: &ClosedSet, point: Point, side: &str) -> Result<Vec<Point>, PathPlannerError> {
    let end = closed.get(&world.id_of(point)).ok_or_else(|| {
        PathPlannerError::ClaimRaceDetected(format!("meeting point {point} was never closed by the {side} search"))
    })?;
    trace_closed(world, closed, end)
}
