use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::{splice, validate_endpoints, Direction, Frontier, Heuristic, PathPlanner, Route, SearchNode};

use log::debug;


/// Bidirectional A*
/// A forward search from the start and a reverse search from the goal take turns.
///
/// Every tile reached by both sides is a candidate meeting point costing the sum of
/// both best costs. Finding one is not enough to stop: the search ends once either
/// side's cheapest open priority reaches the best candidate, at which point no route
/// through that side's unexpanded tiles can be cheaper.
#[derive(Clone, Copy, Debug, Default)]
pub struct BidirectionalAStar;

impl PathPlanner for BidirectionalAStar {
    fn name(&self) -> &'static str {
        "bidir"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;
        if start == goal {
            return Ok(Route::trivial(start));
        }

        let mut forward = Frontier::new(world, start, Heuristic::Manhattan(goal), Direction::Forward);
        let mut reverse = Frontier::new(world, goal, Heuristic::Manhattan(start), Direction::Reverse);
        let mut meeting = Meeting::default();

        loop {
            if meeting.is_proven(&forward, &reverse) {
                break;
            }
            step(&mut forward, &reverse, &mut meeting);

            if meeting.is_proven(&forward, &reverse) {
                break;
            }
            step(&mut reverse, &forward, &mut meeting);
        }

        let expanded = forward.expanded() + reverse.expanded();
        let Some(point) = meeting.point else {
            debug!("bidir: {} -> {} unreachable after {} expansions", start, goal, expanded);
            return Err(PathPlannerError::NoPathFound);
        };

        let route = join_at(world, &forward, &reverse, point, expanded)?;
        debug!("bidir: {} -> {} meets at {}, costs {} after {} expansions", start, goal, point, route.cost, expanded);
        Ok(route)
    }
}


/// Cheapest tile reached by both sides so far
#[derive(Clone, Copy, Debug)]
pub(crate) struct Meeting {
    pub cost: u32,
    pub point: Option<Point>,
}

impl Default for Meeting {
    fn default() -> Self {
        Self { cost: SearchNode::INF, point: None }
    }
}

impl Meeting {

    /// Record `node` as a meeting point if the other side reached it too and it beats the best one
    pub fn consider(&mut self, node: &SearchNode, other_cost: Option<u32>) -> bool {
        let Some(other_cost) = other_cost else {
            return false;
        };
        let total = node.best_cost.saturating_add(other_cost);
        if total < self.cost {
            self.cost = total;
            self.point = Some(node.position);
            true
        } else {
            false
        }
    }

    /// True once neither side can produce a cheaper meeting, or a side ran dry
    fn is_proven(&self, forward: &Frontier, reverse: &Frontier) -> bool {
        self.cost <= forward.peek_priority() || self.cost <= reverse.peek_priority()
    }
}


/// Expand one node of `side`, checking it and every relaxed neighbour against `other`
fn step(side: &mut Frontier, other: &Frontier, meeting: &mut Meeting) {
    let Some(node) = side.pop() else {
        return;
    };
    meeting.consider(&node, other.best_cost(node.position));

    side.expand(&node);
    for relaxed in side.last_relaxed() {
        meeting.consider(relaxed, other.best_cost(relaxed.position));
    }
}


/// Splice the forward chain to `point` with the reverse chain from `point`
pub(crate) fn join_at(world: &World, forward: &Frontier, reverse: &Frontier, point: Point, expanded: usize) -> Result<Route, PathPlannerError> {
    let missing = |side: &str| PathPlannerError::ClaimRaceDetected(format!("meeting point {point} unknown to the {side} search"));
    let forward_end = *forward.node(point).ok_or_else(|| missing("forward"))?;
    let reverse_end = *reverse.node(point).ok_or_else(|| missing("reverse"))?;

    let path = splice(forward.trace(&forward_end)?, reverse.trace(&reverse_end)?);
    Ok(Route::new(world, path, expanded))
}
