use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::collections::FxHashMap;
use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::graph_algos::{trace_path, validate_endpoints, Heuristic, PathPlanner, Route, SearchNode};
use crate::world::World;
use super::sync::{CancelToken, ClaimTable};

use log::{debug, trace};


/// Thread that runs the between-round phases
const LEADER: usize = 0;


/// How the f-threshold grows between rounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThresholdPolicy {
    /// Raise by the most expensive tile of the world
    /// A round may then overshoot the optimum, so every round is drained before a goal is accepted.
    #[default]
    MaxTileCost,
    /// Raise to the cheapest deferred priority, the first goal reached is optimal
    MinDeferred,
}

impl ThresholdPolicy {
    pub const ALL: [ThresholdPolicy; 2] = [ThresholdPolicy::MaxTileCost, ThresholdPolicy::MinDeferred];

    pub fn name(&self) -> &'static str {
        match self {
            ThresholdPolicy::MaxTileCost => "max-tile-cost",
            ThresholdPolicy::MinDeferred => "min-deferred",
        }
    }
}

impl fmt::Display for ThresholdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdPolicy {
    type Err = PathPlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| PathPlannerError::InvalidConfig(format!(
                "unknown threshold policy {s:?}, expected max-tile-cost or min-deferred"
            )))
    }
}


/// Fringe search over a pool of worker threads
///
/// Workers run in lock-step rounds. In a round each worker drains its own `now` list
/// under a shared threshold, claiming every tile it reaches in a shared [`ClaimTable`].
/// Between rounds the leader deals the deferred nodes back out, raises the threshold
/// and decides for everyone whether another round runs.
#[derive(Clone, Debug)]
pub struct ParallelFringe {
    threads: usize,
    policy: ThresholdPolicy,
    cancel: CancelToken,
}

impl ParallelFringe {
    pub fn new(threads: usize, policy: ThresholdPolicy, cancel: CancelToken) -> Self {
        Self { threads, policy, cancel }
    }
}

impl PathPlanner for ParallelFringe {
    fn name(&self) -> &'static str {
        "parFringe"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;
        if self.threads == 0 {
            return Err(PathPlannerError::InvalidConfig("parallel fringe needs at least one thread".into()));
        }

        let state = FringeState::new(world, start, goal, self);
        let joined: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.threads)
                .map(|worker| {
                    let state = &state;
                    scope.spawn(move || state.run_worker(worker))
                })
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect()
        });
        if joined.iter().any(Result::is_err) {
            return Err(PathPlannerError::WorkerPanicked("fringe worker"));
        }

        let rounds = state.rounds.load(Ordering::Relaxed);
        let claimed = state.claims.len();
        let route = state.into_route();
        match &route {
            Ok(route) => debug!("parFringe: {} -> {} costs {} after {} expansions over {} claimed tiles in {} rounds on {} threads",
                start, goal, route.cost, route.expanded, claimed, rounds, self.threads),
            Err(err) => debug!("parFringe: {} -> {} failed after {} rounds: {}", start, goal, rounds, err),
        }
        route
    }
}


/// Outcome of a round, published by the leader
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoundDecision {
    Continue,
    Found,
    Exhausted,
    Cancelled,
    Panicked,
}

/// Step of a worker within a round
#[derive(Clone, Copy, Debug)]
enum Phase {
    Expand,
    Redistribute,
    AdvanceThreshold(RoundStats),
    CheckTermination(RoundStats),
    Await,
}

/// Live deferred nodes left at the end of a round
#[derive(Clone, Copy, Debug)]
struct RoundStats {
    deferred: usize,
    min_priority: u32,
}

/// Nodes above the threshold, waiting for the next round
#[derive(Debug)]
struct Deferred {
    nodes: Vec<SearchNode>,
    min_priority: u32,
}

impl Default for Deferred {
    fn default() -> Self {
        Self { nodes: Vec::new(), min_priority: SearchNode::INF }
    }
}

impl Deferred {
    fn push(&mut self, node: SearchNode) {
        self.min_priority = self.min_priority.min(node.combined_priority());
        self.nodes.push(node);
    }

    fn append(&mut self, mut other: Deferred) {
        self.min_priority = self.min_priority.min(other.min_priority);
        self.nodes.append(&mut other.nodes);
    }
}

#[derive(Default)]
struct GoalState {
    finished: bool,
    best: Option<SearchNode>,
}


/// Everything the workers of one search share
struct FringeState<'w> {
    world: &'w World,
    goal: Point,
    heuristic: Heuristic,
    policy: ThresholdPolicy,
    cancel: CancelToken,
    claims: ClaimTable,
    now: Vec<Mutex<VecDeque<SearchNode>>>, // touched by its owner while expanding, by the leader in between
    later: Vec<Mutex<Deferred>>,
    threshold: AtomicU32,
    goal_state: Mutex<GoalState>,
    decision: Mutex<RoundDecision>,
    barrier: Barrier,
    expanded: AtomicUsize,
    rounds: AtomicUsize,
    panicked: AtomicBool,
}

impl<'w> FringeState<'w> {
    fn new(world: &'w World, start: Point, goal: Point, config: &ParallelFringe) -> Self {
        let heuristic = Heuristic::Manhattan(goal);
        let origin = SearchNode::origin(world.tile_at(start.x, start.y), start, heuristic.estimate(start));

        let claims = ClaimTable::new();
        claims.claim(origin);
        let now: Vec<_> = (0..config.threads).map(|_| Mutex::new(VecDeque::new())).collect();
        now[LEADER].lock().push_back(origin);

        Self {
            world,
            goal,
            heuristic,
            policy: config.policy,
            cancel: config.cancel.clone(),
            claims,
            now,
            later: (0..config.threads).map(|_| Mutex::new(Deferred::default())).collect(),
            threshold: AtomicU32::new(origin.combined_priority()),
            goal_state: Mutex::new(GoalState::default()),
            decision: Mutex::new(RoundDecision::Continue),
            barrier: Barrier::new(config.threads),
            expanded: AtomicUsize::new(0),
            rounds: AtomicUsize::new(0),
            panicked: AtomicBool::new(false),
        }
    }

    /// Round loop of one worker, returns once the leader decided to stop
    fn run_worker(&self, worker: usize) -> RoundDecision {
        let mut seen: FxHashMap<u32, u32> = FxHashMap::default(); // cheapest cost this worker tried per tile
        let mut phase = Phase::Expand;

        loop {
            phase = match phase {
                Phase::Expand => {
                    // keep meeting the barriers after a panic, or the other workers would hang
                    if panic::catch_unwind(AssertUnwindSafe(|| self.expand(worker, &mut seen))).is_err() {
                        self.panicked.store(true, Ordering::Release);
                    }
                    self.barrier.wait();
                    if worker == LEADER { Phase::Redistribute } else { Phase::Await }
                }
                Phase::Redistribute => Phase::AdvanceThreshold(self.redistribute()),
                Phase::AdvanceThreshold(stats) => {
                    self.advance_threshold(&stats);
                    Phase::CheckTermination(stats)
                }
                Phase::CheckTermination(stats) => {
                    *self.decision.lock() = self.check_termination(&stats);
                    Phase::Await
                }
                Phase::Await => {
                    self.barrier.wait();
                    match *self.decision.lock() {
                        RoundDecision::Continue => Phase::Expand,
                        decision => return decision,
                    }
                }
            };
        }
    }

    /// Drain this worker's `now` list under the current threshold
    fn expand(&self, worker: usize, seen: &mut FxHashMap<u32, u32>) {
        let threshold = self.threshold.load(Ordering::Acquire);
        let mut now = std::mem::take(&mut *self.now[worker].lock());
        let mut deferred = Deferred::default();
        let mut expanded = 0;

        while let Some(node) = now.pop_front() {
            if self.cancel.is_cancelled() || self.stop_draining() {
                break;
            }
            if !self.claims.is_current(&node) {
                continue;
            }
            if node.combined_priority() > threshold {
                deferred.push(node);
                continue;
            }
            if node.position == self.goal {
                self.record_goal(node);
                continue;
            }

            expanded += 1;
            for (position, tile) in self.world.neighbors(node.position) {
                let candidate = node.best_cost.saturating_add(tile.cost);
                if seen.get(&tile.id).is_some_and(|&known| known <= candidate) {
                    continue;
                }
                seen.insert(tile.id, candidate);

                let child = SearchNode::reached(tile, position, self.heuristic.estimate(position), candidate, node.position);
                if self.claims.claim(child) {
                    now.push_front(child);
                }
            }
        }

        self.expanded.fetch_add(expanded, Ordering::Relaxed);
        self.later[worker].lock().append(deferred);
    }

    fn stop_draining(&self) -> bool {
        self.policy == ThresholdPolicy::MinDeferred && self.goal_state.lock().finished
    }

    fn record_goal(&self, node: SearchNode) {
        let mut goal = self.goal_state.lock();
        goal.finished = true;
        if goal.best.is_none_or(|best| node.best_cost < best.best_cost) {
            goal.best = Some(node);
        }
    }

    /// Deal every live deferred node round-robin over the `now` lists
    fn redistribute(&self) -> RoundStats {
        let mut stats = RoundStats { deferred: 0, min_priority: SearchNode::INF };
        let mut target = 0;
        for later in &self.later {
            let deferred = std::mem::take(&mut *later.lock());
            for node in deferred.nodes {
                if !self.claims.is_current(&node) {
                    continue;
                }
                stats.deferred += 1;
                stats.min_priority = stats.min_priority.min(node.combined_priority());
                self.now[target].lock().push_back(node);
                target = (target + 1) % self.now.len();
            }
        }
        stats
    }

    fn advance_threshold(&self, stats: &RoundStats) {
        let round = self.rounds.fetch_add(1, Ordering::Relaxed) + 1;
        if stats.deferred == 0 {
            return;
        }
        let current = self.threshold.load(Ordering::Acquire);
        let next = match self.policy {
            ThresholdPolicy::MaxTileCost => current.saturating_add(self.world.max_tile_cost().max(1)),
            ThresholdPolicy::MinDeferred => stats.min_priority,
        };
        self.threshold.store(next, Ordering::Release);
        trace!("parFringe: round {} raises threshold {} -> {} with {} deferred", round, current, next, stats.deferred);
    }

    fn check_termination(&self, stats: &RoundStats) -> RoundDecision {
        if self.panicked.load(Ordering::Acquire) {
            RoundDecision::Panicked
        } else if self.cancel.is_cancelled() {
            RoundDecision::Cancelled
        } else if self.goal_state.lock().finished {
            RoundDecision::Found
        } else if stats.deferred == 0 {
            RoundDecision::Exhausted
        } else {
            RoundDecision::Continue
        }
    }

    fn into_route(self) -> Result<Route, PathPlannerError> {
        let decision = *self.decision.lock();
        match decision {
            RoundDecision::Found => {
                let goal = self.goal_state.lock().best.ok_or_else(|| {
                    PathPlannerError::ClaimRaceDetected("goal reported without a node".into())
                })?;
                let path = trace_path(self.world, &goal, |id| self.claims.get(id))?;
                Ok(Route::new(self.world, path, self.expanded.load(Ordering::Relaxed)))
            }
            RoundDecision::Exhausted => Err(PathPlannerError::NoPathFound),
            RoundDecision::Cancelled => Err(PathPlannerError::Cancelled),
            RoundDecision::Panicked => Err(PathPlannerError::WorkerPanicked("fringe worker")),
            RoundDecision::Continue => Err(PathPlannerError::ClaimRaceDetected("workers stopped mid-search".into())),
        }
    }
}
