//! One entry point over every search strategy.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::graph_algos::a_star::AStar;
use crate::graph_algos::bidirectional::BidirectionalAStar;
use crate::graph_algos::dijkstra::Dijkstra;
use crate::graph_algos::fringe::Fringe;
use crate::graph_algos::{PathPlanner, Route};
use crate::parallel_algos::{CancelToken, ParallelBidirectionalAStar, ParallelDivide, ParallelFringe, ThresholdPolicy};
use crate::world::World;


/// Every available search strategy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Dijkstra,
    AStar,
    Bidirectional,
    ParallelBidirectional,
    Fringe,
    ParallelFringe,
    ParallelDivide,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Dijkstra,
        Algorithm::AStar,
        Algorithm::Bidirectional,
        Algorithm::ParallelBidirectional,
        Algorithm::Fringe,
        Algorithm::ParallelFringe,
        Algorithm::ParallelDivide,
    ];

    /// Name used on the command line and in reports
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::AStar => "aStar",
            Algorithm::Bidirectional => "bidir",
            Algorithm::ParallelBidirectional => "parBidir",
            Algorithm::Fringe => "fringe",
            Algorithm::ParallelFringe => "parFringe",
            Algorithm::ParallelDivide => "parDivide",
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Algorithm::ParallelBidirectional | Algorithm::ParallelFringe | Algorithm::ParallelDivide)
    }

    /// False for strategies that trade the optimal cost for speed
    pub fn is_optimal(&self) -> bool {
        !matches!(self, Algorithm::ParallelDivide)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = PathPlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| PathPlannerError::InvalidConfig(format!("unknown algorithm {s:?}")))
    }
}


/// Settings shared by the parallel strategies
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub threads: usize,
    pub threshold_policy: ThresholdPolicy,
    pub cancel: CancelToken,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, NonZeroUsize::get),
            threshold_policy: ThresholdPolicy::default(),
            cancel: CancelToken::new(),
        }
    }
}

impl PlannerConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_threshold_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.threshold_policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn validate(&self) -> Result<(), PathPlannerError> {
        if self.threads == 0 {
            return Err(PathPlannerError::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(())
    }
}


/// Planner over a single world
pub struct Planner<'w> {
    world: &'w World,
    config: PlannerConfig,
}

impl<'w> Planner<'w> {
    pub fn new(world: &'w World, config: PlannerConfig) -> Result<Self, PathPlannerError> {
        config.validate()?;
        Ok(Self { world, config })
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The strategy behind an algorithm, configured with this planner's settings
    pub fn strategy(&self, algorithm: Algorithm) -> Box<dyn PathPlanner> {
        let cancel = self.config.cancel.clone();
        match algorithm {
            Algorithm::Dijkstra => Box::new(Dijkstra),
            Algorithm::AStar => Box::new(AStar),
            Algorithm::Bidirectional => Box::new(BidirectionalAStar),
            Algorithm::ParallelBidirectional => Box::new(ParallelBidirectionalAStar::new(cancel)),
            Algorithm::Fringe => Box::new(Fringe),
            Algorithm::ParallelFringe => Box::new(ParallelFringe::new(self.config.threads, self.config.threshold_policy, cancel)),
            Algorithm::ParallelDivide => Box::new(ParallelDivide::new(self.config.threads, cancel)),
        }
    }

    /// Plan a route, endpoints are checked before any worker starts
    pub fn plan(&self, algorithm: Algorithm, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        self.plan_timed(algorithm, start, goal).map(|(route, _)| route)
    }

    /// Plan a route and measure how long the search took
    pub fn plan_timed(&self, algorithm: Algorithm, start: Point, goal: Point) -> Result<(Route, Duration), PathPlannerError> {
        self.world.validate_endpoint(start)?;
        self.world.validate_endpoint(goal)?;
        if start == goal {
            return Ok((Route::trivial(start), Duration::ZERO));
        }

        let strategy = self.strategy(algorithm);
        let started = Instant::now();
        let route = strategy.plan(self.world, start, goal)?;
        let elapsed = started.elapsed();

        debug!("{}: {} -> {} took {:?}", strategy.name(), start, goal, elapsed);
        Ok((route, elapsed))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert!(matches!("bfs".parse::<Algorithm>(), Err(PathPlannerError::InvalidConfig(_))));
        assert!(Algorithm::ParallelFringe.is_parallel());
        assert!(!Algorithm::Fringe.is_parallel());
        assert!(!Algorithm::ParallelDivide.is_optimal());
    }

    #[test]
    fn test_strategy_names_match_algorithms() {
        let world = World::from_rows(&["."]).unwrap();
        let planner = Planner::new(&world, PlannerConfig::default().with_threads(2)).unwrap();
        assert_eq!(planner.config().threads, 2);
        assert_eq!(planner.world().tile_count(), 1);
        for algorithm in Algorithm::ALL {
            assert_eq!(planner.strategy(algorithm).name(), algorithm.name());
        }
    }

    #[test]
    fn test_planner_rejects_zero_threads() {
        let world = World::from_rows(&["."]).unwrap();
        let result = Planner::new(&world, PlannerConfig::default().with_threads(0));
        assert!(matches!(result, Err(PathPlannerError::InvalidConfig(_))));
    }

    #[test]
    fn test_planner_validates_before_searching() {
        let world = World::from_rows(&["..#"]).unwrap();
        let planner = Planner::new(&world, PlannerConfig::default()).unwrap();
        for algorithm in Algorithm::ALL {
            assert!(matches!(
                planner.plan(algorithm, Point::new(0, 0), Point::new(2, 0)),
                Err(PathPlannerError::InvalidEndpoint { .. })
            ));
            let route = planner.plan(algorithm, Point::new(1, 0), Point::new(1, 0)).unwrap();
            assert_eq!(route.path, vec![Point::new(1, 0)]);
        }
    }
}
