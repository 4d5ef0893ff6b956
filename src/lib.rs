//! Shortest paths across weighted 4-connected grids.
//!
//! Sequential searches live in [`graph_algos`], the multi-threaded ones in
//! [`parallel_algos`]. [`Planner`] picks between them by [`Algorithm`].

mod collections;
pub mod cli;
pub mod errors;
pub mod geometry;
pub mod graph_algos;
pub mod parallel_algos;
pub mod planner;
pub mod world;

pub use errors::{EndpointIssue, PathPlannerError, WorldError};
pub use geometry::Point;
pub use graph_algos::{path_cost, PathPlanner, Route};
pub use parallel_algos::{CancelToken, ThresholdPolicy};
pub use planner::{Algorithm, Planner, PlannerConfig};
pub use world::{Tile, World, MAX_TILE_COST};
