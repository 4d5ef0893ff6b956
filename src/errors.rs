use std::fmt;

use crate::geometry::Point;

/// Errors surfaced by the planners
#[derive(Debug, thiserror::Error)]
pub enum PathPlannerError {
    #[error("invalid endpoint {point}: {reason}")]
    InvalidEndpoint { point: Point, reason: EndpointIssue },
    #[error("failed to load world: {0}")]
    WorldLoad(#[from] WorldError),
    #[error("no path found")]
    NoPathFound, // frontier exhausted without reaching the goal
    #[error("priority queue invariant violated: {0}")]
    HeapInvariantViolation(String),
    #[error("conflicting tile claims: {0}")]
    ClaimRaceDetected(String),
    #[error("search cancelled")]
    Cancelled,
    #[error("{0} worker panicked")]
    WorkerPanicked(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Why an endpoint was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointIssue {
    OutOfBounds,
    Wall,
}

impl fmt::Display for EndpointIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointIssue::OutOfBounds => write!(f, "outside of the world"),
            EndpointIssue::Wall => write!(f, "tile is impassable"),
        }
    }
}

/// Errors raised while building, reading or writing a world
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed header line {line}: {found:?}")]
    MalformedHeader { line: usize, found: String },
    #[error("expected {expected} tile bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error("tile {id} costs {cost}, above the declared maximum of {max}")]
    CostAboveMax { id: usize, cost: u32, max: u32 },
    #[error("tile {id} has cost {cost}, tiles must fit in a byte")]
    InvalidCost { id: usize, cost: u32 },
    #[error("declared maximum tile cost {0} does not fit in a byte")]
    InvalidMaxCost(u32),
    #[error("row of {found} tiles in a world {width} tiles wide")]
    RaggedRow { width: usize, found: usize },
    #[error("{width}x{height} world needs {expected} tiles, got {found}")]
    DimensionMismatch { width: usize, height: usize, expected: usize, found: usize },
    #[error("world has no tiles")]
    EmptyWorld,
    #[error("unexpected character {0:?} in world row")]
    UnknownGlyph(char),
}
