pub mod par_bidirectional;
pub mod par_divide;
pub mod par_fringe;
mod sync;

pub use par_bidirectional::ParallelBidirectionalAStar;
pub use par_divide::{waypoints, ParallelDivide};
pub use par_fringe::{ParallelFringe, ThresholdPolicy};
pub use sync::CancelToken;
