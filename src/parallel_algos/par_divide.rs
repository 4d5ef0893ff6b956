use std::thread;

use crate::errors::PathPlannerError;
use crate::geometry::{grid_line, Point};
use crate::graph_algos::a_star::AStar;
use crate::graph_algos::{erase_loops, trace_closed, validate_endpoints, ClosedSet, Direction, Frontier, Heuristic, PathPlanner, Route};
use crate::world::World;
use super::sync::{CancelToken, SegmentClaims};

use log::{debug, warn};


/// Divide and stitch search
///
/// Guesses waypoints along the straight line between the endpoints and runs one A* per
/// stretch between consecutive waypoints, all at once. A stretch also stops as soon as it
/// closes a tile the following stretch has closed.
/// Fast on open maps but a bad guess costs optimality, routes are only guaranteed valid.
#[derive(Clone, Debug)]
pub struct ParallelDivide {
    threads: usize,
    cancel: CancelToken,
}

impl ParallelDivide {
    pub fn new(threads: usize, cancel: CancelToken) -> Self {
        Self { threads, cancel }
    }
}

impl PathPlanner for ParallelDivide {
    fn name(&self) -> &'static str {
        "parDivide"
    }

    fn plan(&self, world: &World, start: Point, goal: Point) -> Result<Route, PathPlannerError> {
        validate_endpoints(world, start, goal)?;
        if self.threads == 0 {
            return Err(PathPlannerError::InvalidConfig("parallel divide needs at least one thread".into()));
        }
        if start == goal {
            return Ok(Route::trivial(start));
        }

        let waypoints = waypoints(world, start, goal, self.threads);
        let claims = SegmentClaims::new(self.cancel.clone());
        let joined: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = waypoints
                .windows(2)
                .enumerate()
                .map(|(segment, ends)| {
                    let claims = &claims;
                    let (from, to) = (ends[0], ends[1]);
                    scope.spawn(move || search_segment(world, segment, from, to, claims))
                })
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect()
        });

        let mut segments = Vec::with_capacity(joined.len());
        for result in joined {
            let segment = result.map_err(|_| PathPlannerError::WorkerPanicked("segment search"))?;
            match segment {
                Ok(segment) => segments.push(segment),
                Err(PathPlannerError::NoPathFound) => {
                    warn!("parDivide: a waypoint between {} and {} is unreachable, falling back to aStar", start, goal);
                    return AStar.plan(world, start, goal);
                }
                Err(err) => return Err(err),
            }
        }

        let expanded = segments.iter().map(|segment| segment.closed.len()).sum();
        let path = stitch(world, &waypoints, &segments)?;
        let route = Route::new(world, erase_loops(path), expanded);
        debug!("parDivide: {} -> {} through {} waypoints costs {} after {} expansions",
            start, goal, waypoints.len(), route.cost, expanded);
        Ok(route)
    }
}


/// Waypoints from `start` to `goal`, both included, cutting the straight line into `parts`
/// Each interior waypoint is the open line tile closest to its cut, past the previous one.
pub fn waypoints(world: &World, start: Point, goal: Point, parts: usize) -> Vec<Point> {
    let line = grid_line(start, goal);
    let last = line.len() - 1;
    let mut points = vec![start];
    let mut previous = 0;

    for part in 1..parts {
        let cut = last * part / parts;
        let found = (0..line.len())
            .flat_map(|offset| [cut.checked_add(offset), cut.checked_sub(offset)])
            .flatten()
            .find(|&index| index > previous && index < last && world.is_open(line[index]));

        if let Some(index) = found {
            points.push(line[index]);
            previous = index;
        }
    }
    points.push(goal);
    points
}


/// Closed-set of one stretch and the tile it stopped on
struct Segment {
    closed: ClosedSet,
    end: Point,
}

fn search_segment(world: &World, segment: usize, from: Point, to: Point, claims: &SegmentClaims) -> Result<Segment, PathPlannerError> {
    let mut frontier = Frontier::new(world, from, Heuristic::Manhattan(to), Direction::Forward);

    while let Some(node) = frontier.pop() {
        if claims.is_cancelled() {
            return Err(PathPlannerError::Cancelled);
        }
        let handed_over = claims.claim(segment, node.tile.id);
        if handed_over || node.position == to {
            return Ok(Segment { end: node.position, closed: frontier.into_closed() });
        }
        frontier.expand(&node);
    }
    Err(PathPlannerError::NoPathFound)
}


/// Chain every stretch to its end tile, then walk the following stretch back to its waypoint
fn stitch(world: &World, waypoints: &[Point], segments: &[Segment]) -> Result<Vec<Point>, PathPlannerError> {
    let mut path = vec![waypoints[0]];

    for (index, segment) in segments.iter().enumerate() {
        path.extend(trace_segment(world, segment, segment.end)?.into_iter().skip(1));

        let next_waypoint = waypoints[index + 1];
        if segment.end != next_waypoint {
            let next = segments.get(index + 1).ok_or_else(|| {
                PathPlannerError::ClaimRaceDetected(format!("last stretch stopped at {} before the goal", segment.end))
            })?;
            let back = trace_segment(world, next, segment.end)?;
            path.extend(back.into_iter().rev().skip(1));
        }
    }
    Ok(path)
}

fn trace_segment(world: &World, segment: &Segment, end: Point) -> Result<Vec<Point>, PathPlannerError> {
    let node = segment.closed.get(&world.id_of(end)).ok_or_else(|| {
        PathPlannerError::ClaimRaceDetected(format!("{end} was never closed by the stretch it was handed to"))
    })?;
    trace_closed(world, &segment.closed, node)
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_waypoints_step_around_walls() {
        let world = World::from_rows(&[
            "....#....",
            ".........",
        ]).unwrap();
        let points = waypoints(&world, Point::new(0, 0), Point::new(8, 0), 4);
        assert_eq!(points, vec![
            Point::new(0, 0), Point::new(2, 0), Point::new(5, 0), Point::new(6, 0), Point::new(8, 0),
        ]);
    }

    #[test]
    fn test_waypoints_on_short_lines() {
        let world = World::from_rows(&["..", ".."]).unwrap();
        let points = waypoints(&world, Point::new(0, 0), Point::new(1, 0), 4);
        assert_eq!(points, vec![Point::new(0, 0), Point::new(1, 0)]);
    }

    #[test]
    fn test_divide_returns_valid_routes() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..10 {
            let world = World::random(24, 24, 0.8, 5, &mut rng).unwrap();
            let start = Point::new(0, 0);
            let goal = Point::new(23, 23);
            if !world.is_open(start) || !world.is_open(goal) {
                continue;
            }

            match (AStar.plan(&world, start, goal), ParallelDivide::new(4, CancelToken::new()).plan(&world, start, goal)) {
                (Ok(optimal), Ok(route)) => {
                    assert!(route.is_valid(&world));
                    assert_eq!(route.start(), Some(start));
                    assert_eq!(route.goal(), Some(goal));
                    assert!(route.cost >= optimal.cost);
                }
                (Err(PathPlannerError::NoPathFound), Err(PathPlannerError::NoPathFound)) => {}
                (expected, found) => panic!("A* gave {expected:?}, divide gave {found:?}"),
            }
        }
    }

    #[test]
    fn test_divide_falls_back_when_a_waypoint_is_walled_in() {
        // the middle waypoint lands in the sealed pocket
        let world = World::from_rows(&[
            "...#.#...",
            "...#.#...",
            "...###...",
            ".........",
        ]).unwrap();
        let start = Point::new(0, 0);
        let goal = Point::new(8, 0);
        assert_eq!(waypoints(&world, start, goal, 2)[1], Point::new(4, 0));

        let route = ParallelDivide::new(2, CancelToken::new()).plan(&world, start, goal).unwrap();
        assert_eq!(route.cost, AStar.plan(&world, start, goal).unwrap().cost);
        assert!(route.is_valid(&world));
    }

    #[test]
    fn test_divide_honours_cancellation() {
        let world = World::from_rows(&["......"]).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = ParallelDivide::new(2, cancel).plan(&world, Point::new(0, 0), Point::new(5, 0));
        assert!(matches!(result, Err(PathPlannerError::Cancelled)));
    }
}
