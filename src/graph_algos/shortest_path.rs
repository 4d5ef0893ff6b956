use crate::collections::FxHashMap;
use crate::errors::PathPlannerError;
use crate::geometry::Point;
use crate::world::World;
use super::SearchNode;

/// Construct the path from the search origin to `end`
/// Returns the ordered path as a vector of points from origin to `end`
/// end: SearchNode - last node of the path, its predecessors are fetched through `lookup`
/// lookup: tile id -> finalized node, the chain stops at the node that is its own predecessor
pub(crate) fn trace_path<L>(world: &World, end: &SearchNode, lookup: L) -> Result<Vec<Point>, PathPlannerError>
where
    L: Fn(u32) -> Option<SearchNode>,
{

    let mut path = vec![end.position];
    let mut current = *end;

    // Trace back from end to the origin
    while !current.is_origin() {
        // a valid chain never visits more tiles than the world has open
        if path.len() > world.open_tile_count() {
            return Err(PathPlannerError::ClaimRaceDetected(format!(
                "predecessor chain from {} does not reach its origin", end.position
            )));
        }

        let id = world.id_of(current.predecessor);
        current = lookup(id).ok_or_else(|| PathPlannerError::ClaimRaceDetected(format!(
            "predecessor {} of {} was never finalized", current.predecessor, current.position
        )))?;
        path.push(current.position);
    }

    // The path is in reverse order, so reverse it
    path.reverse();

    Ok(path)
}


/// Total cost of a path: every tile entered after the first one
pub fn path_cost(world: &World, path: &[Point]) -> u32 {
    path.iter()
        .skip(1)
        .map(|point| world.tile_at(point.x, point.y).cost)
        .sum()
}


/// Join a forward half (start -> meeting) and a reverse half (goal -> meeting)
/// The meeting point closes both halves and is kept once
pub(crate) fn splice(mut forward: Vec<Point>, reverse: Vec<Point>) -> Vec<Point> {
    let meeting = forward.last().copied();
    let mut tail = reverse.into_iter().rev().peekable();
    if tail.peek().copied() == meeting {
        tail.next();
    }
    forward.extend(tail);
    forward
}


/// Cut out every loop
/// When a point repeats, everything visited between its two visits is dropped.
/// The path only gets shorter, so its cost can only drop
pub(crate) fn erase_loops(path: Vec<Point>) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(path.len());
    let mut index_of: FxHashMap<Point, usize> = FxHashMap::default();

    for point in path {
        if let Some(&index) = index_of.get(&point) {
            // back at an earlier point, drop everything visited since
            for dropped in kept.drain(index + 1..) {
                index_of.remove(&dropped);
            }
            continue;
        }
        index_of.insert(point, kept.len());
        kept.push(point);
    }
    kept
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Tile;

    fn node(world: &World, position: Point, predecessor: Point) -> SearchNode {
        let tile = world.tile_at(position.x, position.y);
        SearchNode::reached(tile, position, 0, 0, predecessor)
    }

    #[test]
    fn test_trace_path_walks_predecessors() {
        let world = World::from_rows(&["....", "...."]).unwrap();
        let chain = [
            node(&world, Point::new(0, 0), Point::new(0, 0)),
            node(&world, Point::new(1, 0), Point::new(0, 0)),
            node(&world, Point::new(1, 1), Point::new(1, 0)),
            node(&world, Point::new(2, 1), Point::new(1, 1)),
        ];
        let closed: FxHashMap<u32, SearchNode> = chain.iter().map(|n| (n.tile.id, *n)).collect();

        let path = trace_path(&world, &chain[3], |id| closed.get(&id).copied()).unwrap();
        assert_eq!(path, vec![Point::new(0, 0), Point::new(1, 0), Point::new(1, 1), Point::new(2, 1)]);

        // the origin alone is a path of one point
        let path = trace_path(&world, &chain[0], |id| closed.get(&id).copied()).unwrap();
        assert_eq!(path, vec![Point::new(0, 0)]);
    }

    #[test]
    fn test_trace_path_detects_broken_chains() {
        let world = World::from_rows(&["...."]).unwrap();
        let end = node(&world, Point::new(3, 0), Point::new(2, 0));
        let missing = trace_path(&world, &end, |_| None);
        assert!(matches!(missing, Err(PathPlannerError::ClaimRaceDetected(_))));

        // two nodes pointing at each other never reach an origin
        let a = node(&world, Point::new(1, 0), Point::new(2, 0));
        let b = node(&world, Point::new(2, 0), Point::new(1, 0));
        let cycle = trace_path(&world, &end, |id| match id {
            1 => Some(a),
            2 => Some(b),
            _ => None,
        });
        assert!(matches!(cycle, Err(PathPlannerError::ClaimRaceDetected(_))));
    }

    #[test]
    fn test_path_cost_skips_the_first_tile() {
        let world = World::from_rows(&["9", "2", "3"]).unwrap();
        let path = [Point::new(0, 0), Point::new(0, 1), Point::new(0, 2)];
        assert_eq!(path_cost(&world, &path), 5);
        assert_eq!(path_cost(&world, &path[..1]), 0);
        assert_eq!(world.tile_at(0, 0), Tile { cost: 9, id: 0 });
    }

    #[test]
    fn test_splice_keeps_meeting_point_once() {
        let forward = vec![Point::new(0, 0), Point::new(1, 0), Point::new(2, 0)];
        let reverse = vec![Point::new(4, 0), Point::new(3, 0), Point::new(2, 0)];
        assert_eq!(splice(forward, reverse), vec![
            Point::new(0, 0), Point::new(1, 0), Point::new(2, 0), Point::new(3, 0), Point::new(4, 0),
        ]);
    }

    #[test]
    fn test_erase_loops() {
        let p = |x, y| Point::new(x, y);
        let path = vec![p(0, 0), p(1, 0), p(2, 0), p(2, 1), p(1, 1), p(1, 0), p(1, 2), p(1, 1), p(1, 3)];
        assert_eq!(erase_loops(path), vec![p(0, 0), p(1, 0), p(1, 2), p(1, 1), p(1, 3)]);

        let straight = vec![p(0, 0), p(0, 1), p(0, 2)];
        assert_eq!(erase_loops(straight.clone()), straight);
    }
}
