#![allow(dead_code)]

use parpath::{Point, World};

/// Cheapest cost from `start` to every tile, by relaxing every edge until nothing changes
pub fn brute_force_costs(world: &World, start: Point) -> Vec<Option<u32>> {
    let mut costs = vec![None; world.tile_count()];
    costs[world.id_of(start) as usize] = Some(0);

    let mut changed = true;
    while changed {
        changed = false;
        for id in 0..world.tile_count() as u32 {
            let Some(cost) = costs[id as usize] else {
                continue;
            };
            for (_, tile) in world.neighbors(world.point_of(id)) {
                let candidate = cost + tile.cost;
                let known = &mut costs[tile.id as usize];
                if known.is_none_or(|known| candidate < known) {
                    *known = Some(candidate);
                    changed = true;
                }
            }
        }
    }
    costs
}

/// First and last open tile in row-major order
pub fn corner_endpoints(world: &World) -> Option<(Point, Point)> {
    let open: Vec<Point> = (0..world.tile_count() as u32)
        .map(|id| world.point_of(id))
        .filter(|point| world.is_open(*point))
        .collect();
    match open.as_slice() {
        [first, .., last] => Some((*first, *last)),
        _ => None,
    }
}

/// 5x5 grid with column 2 walled off except on row 0
pub fn gate_world() -> World {
    World::from_rows(&[
        ".....",
        "..#..",
        "..#..",
        "..#..",
        "..#..",
    ]).unwrap()
}
