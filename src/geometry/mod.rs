use std::fmt;

use num_traits::Num;


/// Manhattan distance
/// Works for signed and unsigned coordinates alike
pub fn manhattan_distance<T>(x1: T, y1: T, x2: T, y2: T) -> T
where
    T: Num + Copy + PartialOrd,
    {
    abs_diff(x1, x2) + abs_diff(y1, y2)
}

fn abs_diff<T>(a: T, b: T) -> T
where
    T: Num + Copy + PartialOrd,
    {
    if a > b { a - b } else { b - a }
}


/// Grid coordinate, x is the column and y the row
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point
    pub fn manhattan(&self, other: &Point) -> u32 {
        manhattan_distance(self.x, self.y, other.x, other.y)
    }

    /// The 4 axis-aligned neighbours in east, south, west, north order.
    /// Coordinates that would underflow are skipped, bounds checks are left to the caller.
    pub fn adjacent(self) -> impl Iterator<Item = Point> {
        let Point { x, y } = self;
        [
            x.checked_add(1).map(|x| Point::new(x, y)),
            y.checked_add(1).map(|y| Point::new(x, y)),
            x.checked_sub(1).map(|x| Point::new(x, y)),
            y.checked_sub(1).map(|y| Point::new(x, y)),
        ]
        .into_iter()
        .flatten()
    }

    /// True if `other` shares an edge with this point
    pub fn is_adjacent(&self, other: &Point) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}


/// 4-connected line between two points
/// Bresenham's algorithm, with a corner step inserted wherever a diagonal move would occur
/// so that consecutive points always share an edge
/// https://en.wikipedia.org/wiki/Bresenham%27s_line_algorithm
pub fn grid_line(from: Point, to: Point) -> Vec<Point> {
    let (mut x, mut y) = (from.x as i64, from.y as i64);
    let (tx, ty) = (to.x as i64, to.y as i64);
    let dx = (tx - x).abs();
    let dy = -(ty - y).abs();
    let sx = if x < tx { 1 } else { -1 };
    let sy = if y < ty { 1 } else { -1 };
    let mut err = dx + dy;

    let mut points = vec![from];
    while x != tx || y != ty {
        let e2 = 2 * err;
        let step_x = e2 >= dy && x != tx;
        let step_y = e2 <= dx && y != ty;
        if step_x {
            err += dy;
            x += sx;
            points.push(Point::new(x as u32, y as u32));
        }
        if step_y {
            err += dx;
            y += sy;
            points.push(Point::new(x as u32, y as u32));
        }
    }
    points
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance_signed_and_unsigned() {
        assert_eq!(manhattan_distance(0u32, 0, 3, 4), 7);
        assert_eq!(manhattan_distance(3u32, 4, 0, 0), 7);
        assert_eq!(manhattan_distance(-2i32, 5, 1, -1), 9);
        assert_eq!(Point::new(4, 4).manhattan(&Point::new(0, 0)), 8);
    }

    #[test]
    fn test_adjacent_skips_underflow() {
        let corner: Vec<_> = Point::new(0, 0).adjacent().collect();
        assert_eq!(corner, vec![Point::new(1, 0), Point::new(0, 1)]);

        let inner: Vec<_> = Point::new(2, 2).adjacent().collect();
        assert_eq!(inner, vec![
            Point::new(3, 2), Point::new(2, 3), Point::new(1, 2), Point::new(2, 1),
        ]);
    }

    fn east_and_south(point: Point) -> impl Iterator<Item = Point> {
        point.adjacent().take(2)
    }

    #[test]
    fn test_adjacent_outlives_its_point() {
        let around = {
            let point = Point::new(5, 5);
            point.adjacent()
        };
        assert_eq!(around.count(), 4);
        assert_eq!(east_and_south(Point::new(1, 1)).collect::<Vec<_>>(), vec![Point::new(2, 1), Point::new(1, 2)]);
    }

    #[test]
    fn test_grid_line_is_contiguous() {
        let cases = [
            (Point::new(0, 0), Point::new(7, 3)),
            (Point::new(9, 1), Point::new(0, 8)),
            (Point::new(4, 4), Point::new(4, 0)),
            (Point::new(2, 5), Point::new(2, 5)),
        ];
        for (from, to) in cases {
            let line = grid_line(from, to);
            assert_eq!(line.first(), Some(&from));
            assert_eq!(line.last(), Some(&to));
            assert_eq!(line.len() as u32, from.manhattan(&to) + 1);
            for pair in line.windows(2) {
                assert!(pair[0].is_adjacent(&pair[1]), "{} -> {}", pair[0], pair[1]);
            }
        }
    }
}
