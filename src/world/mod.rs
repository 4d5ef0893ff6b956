//! The grid in which path finding takes place.
//!
//! A world is a row-major grid of tiles. Each tile carries the cost of
//! entering it, a cost of 0 marks an impassable tile (a wall).

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use rand::Rng;

use crate::errors::{EndpointIssue, PathPlannerError, WorldError};
use crate::geometry::Point;


/// Largest cost a tile can carry, tiles are stored as single bytes on disk
pub const MAX_TILE_COST: u32 = u8::MAX as u32;

/// One location in the world
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    pub cost: u32, // cost to enter, 0 = wall
    pub id: u32, // row-major index
}

impl Tile {
    pub fn is_open(&self) -> bool {
        self.cost != 0
    }
}


/// Immutable grid of tiles
/// Safe to share between any number of reader threads
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    tiles: Vec<Tile>,
    width: u32,
    height: u32,
    max_tile_cost: u32,
    open_tiles: usize,
}

impl World {

    /// Build a world from row-major tile costs
    /// The maximum tile cost is taken from the tiles themselves
    pub fn new(width: u32, height: u32, costs: Vec<u32>) -> Result<Self, WorldError> {
        let max = costs.iter().copied().max().unwrap_or(0);
        Self::with_max_tile_cost(width, height, max, costs)
    }

    /// Build a world with an explicitly declared maximum tile cost
    pub fn with_max_tile_cost(width: u32, height: u32, max_tile_cost: u32, costs: Vec<u32>) -> Result<Self, WorldError> {
        if width == 0 || height == 0 {
            return Err(WorldError::EmptyWorld);
        }
        let expected = width as usize * height as usize;
        if costs.len() != expected {
            return Err(WorldError::DimensionMismatch {
                width: width as usize,
                height: height as usize,
                expected,
                found: costs.len(),
            });
        }
        if max_tile_cost > MAX_TILE_COST {
            return Err(WorldError::InvalidMaxCost(max_tile_cost));
        }

        let mut open_tiles = 0;
        let mut tiles = Vec::with_capacity(expected);
        for (id, cost) in costs.into_iter().enumerate() {
            if cost > MAX_TILE_COST {
                return Err(WorldError::InvalidCost { id, cost });
            }
            if cost > max_tile_cost {
                return Err(WorldError::CostAboveMax { id, cost, max: max_tile_cost });
            }
            if cost != 0 {
                open_tiles += 1;
            }
            tiles.push(Tile { cost, id: id as u32 });
        }

        Ok(Self { tiles, width, height, max_tile_cost, open_tiles })
    }

    /// Build a world from text rows
    /// `#` is a wall, `.` costs 1 and the digits `1`-`9` cost their value
    pub fn from_rows(rows: &[&str]) -> Result<Self, WorldError> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |row| row.chars().count()) as u32;
        let mut costs = Vec::with_capacity(width as usize * height as usize);
        for row in rows {
            let length = row.chars().count();
            if length != width as usize {
                return Err(WorldError::RaggedRow { width: width as usize, found: length });
            }
            for glyph in row.chars() {
                let cost = match glyph {
                    '#' => 0,
                    '.' => 1,
                    '1'..='9' => glyph as u32 - '0' as u32,
                    other => return Err(WorldError::UnknownGlyph(other)),
                };
                costs.push(cost);
            }
        }
        Self::new(width, height, costs)
    }

    /// Uniformly random world, used for testing and benchmarking
    /// Each tile is open with probability `open_ratio` and costs between 1 and `max_cost`
    pub fn random<R: Rng + ?Sized>(width: u32, height: u32, open_ratio: f64, max_cost: u8, rng: &mut R) -> Result<Self, WorldError> {
        let max_cost = max_cost.max(1) as u32;
        let open_ratio = if open_ratio.is_nan() { 0.0 } else { open_ratio.clamp(0.0, 1.0) };
        let costs = (0..width as usize * height as usize)
            .map(|_| {
                if rng.random_bool(open_ratio) {
                    rng.random_range(1..=max_cost)
                } else {
                    0
                }
            })
            .collect();
        Self::with_max_tile_cost(width, height, max_cost, costs)
    }

    /// Load a world file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// Parse the world file format
    /// `width\nheight\nmax_tile_cost\n` followed by `width * height` cost bytes
    pub fn read_from<R: BufRead>(mut reader: R) -> Result<Self, WorldError> {
        let width = read_header_value(&mut reader, 1)?;
        let height = read_header_value(&mut reader, 2)?;
        let max_tile_cost = read_header_value(&mut reader, 3)?;

        let expected = width as usize * height as usize;
        let mut bytes = Vec::with_capacity(expected);
        reader.take(expected as u64).read_to_end(&mut bytes)?;
        if bytes.len() != expected {
            return Err(WorldError::Truncated { expected, found: bytes.len() });
        }

        let costs = bytes.into_iter().map(u32::from).collect();
        Self::with_max_tile_cost(width, height, max_tile_cost, costs)
    }

    /// Serialize into the world file format
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), WorldError> {
        write!(writer, "{}\n{}\n{}\n", self.width, self.height, self.max_tile_cost)?;
        // costs are validated to fit in a byte on construction
        let bytes: Vec<u8> = self.tiles.iter().map(|tile| tile.cost as u8).collect();
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Tile at column x, row y
    /// Panics if the coordinate is outside of the world
    pub fn tile_at(&self, x: u32, y: u32) -> Tile {
        assert!(x < self.width && y < self.height, "({x}, {y}) is outside of a {}x{} world", self.width, self.height);
        self.tiles[(y * self.width + x) as usize]
    }

    pub fn get(&self, point: Point) -> Option<Tile> {
        self.contains(point).then(|| self.tiles[self.index(point)])
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }

    pub fn is_open(&self, point: Point) -> bool {
        self.get(point).is_some_and(|tile| tile.is_open())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn max_tile_cost(&self) -> u32 {
        self.max_tile_cost
    }

    pub fn open_tile_count(&self) -> usize {
        self.open_tiles
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl ExactSizeIterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn id_of(&self, point: Point) -> u32 {
        point.y * self.width + point.x
    }

    pub fn point_of(&self, id: u32) -> Point {
        Point::new(id % self.width, id / self.width)
    }

    /// Open neighbours of a point in east, south, west, north order
    pub fn neighbors(&self, point: Point) -> impl Iterator<Item = (Point, Tile)> + '_ {
        point.adjacent().filter_map(move |adjacent| {
            self.get(adjacent)
                .filter(Tile::is_open)
                .map(|tile| (adjacent, tile))
        })
    }

    /// Check that a search may start or end at this point
    pub fn validate_endpoint(&self, point: Point) -> Result<Tile, PathPlannerError> {
        match self.get(point) {
            None => Err(PathPlannerError::InvalidEndpoint { point, reason: EndpointIssue::OutOfBounds }),
            Some(tile) if !tile.is_open() => Err(PathPlannerError::InvalidEndpoint { point, reason: EndpointIssue::Wall }),
            Some(tile) => Ok(tile),
        }
    }

    fn index(&self, point: Point) -> usize {
        (point.y * self.width + point.x) as usize
    }
}


fn read_header_value<R: BufRead>(reader: &mut R, line: usize) -> Result<u32, WorldError> {
    let mut text = String::new();
    reader.read_line(&mut text)?;
    let value = text.strip_suffix('\n').unwrap_or(&text);
    value.trim_end_matches('\r')
        .parse()
        .map_err(|_| WorldError::MalformedHeader { line, found: text.clone() })
}
