//! # World Module
//!
//! Tile-grid world representation.
//!
//! The grid is the foundation everything else stands on: generation writes
//! it once, then physics and line-of-sight code query it read-only for the
//! rest of the level's life. All queries are total — reads outside the grid
//! resolve to a solid wall sentinel so collision code can never index out
//! of range or escape the level.

use crate::config::TILE_SIZE;
use serde::{Deserialize, Serialize};

/// Represents a tile coordinate in the grid.
///
/// Cell coordinates are integers; world coordinates are continuous floats
/// converted by floor-division against [`TILE_SIZE`].
///
/// # Examples
///
/// ```
/// use warren::Cell;
///
/// let cell = Cell::of_world(33.0, 17.5);
/// assert_eq!(cell, Cell::new(2, 1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Converts a continuous world position to the cell containing it.
    pub fn of_world(world_x: f32, world_y: f32) -> Self {
        Self {
            x: (world_x / TILE_SIZE).floor() as i32,
            y: (world_y / TILE_SIZE).floor() as i32,
        }
    }

    /// World coordinate of this cell's top-left corner.
    pub fn world_origin(self) -> (f32, f32) {
        (self.x as f32 * TILE_SIZE, self.y as f32 * TILE_SIZE)
    }

    /// Returns the 4 cardinally adjacent cells (no diagonals).
    pub fn cardinal_neighbors(self) -> [Cell; 4] {
        [
            Cell::new(self.x, self.y - 1),
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y + 1),
        ]
    }
}

/// An axis-aligned bounding box in continuous world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// Tile-type codes stored in the grid.
///
/// The numeric codes match the level data the renderer consumes:
/// 0 = air, 1 = surface/wall-front, 2 = solid interior, 3 = one-way platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileKind {
    /// Open air
    Empty = 0,
    /// Walkable surface or wall front
    Surface = 1,
    /// Solid interior ground
    Solid = 2,
    /// One-way platform: blocks falling entities only
    Platform = 3,
}

impl TileKind {
    /// Whether this tile blocks movement from every direction.
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Surface | TileKind::Solid)
    }
}

/// Solidity mode for collision queries.
///
/// Horizontal and upward motion passes through one-way platforms; downward
/// motion and ground-support checks treat them as solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solidity {
    /// Platforms count as solid (downward motion, ground support)
    All,
    /// Platforms are passable (horizontal and upward motion, line of sight)
    IgnorePlatforms,
}

/// A `width x height` grid of tile codes.
///
/// Built once at level-generation time and immutable during play. Any query
/// outside `[0, width) x [0, height)` reports a solid wall — this is the
/// invariant that keeps physics and line-of-sight code total.
///
/// # Examples
///
/// ```
/// use warren::{Cell, TileGrid, TileKind};
///
/// let grid = TileGrid::new(10, 10, TileKind::Empty);
/// assert_eq!(grid.tile(Cell::new(5, 5)), TileKind::Empty);
/// assert_eq!(grid.tile(Cell::new(-1, 5)), TileKind::Solid);
/// assert!(grid.is_solid(Cell::new(10, 0)));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    /// Creates a grid filled with the given tile kind.
    pub fn new(width: u32, height: u32, fill: TileKind) -> Self {
        Self {
            width,
            height,
            tiles: vec![fill; (width * height) as usize],
        }
    }

    /// Grid width in cells.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cell lies inside the grid bounds.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as u32) < self.width && (cell.y as u32) < self.height
    }

    /// Reads the tile at a cell. Out-of-bounds reads return the wall
    /// sentinel ([`TileKind::Solid`]) rather than failing.
    pub fn tile(&self, cell: Cell) -> TileKind {
        if self.in_bounds(cell) {
            self.tiles[(cell.y as u32 * self.width + cell.x as u32) as usize]
        } else {
            TileKind::Solid
        }
    }

    /// Writes a tile. Out-of-bounds writes are ignored; generation code
    /// carves freely near edges and relies on this.
    pub fn set_tile(&mut self, cell: Cell, kind: TileKind) {
        if self.in_bounds(cell) {
            self.tiles[(cell.y as u32 * self.width + cell.x as u32) as usize] = kind;
        }
    }

    /// True if the cell blocks movement from every direction, or is out of
    /// bounds.
    pub fn is_solid(&self, cell: Cell) -> bool {
        self.tile(cell).is_solid()
    }

    /// Solidity query parameterized by platform handling.
    pub fn is_blocking(&self, cell: Cell, mode: Solidity) -> bool {
        match self.tile(cell) {
            TileKind::Empty => false,
            TileKind::Surface | TileKind::Solid => true,
            TileKind::Platform => mode == Solidity::All,
        }
    }

    /// True if the cell holds open air (in bounds and empty).
    pub fn is_open(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.tile(cell) == TileKind::Empty
    }

    /// Fills a rectangle of cells, clipped to the grid.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, kind: TileKind) {
        for cy in y..y + h as i32 {
            for cx in x..x + w as i32 {
                self.set_tile(Cell::new(cx, cy), kind);
            }
        }
    }

    /// Clears a rectangle of cells to air, clipped to the grid.
    pub fn carve_rect(&mut self, x: i32, y: i32, w: u32, h: u32) {
        self.fill_rect(x, y, w, h, TileKind::Empty);
    }

    /// Counts cells of the given kind; used by generation validation.
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&t| t == kind).count()
    }
}
