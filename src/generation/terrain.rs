//! # Terrain Generation
//!
//! Height-field generation for the platformer themes (forest, cave,
//! mountain).
//!
//! The terrain is a left-to-right column walk: a running height offset is
//! perturbed by one row with small probability and blended with a
//! deterministic hash-oscillator noise of the column index, then clamped
//! into bounds. Everything above the surface row is air, the surface row is
//! a surface tile, everything below is solid. Cave pockets and secret rooms
//! are carved afterwards, one-way platform strips are placed where
//! clearance exists, and a surface-dressing pass keeps the top of every
//! solid run reading as a surface tile.

use crate::generation::{
    placement, utils, Checkpoint, GemColor, GenerationConfig, Item, ItemKind, Level,
    LevelGenerator,
};
use crate::world::{Cell, TileGrid, TileKind};
use crate::{WarrenError, WarrenResult};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

/// Rows between the lowest allowed surface and the level bottom.
const SURFACE_BOTTOM_MARGIN: i32 = 3;
/// Highest row the surface may climb to.
const SURFACE_TOP_LIMIT: i32 = 5;

/// Height-field terrain generator.
///
/// # Examples
///
/// ```
/// use warren::{GenerationConfig, HeightFieldGenerator, LevelGenerator, Theme};
/// use warren::generation::utils;
///
/// let config = GenerationConfig::new(60, 30, Theme::Forest, 7);
/// let mut rng = utils::create_rng(&config);
/// let level = HeightFieldGenerator::new().generate(&config, &mut rng).unwrap();
/// assert!(level.find_ground_level(0) >= 5);
/// ```
#[derive(Debug, Clone)]
pub struct HeightFieldGenerator {
    /// Rows of ground beneath the unperturbed surface
    pub ground_depth: u32,
    /// Bound on the random-walk offset, in rows either way
    pub max_walk_offset: i32,
    /// Per-column probability of a random-walk step
    pub walk_chance: f64,
    /// Amplitude of the hash-oscillator term, in rows
    pub noise_amplitude: f32,
    /// Columns per noise lattice point
    pub noise_wavelength: i32,
}

impl HeightFieldGenerator {
    pub fn new() -> Self {
        Self {
            ground_depth: 8,
            max_walk_offset: 3,
            walk_chance: 0.1,
            noise_amplitude: 3.0,
            noise_wavelength: 16,
        }
    }

    /// Deterministic integer-hash noise in (-1.0, 1.0].
    ///
    /// The classic bit-mash oscillator; NOT Perlin noise. The same column
    /// index always yields the same value.
    fn hash_noise(x: i32) -> f32 {
        let x = (x << 13) ^ x;
        let n = x
            .wrapping_mul(x.wrapping_mul(x).wrapping_mul(15731).wrapping_add(789_221))
            .wrapping_add(1_376_312_589)
            & 0x7fff_ffff;
        1.0 - n as f32 / 1_073_741_824.0
    }

    /// Hash noise sampled on a coarse lattice and linearly interpolated,
    /// giving smooth variation across neighboring columns.
    fn smooth_noise(&self, col: i32) -> f32 {
        let wavelength = self.noise_wavelength.max(1);
        let lattice = col.div_euclid(wavelength);
        let t = col.rem_euclid(wavelength) as f32 / wavelength as f32;
        let a = Self::hash_noise(lattice);
        let b = Self::hash_noise(lattice + 1);
        a + (b - a) * t
    }

    /// Walks the columns and fills surface/solid runs.
    fn carve_terrain(&self, grid: &mut TileGrid, rng: &mut StdRng) {
        let height = grid.height() as i32;
        let base_ground = height - self.ground_depth as i32;
        let mut walk_offset = 0i32;

        for x in 0..grid.width() as i32 {
            if rng.gen_bool(self.walk_chance) {
                walk_offset += if rng.gen_bool(0.5) { 1 } else { -1 };
                walk_offset = walk_offset.clamp(-self.max_walk_offset, self.max_walk_offset);
            }

            let noise = (self.smooth_noise(x) * self.noise_amplitude).round() as i32;
            let surface = (base_ground + walk_offset + noise)
                .clamp(SURFACE_TOP_LIMIT, height - SURFACE_BOTTOM_MARGIN);

            grid.set_tile(Cell::new(x, surface), TileKind::Surface);
            for y in surface + 1..height {
                grid.set_tile(Cell::new(x, y), TileKind::Solid);
            }
        }
    }

    /// Carves rectangular cave pockets into the ground.
    fn carve_caves(&self, grid: &mut TileGrid, config: &GenerationConfig, rng: &mut StdRng) {
        let width = grid.width() as i32;
        let height = grid.height() as i32;

        for _ in 0..config.cave_count {
            let cave_w = rng.gen_range(6..=12);
            let cave_h = rng.gen_range(3..=5);
            let x = rng.gen_range(5..(width - 5 - cave_w).max(6));
            let y = rng.gen_range((height - 12).max(1)..(height - SURFACE_BOTTOM_MARGIN - cave_h).max(2));
            grid.carve_rect(x, y, cave_w as u32, cave_h as u32);
        }
    }

    /// Carves hidden pockets holding a high-value gem.
    ///
    /// A candidate pocket is accepted only if it is currently buried in
    /// solid ground; the attempt budget bounds the search.
    fn carve_secret_rooms(&self, level: &mut Level, config: &GenerationConfig, rng: &mut StdRng) {
        let width = level.grid.width() as i32;
        let height = level.grid.height() as i32;
        let (room_w, room_h) = (5i32, 3i32);

        for _ in 0..config.secret_room_count {
            let mut placed = false;
            for _ in 0..config.max_placement_attempts {
                let x = rng.gen_range(5..(width - 5 - room_w).max(6));
                let y = rng.gen_range(5..(height - 2 - room_h).max(6));

                let buried = (x..x + room_w).all(|cx| {
                    (y..y + room_h).all(|cy| level.grid.tile(Cell::new(cx, cy)) == TileKind::Solid)
                });
                if !buried {
                    continue;
                }

                level.grid.carve_rect(x, y, room_w as u32, room_h as u32);
                level.items.push(Item::new(
                    ItemKind::Gem(GemColor::Red),
                    Cell::new(x + room_w / 2, y + room_h / 2),
                    200,
                ));
                placed = true;
                break;
            }
            if !placed {
                debug!("secret room skipped after budget exhaustion");
            }
        }
    }

    /// Places one-way platform strips where a row of clearance exists both
    /// above and below the strip.
    fn place_platforms(&self, grid: &mut TileGrid, config: &GenerationConfig, rng: &mut StdRng) {
        let width = grid.width() as i32;
        let height = grid.height() as i32;

        for _ in 0..config.platform_count {
            let mut placed = false;
            for _ in 0..config.max_placement_attempts {
                let strip_w = rng.gen_range(3..=6);
                let x = rng.gen_range(2..(width - 2 - strip_w).max(3));
                let y = rng.gen_range(4..(height - 10).max(5));

                let clear = (x..x + strip_w).all(|cx| {
                    grid.is_open(Cell::new(cx, y))
                        && grid.is_open(Cell::new(cx, y - 1))
                        && grid.is_open(Cell::new(cx, y + 1))
                });
                if !clear {
                    continue;
                }

                for cx in x..x + strip_w {
                    grid.set_tile(Cell::new(cx, y), TileKind::Platform);
                }
                placed = true;
                break;
            }
            if !placed {
                debug!("platform strip skipped after budget exhaustion");
            }
        }
    }

    /// Evenly spaced checkpoints standing on the ground, one per hundred
    /// columns.
    fn place_checkpoints(&self, level: &mut Level) {
        let width = level.grid.width() as i32;
        let count = width / 100;

        for i in 1..=count {
            let x = width / (count + 1) * i;
            let y = level.find_ground_level(x) - 1;
            level.checkpoints.push(Checkpoint {
                cell: Cell::new(x, y),
                activated: false,
            });
        }
    }

    /// Picks the player spawn two cells above the ground, scanning right
    /// from the reference column until an open stand exists.
    fn pick_player_spawn(&self, level: &Level) -> Cell {
        for x in 2..level.grid.width() as i32 {
            let ground = level.find_ground_level(x);
            let spawn = Cell::new(x, ground - 2);
            if level.grid.is_open(spawn) && level.grid.is_open(Cell::new(x, ground - 1)) {
                return spawn;
            }
        }
        // Clamped surface rows guarantee headroom; reaching here would mean
        // an all-solid grid, and validation rejects that outright.
        Cell::new(2, 2)
    }
}

impl LevelGenerator for HeightFieldGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<Level> {
        config.validate()?;

        let mut grid = TileGrid::new(config.width, config.height, TileKind::Empty);
        self.carve_terrain(&mut grid, rng);
        self.carve_caves(&mut grid, config, rng);

        let mut level = Level {
            grid,
            theme: config.theme,
            player_spawn: Cell::new(0, 0),
            items: Vec::new(),
            enemy_spawns: Vec::new(),
            decorations: Vec::new(),
            checkpoints: Vec::new(),
            rooms: Vec::new(),
        };

        self.carve_secret_rooms(&mut level, config, rng);
        utils::dress_surfaces(&mut level.grid);
        self.place_platforms(&mut level.grid, config, rng);

        level.player_spawn = self.pick_player_spawn(&level);
        self.place_checkpoints(&mut level);

        placement::place_items(&mut level, config, rng);
        placement::place_enemy_spawns(&mut level, config, rng);
        placement::place_decorations(&mut level, config, rng);

        self.validate(&level, config)?;
        debug!(
            "generated terrain: {} items, {} spawns, {} checkpoints",
            level.items.len(),
            level.enemy_spawns.len(),
            level.checkpoints.len()
        );

        Ok(level)
    }

    fn validate(&self, level: &Level, _config: &GenerationConfig) -> WarrenResult<()> {
        utils::validate_level(level)?;

        // The top of each column's solid run must be a surface tile.
        for x in 0..level.grid.width() as i32 {
            for y in 0..level.grid.height() as i32 {
                match level.grid.tile(Cell::new(x, y)) {
                    TileKind::Surface => break,
                    TileKind::Solid => {
                        return Err(WarrenError::GenerationFailed(format!(
                            "column {x} tops out in bare solid at row {y}"
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn generator_kind(&self) -> &'static str {
        "HeightFieldGenerator"
    }
}

impl Default for HeightFieldGenerator {
    fn default() -> Self {
        Self::new()
    }
}
