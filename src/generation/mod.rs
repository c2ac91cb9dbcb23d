//! # Generation Module
//!
//! Procedural level generation for dungeon and terrain themes.
//!
//! Generation is a one-shot synchronous computation: given a configuration
//! and a seed it produces a [`Level`] — the populated tile grid plus item,
//! enemy-spawn, decoration, and checkpoint tables. Two strategies exist
//! behind the [`LevelGenerator`] trait: room-and-corridor dungeons and
//! height-field terrain. All placement uses bounded rejection sampling, so
//! a level that cannot satisfy every placement constraint degrades to fewer
//! placements instead of failing.

pub mod dungeon;
pub mod placement;
pub mod terrain;

pub use dungeon::*;
pub use terrain::*;

use crate::world::{Aabb, Cell, TileGrid, TileKind};
use crate::{WarrenError, WarrenResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Configuration for procedural level generation.
///
/// Controls grid dimensions, the generation strategy, room parameters, and
/// placement densities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Level width in tiles
    pub width: u32,
    /// Level height in tiles
    pub height: u32,
    /// Visual/biome theme; also selects the default strategy
    pub theme: Theme,
    /// Generation strategy
    pub mode: GenerationMode,
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Minimum room dimension (dungeon mode)
    pub min_room_size: u32,
    /// Maximum room dimension (dungeon mode)
    pub max_room_size: u32,
    /// Target room count (dungeon mode); fewer rooms are accepted silently
    pub target_rooms: u32,
    /// Attempt budget per rejection-sampled placement
    pub max_placement_attempts: u32,
    /// Coins to place
    pub coin_count: u32,
    /// Gems to place
    pub gem_count: u32,
    /// Potions (health/energy) to place
    pub potion_count: u32,
    /// Power-ups to place
    pub powerup_count: u32,
    /// Enemy spawn points to place
    pub enemy_count: u32,
    /// Floating one-way platform strips (terrain mode)
    pub platform_count: u32,
    /// Cave pockets to carve (terrain mode)
    pub cave_count: u32,
    /// Secret rooms to carve (terrain mode)
    pub secret_room_count: u32,
    /// Per-surface-cell probability of a decoration
    pub decoration_chance: f64,
}

impl GenerationConfig {
    /// Creates a configuration with the reference defaults for the given
    /// dimensions and theme.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GenerationConfig, Theme};
    ///
    /// let config = GenerationConfig::new(150, 50, Theme::Forest, 42);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(width: u32, height: u32, theme: Theme, seed: u64) -> Self {
        Self {
            width,
            height,
            theme,
            mode: theme.default_mode(),
            seed,
            min_room_size: 4,
            max_room_size: 10,
            target_rooms: 10,
            max_placement_attempts: 100,
            coin_count: 20,
            gem_count: 8,
            potion_count: 5,
            powerup_count: 3,
            enemy_count: 8,
            platform_count: 12,
            cave_count: 3,
            secret_room_count: 3,
            decoration_chance: 0.1,
        }
    }

    /// Creates a configuration for testing with a small, simple level.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            coin_count: 6,
            gem_count: 2,
            potion_count: 1,
            powerup_count: 1,
            enemy_count: 3,
            platform_count: 4,
            cave_count: 1,
            secret_room_count: 1,
            target_rooms: 5,
            max_placement_attempts: 50,
            ..Self::new(60, 30, Theme::Forest, seed)
        }
    }

    /// Checks that the configuration describes a generatable level.
    pub fn validate(&self) -> WarrenResult<()> {
        if self.width < 16 || self.height < 12 {
            return Err(WarrenError::InvalidConfig(format!(
                "level dimensions {}x{} are below the 16x12 minimum",
                self.width, self.height
            )));
        }
        if self.min_room_size < 3 || self.min_room_size > self.max_room_size {
            return Err(WarrenError::InvalidConfig(format!(
                "room size bounds {}..={} are invalid",
                self.min_room_size, self.max_room_size
            )));
        }
        if self.max_room_size + 2 >= self.width.min(self.height) {
            return Err(WarrenError::InvalidConfig(
                "max room size does not fit inside the level".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_LEVEL_WIDTH,
            crate::config::DEFAULT_LEVEL_HEIGHT,
            Theme::Forest,
            42,
        )
    }
}

/// Level themes; each carries a decoration palette and a default strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Forest,
    Cave,
    Mountain,
    Dungeon,
}

impl Theme {
    /// The generation strategy a theme uses unless overridden.
    pub fn default_mode(self) -> GenerationMode {
        match self {
            Theme::Dungeon => GenerationMode::RoomCorridor,
            _ => GenerationMode::HeightField,
        }
    }

    /// Decoration kinds that fit this theme.
    pub fn decoration_palette(self) -> &'static [DecorationKind] {
        match self {
            Theme::Forest => &[DecorationKind::Flower, DecorationKind::Grass],
            Theme::Cave => &[DecorationKind::Mushroom, DecorationKind::Crystal],
            Theme::Mountain => &[DecorationKind::Grass, DecorationKind::Crystal],
            Theme::Dungeon => &[DecorationKind::Torch],
        }
    }
}

/// The two supported generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Rejection-sampled rooms connected by L-shaped corridors
    RoomCorridor,
    /// Column-walk terrain with caves, platforms, and secrets
    HeightField,
}

/// A rectangular room accepted by the dungeon generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Room {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center cell of the room.
    pub fn center(&self) -> Cell {
        Cell::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Whether this room, padded by a 1-cell margin, overlaps another room.
    ///
    /// The margin keeps accepted rooms from sharing walls, which is what
    /// makes corridor carving unambiguous.
    pub fn padded_overlaps(&self, other: &Room) -> bool {
        self.x < other.x + other.width as i32 + 1
            && self.x + self.width as i32 + 1 > other.x
            && self.y < other.y + other.height as i32 + 1
            && self.y + self.height as i32 + 1 > other.y
    }

    /// Whether the cell lies inside the room.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= self.x
            && cell.y >= self.y
            && cell.x < self.x + self.width as i32
            && cell.y < self.y + self.height as i32
    }
}

/// Item type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Gem(GemColor),
    HealthPotion,
    EnergyPotion,
    PowerUp(PowerUpKind),
}

/// Gem color variants; cosmetic, but higher colors carry higher values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GemColor {
    Blue,
    Red,
    Green,
}

/// Timed stat boosts granted by power-up pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Speed,
    Jump,
    Dash,
}

/// A collectible placed in the level.
///
/// Items are flagged collected, never removed; a collected item yields its
/// effect at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub cell: Cell,
    pub value: u32,
    pub collected: bool,
}

impl Item {
    pub fn new(kind: ItemKind, cell: Cell, value: u32) -> Self {
        Self {
            kind,
            cell,
            value,
            collected: false,
        }
    }
}

/// Enemy type tags produced by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Orc,
    Skeleton,
    Goblin,
    Bat,
    Spider,
    Slime,
}

impl EnemyKind {
    /// All spawnable kinds, in spawn-roll order.
    pub fn all() -> &'static [EnemyKind] {
        &[
            EnemyKind::Orc,
            EnemyKind::Skeleton,
            EnemyKind::Goblin,
            EnemyKind::Bat,
            EnemyKind::Spider,
            EnemyKind::Slime,
        ]
    }
}

/// A spawn point produced once by generation and consumed once by game
/// setup to instantiate an enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub cell: Cell,
    pub kind: EnemyKind,
}

/// Decoration type tags; purely visual, consumed by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    Flower,
    Grass,
    Mushroom,
    Crystal,
    Torch,
}

/// A decorative placement sitting on top of a surface tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoration {
    pub kind: DecorationKind,
    pub cell: Cell,
}

/// A respawn checkpoint, evenly spaced along the level width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub cell: Cell,
    pub activated: bool,
}

/// A fully generated level: the tile grid plus placement tables.
///
/// Owned by the play session; the grid is immutable after generation, items
/// transition `collected: false -> true` exactly once each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub grid: TileGrid,
    pub theme: Theme,
    pub player_spawn: Cell,
    pub items: Vec<Item>,
    pub enemy_spawns: Vec<EnemySpawn>,
    pub decorations: Vec<Decoration>,
    pub checkpoints: Vec<Checkpoint>,
    /// Rooms accepted by the dungeon strategy; empty in height-field mode
    pub rooms: Vec<Room>,
}

impl Level {
    /// Generates a level from the configuration, dispatching on its mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use warren::{GenerationConfig, Level};
    ///
    /// let config = GenerationConfig::for_testing(7);
    /// let level = Level::generate(&config).unwrap();
    /// assert!(level.grid.count(warren::TileKind::Empty) > 0);
    /// ```
    pub fn generate(config: &GenerationConfig) -> WarrenResult<Level> {
        let mut rng = utils::create_rng(config);
        generator_for(config.mode).generate(config, &mut rng)
    }

    /// Level width in world units.
    pub fn world_width(&self) -> f32 {
        self.grid.width() as f32 * crate::config::TILE_SIZE
    }

    /// Level height in world units.
    pub fn world_height(&self) -> f32 {
        self.grid.height() as f32 * crate::config::TILE_SIZE
    }

    /// First solid row in the column, scanning top to bottom. Columns with
    /// no solid tile report the bottom row.
    pub fn find_ground_level(&self, col: i32) -> i32 {
        for y in 0..self.grid.height() as i32 {
            if self.grid.is_solid(Cell::new(col, y)) {
                return y;
            }
        }
        self.grid.height() as i32 - 1
    }

    /// Whether an uncollected item occupies the cell.
    pub fn has_item_at(&self, cell: Cell) -> bool {
        self.items
            .iter()
            .any(|item| item.cell == cell && !item.collected)
    }

    /// Indices of uncollected items whose cell lies within a world-space
    /// bounding box.
    pub fn items_in_bounds(&self, bounds: Aabb) -> Vec<usize> {
        let lo = Cell::of_world(bounds.x, bounds.y);
        let hi = Cell::of_world(bounds.x + bounds.w, bounds.y + bounds.h);

        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                !item.collected
                    && item.cell.x >= lo.x
                    && item.cell.x <= hi.x
                    && item.cell.y >= lo.y
                    && item.cell.y <= hi.y
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Collects an item by index. Returns its kind and value on the first
    /// call, `None` once collected — the effect is applied at most once.
    pub fn collect_item(&mut self, index: usize) -> Option<(ItemKind, u32)> {
        let item = self.items.get_mut(index)?;
        if item.collected {
            return None;
        }
        item.collected = true;
        Some((item.kind, item.value))
    }
}

/// Trait implemented by both generation strategies.
pub trait LevelGenerator {
    /// Generates a level using the provided configuration and RNG.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<Level>;

    /// Validates that generated content meets the strategy's requirements.
    fn validate(&self, level: &Level, config: &GenerationConfig) -> WarrenResult<()>;

    /// Strategy name for logging and debugging.
    fn generator_kind(&self) -> &'static str;
}

/// Returns the generator implementing the given strategy.
pub fn generator_for(mode: GenerationMode) -> Box<dyn LevelGenerator> {
    match mode {
        GenerationMode::RoomCorridor => Box::new(RoomCorridorGenerator::new()),
        GenerationMode::HeightField => Box::new(HeightFieldGenerator::new()),
    }
}

/// Utility functions shared by the generation strategies.
pub mod utils {
    use super::*;
    use rand::SeedableRng;

    /// Creates the seeded RNG all generation draws from.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Flood-fills non-solid cells reachable from `start` via cardinal
    /// moves. Used by connectivity validation and tests.
    pub fn reachable_cells(grid: &TileGrid, start: Cell) -> HashSet<Cell> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        if !grid.is_solid(start) {
            visited.insert(start);
            queue.push_back(start);
        }

        while let Some(cell) = queue.pop_front() {
            for next in cell.cardinal_neighbors() {
                if grid.in_bounds(next) && !grid.is_solid(next) && visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// Converts solid cells with open air directly above into surface
    /// tiles, so the top of every solid run reads as a wall front.
    pub fn dress_surfaces(grid: &mut TileGrid) {
        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 {
                let here = Cell::new(x, y);
                let above = Cell::new(x, y - 1);
                if grid.tile(here) == TileKind::Solid && grid.is_open(above) {
                    grid.set_tile(here, TileKind::Surface);
                }
            }
        }
    }

    /// Checks that a level has open space and a legal player spawn.
    pub fn validate_level(level: &Level) -> WarrenResult<()> {
        if level.grid.count(TileKind::Empty) == 0 {
            return Err(WarrenError::GenerationFailed(
                "level has no open cells".to_string(),
            ));
        }
        if level.grid.is_solid(level.player_spawn) {
            return Err(WarrenError::GenerationFailed(format!(
                "player spawn {:?} is inside solid tiles",
                level.player_spawn
            )));
        }
        Ok(())
    }
}
