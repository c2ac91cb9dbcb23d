//! # Dungeon Generation
//!
//! Room-and-corridor generation for the dungeon theme.
//!
//! Rooms are rejection-sampled: a candidate rectangle is accepted only if,
//! padded by a 1-cell margin, it overlaps no previously accepted room.
//! Consecutively accepted rooms are connected by L-shaped corridors. When
//! the room target cannot be met within the attempt budget the generator
//! accepts fewer rooms; it never fails for that reason.

use crate::generation::{
    placement, utils, GenerationConfig, Level, LevelGenerator, Room,
};
use crate::world::{Cell, TileGrid, TileKind};
use crate::{WarrenError, WarrenResult};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;

/// Room-and-corridor generator.
///
/// # Examples
///
/// ```
/// use warren::{GenerationConfig, LevelGenerator, RoomCorridorGenerator, Theme};
/// use warren::generation::utils;
///
/// let config = GenerationConfig::new(80, 40, Theme::Dungeon, 7);
/// let mut rng = utils::create_rng(&config);
/// let level = RoomCorridorGenerator::new().generate(&config, &mut rng).unwrap();
/// assert!(!level.rooms.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RoomCorridorGenerator {
    /// Attempt budget per room before that room is given up on
    pub max_room_attempts: u32,
}

impl RoomCorridorGenerator {
    pub fn new() -> Self {
        Self {
            max_room_attempts: 100,
        }
    }

    /// Rejection-samples rooms up to the configured target.
    fn place_rooms(
        &self,
        grid: &mut TileGrid,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> Vec<Room> {
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..config.target_rooms {
            if let Some(room) = self.try_place_room(grid, config, rng, &rooms) {
                self.carve_room(grid, &room);
                rooms.push(room);
            }
        }

        if rooms.len() < config.target_rooms as usize {
            debug!(
                "accepted {}/{} rooms before exhausting attempt budgets",
                rooms.len(),
                config.target_rooms
            );
        }

        rooms
    }

    /// Attempts one room placement within the attempt budget.
    fn try_place_room(
        &self,
        grid: &TileGrid,
        config: &GenerationConfig,
        rng: &mut StdRng,
        existing: &[Room],
    ) -> Option<Room> {
        for _ in 0..self.max_room_attempts {
            let width = rng.gen_range(config.min_room_size..=config.max_room_size);
            let height = rng.gen_range(config.min_room_size..=config.max_room_size);
            let x = rng.gen_range(1..(grid.width() as i32 - width as i32 - 1));
            let y = rng.gen_range(1..(grid.height() as i32 - height as i32 - 1));
            let room = Room::new(x, y, width, height);

            if !existing.iter().any(|other| room.padded_overlaps(other)) {
                return Some(room);
            }
        }
        None
    }

    fn carve_room(&self, grid: &mut TileGrid, room: &Room) {
        grid.carve_rect(room.x, room.y, room.width, room.height);
    }

    /// Connects each room to the next accepted one with an L-shaped
    /// corridor.
    ///
    /// Corridors run between consecutively accepted rooms only; no spanning
    /// structure is built. Every accepted room is chained to its
    /// acceptance-order neighbor, which keeps the carved floor connected.
    fn connect_rooms(&self, grid: &mut TileGrid, rooms: &[Room]) {
        for pair in rooms.windows(2) {
            let a = pair[0].center();
            let b = pair[1].center();
            self.carve_l_corridor(grid, a, b);
        }
    }

    /// Carves a horizontal run at `a.y`, then a vertical run at `b.x`.
    fn carve_l_corridor(&self, grid: &mut TileGrid, a: Cell, b: Cell) {
        for x in a.x.min(b.x)..=a.x.max(b.x) {
            grid.set_tile(Cell::new(x, a.y), TileKind::Empty);
        }
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            grid.set_tile(Cell::new(b.x, y), TileKind::Empty);
        }
    }
}

impl LevelGenerator for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> WarrenResult<Level> {
        config.validate()?;

        let mut grid = TileGrid::new(config.width, config.height, TileKind::Solid);
        let mut rooms = self.place_rooms(&mut grid, config, rng);

        if rooms.is_empty() {
            // Degenerate budget exhaustion: fall back to one central room
            // rather than failing.
            warn!("no rooms accepted; carving fallback room");
            let room = Room::new(
                config.width as i32 / 2 - config.min_room_size as i32 / 2,
                config.height as i32 / 2 - config.min_room_size as i32 / 2,
                config.min_room_size,
                config.min_room_size,
            );
            self.carve_room(&mut grid, &room);
            rooms.push(room);
        }

        self.connect_rooms(&mut grid, &rooms);
        utils::dress_surfaces(&mut grid);

        let player_spawn = rooms[0].center();
        let mut level = Level {
            grid,
            theme: config.theme,
            player_spawn,
            items: Vec::new(),
            enemy_spawns: Vec::new(),
            decorations: Vec::new(),
            checkpoints: Vec::new(),
            rooms,
        };

        placement::place_items(&mut level, config, rng);
        placement::place_enemy_spawns(&mut level, config, rng);
        placement::place_decorations(&mut level, config, rng);

        self.validate(&level, config)?;
        debug!(
            "generated dungeon: {} rooms, {} items, {} spawns",
            level.rooms.len(),
            level.items.len(),
            level.enemy_spawns.len()
        );

        Ok(level)
    }

    fn validate(&self, level: &Level, _config: &GenerationConfig) -> WarrenResult<()> {
        utils::validate_level(level)?;

        let Some(first) = level.rooms.first() else {
            return Err(WarrenError::GenerationFailed(
                "dungeon level carries no rooms".to_string(),
            ));
        };

        // Every accepted room must be reachable from the first via carved
        // floor; the consecutive-corridor chain guarantees this.
        let reached = utils::reachable_cells(&level.grid, first.center());
        for room in &level.rooms {
            if !reached.contains(&room.center()) {
                return Err(WarrenError::GenerationFailed(format!(
                    "room at ({}, {}) is not connected",
                    room.x, room.y
                )));
            }
        }
        Ok(())
    }

    fn generator_kind(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

impl Default for RoomCorridorGenerator {
    fn default() -> Self {
        Self::new()
    }
}
