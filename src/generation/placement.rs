//! # Placement
//!
//! Rejection-sampled placement of items, enemy spawns, and decorations,
//! shared by both generation strategies.
//!
//! Every placement draws random candidate cells until one satisfies its
//! constraint or the attempt budget runs out. An exhausted budget skips
//! that placement — the level simply holds fewer of that thing. This is a
//! policy, not a failure mode: it guarantees generation terminates on any
//! layout the carving stages produce.

use crate::generation::{
    Decoration, EnemyKind, EnemySpawn, GemColor, GenerationConfig, Item, ItemKind, Level,
    PowerUpKind,
};
use crate::world::{Cell, Solidity, TileKind};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

/// Samples cells until `accept` passes or the budget is exhausted.
fn sample_cell<F>(
    level: &Level,
    rng: &mut StdRng,
    attempts: u32,
    mut accept: F,
) -> Option<Cell>
where
    F: FnMut(&Level, Cell) -> bool,
{
    let width = level.grid.width() as i32;
    let height = level.grid.height() as i32;

    for _ in 0..attempts {
        let cell = Cell::new(rng.gen_range(0..width), rng.gen_range(0..height));
        if accept(level, cell) {
            return Some(cell);
        }
    }
    None
}

fn open_and_vacant(level: &Level, cell: Cell) -> bool {
    level.grid.is_open(cell) && !level.has_item_at(cell)
}

fn stands_on_ground(level: &Level, cell: Cell) -> bool {
    level.grid.is_open(cell)
        && level
            .grid
            .is_blocking(Cell::new(cell.x, cell.y + 1), Solidity::All)
}

/// Places coins, gems, potions, and power-ups on open cells.
///
/// No two items share a cell; a placement that cannot find a legal cell
/// within the budget is skipped.
pub fn place_items(level: &mut Level, config: &GenerationConfig, rng: &mut StdRng) {
    let budget = config.max_placement_attempts;
    let mut skipped = 0u32;

    for _ in 0..config.coin_count {
        match sample_cell(level, rng, budget, open_and_vacant) {
            Some(cell) => level.items.push(Item::new(ItemKind::Coin, cell, 10)),
            None => skipped += 1,
        }
    }

    for _ in 0..config.gem_count {
        let (color, value) = match rng.gen_range(0..3) {
            0 => (GemColor::Blue, 50),
            1 => (GemColor::Red, 75),
            _ => (GemColor::Green, 100),
        };
        match sample_cell(level, rng, budget, open_and_vacant) {
            Some(cell) => level.items.push(Item::new(ItemKind::Gem(color), cell, value)),
            None => skipped += 1,
        }
    }

    for i in 0..config.potion_count {
        let kind = if i % 2 == 0 {
            ItemKind::HealthPotion
        } else {
            ItemKind::EnergyPotion
        };
        match sample_cell(level, rng, budget, open_and_vacant) {
            Some(cell) => level.items.push(Item::new(kind, cell, 0)),
            None => skipped += 1,
        }
    }

    for _ in 0..config.powerup_count {
        let kind = match rng.gen_range(0..3) {
            0 => PowerUpKind::Speed,
            1 => PowerUpKind::Jump,
            _ => PowerUpKind::Dash,
        };
        match sample_cell(level, rng, budget, open_and_vacant) {
            Some(cell) => level.items.push(Item::new(ItemKind::PowerUp(kind), cell, 0)),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("item placement skipped {skipped} placements after budget exhaustion");
    }
}

/// Places enemy spawn points on open cells with ground support directly
/// beneath, so every spawned enemy starts standing.
pub fn place_enemy_spawns(level: &mut Level, config: &GenerationConfig, rng: &mut StdRng) {
    let kinds = EnemyKind::all();
    let mut skipped = 0u32;

    for _ in 0..config.enemy_count {
        match sample_cell(level, rng, config.max_placement_attempts, stands_on_ground) {
            Some(cell) => {
                let kind = kinds[rng.gen_range(0..kinds.len())];
                level.enemy_spawns.push(EnemySpawn { cell, kind });
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("enemy placement skipped {skipped} spawns after budget exhaustion");
    }
}

/// Scatters theme decorations on cells sitting directly on surface tiles.
pub fn place_decorations(level: &mut Level, config: &GenerationConfig, rng: &mut StdRng) {
    let palette = level.theme.decoration_palette();

    for x in 0..level.grid.width() as i32 {
        for y in 1..level.grid.height() as i32 {
            let here = Cell::new(x, y);
            let above = Cell::new(x, y - 1);
            if level.grid.tile(here) == TileKind::Surface
                && level.grid.is_open(above)
                && rng.gen_bool(config.decoration_chance)
            {
                let kind = palette[rng.gen_range(0..palette.len())];
                level.decorations.push(Decoration { kind, cell: above });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils;
    use crate::generation::Theme;
    use crate::world::TileGrid;

    fn flat_level() -> Level {
        let mut grid = TileGrid::new(20, 12, TileKind::Empty);
        grid.fill_rect(0, 8, 20, 1, TileKind::Surface);
        grid.fill_rect(0, 9, 20, 3, TileKind::Solid);
        Level {
            grid,
            theme: Theme::Forest,
            player_spawn: Cell::new(1, 7),
            items: Vec::new(),
            enemy_spawns: Vec::new(),
            decorations: Vec::new(),
            checkpoints: Vec::new(),
            rooms: Vec::new(),
        }
    }

    #[test]
    fn test_items_never_on_solid_or_shared_cells() {
        let config = GenerationConfig::for_testing(11);
        let mut rng = utils::create_rng(&config);
        let mut level = flat_level();

        place_items(&mut level, &config, &mut rng);

        assert!(!level.items.is_empty());
        let mut seen = std::collections::HashSet::new();
        for item in &level.items {
            assert!(level.grid.is_open(item.cell), "item on solid cell");
            assert!(seen.insert(item.cell), "two items share a cell");
        }
    }

    #[test]
    fn test_enemy_spawns_stand_on_ground() {
        let config = GenerationConfig::for_testing(12);
        let mut rng = utils::create_rng(&config);
        let mut level = flat_level();

        place_enemy_spawns(&mut level, &config, &mut rng);

        assert!(!level.enemy_spawns.is_empty());
        for spawn in &level.enemy_spawns {
            assert!(level.grid.is_open(spawn.cell));
            assert!(level
                .grid
                .is_blocking(Cell::new(spawn.cell.x, spawn.cell.y + 1), Solidity::All));
        }
    }

    #[test]
    fn test_exhausted_budget_skips_silently() {
        let config = GenerationConfig::for_testing(13);
        let mut rng = utils::create_rng(&config);
        let mut level = flat_level();
        // No open cells at all: every placement must be skipped, not panic
        level.grid = TileGrid::new(20, 12, TileKind::Solid);

        place_items(&mut level, &config, &mut rng);
        place_enemy_spawns(&mut level, &config, &mut rng);

        assert!(level.items.is_empty());
        assert!(level.enemy_spawns.is_empty());
    }

    #[test]
    fn test_decorations_sit_above_surface() {
        let mut config = GenerationConfig::for_testing(14);
        config.decoration_chance = 1.0;
        let mut rng = utils::create_rng(&config);
        let mut level = flat_level();

        place_decorations(&mut level, &config, &mut rng);

        assert!(!level.decorations.is_empty());
        for deco in &level.decorations {
            let below = Cell::new(deco.cell.x, deco.cell.y + 1);
            assert_eq!(level.grid.tile(below), TileKind::Surface);
            assert!(level.grid.is_open(deco.cell));
        }
    }
}
