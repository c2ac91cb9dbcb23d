//! Generation invariants, checked across seeds and both strategies.

use proptest::prelude::*;
use warren::generation::utils;
use warren::{
    Cell, GenerationConfig, HeightFieldGenerator, Level, LevelGenerator, RoomCorridorGenerator,
    Solidity, Theme, TileKind,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dungeon_level(seed: u64) -> Level {
    let config = GenerationConfig::new(64, 32, Theme::Dungeon, seed);
    let mut rng = utils::create_rng(&config);
    RoomCorridorGenerator::new()
        .generate(&config, &mut rng)
        .unwrap()
}

fn terrain_level(seed: u64) -> Level {
    Level::generate(&GenerationConfig::for_testing(seed)).unwrap()
}

fn assert_out_of_bounds_solid(level: &Level) {
    let w = level.grid.width() as i32;
    let h = level.grid.height() as i32;
    for probe in [
        Cell::new(-1, 0),
        Cell::new(0, -1),
        Cell::new(w, 0),
        Cell::new(0, h),
        Cell::new(-10, -10),
        Cell::new(w + 100, h + 100),
    ] {
        assert!(level.grid.is_solid(probe), "{probe:?} must report solid");
    }
}

fn assert_placements_legal(level: &Level) {
    let mut occupied = std::collections::HashSet::new();
    for item in &level.items {
        assert!(
            level.grid.is_open(item.cell),
            "item {:?} placed on a solid cell",
            item.cell
        );
        assert!(occupied.insert(item.cell), "two items share {:?}", item.cell);
    }
    for spawn in &level.enemy_spawns {
        assert!(level.grid.is_open(spawn.cell));
        assert!(
            level
                .grid
                .is_blocking(Cell::new(spawn.cell.x, spawn.cell.y + 1), Solidity::All),
            "enemy spawn {:?} has no ground beneath it",
            spawn.cell
        );
    }
}

#[test]
fn out_of_bounds_queries_are_solid_for_both_strategies() {
    for seed in 0..5 {
        assert_out_of_bounds_solid(&dungeon_level(seed));
        assert_out_of_bounds_solid(&terrain_level(seed));
    }
}

#[test]
fn dungeon_rooms_are_padded_disjoint() {
    for seed in 0..10 {
        let level = dungeon_level(seed);
        for (i, a) in level.rooms.iter().enumerate() {
            for b in level.rooms.iter().skip(i + 1) {
                assert!(
                    !a.padded_overlaps(b),
                    "seed {seed}: rooms {a:?} and {b:?} violate the margin"
                );
            }
        }
    }
}

#[test]
fn dungeon_rooms_are_mutually_reachable() {
    for seed in 0..10 {
        let level = dungeon_level(seed);
        let reached = utils::reachable_cells(&level.grid, level.rooms[0].center());
        for room in &level.rooms {
            assert!(
                reached.contains(&room.center()),
                "seed {seed}: room {room:?} unreachable from the first room"
            );
        }
    }
}

#[test]
fn terrain_columns_top_out_in_a_single_surface_tile() {
    for seed in 0..10 {
        let level = terrain_level(seed);
        for x in 0..level.grid.width() as i32 {
            let top = level.find_ground_level(x);
            assert_eq!(
                level.grid.tile(Cell::new(x, top)),
                TileKind::Surface,
                "seed {seed}: column {x} tops out in a non-surface tile"
            );
            assert_ne!(
                level.grid.tile(Cell::new(x, top + 1)),
                TileKind::Surface,
                "seed {seed}: column {x} has a doubled surface run"
            );
        }
    }
}

#[test]
fn solid_cells_never_sit_under_open_air() {
    // The surface-dressing invariant: anything with air directly above
    // reads as a surface tile, in both strategies (cave floors included).
    for seed in 0..5 {
        for level in [dungeon_level(seed), terrain_level(seed)] {
            for x in 0..level.grid.width() as i32 {
                for y in 0..level.grid.height() as i32 {
                    let here = Cell::new(x, y);
                    if level.grid.tile(here) == TileKind::Solid {
                        assert_ne!(
                            level.grid.tile(Cell::new(x, y - 1)),
                            TileKind::Empty,
                            "seed {seed}: bare solid under air at {here:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn placements_are_legal_for_both_strategies() {
    for seed in 0..10 {
        assert_placements_legal(&dungeon_level(seed));
        assert_placements_legal(&terrain_level(seed));
    }
}

#[test]
fn player_spawn_is_always_open() {
    for seed in 0..10 {
        let dungeon = dungeon_level(seed);
        assert!(!dungeon.grid.is_solid(dungeon.player_spawn));

        let terrain = terrain_level(seed);
        assert!(!terrain.grid.is_solid(terrain.player_spawn));
    }
}

#[test]
fn generation_is_reproducible_per_seed() {
    let a = serde_json::to_string(&terrain_level(77)).unwrap();
    let b = serde_json::to_string(&terrain_level(77)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn oversubscribed_targets_degrade_instead_of_failing() {
    init_logs();
    let mut config = GenerationConfig::new(64, 32, Theme::Dungeon, 9);
    config.target_rooms = 1000;
    config.coin_count = 5000;
    config.enemy_count = 2000;

    let mut rng = utils::create_rng(&config);
    let level = RoomCorridorGenerator::new()
        .generate(&config, &mut rng)
        .unwrap();

    assert!(level.rooms.len() < 1000);
    assert!(level.items.len() < 5000);
    assert_placements_legal(&level);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn terrain_invariants_hold_for_arbitrary_seeds(seed in any::<u64>()) {
        let config = GenerationConfig::for_testing(seed);
        let mut rng = utils::create_rng(&config);
        let level = HeightFieldGenerator::new().generate(&config, &mut rng).unwrap();

        assert_out_of_bounds_solid(&level);
        assert_placements_legal(&level);
        prop_assert!(!level.grid.is_solid(level.player_spawn));
    }

    #[test]
    fn dungeon_invariants_hold_for_arbitrary_seeds(seed in any::<u64>()) {
        let level = dungeon_level(seed);

        assert_out_of_bounds_solid(&level);
        assert_placements_legal(&level);
        let reached = utils::reachable_cells(&level.grid, level.rooms[0].center());
        for room in &level.rooms {
            prop_assert!(reached.contains(&room.center()));
        }
    }
}
