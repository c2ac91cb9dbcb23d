//! # Physics
//!
//! Axis-separated swept collision against the tile grid, shared by the
//! player and every enemy.
//!
//! Horizontal and vertical motion resolve independently: the horizontal
//! candidate is tested at the current Y, then the vertical candidate at the
//! (possibly updated) X. Rejecting one axis never cancels the other, which
//! gives deterministic slide-along-wall behavior and avoids the corner
//! catching of combined-vector resolution. Large per-tick displacements are
//! substepped to at most half a tile so fast bodies cannot tunnel through a
//! one-cell floor.

use crate::config::TILE_SIZE;
use crate::sim::EntityState;
use crate::world::{Cell, Solidity, TileGrid, TileKind};
use serde::{Deserialize, Serialize};

/// Per-entity integration constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhysicsProfile {
    /// Downward acceleration in world units per second squared
    pub gravity: f32,
    /// Multiplicative horizontal decay applied on undriven ticks
    pub friction: f32,
    /// Terminal downward speed in world units per second
    pub max_fall_speed: f32,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            gravity: 800.0,
            friction: 0.85,
            max_fall_speed: 600.0,
        }
    }
}

/// Largest displacement a single substep may cover on either axis.
const MAX_SUBSTEP: f32 = TILE_SIZE / 2.0;

/// Steps one entity through one tick of `dt_ms` milliseconds.
///
/// `driven` reports whether a controller set the horizontal velocity this
/// tick; friction only applies to undriven motion. The entity's
/// `on_ground` flag is recomputed from scratch — consumers needing
/// persistence across airborne ticks use an explicit timer, not this flag.
///
/// The entity is assumed to start in a legal position; spawn placement
/// guarantees that, and this function does not correct overlap.
pub fn step(
    body: &mut EntityState,
    profile: &PhysicsProfile,
    grid: &TileGrid,
    dt_ms: f32,
    driven: bool,
) {
    let dt = dt_ms / 1000.0;

    body.vy += profile.gravity * dt;
    body.vy = body.vy.min(profile.max_fall_speed);

    if !driven {
        body.vx *= profile.friction;
    }

    let total_dx = body.vx * dt;
    let total_dy = body.vy * dt;
    let steps = (total_dx.abs().max(total_dy.abs()) / MAX_SUBSTEP)
        .ceil()
        .max(1.0) as u32;
    let mut dx = total_dx / steps as f32;
    let mut dy = total_dy / steps as f32;

    body.on_ground = false;

    for _ in 0..steps {
        // Horizontal pass at the current Y
        if dx != 0.0 {
            let nx = body.x + dx;
            if box_clear(grid, nx, body.y, body.width, body.height, Solidity::IgnorePlatforms) {
                body.x = nx;
            } else {
                body.vx = 0.0;
                dx = 0.0;
            }
        }

        // Vertical pass at the updated X
        if dy > 0.0 {
            let old_bottom = body.y + body.height;
            let ny = body.y + dy;
            match fall_obstruction(grid, body.x, ny, body.width, body.height, old_bottom) {
                None => body.y = ny,
                Some(row) => {
                    // Snap the bottom edge onto the blocking tile's top
                    body.y = row as f32 * TILE_SIZE - body.height;
                    body.vy = 0.0;
                    body.on_ground = true;
                    dy = 0.0;
                }
            }
        } else if dy < 0.0 {
            let ny = body.y + dy;
            if box_clear(grid, body.x, ny, body.width, body.height, Solidity::IgnorePlatforms) {
                body.y = ny;
            } else {
                // Snap the top edge under the blocking tile
                body.y = (ny / TILE_SIZE).floor() * TILE_SIZE + TILE_SIZE;
                body.vy = 0.0;
                dy = 0.0;
            }
        }
    }
}

/// Tests the four tile corners covered by a bounding box at the candidate
/// position.
fn box_clear(grid: &TileGrid, x: f32, y: f32, w: f32, h: f32, mode: Solidity) -> bool {
    let lo = Cell::of_world(x, y);
    let hi = Cell::of_world(x + w - 1.0, y + h - 1.0);

    !(grid.is_blocking(Cell::new(lo.x, lo.y), mode)
        || grid.is_blocking(Cell::new(hi.x, lo.y), mode)
        || grid.is_blocking(Cell::new(lo.x, hi.y), mode)
        || grid.is_blocking(Cell::new(hi.x, hi.y), mode))
}

/// Downward obstruction test. Returns the row whose top the body must snap
/// onto, or `None` if the candidate position is clear.
///
/// The box interior (sampled with the exclusive `h - 1` convention, so a
/// resting body does not occupy the row it stands on) blocks on solids
/// only. The leading bottom edge additionally tests the row it penetrates:
/// solids always block there, one-way platforms block only when the body
/// was entirely above the platform top before the substep. A bottom edge
/// sitting exactly on a row boundary is resting, not penetrating.
fn fall_obstruction(grid: &TileGrid, x: f32, ny: f32, w: f32, h: f32, old_bottom: f32) -> Option<i32> {
    let new_bottom = ny + h;
    let edge_row = (new_bottom / TILE_SIZE).floor() as i32;
    let edge_top = edge_row as f32 * TILE_SIZE;

    if !box_clear(grid, x, ny, w, h, Solidity::IgnorePlatforms) {
        return Some(edge_row);
    }
    if new_bottom <= edge_top {
        return None;
    }

    let lo_col = Cell::of_world(x, ny).x;
    let hi_col = Cell::of_world(x + w - 1.0, ny).x;
    for col in lo_col..=hi_col {
        let blocked = match grid.tile(Cell::new(col, edge_row)) {
            TileKind::Surface | TileKind::Solid => true,
            TileKind::Platform => old_bottom <= edge_top,
            TileKind::Empty => false,
        };
        if blocked {
            return Some(edge_row);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::TileKind;

    const DT: f32 = 16.0;

    fn floor_grid() -> TileGrid {
        let mut grid = TileGrid::new(20, 15, TileKind::Empty);
        grid.fill_rect(0, 10, 20, 1, TileKind::Surface);
        grid.fill_rect(0, 11, 20, 4, TileKind::Solid);
        grid
    }

    fn body_at(x: f32, y: f32) -> EntityState {
        EntityState::new(x, y, 16.0, 16.0, 100)
    }

    #[test]
    fn test_dropped_body_settles_on_floor() {
        let grid = floor_grid();
        let profile = PhysicsProfile::default();
        let mut body = body_at(64.0, 16.0);

        for _ in 0..200 {
            step(&mut body, &profile, &grid, DT, false);
        }

        assert!(body.on_ground);
        assert_eq!(body.vy, 0.0);
        // Resting exactly on the floor row at y = 10 * 16
        assert_eq!(body.y + body.height, 160.0);
    }

    #[test]
    fn test_no_tunneling_through_one_cell_floor_at_terminal_velocity() {
        let mut grid = TileGrid::new(20, 40, TileKind::Empty);
        grid.fill_rect(0, 30, 20, 1, TileKind::Surface);
        let profile = PhysicsProfile::default();

        let mut body = body_at(64.0, 0.0);
        body.vy = profile.max_fall_speed;

        // Even at a frame time that covers several tiles per tick
        for _ in 0..100 {
            step(&mut body, &profile, &grid, 50.0, false);
        }

        assert!(body.on_ground);
        assert_eq!(body.y + body.height, 480.0);
    }

    #[test]
    fn test_wall_blocks_horizontal_and_preserves_vertical() {
        let mut grid = floor_grid();
        for y in 0..10 {
            grid.set_tile(Cell::new(8, y), TileKind::Solid);
        }
        let profile = PhysicsProfile::default();

        let mut body = body_at(96.0, 16.0); // two cells left of the wall
        body.vx = 400.0;

        for _ in 0..100 {
            step(&mut body, &profile, &grid, DT, true);
        }

        // Slid down the wall face to the floor without passing through
        assert_eq!(body.vx, 0.0);
        assert!(body.x + body.width <= 128.0);
        assert!(body.on_ground);
    }

    #[test]
    fn test_rising_body_bonks_on_ceiling() {
        let mut grid = floor_grid();
        grid.fill_rect(0, 4, 20, 1, TileKind::Solid);
        let profile = PhysicsProfile::default();

        let mut body = body_at(64.0, 112.0);
        body.vy = -500.0;

        step(&mut body, &profile, &grid, DT, false);
        let after_first = body.vy;
        for _ in 0..20 {
            step(&mut body, &profile, &grid, DT, false);
        }

        assert!(after_first < 0.0);
        // Never entered the ceiling row
        assert!(body.y >= 80.0);
    }

    #[test]
    fn test_platform_blocks_falling_but_not_rising() {
        let mut grid = TileGrid::new(20, 20, TileKind::Empty);
        grid.fill_rect(0, 18, 20, 2, TileKind::Solid);
        grid.fill_rect(2, 10, 6, 1, TileKind::Platform);
        let profile = PhysicsProfile::default();

        // Rising through the platform from below
        let mut body = body_at(48.0, 200.0);
        body.vy = -600.0;
        step(&mut body, &profile, &grid, DT, false);
        assert!(body.y < 200.0, "platform blocked upward motion");

        // Falling onto it from above
        let mut body = body_at(48.0, 100.0);
        for _ in 0..200 {
            step(&mut body, &profile, &grid, DT, false);
        }
        assert!(body.on_ground);
        assert_eq!(body.y + body.height, 160.0); // resting on the platform row
    }

    #[test]
    fn test_friction_only_applies_undriven() {
        let grid = floor_grid();
        let profile = PhysicsProfile::default();

        let mut driven = body_at(32.0, 144.0);
        driven.vx = 100.0;
        step(&mut driven, &profile, &grid, DT, true);
        assert_eq!(driven.vx, 100.0);

        let mut coasting = body_at(32.0, 144.0);
        coasting.vx = 100.0;
        step(&mut coasting, &profile, &grid, DT, false);
        assert!(coasting.vx < 100.0);
    }

    #[test]
    fn test_on_ground_is_recomputed_every_tick() {
        let grid = floor_grid();
        let profile = PhysicsProfile::default();
        let mut body = body_at(64.0, 144.0);

        step(&mut body, &profile, &grid, DT, false);
        assert!(body.on_ground);

        body.vy = -300.0; // launched
        step(&mut body, &profile, &grid, DT, false);
        assert!(!body.on_ground);
    }
}
