//! # Player Controller
//!
//! Consumes per-tick input intents and drives the shared physics state:
//! movement, jumping with coyote time and jump buffering, dashing on an
//! energy budget, wall-slide/wall-jump, power-up timers, and item pickup.
//!
//! All grace windows are countdown timers clamped at zero. The ground flag
//! itself is never sticky — coyote time is the only thing that carries
//! "was grounded" across ticks, which is what makes jumps off ledge edges
//! feel fair without making airborne jumps possible.

use crate::config::{DEFAULT_PLAYER_HEALTH, TILE_SIZE};
use crate::generation::{ItemKind, Level, PowerUpKind};
use crate::sim::{physics, AnimationState, EntityState, GameEvent, InputSnapshot, PhysicsProfile};
use crate::world::{Cell, TileGrid};
use serde::{Deserialize, Serialize};

/// Health restored by a health potion.
const POTION_HEAL: u32 = 25;

/// Movement and resource constants for the player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerTunables {
    /// Base horizontal speed, world units per second
    pub speed: f32,
    /// Upward velocity imparted by a grounded jump
    pub jump_power: f32,
    /// Forced horizontal velocity during a dash
    pub dash_power: f32,
    /// Velocity imparted by a wall jump (up, and 0.8x away from the wall)
    pub wall_jump_power: f32,
    /// Fall-speed cap while wall-sliding
    pub wall_slide_speed: f32,
    pub max_energy: f32,
    /// Energy consumed by one dash
    pub dash_cost: f32,
    /// Movement-override window of a dash
    pub dash_duration_ms: f32,
    /// Re-trigger lockout after a dash
    pub dash_cooldown_ms: f32,
    /// Grace window after leaving the ground
    pub max_coyote_ms: f32,
    /// Grace window remembering an early jump press
    pub max_jump_buffer_ms: f32,
    /// Passive energy regeneration per millisecond
    pub energy_regen_per_ms: f32,
    /// Lifetime of a collected power-up
    pub powerup_duration_ms: f32,
    pub speed_boost_factor: f32,
    pub jump_boost_factor: f32,
    pub dash_boost_factor: f32,
}

impl Default for PlayerTunables {
    fn default() -> Self {
        Self {
            speed: 150.0,
            jump_power: 300.0,
            dash_power: 400.0,
            wall_jump_power: 250.0,
            wall_slide_speed: 50.0,
            max_energy: 100.0,
            dash_cost: 25.0,
            dash_duration_ms: 200.0,
            dash_cooldown_ms: 800.0,
            max_coyote_ms: 100.0,
            max_jump_buffer_ms: 100.0,
            energy_regen_per_ms: 0.05,
            powerup_duration_ms: 10_000.0,
            speed_boost_factor: 1.5,
            jump_boost_factor: 1.3,
            dash_boost_factor: 1.25,
        }
    }
}

/// Read-only per-frame view for the renderer and UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub facing: i8,
    pub health: u32,
    pub max_health: u32,
    pub energy: f32,
    pub max_energy: f32,
    pub score: u32,
    pub coins: u32,
    pub gems: u32,
    pub animation: AnimationState,
}

/// The player's behavior module, operating on a shared [`EntityState`].
#[derive(Debug, Clone)]
pub struct PlayerController {
    body: EntityState,
    tunables: PlayerTunables,
    profile: PhysicsProfile,
    energy: f32,
    score: u32,
    coins: u32,
    gems: u32,
    coyote_ms: f32,
    jump_buffer_ms: f32,
    dash_duration_ms: f32,
    dash_cooldown_ms: f32,
    wall_sliding: bool,
    wall_direction: i8,
    speed_boost_ms: f32,
    jump_boost_ms: f32,
    dash_boost_ms: f32,
    animation: AnimationState,
}

impl PlayerController {
    /// Creates a player at a world position with default tunables.
    pub fn new(x: f32, y: f32) -> Self {
        let tunables = PlayerTunables::default();
        Self {
            body: EntityState::new(x, y, 16.0, 16.0, DEFAULT_PLAYER_HEALTH),
            tunables,
            profile: PhysicsProfile::default(),
            energy: tunables.max_energy,
            score: 0,
            coins: 0,
            gems: 0,
            coyote_ms: 0.0,
            jump_buffer_ms: 0.0,
            dash_duration_ms: 0.0,
            dash_cooldown_ms: 0.0,
            wall_sliding: false,
            wall_direction: 0,
            speed_boost_ms: 0.0,
            jump_boost_ms: 0.0,
            dash_boost_ms: 0.0,
            animation: AnimationState::Idle,
        }
    }

    /// Advances the player by one tick: timers, input, wall contact,
    /// physics, then item pickup. Returns the tick's events.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        level: &mut Level,
        dt_ms: f32,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();

        self.update_timers(dt_ms);
        self.handle_input(input);
        self.update_wall_slide(input, &level.grid);

        let driven = input.move_axis != 0 || self.dashing();
        let profile = PhysicsProfile {
            // Gravity is suppressed for the dash window to flatten the arc
            gravity: if self.dashing() { 0.0 } else { self.profile.gravity },
            ..self.profile
        };
        physics::step(&mut self.body, &profile, &level.grid, dt_ms, driven);

        self.collect_items(level, &mut events);
        self.update_animation(input);

        events
    }

    fn update_timers(&mut self, dt_ms: f32) {
        let t = &self.tunables;

        if self.body.on_ground {
            self.coyote_ms = t.max_coyote_ms;
        } else {
            self.coyote_ms = (self.coyote_ms - dt_ms).max(0.0);
        }

        self.jump_buffer_ms = (self.jump_buffer_ms - dt_ms).max(0.0);
        self.dash_duration_ms = (self.dash_duration_ms - dt_ms).max(0.0);
        self.dash_cooldown_ms = (self.dash_cooldown_ms - dt_ms).max(0.0);

        if self.energy < t.max_energy && self.dash_cooldown_ms <= 0.0 {
            self.energy = (self.energy + dt_ms * t.energy_regen_per_ms).min(t.max_energy);
        }

        self.speed_boost_ms = (self.speed_boost_ms - dt_ms).max(0.0);
        self.jump_boost_ms = (self.jump_boost_ms - dt_ms).max(0.0);
        self.dash_boost_ms = (self.dash_boost_ms - dt_ms).max(0.0);
    }

    fn handle_input(&mut self, input: &InputSnapshot) {
        if input.move_axis != 0 {
            self.body.facing = input.move_axis.signum();
        }

        if self.dashing() {
            self.body.vx = self.body.facing as f32 * self.dash_power();
        } else if input.move_axis != 0 && !self.wall_sliding {
            self.body.vx = input.move_axis as f32 * self.speed();
        }

        if input.jump_pressed {
            self.jump_buffer_ms = self.tunables.max_jump_buffer_ms;
        }

        // A buffered jump fires as soon as a jump becomes legal, decoupling
        // input-edge timing from physics-step timing
        if self.jump_buffer_ms > 0.0 && (self.coyote_ms > 0.0 || self.wall_sliding) {
            self.execute_jump();
            self.jump_buffer_ms = 0.0;
        }

        if input.dash_pressed
            && self.dash_cooldown_ms <= 0.0
            && self.energy >= self.tunables.dash_cost
        {
            self.start_dash();
        }
    }

    fn execute_jump(&mut self) {
        if self.wall_sliding {
            self.body.vy = -self.tunables.wall_jump_power;
            self.body.vx = -(self.wall_direction as f32) * self.tunables.wall_jump_power * 0.8;
            self.wall_sliding = false;
        } else {
            self.body.vy = -self.jump_power();
        }
        self.body.on_ground = false;
        self.coyote_ms = 0.0;
    }

    fn start_dash(&mut self) {
        self.dash_duration_ms = self.tunables.dash_duration_ms;
        self.dash_cooldown_ms = self.tunables.dash_cooldown_ms;
        self.energy -= self.tunables.dash_cost;
        // Damped, not zeroed: the dash arc flattens but keeps some drop
        self.body.vy *= 0.5;
        self.body.vx = self.body.facing as f32 * self.dash_power();
    }

    fn update_wall_slide(&mut self, input: &InputSnapshot, grid: &TileGrid) {
        self.wall_sliding = false;
        self.wall_direction = 0;

        if self.body.on_ground || self.body.vy <= 0.0 {
            return;
        }

        if self.wall_at(grid, -1) && input.left_held {
            self.wall_sliding = true;
            self.wall_direction = -1;
        } else if self.wall_at(grid, 1) && input.right_held {
            self.wall_sliding = true;
            self.wall_direction = 1;
        }

        if self.wall_sliding {
            self.body.vy = self.body.vy.min(self.tunables.wall_slide_speed);
        }
    }

    /// Whether a wall occupies the cell column adjacent to the given side.
    fn wall_at(&self, grid: &TileGrid, direction: i8) -> bool {
        let probe_x = if direction > 0 {
            self.body.x + self.body.width
        } else {
            self.body.x - 1.0
        };
        let col = (probe_x / TILE_SIZE).floor() as i32;
        let top = Cell::of_world(probe_x, self.body.y).y;
        let bottom = Cell::of_world(probe_x, self.body.y + self.body.height - 1.0).y;

        grid.is_solid(Cell::new(col, top)) || grid.is_solid(Cell::new(col, bottom))
    }

    fn collect_items(&mut self, level: &mut Level, events: &mut Vec<GameEvent>) {
        for index in level.items_in_bounds(self.body.bounds()) {
            let cell = level.items[index].cell;
            let Some((kind, value)) = level.collect_item(index) else {
                continue;
            };

            match kind {
                ItemKind::Coin => {
                    self.score += value;
                    self.coins += 1;
                }
                ItemKind::Gem(_) => {
                    self.score += value;
                    self.gems += 1;
                }
                ItemKind::HealthPotion => {
                    let before = self.body.health;
                    self.body.heal(POTION_HEAL);
                    let healed = self.body.health - before;
                    if healed > 0 {
                        events.push(GameEvent::PlayerHealed { amount: healed });
                    }
                }
                ItemKind::EnergyPotion => {
                    self.energy = self.tunables.max_energy;
                }
                ItemKind::PowerUp(power) => {
                    let duration = self.tunables.powerup_duration_ms;
                    match power {
                        PowerUpKind::Speed => self.speed_boost_ms = duration,
                        PowerUpKind::Jump => self.jump_boost_ms = duration,
                        PowerUpKind::Dash => self.dash_boost_ms = duration,
                    }
                }
            }

            events.push(GameEvent::ItemCollected { kind, value, cell });
        }
    }

    fn update_animation(&mut self, input: &InputSnapshot) {
        self.animation = if self.dashing() {
            AnimationState::Dash
        } else if self.wall_sliding {
            AnimationState::WallSlide
        } else if !self.body.on_ground {
            AnimationState::Jump
        } else if input.move_axis != 0 {
            AnimationState::Walk
        } else {
            AnimationState::Idle
        };
    }

    fn speed(&self) -> f32 {
        let boost = if self.speed_boost_ms > 0.0 {
            self.tunables.speed_boost_factor
        } else {
            1.0
        };
        self.tunables.speed * boost
    }

    fn jump_power(&self) -> f32 {
        let boost = if self.jump_boost_ms > 0.0 {
            self.tunables.jump_boost_factor
        } else {
            1.0
        };
        self.tunables.jump_power * boost
    }

    fn dash_power(&self) -> f32 {
        let boost = if self.dash_boost_ms > 0.0 {
            self.tunables.dash_boost_factor
        } else {
            1.0
        };
        self.tunables.dash_power * boost
    }

    /// Whether the dash movement-override window is active.
    pub fn dashing(&self) -> bool {
        self.dash_duration_ms > 0.0
    }

    pub fn wall_sliding(&self) -> bool {
        self.wall_sliding
    }

    pub fn body(&self) -> &EntityState {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut EntityState {
        &mut self.body
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    /// Read-only snapshot consumed once per rendered frame.
    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            x: self.body.x,
            y: self.body.y,
            facing: self.body.facing,
            health: self.body.health,
            max_health: self.body.max_health,
            energy: self.energy,
            max_energy: self.tunables.max_energy,
            score: self.score,
            coins: self.coins,
            gems: self.gems,
            animation: self.animation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Item, Theme};
    use crate::world::{TileGrid, TileKind};

    const DT: f32 = 16.0;

    /// Flat floor with its top at row 10 (y = 160).
    fn flat_level() -> Level {
        let mut grid = TileGrid::new(40, 15, TileKind::Empty);
        grid.fill_rect(0, 10, 40, 1, TileKind::Surface);
        grid.fill_rect(0, 11, 40, 4, TileKind::Solid);
        Level {
            grid,
            theme: Theme::Forest,
            player_spawn: Cell::new(2, 8),
            items: Vec::new(),
            enemy_spawns: Vec::new(),
            decorations: Vec::new(),
            checkpoints: Vec::new(),
            rooms: Vec::new(),
        }
    }

    fn settled_player(level: &mut Level) -> PlayerController {
        let mut player = PlayerController::new(64.0, 140.0);
        for _ in 0..30 {
            player.update(&InputSnapshot::idle(), level, DT);
        }
        assert!(player.body().on_ground);
        player
    }

    #[test]
    fn test_grounded_jump() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);

        let input = InputSnapshot {
            jump_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);

        assert!(player.body().vy < 0.0);
        assert!(!player.body().on_ground);
    }

    #[test]
    fn test_coyote_jump_within_window() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);

        // Leave the ground without jumping
        player.body_mut().y = 100.0;
        player.body_mut().vy = 10.0;
        player.update(&InputSnapshot::idle(), &mut level, DT); // airborne, coyote ticking
        player.update(&InputSnapshot::idle(), &mut level, DT);

        let input = InputSnapshot {
            jump_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);

        assert!(player.body().vy < 0.0, "coyote window should allow the jump");
    }

    #[test]
    fn test_jump_rejected_after_coyote_expiry() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);

        player.body_mut().y = 40.0;
        player.body_mut().vy = 10.0;
        for _ in 0..8 {
            // 128 ms airborne: past the 100 ms coyote window
            player.update(&InputSnapshot::idle(), &mut level, DT);
        }

        let input = InputSnapshot {
            jump_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);

        assert!(player.body().vy > 0.0, "no jump without ground or coyote");
    }

    #[test]
    fn test_buffered_jump_fires_on_landing() {
        let mut level = flat_level();
        let mut player = PlayerController::new(64.0, 142.0); // just above the floor

        // Press jump while still airborne
        let input = InputSnapshot {
            jump_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);
        assert!(!player.body().on_ground);

        // Keep falling with no further input; the buffer must fire the jump
        let mut jumped = false;
        for _ in 0..6 {
            player.update(&InputSnapshot::idle(), &mut level, DT);
            if player.body().vy < 0.0 {
                jumped = true;
                break;
            }
        }
        assert!(jumped, "buffered jump should execute on landing");
    }

    #[test]
    fn test_dash_consumes_energy_and_locks_out() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);

        let input = InputSnapshot {
            dash_pressed: true,
            move_axis: 1,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);

        assert!(player.dashing());
        assert_eq!(player.body().vx, 400.0);
        assert_eq!(player.energy(), 75.0);

        // Second press during cooldown is rejected
        player.update(&input, &mut level, DT);
        assert_eq!(player.energy(), 75.0);
    }

    #[test]
    fn test_dash_blocked_without_energy() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);
        player.energy = 10.0;

        let input = InputSnapshot {
            dash_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&input, &mut level, DT);

        assert!(!player.dashing());
        assert!(player.energy() < 25.0, "energy must not be spent");
    }

    #[test]
    fn test_energy_regenerates_outside_cooldown() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);
        player.energy = 50.0;
        player.dash_cooldown_ms = 100.0;

        player.update(&InputSnapshot::idle(), &mut level, DT);
        assert_eq!(player.energy(), 50.0, "no regen while cooling down");

        player.dash_cooldown_ms = 0.0;
        player.update(&InputSnapshot::idle(), &mut level, DT);
        assert!(player.energy() > 50.0);
    }

    #[test]
    fn test_wall_slide_caps_fall_and_wall_jump_pushes_away() {
        let mut level = flat_level();
        // Wall column at x = 10 (world 160), open air beside it
        for y in 0..10 {
            level.grid.set_tile(Cell::new(10, y), TileKind::Solid);
        }

        let mut player = PlayerController::new(144.0, 64.0); // flush left of the wall
        player.body_mut().vy = 200.0;

        let cling = InputSnapshot {
            move_axis: 1,
            right_held: true,
            ..InputSnapshot::idle()
        };
        player.update(&cling, &mut level, DT);

        assert!(player.wall_sliding());
        assert!(player.body().vy < 200.0, "slide caps the fall speed");

        let jump = InputSnapshot {
            jump_pressed: true,
            right_held: true,
            ..InputSnapshot::idle()
        };
        player.update(&jump, &mut level, DT);

        assert!(player.body().vy < 0.0);
        assert!(player.body().vx < 0.0, "wall jump pushes away from the wall");
    }

    #[test]
    fn test_item_pickup_applies_effect_once() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);
        let player_cell = Cell::of_world(player.body().x, player.body().y);
        level.items.push(Item::new(ItemKind::Coin, player_cell, 10));

        let events = player.update(&InputSnapshot::idle(), &mut level, DT);
        assert_eq!(player.score(), 10);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::ItemCollected { .. })));

        let events = player.update(&InputSnapshot::idle(), &mut level, DT);
        assert_eq!(player.score(), 10, "second overlap must not re-collect");
        assert!(events.is_empty());
    }

    #[test]
    fn test_speed_powerup_multiplies_drive() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);
        let player_cell = Cell::of_world(player.body().x, player.body().y);
        level
            .items
            .push(Item::new(ItemKind::PowerUp(PowerUpKind::Speed), player_cell, 0));

        player.update(&InputSnapshot::idle(), &mut level, DT);

        let run = InputSnapshot {
            move_axis: 1,
            ..InputSnapshot::idle()
        };
        player.update(&run, &mut level, DT);
        assert_eq!(player.body().vx, 225.0); // 150 * 1.5
    }

    #[test]
    fn test_animation_tags() {
        let mut level = flat_level();
        let mut player = settled_player(&mut level);
        assert_eq!(player.animation(), AnimationState::Idle);

        let run = InputSnapshot {
            move_axis: 1,
            ..InputSnapshot::idle()
        };
        player.update(&run, &mut level, DT);
        assert_eq!(player.animation(), AnimationState::Walk);

        let jump = InputSnapshot {
            jump_pressed: true,
            ..InputSnapshot::idle()
        };
        player.update(&jump, &mut level, DT);
        assert_eq!(player.animation(), AnimationState::Jump);
    }
}
