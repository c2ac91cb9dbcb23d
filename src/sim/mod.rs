//! # Simulation Module
//!
//! The per-tick simulation: entity physics state, the player controller,
//! enemy AI, and the [`Simulation`] orchestrator that steps them in a fixed
//! order.
//!
//! One tick runs to completion before control returns to the caller; there
//! is no parallelism and no I/O. Each tick returns an ordered list of
//! [`GameEvent`] records — the explicit notification channel the outer
//! controller consumes for score, UI, and state-transition decisions.

pub mod enemy;
pub mod physics;
pub mod player;

pub use enemy::*;
pub use physics::*;
pub use player::*;

use crate::generation::{ItemKind, Level};
use crate::world::{Aabb, Cell};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for simulation entities.
pub type EntityId = Uuid;

/// Creates a new unique entity ID.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

/// Shared physics state for every simulated entity.
///
/// "Entity" is data, not behavior: the player controller and enemy AI are
/// separate modules that operate on this record through the shared physics
/// step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityState {
    /// World-space position of the top-left corner
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    pub health: u32,
    pub max_health: u32,
    /// True only for the tick just computed; recomputed by every step
    pub on_ground: bool,
    /// +1 facing right, -1 facing left
    pub facing: i8,
    /// Cleared when health reaches zero; a terminal transition
    pub alive: bool,
}

impl EntityState {
    pub fn new(x: f32, y: f32, width: f32, height: f32, max_health: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            vx: 0.0,
            vy: 0.0,
            health: max_health,
            max_health,
            on_ground: false,
            facing: 1,
            alive: true,
        }
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    /// World-space center point.
    pub fn center(&self) -> (f32, f32) {
        self.bounds().center()
    }

    pub fn intersects(&self, other: &EntityState) -> bool {
        self.bounds().intersects(&other.bounds())
    }

    /// Removes health, clamped at zero. Reaching zero clears `alive`;
    /// there is no transition back.
    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
        }
    }

    /// Restores health, clamped at `max_health`. Dead entities stay dead.
    pub fn heal(&mut self, amount: u32) {
        if self.alive {
            self.health = (self.health + amount).min(self.max_health);
        }
    }
}

/// Per-tick snapshot of discrete input intents.
///
/// The input source polls devices; the simulation only ever sees this
/// record. Jump and dash are edge-triggered presses, the hold states feed
/// wall-cling detection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    /// Horizontal intent: -1, 0, or 1
    pub move_axis: i8,
    /// Jump was pressed this tick (edge, not level)
    pub jump_pressed: bool,
    /// Dash was pressed this tick (edge, not level)
    pub dash_pressed: bool,
    pub left_held: bool,
    pub right_held: bool,
}

impl InputSnapshot {
    /// A snapshot with no intents; useful for settling and tests.
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Animation tag exposed to the renderer; no behavior hangs off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationState {
    Idle,
    Walk,
    Jump,
    WallSlide,
    Dash,
}

/// Discrete event records returned from each tick, in occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ItemCollected {
        kind: ItemKind,
        value: u32,
        cell: Cell,
    },
    PlayerDamaged {
        amount: u32,
    },
    PlayerHealed {
        amount: u32,
    },
    PlayerDefeated,
    EnemyDefeated {
        id: EntityId,
    },
    CheckpointActivated {
        index: usize,
    },
}

/// The play session: a generated level plus the entities simulating in it.
///
/// # Examples
///
/// ```
/// use warren::{GenerationConfig, InputSnapshot, Level, Simulation};
///
/// let level = Level::generate(&GenerationConfig::for_testing(3)).unwrap();
/// let mut sim = Simulation::new(level, 3);
/// for _ in 0..60 {
///     sim.tick(&InputSnapshot::idle(), 16.0);
/// }
/// assert!(sim.player().body().alive);
/// ```
#[derive(Debug)]
pub struct Simulation {
    level: Level,
    player: PlayerController,
    enemies: Vec<EnemyAi>,
    player_defeated_reported: bool,
}

impl Simulation {
    /// Builds a session from a generated level, instantiating the player at
    /// the level's spawn cell and one enemy per spawn-table entry.
    pub fn new(level: Level, seed: u64) -> Self {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

        let (spawn_x, spawn_y) = level.player_spawn.world_origin();
        let player = PlayerController::new(spawn_x, spawn_y);
        let enemies = level
            .enemy_spawns
            .iter()
            .map(|spawn| EnemyAi::spawn(spawn, &mut rng))
            .collect();

        Self {
            level,
            player,
            enemies,
            player_defeated_reported: false,
        }
    }

    /// Advances the simulation by one tick.
    ///
    /// Fixed order: player (timers, input, physics, pickups), checkpoint
    /// activation, then each living enemy (AI, physics, contact
    /// resolution). Returns the tick's events in occurrence order.
    pub fn tick(&mut self, input: &InputSnapshot, dt_ms: f32) -> Vec<GameEvent> {
        let mut events = self.player.update(input, &mut self.level, dt_ms);
        self.activate_checkpoints(&mut events);

        for enemy in &mut self.enemies {
            if !enemy.body().alive {
                continue;
            }
            events.extend(enemy.update(&mut self.player, &self.level.grid, dt_ms));
        }

        if !self.player.body().alive && !self.player_defeated_reported {
            self.player_defeated_reported = true;
            events.push(GameEvent::PlayerDefeated);
        }

        events
    }

    fn activate_checkpoints(&mut self, events: &mut Vec<GameEvent>) {
        let bounds = self.player.body().bounds();
        let lo = Cell::of_world(bounds.x, bounds.y);
        let hi = Cell::of_world(bounds.x + bounds.w - 1.0, bounds.y + bounds.h - 1.0);

        for (index, checkpoint) in self.level.checkpoints.iter_mut().enumerate() {
            if !checkpoint.activated
                && checkpoint.cell.x >= lo.x
                && checkpoint.cell.x <= hi.x
                && checkpoint.cell.y >= lo.y
                && checkpoint.cell.y <= hi.y
            {
                checkpoint.activated = true;
                events.push(GameEvent::CheckpointActivated { index });
            }
        }
    }

    /// Whether the player has crossed into the level-end margin at the
    /// right edge. The outer controller decides what completion means.
    pub fn level_complete(&self) -> bool {
        let (center_x, _) = self.player.body().center();
        center_x >= self.level.world_width() - crate::config::LEVEL_END_MARGIN
    }

    /// Whether the player has fallen below the level. The outer controller
    /// owns the respawn decision.
    pub fn player_out_of_bounds(&self) -> bool {
        self.player.body().y > self.level.world_height()
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    /// Mutable player access for outer-controller decisions (respawn
    /// placement, completion healing).
    pub fn player_mut(&mut self) -> &mut PlayerController {
        &mut self.player
    }

    pub fn enemies(&self) -> &[EnemyAi] {
        &self.enemies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;

    #[test]
    fn test_damage_clamps_and_kills() {
        let mut body = EntityState::new(0.0, 0.0, 16.0, 16.0, 30);

        body.take_damage(10);
        assert_eq!(body.health, 20);
        assert!(body.alive);

        body.take_damage(50);
        assert_eq!(body.health, 0);
        assert!(!body.alive);

        // Terminal: healing a dead entity does nothing
        body.heal(10);
        assert_eq!(body.health, 0);
        assert!(!body.alive);
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut body = EntityState::new(0.0, 0.0, 16.0, 16.0, 30);
        body.take_damage(5);
        body.heal(100);
        assert_eq!(body.health, 30);
    }

    #[test]
    fn test_simulation_spawns_one_enemy_per_spawn_entry() {
        let level = Level::generate(&GenerationConfig::for_testing(5)).unwrap();
        let spawn_count = level.enemy_spawns.len();
        let sim = Simulation::new(level, 5);
        assert_eq!(sim.enemies().len(), spawn_count);
    }

    #[test]
    fn test_tick_runs_without_input() {
        let level = Level::generate(&GenerationConfig::for_testing(6)).unwrap();
        let mut sim = Simulation::new(level, 6);

        for _ in 0..60 {
            sim.tick(&InputSnapshot::idle(), 16.0);
        }

        // One second of settling leaves the player standing somewhere legal
        let body = sim.player().body();
        assert!(body.alive);
        assert!(body.y <= sim.level().world_height());
    }

    #[test]
    fn test_player_defeated_reported_once() {
        let level = Level::generate(&GenerationConfig::for_testing(7)).unwrap();
        let mut sim = Simulation::new(level, 7);

        sim.player_mut().body_mut().take_damage(1000);
        let first: Vec<_> = sim.tick(&InputSnapshot::idle(), 16.0);
        let second: Vec<_> = sim.tick(&InputSnapshot::idle(), 16.0);

        assert!(first.contains(&GameEvent::PlayerDefeated));
        assert!(!second.contains(&GameEvent::PlayerDefeated));
    }
}
