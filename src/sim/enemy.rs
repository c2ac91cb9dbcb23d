//! # Enemy AI
//!
//! Finite-state enemy behavior over the shared physics state: patrol around
//! the spawn anchor, chase the player on sight, attack in close range.
//!
//! Sight is a straight-segment raycast against the tile grid; a blocked
//! segment forces patrol regardless of distance, so enemies never track the
//! player through walls. Combat contact is asymmetric: a falling player
//! overlapping from above defeats the enemy outright, any other overlap
//! damages the player.

use crate::config::TILE_SIZE;
use crate::generation::{EnemyKind, EnemySpawn};
use crate::sim::{
    new_entity_id, physics, EntityId, EntityState, GameEvent, PhysicsProfile, PlayerController,
};
use crate::world::{Cell, TileGrid};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upward velocity granted to the player by a successful stomp.
const STOMP_BOUNCE: f32 = 180.0;

/// Sampling resolution of the line-of-sight raycast, in world units.
const SIGHT_STEP: f32 = TILE_SIZE / 2.0;

/// Per-kind behavior constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyTunables {
    /// Chase speed, world units per second; patrol moves at half this
    pub speed: f32,
    /// Damage per attack or contact
    pub damage: u32,
    pub max_health: u32,
    /// Distance at which a sighted player triggers a chase
    pub detection_range: f32,
    /// Distance at which the enemy halts and attacks
    pub attack_range: f32,
    /// Lockout between attacks
    pub attack_cooldown_ms: f32,
    /// Upward velocity of a chase jump
    pub jump_power: f32,
}

impl EnemyTunables {
    /// Behavior constants for an enemy kind.
    pub fn for_kind(kind: EnemyKind) -> Self {
        let base = Self {
            speed: 30.0,
            damage: 5,
            max_health: 20,
            detection_range: 80.0,
            attack_range: 24.0,
            attack_cooldown_ms: 1000.0,
            jump_power: 200.0,
        };

        match kind {
            EnemyKind::Orc => Self {
                speed: 35.0,
                damage: 10,
                max_health: 30,
                detection_range: 90.0,
                jump_power: 220.0,
                ..base
            },
            EnemyKind::Skeleton => Self {
                damage: 8,
                max_health: 25,
                detection_range: 100.0,
                ..base
            },
            EnemyKind::Goblin => Self {
                speed: 55.0,
                max_health: 15,
                ..base
            },
            EnemyKind::Bat => Self {
                speed: 60.0,
                damage: 4,
                max_health: 10,
                detection_range: 130.0,
                ..base
            },
            EnemyKind::Spider => Self {
                speed: 45.0,
                damage: 6,
                max_health: 15,
                detection_range: 90.0,
                jump_power: 260.0,
                ..base
            },
            EnemyKind::Slime => Self {
                speed: 20.0,
                detection_range: 60.0,
                ..base
            },
        }
    }
}

/// Behavior states, exposed to the renderer as a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiState {
    Patrolling,
    Chasing,
    Attacking,
}

/// Read-only per-frame view for the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub x: f32,
    pub y: f32,
    pub facing: i8,
    pub kind: EnemyKind,
    pub state: AiState,
}

/// One enemy's behavior module, operating on a shared [`EntityState`].
#[derive(Debug, Clone)]
pub struct EnemyAi {
    id: EntityId,
    kind: EnemyKind,
    body: EntityState,
    tunables: EnemyTunables,
    profile: PhysicsProfile,
    state: AiState,
    anchor_x: f32,
    patrol_radius: f32,
    patrol_direction: i8,
    attack_timer_ms: f32,
}

impl EnemyAi {
    /// Instantiates an enemy from a generation spawn record.
    pub fn spawn(spawn: &EnemySpawn, rng: &mut StdRng) -> Self {
        let (x, y) = spawn.cell.world_origin();
        let tunables = EnemyTunables::for_kind(spawn.kind);

        Self {
            id: new_entity_id(),
            kind: spawn.kind,
            body: EntityState::new(x, y, 16.0, 16.0, tunables.max_health),
            tunables,
            profile: PhysicsProfile::default(),
            state: AiState::Patrolling,
            anchor_x: x,
            patrol_radius: rng.gen_range(2.0..=4.0) * TILE_SIZE,
            patrol_direction: if rng.gen_bool(0.5) { 1 } else { -1 },
            attack_timer_ms: 0.0,
        }
    }

    /// Advances this enemy by one tick: state selection, steering, physics,
    /// then contact resolution against the player.
    pub fn update(
        &mut self,
        player: &mut PlayerController,
        grid: &TileGrid,
        dt_ms: f32,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.attack_timer_ms = (self.attack_timer_ms - dt_ms).max(0.0);

        let (ex, ey) = self.body.center();
        let (px, py) = player.body().center();
        let dx = px - ex;
        let dy = py - ey;
        let distance = (dx * dx + dy * dy).sqrt();
        let sighted = player.body().alive && line_of_sight(grid, (ex, ey), (px, py));

        self.state = if sighted && distance <= self.tunables.attack_range {
            AiState::Attacking
        } else if sighted && distance <= self.tunables.detection_range {
            AiState::Chasing
        } else {
            AiState::Patrolling
        };

        let driven = match self.state {
            AiState::Attacking => {
                self.body.vx = 0.0;
                false
            }
            AiState::Chasing => {
                self.chase(dx, dy);
                true
            }
            AiState::Patrolling => {
                self.patrol();
                true
            }
        };

        if self.body.vx != 0.0 {
            self.body.facing = if self.body.vx > 0.0 { 1 } else { -1 };
        }

        physics::step(&mut self.body, &self.profile, grid, dt_ms, driven);

        // A zeroed drive after the step means an obstruction: turn around
        if self.state == AiState::Patrolling && self.body.vx == 0.0 {
            self.patrol_direction = -self.patrol_direction;
        }

        self.resolve_player_contact(player, &mut events);

        if self.body.alive
            && self.state == AiState::Attacking
            && self.attack_timer_ms <= 0.0
            && player.body().alive
        {
            player.body_mut().take_damage(self.tunables.damage);
            self.attack_timer_ms = self.tunables.attack_cooldown_ms;
            events.push(GameEvent::PlayerDamaged {
                amount: self.tunables.damage,
            });
        }

        events
    }

    fn chase(&mut self, dx: f32, dy: f32) {
        self.body.vx = if dx > 0.0 {
            self.tunables.speed
        } else if dx < 0.0 {
            -self.tunables.speed
        } else {
            0.0
        };

        // Player well above a grounded enemy: jump for it
        if dy < -2.0 * TILE_SIZE && self.body.on_ground {
            self.body.vy = -self.tunables.jump_power;
            self.body.on_ground = false;
        }
    }

    fn patrol(&mut self) {
        let offset = self.body.x - self.anchor_x;
        if offset >= self.patrol_radius {
            self.patrol_direction = -1;
        } else if offset <= -self.patrol_radius {
            self.patrol_direction = 1;
        }
        self.body.vx = self.patrol_direction as f32 * self.tunables.speed * 0.5;
    }

    /// Applies the asymmetric contact rule.
    ///
    /// A player who is falling and whose top edge is above the enemy's top
    /// edge defeats the enemy outright — independent of any HP count — and
    /// receives an upward bounce. Any other overlap damages the player,
    /// gated by the attack cooldown.
    fn resolve_player_contact(&mut self, player: &mut PlayerController, events: &mut Vec<GameEvent>) {
        if !player.body().alive || !self.body.intersects(player.body()) {
            return;
        }

        let stomp = player.body().vy > 0.0 && player.body().y < self.body.y;
        if stomp {
            self.body.health = 0;
            self.body.alive = false;
            player.body_mut().vy = -STOMP_BOUNCE;
            events.push(GameEvent::EnemyDefeated { id: self.id });
        } else if self.attack_timer_ms <= 0.0 {
            player.body_mut().take_damage(self.tunables.damage);
            self.attack_timer_ms = self.tunables.attack_cooldown_ms;
            events.push(GameEvent::PlayerDamaged {
                amount: self.tunables.damage,
            });
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn body(&self) -> &EntityState {
        &self.body
    }

    /// Read-only snapshot consumed once per rendered frame.
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            x: self.body.x,
            y: self.body.y,
            facing: self.body.facing,
            kind: self.kind,
            state: self.state,
        }
    }
}

/// Samples the segment between two world points at a fixed step; sight is
/// blocked if any sampled cell is solid.
pub fn line_of_sight(grid: &TileGrid, from: (f32, f32), to: (f32, f32)) -> bool {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let distance = (dx * dx + dy * dy).sqrt();
    let steps = (distance / SIGHT_STEP).ceil().max(1.0) as u32;

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let cell = Cell::of_world(from.0 + dx * t, from.1 + dy * t);
        if grid.is_solid(cell) {
            return false;
        }
    }
    true
}
