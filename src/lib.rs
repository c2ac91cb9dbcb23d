//! # Warren
//!
//! The simulation core of a 2D tile-based action game.
//!
//! ## Architecture Overview
//!
//! Warren is a library consumed by an interactive game loop; it contains no
//! rendering, audio, or input-device code. The core concepts:
//!
//! - **Tile World**: a fixed grid of tile codes with safe out-of-bounds
//!   solidity queries, shared by collision and line-of-sight code
//! - **Generation System**: procedural level generation with two strategies
//!   (room-and-corridor dungeons, height-field terrain) behind one trait
//! - **Simulation**: axis-separated swept physics, a player movement
//!   controller, and enemy AI state machines, stepped once per tick
//! - **Events**: each tick returns an ordered list of discrete event records
//!   for the outer controller (score, UI, state transitions) to consume
//!
//! The simulation is single-threaded and cooperative: one tick runs to
//! completion before control returns to the caller, and level generation is
//! a one-shot synchronous computation at level start.

pub mod generation;
pub mod sim;
pub mod world;

// Core module re-exports
pub use generation::*;
pub use sim::*;
pub use world::*;

/// Core error type for the Warren engine.
#[derive(thiserror::Error, Debug)]
pub enum WarrenError {
    /// Generation configuration is unusable
    #[error("Invalid generation config: {0}")]
    InvalidConfig(String),

    /// Generation failed outright (distinct from bounded placement shortfalls)
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Warren codebase.
pub type WarrenResult<T> = Result<T, WarrenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation configuration constants.
pub mod config {
    /// World units per tile cell, for both collision and rendering alignment
    pub const TILE_SIZE: f32 = 16.0;

    /// Default level width in tiles
    pub const DEFAULT_LEVEL_WIDTH: u32 = 150;

    /// Default level height in tiles
    pub const DEFAULT_LEVEL_HEIGHT: u32 = 50;

    /// Default player starting health
    pub const DEFAULT_PLAYER_HEALTH: u32 = 100;

    /// Distance from the right edge, in world units, that counts as level completion
    pub const LEVEL_END_MARGIN: f32 = 100.0;
}
