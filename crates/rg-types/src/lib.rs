//! Core types for the rogrid engine — IDs, enums, grid geometry, game state,
//! actions, observation snapshots, and the deterministic stage RNG.
//!
//! This crate has no game logic — just data definitions.

pub mod action;
pub mod enums;
pub mod grid;
pub mod ids;
pub mod observe;
pub mod rng;
pub mod state;

// Re-export commonly used types at crate root
pub use action::{Action, ActionSet, ExecutionResult, StateChange};
pub use enums::*;
pub use grid::{Direction, Position};
pub use ids::*;
pub use rng::StageRng;
pub use state::GameState;
