//! Observation snapshots — what the query surface returns.
//!
//! These are read-only views handed to external drivers (renderers,
//! user-authored solve code). Building one never mutates `GameState` and
//! never advances the clock.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::ActionSet;
use crate::enums::{CellKind, EnemyKind, GameStatus, ItemKind};
use crate::grid::{Direction, Position};
use crate::ids::{EnemyId, ItemId, StageId};

/// Player portion of a `see` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub position: Position,
    pub direction: Direction,
    pub hp: i32,
    pub max_hp: i32,
    pub attack_power: i32,
    pub stamina: Option<i32>,
    pub collected_items: Vec<ItemId>,
    pub disposed_items: Vec<ItemId>,
}

/// What one visible cell contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub kind: CellKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enemy: Option<EnemyView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemView>,
}

/// Enemy entry inside a vision map cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub alerted: bool,
    /// hp / max_hp in [0, 1].
    pub hp_ratio: f64,
}

/// Item entry inside a vision map cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub kind: ItemKind,
}

/// The four orthogonal neighbors of the player, keyed by direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborView {
    pub north: CellKind,
    pub east: CellKind,
    pub south: CellKind,
    pub west: CellKind,
}

impl NeighborView {
    pub fn in_direction(&self, dir: Direction) -> CellKind {
        match dir {
            Direction::N => self.north,
            Direction::E => self.east,
            Direction::S => self.south,
            Direction::W => self.west,
        }
    }
}

/// Full `see` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub player: PlayerView,
    pub neighbors: NeighborView,
    /// Cells within Manhattan `vision_range` of the player, keyed by
    /// position. Out-of-board cells are present with `CellKind::Boundary`.
    pub vision: BTreeMap<Position, CellView>,
    pub status: GameStatus,
    pub turn_count: u32,
}

/// Static stage metadata returned by `get_stage_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageInfo {
    pub stage_id: StageId,
    pub width: i32,
    pub height: i32,
    pub goal: Position,
    pub max_turns: u32,
    pub allowed_actions: ActionSet,
    pub walls: Vec<Position>,
    pub forbidden: Vec<Position>,
    pub initial_enemies: Vec<EnemyInfo>,
    pub initial_items: Vec<ItemInfo>,
}

/// Static per-enemy metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyInfo {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub position: Position,
    pub hp: i32,
    pub attack_power: i32,
    pub vision_range: u32,
}

/// Static per-item metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: Position,
}
