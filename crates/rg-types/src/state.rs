//! Game state structures — `GameState`, `Board`, `PlayerState`, `EnemyState`,
//! `ItemState`.
//!
//! `GameState` exclusively owns the player, enemies and items. Enemies are
//! addressed by index into `enemies`, never by pointer; the solver works on
//! by-value clones of the whole struct.

use std::collections::{BTreeMap, BTreeSet};

use arrayvec::ArrayVec;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::action::ActionSet;
use crate::enums::*;
use crate::grid::{Direction, Position};
use crate::ids::{EnemyId, ItemId, StageId};

// =============================================================================
// Capacity constants
// =============================================================================

/// Max cells in an enemy footprint (3x3).
pub const MAX_FOOTPRINT: usize = 9;
/// Default player stats.
pub const DEFAULT_PLAYER_HP: i32 = 100;
pub const DEFAULT_PLAYER_ATTACK: i32 = 30;
/// Default bomb damage.
pub const DEFAULT_BOMB_DAMAGE: i32 = 100;
/// Default stats for the conditional 2x3 enemy.
pub const SPECIAL_ENEMY_HP: i32 = 10000;
pub const SPECIAL_ENEMY_ATTACK: i32 = 10000;
/// Alert cooldown set whenever an enemy sees the player.
pub const ALERT_COOLDOWN_TURNS: u32 = 10;

// =============================================================================
// StateFlags — packed boolean fields
// =============================================================================

bitflags! {
    /// Boolean game state packed into a u8 bitfield.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// Set when any enemy strike or area attack hit the player this turn.
        const PLAYER_ATTACKED_THIS_TURN = 1 << 0;
        /// The stage enables the stamina system.
        const STAMINA_ENABLED           = 1 << 1;
        /// Winning additionally requires every initial item collected or
        /// disposed.
        const COLLECT_ALL_ITEMS         = 1 << 2;
    }
}

// Manual serde for StateFlags as a u8 value.
impl Serialize for StateFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(deserializer)?;
        Ok(StateFlags::from_bits_truncate(bits))
    }
}

// =============================================================================
// Board
// =============================================================================

/// Static board geometry. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    pub walls: BTreeSet<Position>,
    pub forbidden: BTreeSet<Position>,
    pub goal: Position,
    /// Character legend the stage was written with. Serialization only.
    pub legend: BTreeMap<char, String>,
}

impl Board {
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.walls.contains(&pos)
    }

    pub fn is_forbidden(&self, pos: Position) -> bool {
        self.forbidden.contains(&pos)
    }

    /// Whether the cell is statically untraversable (out of bounds, wall, or
    /// forbidden tile).
    pub fn is_blocked(&self, pos: Position) -> bool {
        !self.in_bounds(pos) || self.is_wall(pos) || self.is_forbidden(pos)
    }
}

// =============================================================================
// Player
// =============================================================================

/// Stamina gauge, present only when the stage enables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamina {
    pub current: i32,
    pub max: i32,
}

/// The player. Mutated only by the action kernel and enemy AI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Position,
    pub direction: Direction,
    pub hp: i32,
    pub max_hp: i32,
    pub attack_power: i32,
    pub stamina: Option<Stamina>,
    /// Items picked up, in pickup order.
    pub collected_items: Vec<ItemId>,
    /// Detrimental items disposed of, in disposal order.
    pub disposed_items: Vec<ItemId>,
}

impl PlayerState {
    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

// =============================================================================
// Enemies
// =============================================================================

/// Patrol route state: ordered waypoints plus the index currently targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatrolState {
    pub waypoints: Vec<Position>,
    pub index: usize,
}

/// One enemy. The `kind` drives footprint size and which behaviors
/// (`rage`, conditional kill) the AI runs; everything else is shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyState {
    pub id: EnemyId,
    pub kind: EnemyKind,
    /// Top-left cell of the footprint.
    pub position: Position,
    pub direction: Direction,
    pub hp: i32,
    pub max_hp: i32,
    pub attack_power: i32,
    /// Manhattan vision radius. 0 disables vision entirely.
    pub vision_range: u32,
    pub alerted: bool,
    pub alert_cooldown: u32,
    pub patrol: Option<PatrolState>,
    pub rage: RageState,
    /// Once set, any further damage re-enters the rage cycle immediately.
    pub rage_retrigger: bool,
    /// Rage trigger threshold as a percentage of max HP (default 50).
    pub rage_threshold_pct: u32,
    /// Chebyshev radius of the area attack around the footprint (default 1).
    pub area_attack_range: u32,
    /// Required kill order (Special2x3 only; empty otherwise).
    pub required_sequence: Vec<EnemyId>,
    /// Set when the required order was violated: pursue ignoring vision.
    pub hunting: bool,
}

impl EnemyState {
    /// Footprint cells: anchor + (dx, dy) for 0 ≤ dx < w, 0 ≤ dy < h.
    pub fn footprint(&self) -> ArrayVec<Position, MAX_FOOTPRINT> {
        let (w, h) = self.kind.footprint_size();
        let mut cells = ArrayVec::new();
        for dy in 0..h {
            for dx in 0..w {
                cells.push(Position::new(self.position.x + dx, self.position.y + dy));
            }
        }
        cells
    }

    /// Footprint cells for a hypothetical anchor (used when testing moves).
    pub fn footprint_at(&self, anchor: Position) -> ArrayVec<Position, MAX_FOOTPRINT> {
        let (w, h) = self.kind.footprint_size();
        let mut cells = ArrayVec::new();
        for dy in 0..h {
            for dx in 0..w {
                cells.push(Position::new(anchor.x + dx, anchor.y + dy));
            }
        }
        cells
    }

    pub fn occupies(&self, pos: Position) -> bool {
        let (w, h) = self.kind.footprint_size();
        pos.x >= self.position.x
            && pos.x < self.position.x + w
            && pos.y >= self.position.y
            && pos.y < self.position.y + h
    }

    /// Manhattan distance from the nearest footprint cell to `pos`.
    pub fn distance_to(&self, pos: Position) -> u32 {
        self.footprint()
            .iter()
            .map(|c| c.manhattan(pos))
            .min()
            .unwrap_or(u32::MAX)
    }

    /// HP as a fraction of max, for observation snapshots.
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp.max(0) as f64 / self.max_hp as f64
    }
}

// =============================================================================
// Items
// =============================================================================

/// An item still on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemState {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: Position,
    /// Damage dealt on pickup (bombs).
    pub damage: i32,
    /// HP restored on pickup (potions).
    pub heal: i32,
    /// Attack power gained on pickup (weapons).
    pub attack_bonus: i32,
}

// =============================================================================
// GameState
// =============================================================================

/// The entire execution/search state. One live instance per engine; the
/// solver clones it freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub stage_id: StageId,
    pub turn_count: u32,
    pub max_turns: u32,
    pub board: Board,
    pub player: PlayerState,
    /// Stable by initial index; removal preserves relative order.
    pub enemies: Vec<EnemyState>,
    /// Items still on the board.
    pub items: Vec<ItemState>,
    pub status: GameStatus,
    pub flags: StateFlags,
    pub allowed_actions: ActionSet,
    /// Every defeated enemy id, in defeat order. Drives conditional kills.
    pub defeated_order: Vec<EnemyId>,
}

impl GameState {
    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }

    /// Index of the enemy whose footprint covers `pos`, if any.
    pub fn enemy_at(&self, pos: Position) -> Option<usize> {
        self.enemies.iter().position(|e| e.occupies(pos))
    }

    /// Index of the item at `pos`, if any.
    pub fn item_at(&self, pos: Position) -> Option<usize> {
        self.items.iter().position(|i| i.position == pos)
    }

    pub fn enemy_by_id(&self, id: &EnemyId) -> Option<&EnemyState> {
        self.enemies.iter().find(|e| &e.id == id)
    }

    /// Dynamic cell resolution with priority
    /// wall > enemy footprint > item > goal > empty.
    pub fn cell_kind(&self, pos: Position) -> CellKind {
        if !self.board.in_bounds(pos) {
            return CellKind::Boundary;
        }
        if self.board.is_wall(pos) {
            return CellKind::Wall;
        }
        if self.board.is_forbidden(pos) {
            return CellKind::Forbidden;
        }
        if self.enemy_at(pos).is_some() {
            return CellKind::Enemy;
        }
        if self.item_at(pos).is_some() {
            return CellKind::Item;
        }
        if pos == self.board.goal {
            return CellKind::Goal;
        }
        CellKind::Empty
    }

    /// Whether an enemy with index `moving_idx` could stand with its
    /// footprint on `cells`: all in bounds, no walls/forbidden tiles, no
    /// other enemy, not the player.
    pub fn footprint_fits(&self, cells: &[Position], moving_idx: usize) -> bool {
        cells.iter().all(|&cell| {
            !self.board.is_blocked(cell)
                && cell != self.player.position
                && !self
                    .enemies
                    .iter()
                    .enumerate()
                    .any(|(i, e)| i != moving_idx && e.occupies(cell))
        })
    }

    /// Total items the stage started with.
    pub fn initial_item_count(&self) -> usize {
        self.items.len() + self.player.collected_items.len() + self.player.disposed_items.len()
    }

    /// Stamina value, when the stage enables the system.
    pub fn stamina(&self) -> Option<i32> {
        self.player.stamina.map(|s| s.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_board(w: i32, h: i32) -> Board {
        Board {
            width: w,
            height: h,
            walls: BTreeSet::new(),
            forbidden: BTreeSet::new(),
            goal: Position::new(w - 1, h - 1),
            legend: BTreeMap::new(),
        }
    }

    fn enemy(kind: EnemyKind, pos: Position) -> EnemyState {
        EnemyState {
            id: EnemyId::from("e1"),
            kind,
            position: pos,
            direction: Direction::S,
            hp: 30,
            max_hp: 30,
            attack_power: 10,
            vision_range: 2,
            alerted: false,
            alert_cooldown: 0,
            patrol: None,
            rage: RageState::Calm,
            rage_retrigger: false,
            rage_threshold_pct: 50,
            area_attack_range: 1,
            required_sequence: Vec::new(),
            hunting: false,
        }
    }

    #[test]
    fn footprint_cells_for_each_kind() {
        let e = enemy(EnemyKind::Normal, Position::new(2, 2));
        assert_eq!(e.footprint().as_slice(), &[Position::new(2, 2)]);

        let e = enemy(EnemyKind::Large2x2, Position::new(2, 2));
        assert_eq!(e.footprint().len(), 4);
        assert!(e.occupies(Position::new(3, 3)));
        assert!(!e.occupies(Position::new(4, 2)));

        let e = enemy(EnemyKind::Special2x3, Position::new(1, 1));
        assert_eq!(e.footprint().len(), 6);
        assert!(e.occupies(Position::new(2, 3)));
        assert!(!e.occupies(Position::new(3, 1)));
    }

    #[test]
    fn board_bounds_and_walls() {
        let mut board = empty_board(5, 5);
        board.walls.insert(Position::new(2, 2));
        assert!(board.in_bounds(Position::new(0, 0)));
        assert!(board.in_bounds(Position::new(4, 4)));
        assert!(!board.in_bounds(Position::new(5, 0)));
        assert!(!board.in_bounds(Position::new(0, -1)));
        assert!(board.is_blocked(Position::new(2, 2)));
        assert!(!board.is_blocked(Position::new(1, 2)));
    }

    #[test]
    fn hp_ratio_clamps_at_zero() {
        let mut e = enemy(EnemyKind::Normal, Position::new(0, 0));
        e.hp = -5;
        assert_eq!(e.hp_ratio(), 0.0);
        e.hp = 15;
        assert_eq!(e.hp_ratio(), 0.5);
    }

    #[test]
    fn distance_to_uses_nearest_footprint_cell() {
        let e = enemy(EnemyKind::Large2x2, Position::new(2, 2));
        // Nearest cell to (5, 3) is (3, 3).
        assert_eq!(e.distance_to(Position::new(5, 3)), 2);
        assert_eq!(e.distance_to(Position::new(2, 2)), 0);
    }

    #[test]
    fn state_flags_serde_round_trip() {
        let flags = StateFlags::STAMINA_ENABLED | StateFlags::COLLECT_ALL_ITEMS;
        let json = serde_json::to_string(&flags).unwrap();
        let back: StateFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }
}
