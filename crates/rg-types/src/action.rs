//! Player action types and execution results.
//!
//! `Action` covers the turn-consuming surface only. Queries (`see`,
//! `get_stage_info`, `is_available`, `get_stamina`) never enter the turn
//! pipeline and therefore are not actions.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::grid::{Direction, Position};
use crate::ids::{EnemyId, ItemId};

/// A turn-consuming player action.
///
/// Serialized as a lowercase token so solution files read as plain action
/// sequences: `["turn_right", "move", "move", "attack"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    TurnLeft,
    TurnRight,
    Move,
    Attack,
    Pickup,
    Dispose,
    Wait,
}

impl Action {
    /// Canonical enumeration order; also the successor expansion order in
    /// the solver, so it must stay stable.
    pub const ALL: [Self; 7] = [
        Self::TurnLeft,
        Self::TurnRight,
        Self::Move,
        Self::Attack,
        Self::Pickup,
        Self::Dispose,
        Self::Wait,
    ];

    /// Flag bit for the allowed-API mask.
    pub const fn flag(self) -> ActionSet {
        match self {
            Self::TurnLeft => ActionSet::TURN_LEFT,
            Self::TurnRight => ActionSet::TURN_RIGHT,
            Self::Move => ActionSet::MOVE,
            Self::Attack => ActionSet::ATTACK,
            Self::Pickup => ActionSet::PICKUP,
            Self::Dispose => ActionSet::DISPOSE,
            Self::Wait => ActionSet::WAIT,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Pickup => "pickup",
            Self::Dispose => "dispose",
            Self::Wait => "wait",
        };
        f.write_str(s)
    }
}

bitflags! {
    /// The stage's allowed-API mask (`constraints.allowed_apis`), packed
    /// into a u16. Query APIs are always available and carry no bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionSet: u16 {
        const TURN_LEFT  = 1 << 0;
        const TURN_RIGHT = 1 << 1;
        const MOVE       = 1 << 2;
        const ATTACK     = 1 << 3;
        const PICKUP     = 1 << 4;
        const DISPOSE    = 1 << 5;
        const WAIT       = 1 << 6;
    }
}

impl ActionSet {
    /// Every turn-consuming action.
    pub const fn full() -> Self {
        Self::all()
    }

    pub fn allows(self, action: Action) -> bool {
        self.contains(action.flag())
    }
}

// Manual serde for ActionSet as a u16 value.
impl Serialize for ActionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u16::deserialize(deserializer)?;
        Ok(ActionSet::from_bits_truncate(bits))
    }
}

/// One structured entry in `ExecutionResult::state_changes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateChange {
    PlayerMoved { from: Position, to: Position },
    PlayerTurned { from: Direction, to: Direction },
    PlayerDamaged { amount: i32, source: DamageSource },
    PlayerHealed { amount: i32 },
    AttackBoosted { amount: i32 },
    StaminaRecovered { amount: i32 },
    EnemyDamaged { id: EnemyId, amount: i32, remaining: i32 },
    EnemyDefeated { id: EnemyId },
    ItemCollected { id: ItemId },
    ItemDisposed { id: ItemId },
}

/// Where player damage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageSource {
    EnemyStrike,
    AreaAttack,
    Bomb,
}

/// Result of a turn-consuming action. A failed precondition (blocked move,
/// dispose on an empty tile) is `success = false` with the turn still
/// consumed — never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    pub state_changes: Vec<StateChange>,
}

impl ExecutionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            state_changes: Vec::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            state_changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: StateChange) -> Self {
        self.state_changes.push(change);
        self
    }
}
