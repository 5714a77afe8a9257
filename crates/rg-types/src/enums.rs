//! Shared enums — entity kinds, item kinds, game status, rage states.

use serde::{Deserialize, Serialize};

/// Enemy size/behavior variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// 1x1 enemy.
    #[serde(rename = "normal")]
    Normal,
    /// 2x2 enemy with a rage cycle.
    #[serde(rename = "large_2x2")]
    Large2x2,
    /// 3x3 enemy with a rage cycle.
    #[serde(rename = "large_3x3")]
    Large3x3,
    /// 2x3 enemy with a required kill-order condition.
    #[serde(rename = "special_2x3")]
    Special2x3,
}

impl EnemyKind {
    /// Footprint dimensions (width, height) in cells.
    pub const fn footprint_size(self) -> (i32, i32) {
        match self {
            Self::Normal => (1, 1),
            Self::Large2x2 => (2, 2),
            Self::Large3x3 => (3, 3),
            Self::Special2x3 => (2, 3),
        }
    }

    /// Whether this kind runs the rage cycle when wounded past half HP.
    pub const fn has_rage(self) -> bool {
        matches!(self, Self::Large2x2 | Self::Large3x3)
    }

    /// Whether this kind watches kill order and hunts on violation.
    pub const fn has_conditional_kill(self) -> bool {
        matches!(self, Self::Special2x3)
    }
}

/// Item variant. `Bomb` is detrimental; everything else is beneficial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Key,
    Weapon,
    Potion,
    Bomb,
}

impl ItemKind {
    pub const fn is_detrimental(self) -> bool {
        matches!(self, Self::Bomb)
    }

    pub const fn is_beneficial(self) -> bool {
        !self.is_detrimental()
    }
}

/// Overall game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    Won,
    Failed,
}

impl GameStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Rage cycle state for large enemies.
///
/// `Calm` →(damage at ≤50% HP, or any damage once sticky)→ `Triggered`
/// →(one no-op update)→ `AreaAttacking` →(area strike)→ `Cooldown`
/// →(next update)→ `Calm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RageState {
    Calm,
    Triggered,
    AreaAttacking,
    Cooldown,
}

impl RageState {
    /// Whether the enemy is mid-cycle (transition or strike pending).
    /// A large enemy at 0 HP in this window stays on the board until the
    /// area attack resolves.
    pub const fn is_cycling(self) -> bool {
        matches!(self, Self::Triggered | Self::AreaAttacking)
    }
}

/// What a board cell resolves to from the player's point of view.
/// Priority when several apply: wall > enemy > item > goal > empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    /// Outside the board.
    Boundary,
    /// Configured impassable tile, distinct from walls.
    Forbidden,
    Goal,
    Enemy,
    Item,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_sizes() {
        assert_eq!(EnemyKind::Normal.footprint_size(), (1, 1));
        assert_eq!(EnemyKind::Large2x2.footprint_size(), (2, 2));
        assert_eq!(EnemyKind::Large3x3.footprint_size(), (3, 3));
        assert_eq!(EnemyKind::Special2x3.footprint_size(), (2, 3));
    }

    #[test]
    fn only_bombs_are_detrimental() {
        assert!(ItemKind::Bomb.is_detrimental());
        assert!(ItemKind::Key.is_beneficial());
        assert!(ItemKind::Weapon.is_beneficial());
        assert!(ItemKind::Potion.is_beneficial());
    }

    #[test]
    fn serde_snake_case_tags() {
        assert_eq!(
            serde_json::to_string(&EnemyKind::Large2x2).unwrap(),
            "\"large_2x2\""
        );
        assert_eq!(
            serde_json::to_string(&RageState::AreaAttacking).unwrap(),
            "\"area_attacking\""
        );
        let kind: EnemyKind = serde_json::from_str("\"special_2x3\"").unwrap();
        assert_eq!(kind, EnemyKind::Special2x3);
    }
}
