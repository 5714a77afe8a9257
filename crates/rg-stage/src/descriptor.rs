//! Declarative stage descriptor — the YAML schema stages are written in.
//!
//! The descriptor is pure data; all validation and `GameState` construction
//! happens in the loader. Positions are `[x, y]` pairs, the grid is a list
//! of legend-encoded row strings, and entity placement comes from the
//! `enemies` / `items` lists (the grid only carries terrain).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rg_types::enums::{EnemyKind, ItemKind};
use rg_types::grid::Direction;

/// `[x, y]` coordinate pair as written in stage files.
pub type Coord = (i32, i32);

/// Top-level stage descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub id: String,
    pub board: BoardDescriptor,
    pub player: PlayerDescriptor,
    pub goal: GoalDescriptor,
    #[serde(default)]
    pub enemies: Vec<EnemyDescriptor>,
    #[serde(default)]
    pub items: Vec<ItemDescriptor>,
    pub constraints: ConstraintsDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_conditions: Option<StageConditions>,
}

/// Board geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDescriptor {
    /// `[width, height]`.
    pub size: Coord,
    /// Legend-encoded rows, top to bottom.
    pub grid: Vec<String>,
    /// Maps grid characters to semantic names
    /// (`empty`, `wall`, `forbidden`, `goal`, `start`).
    pub legend: BTreeMap<char, String>,
}

/// Player start configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    pub start: Coord,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_power: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamina: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stamina: Option<i32>,
}

/// Goal cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDescriptor {
    pub position: Coord,
}

/// One enemy entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EnemyKind,
    pub position: Coord,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_power: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<EnemyBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patrol: Vec<Coord>,
    /// Fraction of max HP at or below which the rage cycle triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rage_threshold: Option<f64>,
    /// Chebyshev radius of the area attack around the footprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_attack_range: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_conditions: Option<EnemyConditions>,
}

/// Declared idle behavior. Defaults to `patrol` when waypoints are present,
/// `static` otherwise; when given explicitly it must match the waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyBehavior {
    Static,
    Patrol,
}

/// Per-enemy special conditions (the 2x3 conditional enemy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConditions {
    /// Enemy IDs that must be defeated, in exactly this order.
    pub required_sequence: Vec<String>,
}

/// One item entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub position: Coord,
    /// Damage dealt on pickup (bombs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    /// HP restored on pickup (potions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal: Option<i32>,
    /// Instantaneous equip effect applied on pickup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<ItemEffect>,
}

/// Equip-on-pickup effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemEffect {
    AttackBoost { amount: i32 },
}

/// Stage constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintsDescriptor {
    pub max_turns: u32,
    /// API names the stage allows. Query APIs (`see`, `get_stage_info`,
    /// `is_available`, `get_stamina`) are always available; listing them is
    /// legal and ignored.
    pub allowed_apis: Vec<String>,
}

/// Stage-level special conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConditions {
    /// Enable the stamina system.
    #[serde(default)]
    pub stamina: bool,
    /// Winning requires every initial item collected or disposed.
    #[serde(default)]
    pub collect_all_items: bool,
}

impl StageDescriptor {
    /// Serialize to the canonical on-disk YAML form.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
id: basic_move
board:
  size: [5, 5]
  grid:
    - "....."
    - "....."
    - "..#.."
    - "....."
    - "....G"
  legend:
    ".": empty
    "#": wall
    "G": goal
player:
  start: [0, 0]
  direction: N
goal:
  position: [4, 4]
constraints:
  max_turns: 20
  allowed_apis: [turn_left, turn_right, move, wait, see]
"##;

    #[test]
    fn minimal_descriptor_parses() {
        let desc: StageDescriptor = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(desc.id, "basic_move");
        assert_eq!(desc.board.size, (5, 5));
        assert_eq!(desc.player.start, (0, 0));
        assert_eq!(desc.player.direction, Direction::N);
        assert!(desc.enemies.is_empty());
        assert!(desc.items.is_empty());
        assert_eq!(desc.constraints.max_turns, 20);
    }

    #[test]
    fn enemy_entry_parses_with_patrol_and_conditions() {
        let yaml = r#"
id: e
type: special_2x3
position: [3, 1]
direction: S
patrol: [[1, 1], [4, 1]]
special_conditions:
  required_sequence: [brute, giant]
"#;
        let enemy: EnemyDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(enemy.kind, EnemyKind::Special2x3);
        assert_eq!(enemy.patrol, vec![(1, 1), (4, 1)]);
        assert_eq!(
            enemy.special_conditions.unwrap().required_sequence,
            vec!["brute".to_string(), "giant".to_string()]
        );
    }

    #[test]
    fn descriptor_round_trips_through_yaml() {
        let desc: StageDescriptor = serde_yaml::from_str(MINIMAL).unwrap();
        let yaml = desc.to_yaml().unwrap();
        let back: StageDescriptor = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, desc);
    }
}
