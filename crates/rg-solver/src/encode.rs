//! Search-node encoding — structural equality/hash key over a `GameState`.
//!
//! The key covers every field the engine observes: projecting anything out
//! would let the search merge states the engine can still tell apart, which
//! breaks the parity contract. The immutable board is the one thing left
//! out — all nodes share it.

use rg_types::enums::{GameStatus, RageState};
use rg_types::grid::{Direction, Position};
use rg_types::ids::{EnemyId, ItemId};
use rg_types::state::{GameState, StateFlags};

/// Hashable identity of a game state for the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchKey {
    player: PlayerKey,
    enemies: Vec<EnemyKey>,
    items: Vec<ItemId>,
    defeated: Vec<EnemyId>,
    status: GameStatus,
    attacked_this_turn: bool,
    turn_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PlayerKey {
    position: Position,
    direction: Direction,
    hp: i32,
    attack_power: i32,
    stamina: Option<i32>,
    collected: Vec<ItemId>,
    disposed: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EnemyKey {
    id: EnemyId,
    position: Position,
    direction: Direction,
    hp: i32,
    alerted: bool,
    alert_cooldown: u32,
    patrol_index: Option<usize>,
    rage: RageState,
    rage_retrigger: bool,
    hunting: bool,
}

impl SearchKey {
    pub fn of(state: &GameState) -> Self {
        Self {
            player: PlayerKey {
                position: state.player.position,
                direction: state.player.direction,
                hp: state.player.hp,
                attack_power: state.player.attack_power,
                stamina: state.stamina(),
                collected: state.player.collected_items.clone(),
                disposed: state.player.disposed_items.clone(),
            },
            enemies: state
                .enemies
                .iter()
                .map(|e| EnemyKey {
                    id: e.id.clone(),
                    position: e.position,
                    direction: e.direction,
                    hp: e.hp,
                    alerted: e.alerted,
                    alert_cooldown: e.alert_cooldown,
                    patrol_index: e.patrol.as_ref().map(|p| p.index),
                    rage: e.rage,
                    rage_retrigger: e.rage_retrigger,
                    hunting: e.hunting,
                })
                .collect(),
            items: state.items.iter().map(|i| i.id.clone()).collect(),
            defeated: state.defeated_order.clone(),
            status: state.status,
            attacked_this_turn: state
                .flags
                .contains(StateFlags::PLAYER_ATTACKED_THIS_TURN),
            turn_count: state.turn_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_stage::load_stage;

    const STAGE: &str = r#"
id: key_test
board:
  size: [4, 4]
  grid:
    - "...."
    - "...."
    - "...."
    - "...."
  legend:
    ".": empty
player:
  start: [0, 0]
  direction: E
goal:
  position: [3, 3]
constraints:
  max_turns: 10
  allowed_apis: [move, turn_left, turn_right, wait]
"#;

    #[test]
    fn identical_states_share_a_key() {
        let a = load_stage(STAGE).unwrap();
        let b = load_stage(STAGE).unwrap();
        assert_eq!(SearchKey::of(&a), SearchKey::of(&b));
    }

    #[test]
    fn player_and_clock_fields_distinguish_keys() {
        let base = load_stage(STAGE).unwrap();

        let mut moved = base.clone();
        moved.player.position = Position::new(1, 0);
        assert_ne!(SearchKey::of(&base), SearchKey::of(&moved));

        let mut later = base.clone();
        later.turn_count += 1;
        assert_ne!(SearchKey::of(&base), SearchKey::of(&later));
    }
}
