//! Query surface — pure projections of `GameState` into observation types.
//!
//! None of these mutate state or advance the clock; they are what external
//! drivers (renderers, user solve code) are allowed to know.

use std::collections::BTreeMap;

use rg_types::grid::Position;
use rg_types::observe::*;
use rg_types::state::GameState;

/// `see`: player snapshot, four-way neighbors, and the vision map of every
/// cell within Manhattan `vision_range` of the player.
pub fn see(state: &GameState, vision_range: u32) -> Observation {
    let player_pos = state.player.position;
    let r = vision_range as i32;

    let mut vision = BTreeMap::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx.abs() + dy.abs() > r {
                continue;
            }
            let pos = Position::new(player_pos.x + dx, player_pos.y + dy);
            vision.insert(pos, cell_view(state, pos));
        }
    }

    Observation {
        player: PlayerView {
            position: player_pos,
            direction: state.player.direction,
            hp: state.player.hp,
            max_hp: state.player.max_hp,
            attack_power: state.player.attack_power,
            stamina: state.stamina(),
            collected_items: state.player.collected_items.clone(),
            disposed_items: state.player.disposed_items.clone(),
        },
        neighbors: NeighborView {
            north: state.cell_kind(player_pos.step(rg_types::Direction::N)),
            east: state.cell_kind(player_pos.step(rg_types::Direction::E)),
            south: state.cell_kind(player_pos.step(rg_types::Direction::S)),
            west: state.cell_kind(player_pos.step(rg_types::Direction::W)),
        },
        vision,
        status: state.status,
        turn_count: state.turn_count,
    }
}

fn cell_view(state: &GameState, pos: Position) -> CellView {
    let kind = state.cell_kind(pos);
    let enemy = state.enemy_at(pos).map(|idx| {
        let e = &state.enemies[idx];
        EnemyView {
            id: e.id.clone(),
            kind: e.kind,
            alerted: e.alerted,
            hp_ratio: e.hp_ratio(),
        }
    });
    let item = state.item_at(pos).map(|idx| {
        let i = &state.items[idx];
        ItemView {
            id: i.id.clone(),
            kind: i.kind,
        }
    });
    CellView { kind, enemy, item }
}

/// `get_stage_info`: static stage metadata. Enemy and item listings reflect
/// the state this is called on — capture it on the freshly loaded state to
/// get the initial roster.
pub fn get_stage_info(state: &GameState) -> StageInfo {
    StageInfo {
        stage_id: state.stage_id.clone(),
        width: state.board.width,
        height: state.board.height,
        goal: state.board.goal,
        max_turns: state.max_turns,
        allowed_actions: state.allowed_actions,
        walls: state.board.walls.iter().copied().collect(),
        forbidden: state.board.forbidden.iter().copied().collect(),
        initial_enemies: state
            .enemies
            .iter()
            .map(|e| EnemyInfo {
                id: e.id.clone(),
                kind: e.kind,
                position: e.position,
                hp: e.hp,
                attack_power: e.attack_power,
                vision_range: e.vision_range,
            })
            .collect(),
        initial_items: state
            .items
            .iter()
            .map(|i| ItemInfo {
                id: i.id.clone(),
                kind: i.kind,
                position: i.position,
            })
            .collect(),
    }
}

/// `is_available`: whether the item under the player is beneficial.
pub fn is_available(state: &GameState) -> bool {
    state
        .item_at(state.player.position)
        .is_some_and(|idx| state.items[idx].kind.is_beneficial())
}

/// `get_stamina`: the current stamina value, when the system is enabled.
pub fn get_stamina(state: &GameState) -> Option<i32> {
    state.stamina()
}
