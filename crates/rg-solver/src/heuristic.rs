//! Domain heuristic for the A* search.
//!
//! Combines goal distance, the attack turns still owed to mandatory enemies
//! (those named in an alive watcher's required sequence), the detour cost of
//! outstanding mandatory items, and a small bonus when a beneficial item
//! sits on a shortest path anyway. Admissible in spirit: each term counts
//! turns the player cannot avoid spending, and the bonus never drives the
//! estimate below zero.

use rg_types::enums::GameStatus;
use rg_types::state::{GameState, StateFlags};

/// Estimated turns from `state` to a win.
pub fn heuristic(state: &GameState) -> u32 {
    if state.status == GameStatus::Won {
        return 0;
    }

    let player = state.player.position;
    let goal = state.board.goal;
    let goal_dist = player.manhattan(goal);
    let mut h = goal_dist;

    // Enemies named by an alive conditional watcher must still be felled,
    // at ceil(hp / attack_power) attack turns each.
    let attack = state.player.attack_power.max(1) as u32;
    for watcher in state.enemies.iter().filter(|e| !e.required_sequence.is_empty()) {
        for target_id in &watcher.required_sequence {
            if let Some(target) = state.enemy_by_id(target_id) {
                h += (target.hp.max(0) as u32).div_ceil(attack);
            }
        }
    }

    if state.flags.contains(StateFlags::COLLECT_ALL_ITEMS) && !state.items.is_empty() {
        // One pickup/dispose turn per outstanding item, plus the shortest
        // single-item detour off the direct route.
        h += state.items.len() as u32;
        let detour = state
            .items
            .iter()
            .map(|item| player.manhattan(item.position) + item.position.manhattan(goal))
            .min()
            .unwrap_or(goal_dist)
            .saturating_sub(goal_dist);
        h += detour;
    } else {
        // A beneficial pickup that costs no detour is worth leaning toward.
        let free_boost = state.items.iter().any(|item| {
            item.kind.is_beneficial()
                && (item.attack_bonus > 0 || item.heal > 0)
                && player.manhattan(item.position) + item.position.manhattan(goal) == goal_dist
        });
        if free_boost {
            h = h.saturating_sub(1);
        }
    }

    h
}
