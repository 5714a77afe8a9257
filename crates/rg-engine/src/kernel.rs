//! Action kernel — one dispatch per action kind.
//!
//! `apply_action` mutates the state for the player half of a turn and
//! returns the `ExecutionResult`. It never runs enemy updates, never touches
//! `turn_count`, and never rejects a legal-but-ineffective action: a blocked
//! move or an empty-handed dispose is `success = false` with the turn still
//! consumed by the scheduler.

use rg_types::action::{Action, DamageSource, ExecutionResult, StateChange};
use rg_types::enums::CellKind;
use rg_types::state::GameState;

use crate::combat::damage_enemy;
use crate::rules::RuleConfig;

/// Execute the player half of a turn. The caller (scheduler) owns flag
/// reset, enemy updates, stamina drain and terminal checks.
pub fn apply_action(state: &mut GameState, rules: &RuleConfig, action: Action) -> ExecutionResult {
    match action {
        Action::TurnLeft => apply_turn(state, true),
        Action::TurnRight => apply_turn(state, false),
        Action::Move => apply_move(state),
        Action::Attack => apply_attack(state, rules),
        Action::Pickup => apply_pickup(state),
        Action::Dispose => apply_dispose(state),
        Action::Wait => ExecutionResult::ok("waiting"),
    }
}

// =============================================================================
// Rotation
// =============================================================================

fn apply_turn(state: &mut GameState, left: bool) -> ExecutionResult {
    let from = state.player.direction;
    let to = if left { from.turn_left() } else { from.turn_right() };
    state.player.direction = to;
    ExecutionResult::ok(format!("now facing {to}"))
        .with_change(StateChange::PlayerTurned { from, to })
}

// =============================================================================
// Movement
// =============================================================================

fn apply_move(state: &mut GameState) -> ExecutionResult {
    if stamina_exhausted(state) {
        return ExecutionResult::failed("too exhausted to move");
    }

    let from = state.player.position;
    let to = from.step(state.player.direction);

    match state.cell_kind(to) {
        CellKind::Boundary => ExecutionResult::failed("blocked by the board edge"),
        CellKind::Wall => ExecutionResult::failed("blocked by a wall"),
        CellKind::Forbidden => ExecutionResult::failed("that tile cannot be entered"),
        CellKind::Enemy => ExecutionResult::failed("blocked by an enemy"),
        CellKind::Empty | CellKind::Item | CellKind::Goal => {
            state.player.position = to;
            ExecutionResult::ok(format!("moved to {to}"))
                .with_change(StateChange::PlayerMoved { from, to })
        }
    }
}

// =============================================================================
// Attack
// =============================================================================

fn apply_attack(state: &mut GameState, _rules: &RuleConfig) -> ExecutionResult {
    if stamina_exhausted(state) {
        return ExecutionResult::failed("too exhausted to attack");
    }

    let front = state.player.position.step(state.player.direction);
    let Some(idx) = state.enemy_at(front) else {
        return ExecutionResult::failed("nothing to attack");
    };

    let target = state.enemies[idx].id.clone();
    let changes = damage_enemy(state, idx, state.player.attack_power);
    let mut result = ExecutionResult::ok(format!("attacked {target}"));
    result.state_changes = changes;
    result
}

// =============================================================================
// Items
// =============================================================================

fn apply_pickup(state: &mut GameState) -> ExecutionResult {
    let Some(idx) = state.item_at(state.player.position) else {
        return ExecutionResult::failed("no item here");
    };

    let item = state.items.remove(idx);
    state.player.collected_items.push(item.id.clone());

    let mut result = ExecutionResult::ok(format!("picked up {}", item.id))
        .with_change(StateChange::ItemCollected {
            id: item.id.clone(),
        });

    if item.kind.is_detrimental() {
        let change = crate::combat::damage_player(state, item.damage, DamageSource::Bomb);
        result.state_changes.push(change);
        result.message = format!("picked up {} and took {} damage", item.id, item.damage);
        return result;
    }

    if item.attack_bonus > 0 {
        state.player.attack_power += item.attack_bonus;
        result.state_changes.push(StateChange::AttackBoosted {
            amount: item.attack_bonus,
        });
    }
    if item.heal > 0 {
        let before = state.player.hp;
        state.player.hp = (state.player.hp + item.heal).min(state.player.max_hp);
        let healed = state.player.hp - before;
        if healed > 0 {
            result.state_changes.push(StateChange::PlayerHealed { amount: healed });
        }
    }
    result
}

fn apply_dispose(state: &mut GameState) -> ExecutionResult {
    let Some(idx) = state.item_at(state.player.position) else {
        return ExecutionResult::failed("no item here");
    };
    if !state.items[idx].kind.is_detrimental() {
        return ExecutionResult::failed("only detrimental items can be disposed");
    }

    let item = state.items.remove(idx);
    state.player.disposed_items.push(item.id.clone());
    ExecutionResult::ok(format!("disposed of {}", item.id))
        .with_change(StateChange::ItemDisposed { id: item.id })
}

// =============================================================================
// Stamina
// =============================================================================

fn stamina_exhausted(state: &GameState) -> bool {
    matches!(state.player.stamina, Some(s) if s.current <= 0)
}
