//! Turn scheduler — the strict per-turn ordering.
//!
//! One `execute_turn` call is one full turn: flag reset → player action →
//! enemy updates in stable initial order (deaths resolved after each enemy)
//! → conditional-sequence completion → wait recovery → turn increment →
//! terminal checks. Queries never come through here; a turn is atomic.

use rg_types::action::{Action, ExecutionResult, StateChange};
use rg_types::enums::GameStatus;
use rg_types::ids::EnemyId;
use rg_types::state::{GameState, StateFlags};

use crate::combat::resolve_deaths;
use crate::enemy_ai::update_enemy;
use crate::kernel::apply_action;
use crate::rules::RuleConfig;

/// Execute one turn-consuming action and everything that follows from it.
///
/// Returns the `ExecutionResult` for the player action, extended with the
/// structured changes caused by the enemy phase. On a terminal state or a
/// disallowed API the call is rejected without consuming a turn.
pub fn execute_turn(state: &mut GameState, rules: &RuleConfig, action: Action) -> ExecutionResult {
    if state.is_over() {
        return ExecutionResult::failed("the game is already over");
    }
    if !state.allowed_actions.allows(action) {
        return ExecutionResult::failed(format!("{action} is not allowed in this stage"));
    }

    // 1. Reset per-turn flags.
    state.flags.remove(StateFlags::PLAYER_ATTACKED_THIS_TURN);

    // 2. Player action.
    let mut result = apply_action(state, rules, action);

    // Stamina drains on every consumed turn except waiting.
    if action != Action::Wait {
        if let Some(stamina) = &mut state.player.stamina {
            stamina.current = (stamina.current - rules.stamina_drain).max(0);
        }
    }

    // 3. Enemy updates, stable by initial order. Iterating by id keeps the
    // walk correct when an update removes an enemy mid-phase.
    let ids: Vec<EnemyId> = state.enemies.iter().map(|e| e.id.clone()).collect();
    for id in ids {
        let Some(idx) = state.enemies.iter().position(|e| e.id == id) else {
            continue;
        };
        result.state_changes.extend(update_enemy(state, rules, idx));
        result.state_changes.extend(resolve_deaths(state));
    }

    // Conditional sequences complete at end of turn.
    result
        .state_changes
        .extend(resolve_conditional_completion(state));

    // Safe waiting recovers stamina; enemy pressure cancels it.
    if action == Action::Wait {
        if let Some(change) = recover_stamina(state, rules) {
            result.state_changes.push(change);
        }
    }

    // 4. Turn accounting precedes the terminal checks so terminal reports
    // carry the 1-based count of consumed turns.
    state.turn_count += 1;

    // 5. Terminal checks: won before failed.
    let collect_done =
        !state.flags.contains(StateFlags::COLLECT_ALL_ITEMS) || state.items.is_empty();
    if state.player.position == state.board.goal && collect_done {
        state.status = GameStatus::Won;
        log::debug!("stage won at turn {}", state.turn_count);
    } else if state.player.is_dead() || state.turn_count >= state.max_turns {
        state.status = GameStatus::Failed;
        log::debug!("stage failed at turn {}", state.turn_count);
    }

    result
}

/// Remove every conditional enemy whose required sequence has completed,
/// in stable order.
fn resolve_conditional_completion(state: &mut GameState) -> Vec<StateChange> {
    let mut changes = Vec::new();
    let mut idx = 0;
    while idx < state.enemies.len() {
        let enemy = &state.enemies[idx];
        let completed = enemy.kind.has_conditional_kill()
            && !enemy.required_sequence.is_empty()
            && {
                let observed: Vec<_> = state
                    .defeated_order
                    .iter()
                    .filter(|id| enemy.required_sequence.contains(id))
                    .cloned()
                    .collect();
                observed == enemy.required_sequence
            };
        if completed {
            let removed = state.enemies.remove(idx);
            log::debug!("enemy {} released by completed kill order", removed.id);
            state.defeated_order.push(removed.id.clone());
            changes.push(StateChange::EnemyDefeated { id: removed.id });
        } else {
            idx += 1;
        }
    }
    changes
}

/// Wait recovery: only when the stamina system is on, no enemy is alerted,
/// and nothing hit the player this turn.
fn recover_stamina(state: &mut GameState, rules: &RuleConfig) -> Option<StateChange> {
    if !state.flags.contains(StateFlags::STAMINA_ENABLED) {
        return None;
    }
    if state.flags.contains(StateFlags::PLAYER_ATTACKED_THIS_TURN) {
        return None;
    }
    if state.enemies.iter().any(|e| e.alerted) {
        return None;
    }
    let stamina = state.player.stamina.as_mut()?;
    let before = stamina.current;
    stamina.current = (stamina.current + rules.stamina_recovery).min(stamina.max);
    let amount = stamina.current - before;
    (amount > 0).then_some(StateChange::StaminaRecovered { amount })
}
