//! Productive action enumeration.
//!
//! `enumerate_actions` lists, in the canonical `Action::ALL` order, every
//! allowed action whose preconditions hold. The contract mirrors the kernel:
//! every enumerated action executes with `success = true` — the solver
//! expands exactly this set, so a miss here is a hole in the search space
//! and a false entry is a wasted node.

use rg_types::action::Action;
use rg_types::enums::CellKind;
use rg_types::state::GameState;

use crate::rules::RuleConfig;

/// Enumerate the productive actions for the current state.
///
/// `wait` is always productive; rotations are productive whenever allowed.
/// Returns an empty list on a terminal state.
pub fn enumerate_actions(state: &GameState, _rules: &RuleConfig) -> Vec<Action> {
    if state.is_over() {
        return Vec::new();
    }

    let exhausted = matches!(state.player.stamina, Some(s) if s.current <= 0);
    let front = state.player.position.step(state.player.direction);

    Action::ALL
        .into_iter()
        .filter(|action| state.allowed_actions.allows(*action))
        .filter(|action| match action {
            Action::TurnLeft | Action::TurnRight | Action::Wait => true,
            Action::Move => {
                !exhausted
                    && matches!(
                        state.cell_kind(front),
                        CellKind::Empty | CellKind::Item | CellKind::Goal
                    )
            }
            Action::Attack => !exhausted && state.enemy_at(front).is_some(),
            Action::Pickup => state.item_at(state.player.position).is_some(),
            Action::Dispose => state
                .item_at(state.player.position)
                .is_some_and(|idx| state.items[idx].kind.is_detrimental()),
        })
        .collect()
}
