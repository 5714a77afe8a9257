//! Damage resolution — enemy wounding, rage triggering, death bookkeeping.
//!
//! Deaths are resolved through `resolve_deaths` so that removal order stays
//! stable (initial index order) and every removal lands in
//! `state.defeated_order`, which drives the conditional-kill watcher.

use rg_types::action::{DamageSource, StateChange};
use rg_types::enums::RageState;
use rg_types::state::GameState;

/// Apply `amount` damage to the enemy at `idx`.
///
/// Handles the rage trigger: large enemies whose HP crosses the configured
/// threshold (or who take any damage once the re-trigger flag is set) enter
/// `Triggered` unless already mid-cycle. The enemy is not removed here even
/// at 0 HP — removal happens in `resolve_deaths`, and an enemy mid-rage
/// survives until its area attack resolves.
pub fn damage_enemy(state: &mut GameState, idx: usize, amount: i32) -> Vec<StateChange> {
    let enemy = &mut state.enemies[idx];
    let hp_before = enemy.hp;
    enemy.hp = (enemy.hp - amount).max(0);

    let mut changes = vec![StateChange::EnemyDamaged {
        id: enemy.id.clone(),
        amount,
        remaining: enemy.hp,
    }];

    if enemy.kind.has_rage() && enemy.hp > 0 {
        let threshold = enemy.max_hp as i64 * enemy.rage_threshold_pct as i64;
        let crossed = hp_before as i64 * 100 > threshold && enemy.hp as i64 * 100 <= threshold;
        if crossed {
            enemy.rage_retrigger = true;
        }
        if (crossed || enemy.rage_retrigger) && !enemy.rage.is_cycling() {
            enemy.rage = RageState::Triggered;
        }
    }

    changes.extend(resolve_deaths(state));
    changes
}

/// Remove every enemy at 0 HP that is not mid-rage-cycle, in stable order,
/// recording each removal in `defeated_order`.
pub fn resolve_deaths(state: &mut GameState) -> Vec<StateChange> {
    let mut changes = Vec::new();
    let mut idx = 0;
    while idx < state.enemies.len() {
        let enemy = &state.enemies[idx];
        if enemy.hp <= 0 && !enemy.rage.is_cycling() {
            let removed = state.enemies.remove(idx);
            log::debug!("enemy {} defeated", removed.id);
            state.defeated_order.push(removed.id.clone());
            changes.push(StateChange::EnemyDefeated { id: removed.id });
        } else {
            idx += 1;
        }
    }
    changes
}

/// Apply damage to the player, clamped at 0 HP. Enemy-sourced damage marks
/// the player as attacked this turn (bombs do not — that flag exists for
/// the wait-recovery rule, which only cares about enemy pressure).
pub fn damage_player(state: &mut GameState, amount: i32, source: DamageSource) -> StateChange {
    state.player.hp = (state.player.hp - amount).max(0);
    if matches!(source, DamageSource::EnemyStrike | DamageSource::AreaAttack) {
        state
            .flags
            .insert(rg_types::state::StateFlags::PLAYER_ATTACKED_THIS_TURN);
    }
    StateChange::PlayerDamaged { amount, source }
}
