//! Parity harness — lockstep replay of two runtimes with field-precise
//! snapshot comparison.
//!
//! A solver-certified sequence must replay on the engine to `Won` with every
//! intermediate state identical. Both runtimes here are instances of the
//! same kernel by construction; the harness exists to enforce and verify
//! that contract, and to pin down exactly which field drifted first if it
//! is ever broken.

use serde::Serialize;
use thiserror::Error;

use rg_engine::{execute_turn, RuleConfig};
use rg_types::action::Action;
use rg_types::enums::GameStatus;
use rg_types::state::GameState;

// =============================================================================
// Divergence reporting
// =============================================================================

/// How damaging a mismatch in this field is for the candidate solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

/// The first point where the two runtimes disagreed.
#[derive(Debug, Clone, Serialize)]
pub struct Divergence {
    /// 0-based index into the action sequence.
    pub step: usize,
    pub action: Action,
    pub field: String,
    pub engine_value: String,
    pub solver_value: String,
    pub severity: Severity,
}

impl std::fmt::Display for Divergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "step {} ({}): {} diverged — engine {}, solver {} [{:?}]",
            self.step, self.action, self.field, self.engine_value, self.solver_value, self.severity
        )
    }
}

/// Replay verification failure.
#[derive(Debug, Error)]
pub enum ParityError {
    #[error("replay diverged: {0}")]
    Diverged(Divergence),

    #[error("sequence replayed cleanly but ended {status:?}, not won")]
    NotWinning { status: GameStatus },
}

/// A verified replay: the sequence, its final state, and the step count.
#[derive(Debug)]
pub struct CertifiedRun {
    pub steps: usize,
    pub final_state: GameState,
}

// =============================================================================
// Snapshot comparison
// =============================================================================

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<unserializable>".to_string())
}

/// Compare the fields the parity contract names, most critical first.
/// Returns the first mismatch.
pub fn compare_states(
    step: usize,
    action: Action,
    engine: &GameState,
    solver: &GameState,
) -> Option<Divergence> {
    let report = |field: &str, a: String, b: String, severity: Severity| Divergence {
        step,
        action,
        field: field.to_string(),
        engine_value: a,
        solver_value: b,
        severity,
    };

    if engine.status != solver.status {
        return Some(report(
            "status",
            json(&engine.status),
            json(&solver.status),
            Severity::Critical,
        ));
    }
    if engine.turn_count != solver.turn_count {
        return Some(report(
            "turn_count",
            engine.turn_count.to_string(),
            solver.turn_count.to_string(),
            Severity::Critical,
        ));
    }
    if engine.player.position != solver.player.position {
        return Some(report(
            "player.position",
            json(&engine.player.position),
            json(&solver.player.position),
            Severity::Critical,
        ));
    }
    if engine.player.hp != solver.player.hp {
        return Some(report(
            "player.hp",
            engine.player.hp.to_string(),
            solver.player.hp.to_string(),
            Severity::Critical,
        ));
    }
    if engine.player.direction != solver.player.direction {
        return Some(report(
            "player.direction",
            json(&engine.player.direction),
            json(&solver.player.direction),
            Severity::Major,
        ));
    }

    // Remaining item ids.
    let engine_items: Vec<_> = engine.items.iter().map(|i| &i.id).collect();
    let solver_items: Vec<_> = solver.items.iter().map(|i| &i.id).collect();
    if engine_items != solver_items {
        return Some(report(
            "items",
            json(&engine_items),
            json(&solver_items),
            Severity::Major,
        ));
    }

    // Per-enemy snapshot: roster first, then fields.
    if engine.enemies.len() != solver.enemies.len() {
        let engine_ids: Vec<_> = engine.enemies.iter().map(|e| &e.id).collect();
        let solver_ids: Vec<_> = solver.enemies.iter().map(|e| &e.id).collect();
        return Some(report(
            "enemies",
            json(&engine_ids),
            json(&solver_ids),
            Severity::Major,
        ));
    }
    for (a, b) in engine.enemies.iter().zip(&solver.enemies) {
        let prefix = format!("enemy[{}]", a.id);
        if a.id != b.id {
            return Some(report(&prefix, json(&a.id), json(&b.id), Severity::Major));
        }
        if a.position != b.position {
            return Some(report(
                &format!("{prefix}.position"),
                json(&a.position),
                json(&b.position),
                Severity::Major,
            ));
        }
        if a.hp != b.hp {
            return Some(report(
                &format!("{prefix}.hp"),
                a.hp.to_string(),
                b.hp.to_string(),
                Severity::Major,
            ));
        }
        if a.rage != b.rage {
            return Some(report(
                &format!("{prefix}.rage"),
                json(&a.rage),
                json(&b.rage),
                Severity::Major,
            ));
        }
        if a.direction != b.direction {
            return Some(report(
                &format!("{prefix}.direction"),
                json(&a.direction),
                json(&b.direction),
                Severity::Minor,
            ));
        }
        if a.alerted != b.alerted {
            return Some(report(
                &format!("{prefix}.alerted"),
                a.alerted.to_string(),
                b.alerted.to_string(),
                Severity::Minor,
            ));
        }
        if a.alert_cooldown != b.alert_cooldown {
            return Some(report(
                &format!("{prefix}.alert_cooldown"),
                a.alert_cooldown.to_string(),
                b.alert_cooldown.to_string(),
                Severity::Minor,
            ));
        }
        let a_patrol = a.patrol.as_ref().map(|p| p.index);
        let b_patrol = b.patrol.as_ref().map(|p| p.index);
        if a_patrol != b_patrol {
            return Some(report(
                &format!("{prefix}.patrol_index"),
                json(&a_patrol),
                json(&b_patrol),
                Severity::Minor,
            ));
        }
    }

    None
}

// =============================================================================
// Replay
// =============================================================================

/// Replay `actions` on two independent runtimes built from the same initial
/// state, comparing snapshots after every step. After a first divergence the
/// remaining steps are still executed and logged for context.
pub fn verify_replay(
    initial: &GameState,
    rules: &RuleConfig,
    actions: &[Action],
) -> Result<GameState, ParityError> {
    let mut engine = initial.clone();
    let mut solver = initial.clone();
    let mut first_divergence: Option<Divergence> = None;

    for (step, &action) in actions.iter().enumerate() {
        execute_turn(&mut engine, rules, action);
        execute_turn(&mut solver, rules, action);

        if let Some(divergence) = compare_states(step, action, &engine, &solver) {
            if first_divergence.is_none() {
                log::error!("parity broken: {divergence}");
                first_divergence = Some(divergence);
            } else {
                log::warn!("post-divergence context: {divergence}");
            }
        }
    }

    match first_divergence {
        Some(divergence) => Err(ParityError::Diverged(divergence)),
        None => Ok(engine),
    }
}

/// Verify a candidate winning sequence end to end: clean replay and a final
/// `Won` status.
pub fn certify_solution(
    initial: &GameState,
    rules: &RuleConfig,
    actions: &[Action],
) -> Result<CertifiedRun, ParityError> {
    let final_state = verify_replay(initial, rules, actions)?;
    if final_state.status != GameStatus::Won {
        return Err(ParityError::NotWinning {
            status: final_state.status,
        });
    }
    Ok(CertifiedRun {
        steps: actions.len(),
        final_state,
    })
}
