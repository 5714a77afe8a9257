//! Solver end-to-end tests: search outcomes, bounds, cancellation, and the
//! engine/solver parity contract on reference stages.

use rg_engine::{execute_turn, RuleConfig};
use rg_stage::load_stage;
use rg_types::action::Action;
use rg_types::enums::GameStatus;

use crate::parity::{certify_solution, compare_states, verify_replay, ParityError, Severity};
use crate::search::{solve, CancelToken, SearchLimits, SearchOutcome};

const BASIC_MOVE: &str = r##"
id: basic_move
board:
  size: [5, 5]
  grid:
    - "....."
    - "....."
    - "..#.."
    - "....."
    - "....."
  legend:
    ".": empty
    "#": wall
player:
  start: [0, 0]
  direction: N
goal:
  position: [4, 4]
constraints:
  max_turns: 20
  allowed_apis: [turn_left, turn_right, move, wait, see]
"#;

const ATTACK_STAGE: &str = r#"
id: attack_parity
board:
  size: [6, 6]
  grid:
    - "......"
    - "......"
    - "......"
    - "......"
    - "......"
    - "......"
  legend:
    ".": empty
player:
  start: [0, 3]
  direction: E
goal:
  position: [5, 3]
enemies:
  - id: blocker
    type: normal
    position: [4, 3]
    direction: W
    hp: 30
    attack_power: 30
    vision_range: 0
constraints:
  max_turns: 20
  allowed_apis: [turn_left, turn_right, move, attack, wait, see]
"#;

const WALLED_GOAL: &str = r#"
id: walled_goal
board:
  size: [4, 4]
  grid:
    - "...."
    - "...."
    - "..##"
    - "..#."
  legend:
    ".": empty
    "#": wall
player:
  start: [0, 0]
  direction: E
goal:
  position: [3, 3]
constraints:
  max_turns: 5
  allowed_apis: [turn_left, turn_right, move, wait]
"##;

fn default_limits() -> SearchLimits {
    SearchLimits {
        max_nodes: Some(200_000),
        timeout: None,
        progress_every: 10_000,
    }
}

// =============================================================================
// Solving
// =============================================================================

#[test]
fn solves_basic_move_optimally() {
    let initial = load_stage(BASIC_MOVE).unwrap();
    let rules = RuleConfig::default();
    let outcome = solve(&initial, &rules, &default_limits(), &CancelToken::new(), None);

    let SearchOutcome::Solved { actions, stats } = outcome else {
        panic!("expected a solution");
    };
    // Manhattan distance 8 plus two unavoidable rotations.
    assert_eq!(actions.len(), 10);
    assert_eq!(stats.solution_length, Some(10));
    assert!(stats.nodes_explored > 0);

    let run = certify_solution(&initial, &rules, &actions).unwrap();
    assert_eq!(run.final_state.status, GameStatus::Won);
    assert_eq!(run.steps, 10);
}

#[test]
fn attack_solution_replays_identically() {
    let initial = load_stage(ATTACK_STAGE).unwrap();
    let rules = RuleConfig::default();
    let outcome = solve(&initial, &rules, &default_limits(), &CancelToken::new(), None);

    let SearchOutcome::Solved { actions, .. } = outcome else {
        panic!("expected a solution");
    };
    // Straight line through the sentry: 5 moves + 1 attack.
    assert_eq!(actions.len(), 6);
    assert!(actions.contains(&Action::Attack));

    // Replay on an engine instance step by step: certified means won with
    // every snapshot identical.
    let run = certify_solution(&initial, &rules, &actions).unwrap();
    assert_eq!(run.final_state.status, GameStatus::Won);
    assert!(run.final_state.enemies.is_empty());
}

#[test]
fn known_sequence_matches_hand_replay() {
    let initial = load_stage(ATTACK_STAGE).unwrap();
    let rules = RuleConfig::default();
    let actions = [
        Action::Move,
        Action::Move,
        Action::Move,
        Action::Attack,
        Action::Move,
        Action::Move,
    ];

    let mut by_hand = initial.clone();
    for &action in &actions {
        execute_turn(&mut by_hand, &rules, action);
    }
    assert_eq!(by_hand.status, GameStatus::Won);

    let verified = verify_replay(&initial, &rules, &actions).unwrap();
    assert_eq!(verified, by_hand);
}

// =============================================================================
// Failure modes
// =============================================================================

#[test]
fn walled_goal_exhausts_the_search() {
    let initial = load_stage(WALLED_GOAL).unwrap();
    let rules = RuleConfig::default();
    let outcome = solve(&initial, &rules, &default_limits(), &CancelToken::new(), None);

    let SearchOutcome::Unsolvable { stats, best_hint } = outcome else {
        panic!("expected exhaustion");
    };
    assert!(stats.nodes_explored > 0);
    // The hint leads toward the lowest-h state seen, not to a win.
    assert!(best_hint.len() <= 5);
}

#[test]
fn node_limit_stops_the_search() {
    let initial = load_stage(WALLED_GOAL).unwrap();
    let rules = RuleConfig::default();
    let limits = SearchLimits {
        max_nodes: Some(3),
        timeout: None,
        progress_every: 1_000,
    };
    let outcome = solve(&initial, &rules, &limits, &CancelToken::new(), None);
    assert!(matches!(outcome, SearchOutcome::NodeLimitReached { .. }));
    assert_eq!(outcome.stats().nodes_explored, 3);
}

#[test]
fn cancellation_returns_best_so_far() {
    let initial = load_stage(BASIC_MOVE).unwrap();
    let rules = RuleConfig::default();
    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = solve(&initial, &rules, &default_limits(), &cancel, None);

    let SearchOutcome::Cancelled { stats, best_hint } = outcome else {
        panic!("expected cancellation");
    };
    assert_eq!(stats.nodes_explored, 0);
    assert!(best_hint.is_empty());
}

#[test]
fn progress_callback_fires() {
    let initial = load_stage(WALLED_GOAL).unwrap();
    let rules = RuleConfig::default();
    let limits = SearchLimits {
        max_nodes: Some(100_000),
        timeout: None,
        progress_every: 10,
    };
    let mut reports = Vec::new();
    let mut on_progress = |p: crate::search::SearchProgress| reports.push(p.nodes_explored);
    let _ = solve(
        &initial,
        &rules,
        &limits,
        &CancelToken::new(),
        Some(&mut on_progress),
    );
    assert!(!reports.is_empty());
    assert_eq!(reports[0], 10);
}

// =============================================================================
// Parity divergence detection
// =============================================================================

#[test]
fn divergence_is_detected_and_classified() {
    let initial = load_stage(ATTACK_STAGE).unwrap();

    let engine = initial.clone();
    let mut drifted = initial.clone();
    drifted.player.hp -= 1;

    let divergence = compare_states(0, Action::Wait, &engine, &drifted).unwrap();
    assert_eq!(divergence.field, "player.hp");
    assert_eq!(divergence.severity, Severity::Critical);

    let mut rotated = initial.clone();
    rotated.enemies[0].direction = rotated.enemies[0].direction.turn_left();
    let divergence = compare_states(2, Action::Move, &engine, &rotated).unwrap();
    assert_eq!(divergence.field, "enemy[blocker].direction");
    assert_eq!(divergence.severity, Severity::Minor);
}

#[test]
fn identical_states_produce_no_divergence() {
    let initial = load_stage(ATTACK_STAGE).unwrap();
    assert!(compare_states(0, Action::Wait, &initial, &initial.clone()).is_none());
}

#[test]
fn non_winning_sequence_fails_certification() {
    let initial = load_stage(BASIC_MOVE).unwrap();
    let rules = RuleConfig::default();
    let err = certify_solution(&initial, &rules, &[Action::Wait]).unwrap_err();
    assert!(matches!(
        err,
        ParityError::NotWinning {
            status: GameStatus::Playing
        }
    ));
}
