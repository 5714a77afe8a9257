//! Enemy AI — vision cones, alert decay, pursuit, patrol, strikes, the rage
//! cycle, and the conditional-kill watcher.
//!
//! One `update_enemy` call is one enemy's whole turn. Phase order inside an
//! update is fixed: rage cycle (replaces everything when mid-cycle), then
//! vision → alert decay → movement/rotation → strike → kill-order check.
//! Enemy-to-enemy order is the scheduler's job.

use arrayvec::ArrayVec;

use rg_types::action::{DamageSource, StateChange};
use rg_types::enums::RageState;
use rg_types::grid::{Direction, Position};
use rg_types::state::{Board, EnemyState, GameState};

use crate::combat::damage_player;
use crate::rules::RuleConfig;

/// Run one enemy's update. Returns the player-visible changes it caused.
pub fn update_enemy(state: &mut GameState, rules: &RuleConfig, idx: usize) -> Vec<StateChange> {
    let mut changes = Vec::new();

    // Rage cycle turns replace normal behavior entirely.
    match state.enemies[idx].rage {
        RageState::Triggered => {
            state.enemies[idx].rage = RageState::AreaAttacking;
            return changes;
        }
        RageState::AreaAttacking => {
            changes.extend(perform_area_attack(state, idx));
            let enemy = &mut state.enemies[idx];
            enemy.rage = RageState::Cooldown;
            enemy.rage_retrigger = true;
            return changes;
        }
        RageState::Cooldown => {
            state.enemies[idx].rage = RageState::Calm;
        }
        RageState::Calm => {}
    }

    update_alert(state, rules, idx);

    let enemy = &state.enemies[idx];
    if enemy.alerted || enemy.hunting {
        pursue(state, rules, idx);
    } else if enemy.patrol.is_some() {
        patrol_step(state, rules, idx);
    }

    if let Some(change) = try_strike(state, idx) {
        changes.push(change);
    }

    observe_kill_order(state, idx);
    changes
}

// =============================================================================
// Vision & alert
// =============================================================================

/// Whether the enemy sees `target` from its anchor cell.
///
/// Visible iff (a) inside the facing cone (forward component ≥ 1, lateral
/// spread ≤ forward), (b) within Manhattan `vision_range`, and (c) no wall
/// strictly between along the L-path that walks the facing axis first.
pub fn can_see(enemy: &EnemyState, board: &Board, target: Position) -> bool {
    if enemy.vision_range == 0 {
        return false;
    }
    let anchor = enemy.position;
    let dx = target.x - anchor.x;
    let dy = target.y - anchor.y;

    let (forward, lateral) = match enemy.direction {
        Direction::N => (-dy, dx),
        Direction::S => (dy, dx),
        Direction::E => (dx, dy),
        Direction::W => (-dx, dy),
    };
    if forward < 1 || lateral.abs() > forward {
        return false;
    }
    if anchor.manhattan(target) > enemy.vision_range {
        return false;
    }

    // Occlusion along the facing-axis-first L-path; endpoints excluded.
    let lateral_dir = match enemy.direction {
        Direction::N | Direction::S => {
            if lateral > 0 {
                Direction::E
            } else {
                Direction::W
            }
        }
        Direction::E | Direction::W => {
            if lateral > 0 {
                Direction::S
            } else {
                Direction::N
            }
        }
    };
    let mut cursor = anchor;
    for _ in 0..forward {
        cursor = cursor.step(enemy.direction);
        if cursor != target && board.is_wall(cursor) {
            return false;
        }
    }
    for _ in 0..lateral.abs() {
        cursor = cursor.step(lateral_dir);
        if cursor != target && board.is_wall(cursor) {
            return false;
        }
    }
    true
}

fn update_alert(state: &mut GameState, rules: &RuleConfig, idx: usize) {
    let sees = can_see(&state.enemies[idx], &state.board, state.player.position);
    let enemy = &mut state.enemies[idx];
    if sees {
        if !enemy.alerted {
            log::debug!("enemy {} spotted the player", enemy.id);
        }
        enemy.alerted = true;
        enemy.alert_cooldown = rules.alert_cooldown;
    } else if enemy.alerted {
        enemy.alert_cooldown = enemy.alert_cooldown.saturating_sub(1);
        if enemy.alert_cooldown == 0 {
            enemy.alerted = false;
        }
    }
}

// =============================================================================
// Movement
// =============================================================================

/// Step directions toward `to`, greater-distance axis first; ties prefer
/// horizontal when configured.
fn preferred_directions(
    from: Position,
    to: Position,
    horizontal_first: bool,
) -> ArrayVec<Direction, 2> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let horizontal = if dx > 0 { Direction::E } else { Direction::W };
    let vertical = if dy > 0 { Direction::S } else { Direction::N };

    let mut dirs = ArrayVec::new();
    match (dx != 0, dy != 0) {
        (false, false) => {}
        (true, false) => dirs.push(horizontal),
        (false, true) => dirs.push(vertical),
        (true, true) => {
            let horizontal_primary = match dx.abs().cmp(&dy.abs()) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Less => false,
                std::cmp::Ordering::Equal => horizontal_first,
            };
            if horizontal_primary {
                dirs.push(horizontal);
                dirs.push(vertical);
            } else {
                dirs.push(vertical);
                dirs.push(horizontal);
            }
        }
    }
    dirs
}

enum MoveOutcome {
    Moved,
    /// The step would land on the player; the strike phase handles it.
    BlockedByPlayer,
    Blocked,
}

/// Try each direction in order; the first whose destination footprint fits
/// wins. Moving also turns the enemy to face the direction moved.
fn try_move_enemy(state: &mut GameState, idx: usize, dirs: &[Direction]) -> MoveOutcome {
    for &dir in dirs {
        let anchor = state.enemies[idx].position.step(dir);
        let cells = state.enemies[idx].footprint_at(anchor);
        if cells.iter().any(|&c| c == state.player.position) {
            return MoveOutcome::BlockedByPlayer;
        }
        if state.footprint_fits(&cells, idx) {
            let enemy = &mut state.enemies[idx];
            enemy.position = anchor;
            enemy.direction = dir;
            return MoveOutcome::Moved;
        }
    }
    MoveOutcome::Blocked
}

/// Alerted/hunting movement: one step toward the player, falling back to
/// the other axis, falling back to a single rotation step toward the target.
fn pursue(state: &mut GameState, rules: &RuleConfig, idx: usize) {
    let dirs = preferred_directions(
        state.enemies[idx].position,
        state.player.position,
        rules.horizontal_first,
    );
    let Some(&desired) = dirs.first() else {
        return;
    };
    if matches!(try_move_enemy(state, idx, &dirs), MoveOutcome::Blocked) {
        let enemy = &mut state.enemies[idx];
        enemy.direction = enemy.direction.rotate_toward(desired);
    }
}

/// Idle movement along the patrol route: face the current waypoint, step
/// toward it, advance the index when standing on it.
fn patrol_step(state: &mut GameState, rules: &RuleConfig, idx: usize) {
    let Some(patrol) = state.enemies[idx].patrol.clone() else {
        return;
    };
    let len = patrol.waypoints.len();
    if len == 0 {
        return;
    }

    let mut index = patrol.index;
    if state.enemies[idx].position == patrol.waypoints[index] {
        index = (index + 1) % len;
    }
    let target = patrol.waypoints[index];

    let dirs = preferred_directions(state.enemies[idx].position, target, rules.horizontal_first);
    if let Some(&facing) = dirs.first() {
        state.enemies[idx].direction = facing;
    }
    try_move_enemy(state, idx, &dirs);

    if let Some(patrol) = &mut state.enemies[idx].patrol {
        patrol.index = index;
    }
}

// =============================================================================
// Strikes
// =============================================================================

/// Strike the player when facing them across a footprint edge; otherwise
/// snap facing toward an adjacent player. Rotation and strike are separate
/// enemy turns.
fn try_strike(state: &mut GameState, idx: usize) -> Option<StateChange> {
    let enemy = &state.enemies[idx];
    let player = state.player.position;

    let facing_player = enemy
        .footprint()
        .iter()
        .any(|f| f.step(enemy.direction) == player);
    if facing_player {
        let power = enemy.attack_power;
        log::debug!("enemy {} strikes the player for {power}", enemy.id);
        return Some(damage_player(state, power, DamageSource::EnemyStrike));
    }

    if enemy.distance_to(player) == 1 {
        let snap = Direction::ALL
            .into_iter()
            .find(|&dir| enemy.footprint().iter().any(|f| f.step(dir) == player));
        if let Some(dir) = snap {
            state.enemies[idx].direction = dir;
        }
    }
    None
}

// =============================================================================
// Rage area attack
// =============================================================================

/// The rectangle of cells within Chebyshev `range` of the footprint.
pub fn area_attack_covers(enemy: &EnemyState, pos: Position) -> bool {
    let (w, h) = enemy.kind.footprint_size();
    let r = enemy.area_attack_range as i32;
    pos.x >= enemy.position.x - r
        && pos.x <= enemy.position.x + w - 1 + r
        && pos.y >= enemy.position.y - r
        && pos.y <= enemy.position.y + h - 1 + r
}

fn perform_area_attack(state: &mut GameState, idx: usize) -> Vec<StateChange> {
    let enemy = &state.enemies[idx];
    log::debug!("enemy {} unleashes an area attack", enemy.id);
    if area_attack_covers(enemy, state.player.position) {
        let power = enemy.attack_power;
        vec![damage_player(state, power, DamageSource::AreaAttack)]
    } else {
        Vec::new()
    }
}

// =============================================================================
// Conditional kill order
// =============================================================================

/// Check the observed kill order against the required sequence. A violated
/// prefix turns the watcher permanently hostile (pursuit ignoring vision).
/// Sequence completion is the scheduler's end-of-turn job.
fn observe_kill_order(state: &mut GameState, idx: usize) {
    let enemy = &state.enemies[idx];
    if enemy.required_sequence.is_empty() || enemy.hunting {
        return;
    }
    let observed: Vec<_> = state
        .defeated_order
        .iter()
        .filter(|id| enemy.required_sequence.contains(id))
        .collect();
    let is_prefix = observed.len() <= enemy.required_sequence.len()
        && observed
            .iter()
            .zip(&enemy.required_sequence)
            .all(|(a, b)| **a == *b);
    if !is_prefix {
        log::debug!("enemy {} saw the kill order violated, hunting", enemy.id);
        state.enemies[idx].hunting = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rg_stage::load_stage;
    use rg_types::action::Action;
    use rg_types::enums::EnemyKind;
    use rg_types::ids::EnemyId;
    use rg_types::state::StateFlags;

    use crate::turn::execute_turn;

    fn bare_board(width: i32, height: i32) -> Board {
        Board {
            width,
            height,
            walls: Default::default(),
            forbidden: Default::default(),
            goal: Position::new(width - 1, height - 1),
            legend: Default::default(),
        }
    }

    fn watcher_at(pos: Position, direction: Direction, vision_range: u32) -> EnemyState {
        EnemyState {
            id: EnemyId::from("watcher"),
            kind: EnemyKind::Normal,
            position: pos,
            direction,
            hp: 30,
            max_hp: 30,
            attack_power: 10,
            vision_range,
            alerted: false,
            alert_cooldown: 0,
            patrol: None,
            rage: RageState::Calm,
            rage_retrigger: false,
            rage_threshold_pct: 50,
            area_attack_range: 1,
            required_sequence: Vec::new(),
            hunting: false,
        }
    }

    // =========================================================================
    // Vision cone
    // =========================================================================

    #[test]
    fn cone_covers_forward_wedge_only() {
        let board = bare_board(9, 9);
        let enemy = watcher_at(Position::new(4, 4), Direction::N, 4);

        // Straight ahead.
        assert!(can_see(&enemy, &board, Position::new(4, 3)));
        assert!(can_see(&enemy, &board, Position::new(4, 1)));
        // Diagonal edge of the wedge: |lateral| == forward.
        assert!(can_see(&enemy, &board, Position::new(5, 3)));
        assert!(can_see(&enemy, &board, Position::new(2, 2)));
        // Outside the wedge: more lateral than forward.
        assert!(!can_see(&enemy, &board, Position::new(6, 3)));
        // Behind or beside.
        assert!(!can_see(&enemy, &board, Position::new(4, 5)));
        assert!(!can_see(&enemy, &board, Position::new(3, 4)));
        // In the wedge but past the Manhattan range.
        assert!(!can_see(&enemy, &board, Position::new(2, 1)));
    }

    #[test]
    fn walls_occlude_along_the_facing_axis() {
        let mut board = bare_board(9, 9);
        board.walls.insert(Position::new(4, 3));
        let enemy = watcher_at(Position::new(4, 4), Direction::N, 4);

        // The wall cell itself is still "visible" (it is the endpoint);
        // anything behind it is not.
        assert!(can_see(&enemy, &board, Position::new(4, 3)));
        assert!(!can_see(&enemy, &board, Position::new(4, 2)));
        // The occlusion path walks the facing axis first, so the lateral
        // cell behind the wall is hidden too.
        assert!(!can_see(&enemy, &board, Position::new(5, 2)));
    }

    #[test]
    fn zero_vision_range_never_sees() {
        let board = bare_board(9, 9);
        let enemy = watcher_at(Position::new(4, 4), Direction::N, 0);
        assert!(!can_see(&enemy, &board, Position::new(4, 3)));
    }

    // =========================================================================
    // Area attack footprint
    // =========================================================================

    #[test]
    fn area_attack_covers_chebyshev_ring() {
        let mut enemy = watcher_at(Position::new(3, 3), Direction::N, 0);
        enemy.kind = EnemyKind::Large2x2;

        // Footprint (3,3)-(4,4); ring spans (2,2)-(5,5).
        assert!(area_attack_covers(&enemy, Position::new(2, 2)));
        assert!(area_attack_covers(&enemy, Position::new(5, 5)));
        assert!(area_attack_covers(&enemy, Position::new(2, 4)));
        assert!(!area_attack_covers(&enemy, Position::new(1, 3)));
        assert!(!area_attack_covers(&enemy, Position::new(6, 5)));
    }

    // =========================================================================
    // Alert, pursuit, patrol, strikes (driven through the scheduler)
    // =========================================================================

    const ALERT_DECAY_STAGE: &str = r#"
id: alert_decay
board:
  size: [8, 8]
  grid:
    - "........"
    - "........"
    - "........"
    - "....X..."
    - "...X.X.."
    - "....X..."
    - "........"
    - "........"
  legend:
    ".": empty
    "X": forbidden
player:
  start: [0, 4]
  direction: S
goal:
  position: [7, 7]
enemies:
  - id: watcher
    type: normal
    position: [4, 4]
    direction: W
    hp: 30
    attack_power: 1
    vision_range: 4
constraints:
  max_turns: 30
  allowed_apis: [turn_left, turn_right, move, wait, see]
"#;

    #[test]
    fn alert_sets_then_decays_out_of_sight() {
        let mut state = load_stage(ALERT_DECAY_STAGE).unwrap();
        let mut rules = RuleConfig::default();
        rules.alert_cooldown = 2;

        // Player at (0, 4) is dead ahead within range: alerted.
        execute_turn(&mut state, &rules, Action::Wait);
        let watcher = &state.enemies[0];
        assert!(watcher.alerted);
        assert_eq!(watcher.alert_cooldown, 2);
        // The forbidden ring blocks pursuit; the enemy only rotates.
        assert_eq!(watcher.position, Position::new(4, 4));

        // Step out of range; the cooldown ticks down.
        execute_turn(&mut state, &rules, Action::Move);
        assert!(state.enemies[0].alerted);
        assert_eq!(state.enemies[0].alert_cooldown, 1);

        execute_turn(&mut state, &rules, Action::Wait);
        assert!(!state.enemies[0].alerted);
    }

    const PURSUIT_STAGE: &str = r#"
id: pursuit
board:
  size: [9, 9]
  grid:
    - "........."
    - "........."
    - "........."
    - "........."
    - "........."
    - "........."
    - "........."
    - "........."
    - "........."
  legend:
    ".": empty
player:
  start: [2, 2]
  direction: N
goal:
  position: [8, 8]
enemies:
  - id: chaser
    type: normal
    position: [4, 4]
    direction: N
    hp: 30
    attack_power: 1
    vision_range: 4
constraints:
  max_turns: 30
  allowed_apis: [turn_left, turn_right, move, wait, see]
"#;

    #[test]
    fn pursuit_breaks_axis_ties_horizontally() {
        let mut state = load_stage(PURSUIT_STAGE).unwrap();
        let rules = RuleConfig::default();

        // dx == dy == -2 from the chaser: the horizontal step wins the tie.
        execute_turn(&mut state, &rules, Action::Wait);
        let chaser = &state.enemies[0];
        assert!(chaser.alerted);
        assert_eq!(chaser.position, Position::new(3, 4));
        assert_eq!(chaser.direction, Direction::W);
    }

    const PATROL_STAGE: &str = r#"
id: patrol
board:
  size: [7, 7]
  grid:
    - "......."
    - "......."
    - "......."
    - "......."
    - "......."
    - "......."
    - "......."
  legend:
    ".": empty
player:
  start: [0, 6]
  direction: S
goal:
  position: [6, 6]
enemies:
  - id: rover
    type: normal
    position: [1, 3]
    direction: E
    hp: 30
    attack_power: 1
    vision_range: 0
    behavior: patrol
    patrol: [[1, 3], [4, 3]]
constraints:
  max_turns: 30
  allowed_apis: [turn_left, turn_right, move, wait, see]
"#;

    #[test]
    fn patrol_walks_between_waypoints_and_cycles_the_index() {
        let mut state = load_stage(PATROL_STAGE).unwrap();
        let rules = RuleConfig::default();

        let positions_and_indices: Vec<(Position, usize)> = (0..6)
            .map(|_| {
                execute_turn(&mut state, &rules, Action::Wait);
                let rover = &state.enemies[0];
                (rover.position, rover.patrol.as_ref().unwrap().index)
            })
            .collect();

        assert_eq!(
            positions_and_indices,
            vec![
                (Position::new(2, 3), 1),
                (Position::new(3, 3), 1),
                (Position::new(4, 3), 1),
                (Position::new(3, 3), 0),
                (Position::new(2, 3), 0),
                (Position::new(1, 3), 0),
            ]
        );
    }

    const STRIKE_STAGE: &str = r#"
id: strike
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
  start: [2, 3]
  direction: N
goal:
  position: [5, 5]
enemies:
  - id: bruiser
    type: normal
    position: [3, 3]
    direction: E
    hp: 30
    attack_power: 15
    vision_range: 0
constraints:
  max_turns: 30
  allowed_apis: [turn_left, turn_right, move, wait, see]
"#;

    #[test]
    fn adjacent_enemy_rotates_first_and_strikes_the_turn_after() {
        let mut state = load_stage(STRIKE_STAGE).unwrap();
        let rules = RuleConfig::default();

        // Turn 1: facing away — it only snaps around to face the player.
        execute_turn(&mut state, &rules, Action::Wait);
        assert_eq!(state.player.hp, 100);
        assert_eq!(state.enemies[0].direction, Direction::W);
        assert!(!state.flags.contains(StateFlags::PLAYER_ATTACKED_THIS_TURN));

        // Turn 2: now facing — the strike lands.
        execute_turn(&mut state, &rules, Action::Wait);
        assert_eq!(state.player.hp, 85);
        assert!(state.flags.contains(StateFlags::PLAYER_ATTACKED_THIS_TURN));
    }
}
