//! Stage loading — parse a YAML descriptor, validate every field, and
//! construct the initial `GameState`.
//!
//! Validation is structural only: positions in bounds, stats positive,
//! footprints non-overlapping, references resolvable. Whether the goal is
//! actually reachable is the generator's problem, not the loader's.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use thiserror::Error;

use rg_types::action::{Action, ActionSet};
use rg_types::enums::{EnemyKind, GameStatus, ItemKind, RageState};
use rg_types::grid::Position;
use rg_types::ids::{EnemyId, ItemId, StageId};
use rg_types::state::*;

use crate::descriptor::*;

/// Default weapon attack bonus when no explicit effect is given.
pub const DEFAULT_WEAPON_BONUS: i32 = 10;
/// Default potion heal when no explicit amount is given.
pub const DEFAULT_POTION_HEAL: i32 = 50;
/// Default enemy vision radius.
pub const DEFAULT_VISION_RANGE: u32 = 2;
/// Default stamina gauge when the system is enabled without explicit values.
pub const DEFAULT_STAMINA: i32 = 100;

// =============================================================================
// Errors
// =============================================================================

/// Typed stage validation error naming the offending field.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to parse stage descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read stage file: {0}")]
    Io(#[from] std::io::Error),

    #[error("board size must be positive, got {width}x{height}")]
    BadBoardSize { width: i32, height: i32 },

    #[error("grid has {got} rows, board height is {expected}")]
    GridRowCount { expected: usize, got: usize },

    #[error("grid row {row} has {got} cells, board width is {expected}")]
    GridRowWidth { row: usize, expected: usize, got: usize },

    #[error("grid character {ch:?} in row {row} is not in the legend")]
    UnknownLegendChar { ch: char, row: usize },

    #[error("legend entry {ch:?} maps to unknown semantic {name:?}")]
    UnknownSemantic { ch: char, name: String },

    #[error("{entity} {id:?}: position {x},{y} is outside the board")]
    OutOfBounds { entity: &'static str, id: String, x: i32, y: i32 },

    #[error("{entity} {id:?}: position {x},{y} is on an impassable tile")]
    OnBlockedTile { entity: &'static str, id: String, x: i32, y: i32 },

    #[error("{entity} {id:?}: field {field:?} must be positive, got {value}")]
    NonPositive { entity: &'static str, id: String, field: &'static str, value: i64 },

    #[error("{entity} {id:?}: required field {field:?} is missing")]
    MissingField { entity: &'static str, id: String, field: &'static str },

    #[error("{entity} {id:?}: field {field:?} does not apply to this kind")]
    FieldNotApplicable { entity: &'static str, id: String, field: &'static str },

    #[error("duplicate {entity} id {id:?}")]
    DuplicateId { entity: &'static str, id: String },

    #[error("enemies {a:?} and {b:?} have overlapping footprints")]
    FootprintOverlap { a: String, b: String },

    #[error("enemy {id:?} footprint covers the player start")]
    FootprintOnStart { id: String },

    #[error("items {a:?} and {b:?} share a cell")]
    ItemOverlap { a: String, b: String },

    #[error("item {id:?} is under enemy {enemy:?}")]
    ItemUnderEnemy { id: String, enemy: String },

    #[error("enemy {id:?}: behavior {behavior:?} conflicts with its patrol list")]
    BehaviorMismatch { id: String, behavior: &'static str },

    #[error("enemy {id:?}: rage_threshold {value} must be in (0, 1]")]
    BadRageThreshold { id: String, value: f64 },

    #[error("enemy {id:?}: required_sequence references unknown enemy {reference:?}")]
    UnknownSequenceRef { id: String, reference: String },

    #[error("enemy {id:?}: required_sequence entry {reference:?} is repeated")]
    RepeatedSequenceRef { id: String, reference: String },

    #[error("constraints.max_turns must be at least 1")]
    BadMaxTurns,

    #[error("constraints.allowed_apis contains unknown API {name:?}")]
    UnknownApi { name: String },
}

// =============================================================================
// Public API
// =============================================================================

/// Parse a YAML descriptor without building state.
pub fn parse_descriptor(yaml: &str) -> Result<StageDescriptor, StageError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parse and validate a YAML descriptor, producing the initial `GameState`.
pub fn load_stage(yaml: &str) -> Result<GameState, StageError> {
    let descriptor = parse_descriptor(yaml)?;
    build_state(&descriptor)
}

/// Load a stage from a file on disk.
pub fn load_stage_file(path: impl AsRef<Path>) -> Result<GameState, StageError> {
    let yaml = std::fs::read_to_string(path)?;
    load_stage(&yaml)
}

/// Validate a descriptor and construct the initial `GameState`.
pub fn build_state(desc: &StageDescriptor) -> Result<GameState, StageError> {
    let mut board = build_board(&desc.board)?;
    board.goal = Position::new(desc.goal.position.0, desc.goal.position.1);
    let conditions = desc.special_conditions.clone().unwrap_or(StageConditions {
        stamina: false,
        collect_all_items: false,
    });

    let player = build_player(&desc.player, &conditions, &board)?;
    let enemies = build_enemies(&desc.enemies, &board, player.position)?;
    let items = build_items(&desc.items, &board, &enemies)?;

    if desc.constraints.max_turns == 0 {
        return Err(StageError::BadMaxTurns);
    }
    let allowed_actions = parse_allowed_apis(&desc.constraints.allowed_apis)?;

    // Goal must sit inside the grid on a traversable tile.
    let goal = board.goal;
    if !board.in_bounds(goal) {
        return Err(StageError::OutOfBounds {
            entity: "goal",
            id: desc.id.clone(),
            x: goal.x,
            y: goal.y,
        });
    }
    if board.is_wall(goal) || board.is_forbidden(goal) {
        return Err(StageError::OnBlockedTile {
            entity: "goal",
            id: desc.id.clone(),
            x: goal.x,
            y: goal.y,
        });
    }

    let mut flags = StateFlags::empty();
    if conditions.stamina || desc.player.stamina.is_some() || desc.player.max_stamina.is_some() {
        flags |= StateFlags::STAMINA_ENABLED;
    }
    if conditions.collect_all_items {
        flags |= StateFlags::COLLECT_ALL_ITEMS;
    }

    Ok(GameState {
        stage_id: StageId::from(desc.id.as_str()),
        turn_count: 0,
        max_turns: desc.constraints.max_turns,
        board,
        player,
        enemies,
        items,
        status: GameStatus::Playing,
        flags,
        allowed_actions,
        defeated_order: Vec::new(),
    })
}

/// Parse `constraints.allowed_apis` into the action mask. Query API names
/// are accepted and ignored (queries are always available).
pub fn parse_allowed_apis(names: &[String]) -> Result<ActionSet, StageError> {
    let mut mask = ActionSet::empty();
    for name in names {
        match name.as_str() {
            "turn_left" => mask |= Action::TurnLeft.flag(),
            "turn_right" => mask |= Action::TurnRight.flag(),
            "move" => mask |= Action::Move.flag(),
            "attack" => mask |= Action::Attack.flag(),
            "pickup" => mask |= Action::Pickup.flag(),
            "dispose" => mask |= Action::Dispose.flag(),
            "wait" => mask |= Action::Wait.flag(),
            "see" | "get_stage_info" | "is_available" | "get_stamina" => {}
            other => {
                return Err(StageError::UnknownApi {
                    name: other.to_string(),
                })
            }
        }
    }
    Ok(mask)
}

// =============================================================================
// Board construction
// =============================================================================

fn build_board(desc: &BoardDescriptor) -> Result<Board, StageError> {
    let (width, height) = desc.size;
    if width <= 0 || height <= 0 {
        return Err(StageError::BadBoardSize { width, height });
    }
    if desc.grid.len() != height as usize {
        return Err(StageError::GridRowCount {
            expected: height as usize,
            got: desc.grid.len(),
        });
    }

    let mut walls = BTreeSet::new();
    let mut forbidden = BTreeSet::new();
    let mut goal_from_grid: Option<Position> = None;

    for (y, row) in desc.grid.iter().enumerate() {
        let cells: Vec<char> = row.chars().collect();
        if cells.len() != width as usize {
            return Err(StageError::GridRowWidth {
                row: y,
                expected: width as usize,
                got: cells.len(),
            });
        }
        for (x, &ch) in cells.iter().enumerate() {
            let name = desc
                .legend
                .get(&ch)
                .ok_or(StageError::UnknownLegendChar { ch, row: y })?;
            let pos = Position::new(x as i32, y as i32);
            match name.as_str() {
                "empty" | "start" => {}
                "wall" => {
                    walls.insert(pos);
                }
                "forbidden" => {
                    forbidden.insert(pos);
                }
                "goal" => goal_from_grid = Some(pos),
                other => {
                    return Err(StageError::UnknownSemantic {
                        ch,
                        name: other.to_string(),
                    })
                }
            }
        }
    }

    // The explicit goal.position is authoritative; a goal tile in the grid
    // is decorative.
    let _ = goal_from_grid;

    Ok(Board {
        width,
        height,
        walls,
        forbidden,
        // Caller overwrites with the descriptor's explicit goal position.
        goal: Position::new(0, 0),
        legend: desc.legend.clone(),
    })
}

fn build_player(
    desc: &PlayerDescriptor,
    conditions: &StageConditions,
    board: &Board,
) -> Result<PlayerState, StageError> {
    let position = Position::new(desc.start.0, desc.start.1);
    if !board.in_bounds(position) {
        return Err(StageError::OutOfBounds {
            entity: "player",
            id: "start".to_string(),
            x: position.x,
            y: position.y,
        });
    }
    if board.is_wall(position) || board.is_forbidden(position) {
        return Err(StageError::OnBlockedTile {
            entity: "player",
            id: "start".to_string(),
            x: position.x,
            y: position.y,
        });
    }

    let hp = desc.hp.unwrap_or(DEFAULT_PLAYER_HP);
    let max_hp = desc.max_hp.unwrap_or(hp.max(DEFAULT_PLAYER_HP));
    let attack_power = desc.attack_power.unwrap_or(DEFAULT_PLAYER_ATTACK);
    for (field, value) in [("hp", hp), ("max_hp", max_hp), ("attack_power", attack_power)] {
        if value <= 0 {
            return Err(StageError::NonPositive {
                entity: "player",
                id: "start".to_string(),
                field,
                value: value as i64,
            });
        }
    }

    let stamina_enabled =
        conditions.stamina || desc.stamina.is_some() || desc.max_stamina.is_some();
    let stamina = if stamina_enabled {
        let max = desc.max_stamina.or(desc.stamina).unwrap_or(DEFAULT_STAMINA);
        let current = desc.stamina.unwrap_or(max);
        if max <= 0 || current <= 0 {
            return Err(StageError::NonPositive {
                entity: "player",
                id: "start".to_string(),
                field: "stamina",
                value: current.min(max) as i64,
            });
        }
        Some(Stamina {
            current: current.min(max),
            max,
        })
    } else {
        None
    };

    Ok(PlayerState {
        position,
        direction: desc.direction,
        hp: hp.min(max_hp),
        max_hp,
        attack_power,
        stamina,
        collected_items: Vec::new(),
        disposed_items: Vec::new(),
    })
}

// =============================================================================
// Enemy construction
// =============================================================================

fn build_enemies(
    descs: &[EnemyDescriptor],
    board: &Board,
    player_start: Position,
) -> Result<Vec<EnemyState>, StageError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let known_ids: HashSet<&str> = descs.iter().map(|e| e.id.as_str()).collect();
    let mut enemies = Vec::with_capacity(descs.len());

    for desc in descs {
        if !seen_ids.insert(desc.id.as_str()) {
            return Err(StageError::DuplicateId {
                entity: "enemy",
                id: desc.id.clone(),
            });
        }
        enemies.push(build_enemy(desc, board, player_start, &known_ids)?);
    }

    // Footprints must not overlap.
    for i in 0..enemies.len() {
        for j in (i + 1)..enemies.len() {
            if enemies[i]
                .footprint()
                .iter()
                .any(|cell| enemies[j].occupies(*cell))
            {
                return Err(StageError::FootprintOverlap {
                    a: enemies[i].id.to_string(),
                    b: enemies[j].id.to_string(),
                });
            }
        }
    }

    Ok(enemies)
}

fn build_enemy(
    desc: &EnemyDescriptor,
    board: &Board,
    player_start: Position,
    known_ids: &HashSet<&str>,
) -> Result<EnemyState, StageError> {
    let is_special = desc.kind == EnemyKind::Special2x3;

    let hp = match (desc.hp, is_special) {
        (Some(hp), _) => hp,
        (None, true) => SPECIAL_ENEMY_HP,
        (None, false) => {
            return Err(StageError::MissingField {
                entity: "enemy",
                id: desc.id.clone(),
                field: "hp",
            })
        }
    };
    let attack_power = match (desc.attack_power, is_special) {
        (Some(a), _) => a,
        (None, true) => SPECIAL_ENEMY_ATTACK,
        (None, false) => {
            return Err(StageError::MissingField {
                entity: "enemy",
                id: desc.id.clone(),
                field: "attack_power",
            })
        }
    };
    let max_hp = desc.max_hp.unwrap_or(hp);
    for (field, value) in [("hp", hp), ("max_hp", max_hp), ("attack_power", attack_power)] {
        if value <= 0 {
            return Err(StageError::NonPositive {
                entity: "enemy",
                id: desc.id.clone(),
                field,
                value: value as i64,
            });
        }
    }

    // Rage fields only make sense on large enemies; a required sequence only
    // on the special one.
    if !desc.kind.has_rage() && (desc.rage_threshold.is_some() || desc.area_attack_range.is_some())
    {
        return Err(StageError::FieldNotApplicable {
            entity: "enemy",
            id: desc.id.clone(),
            field: "rage_threshold",
        });
    }
    if !is_special && desc.special_conditions.is_some() {
        return Err(StageError::FieldNotApplicable {
            entity: "enemy",
            id: desc.id.clone(),
            field: "special_conditions",
        });
    }

    let rage_threshold = desc.rage_threshold.unwrap_or(0.5);
    if !(rage_threshold > 0.0 && rage_threshold <= 1.0) {
        return Err(StageError::BadRageThreshold {
            id: desc.id.clone(),
            value: rage_threshold,
        });
    }

    // Behavior declaration must match the waypoint list.
    match desc.behavior {
        Some(EnemyBehavior::Patrol) if desc.patrol.is_empty() => {
            return Err(StageError::BehaviorMismatch {
                id: desc.id.clone(),
                behavior: "patrol",
            })
        }
        Some(EnemyBehavior::Static) if !desc.patrol.is_empty() => {
            return Err(StageError::BehaviorMismatch {
                id: desc.id.clone(),
                behavior: "static",
            })
        }
        _ => {}
    }

    let mut required_sequence = Vec::new();
    if let Some(conditions) = &desc.special_conditions {
        let mut seen: HashSet<&str> = HashSet::new();
        for reference in &conditions.required_sequence {
            if reference == &desc.id || !known_ids.contains(reference.as_str()) {
                return Err(StageError::UnknownSequenceRef {
                    id: desc.id.clone(),
                    reference: reference.clone(),
                });
            }
            if !seen.insert(reference.as_str()) {
                return Err(StageError::RepeatedSequenceRef {
                    id: desc.id.clone(),
                    reference: reference.clone(),
                });
            }
            required_sequence.push(EnemyId::from(reference.as_str()));
        }
    }

    let enemy = EnemyState {
        id: EnemyId::from(desc.id.as_str()),
        kind: desc.kind,
        position: Position::new(desc.position.0, desc.position.1),
        direction: desc.direction,
        hp: hp.min(max_hp),
        max_hp,
        attack_power,
        vision_range: desc.vision_range.unwrap_or(DEFAULT_VISION_RANGE),
        alerted: false,
        alert_cooldown: 0,
        patrol: if desc.patrol.is_empty() {
            None
        } else {
            Some(PatrolState {
                waypoints: desc.patrol.iter().map(|&(x, y)| Position::new(x, y)).collect(),
                index: 0,
            })
        },
        rage: RageState::Calm,
        rage_retrigger: false,
        rage_threshold_pct: (rage_threshold * 100.0).round() as u32,
        area_attack_range: desc.area_attack_range.unwrap_or(1),
        required_sequence,
        hunting: false,
    };

    // Every footprint cell must be a traversable board cell.
    for cell in enemy.footprint() {
        if !board.in_bounds(cell) {
            return Err(StageError::OutOfBounds {
                entity: "enemy",
                id: desc.id.clone(),
                x: cell.x,
                y: cell.y,
            });
        }
        if board.is_wall(cell) || board.is_forbidden(cell) {
            return Err(StageError::OnBlockedTile {
                entity: "enemy",
                id: desc.id.clone(),
                x: cell.x,
                y: cell.y,
            });
        }
        if cell == player_start {
            return Err(StageError::FootprintOnStart {
                id: desc.id.clone(),
            });
        }
    }

    if let Some(patrol) = &enemy.patrol {
        for &waypoint in &patrol.waypoints {
            if !board.in_bounds(waypoint) {
                return Err(StageError::OutOfBounds {
                    entity: "enemy",
                    id: desc.id.clone(),
                    x: waypoint.x,
                    y: waypoint.y,
                });
            }
            if board.is_wall(waypoint) || board.is_forbidden(waypoint) {
                return Err(StageError::OnBlockedTile {
                    entity: "enemy",
                    id: desc.id.clone(),
                    x: waypoint.x,
                    y: waypoint.y,
                });
            }
        }
    }

    Ok(enemy)
}

// =============================================================================
// Item construction
// =============================================================================

fn build_items(
    descs: &[ItemDescriptor],
    board: &Board,
    enemies: &[EnemyState],
) -> Result<Vec<ItemState>, StageError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut by_position: BTreeMap<Position, &str> = BTreeMap::new();
    let mut items = Vec::with_capacity(descs.len());

    for desc in descs {
        if !seen_ids.insert(desc.id.as_str()) {
            return Err(StageError::DuplicateId {
                entity: "item",
                id: desc.id.clone(),
            });
        }
        let position = Position::new(desc.position.0, desc.position.1);
        if !board.in_bounds(position) {
            return Err(StageError::OutOfBounds {
                entity: "item",
                id: desc.id.clone(),
                x: position.x,
                y: position.y,
            });
        }
        if board.is_wall(position) || board.is_forbidden(position) {
            return Err(StageError::OnBlockedTile {
                entity: "item",
                id: desc.id.clone(),
                x: position.x,
                y: position.y,
            });
        }
        if let Some(other) = by_position.insert(position, desc.id.as_str()) {
            return Err(StageError::ItemOverlap {
                a: other.to_string(),
                b: desc.id.clone(),
            });
        }
        if let Some(enemy) = enemies.iter().find(|e| e.occupies(position)) {
            return Err(StageError::ItemUnderEnemy {
                id: desc.id.clone(),
                enemy: enemy.id.to_string(),
            });
        }

        // Kind-specific fields.
        if desc.damage.is_some() && desc.kind != ItemKind::Bomb {
            return Err(StageError::FieldNotApplicable {
                entity: "item",
                id: desc.id.clone(),
                field: "damage",
            });
        }
        if desc.heal.is_some() && desc.kind != ItemKind::Potion {
            return Err(StageError::FieldNotApplicable {
                entity: "item",
                id: desc.id.clone(),
                field: "heal",
            });
        }
        if desc.effect.is_some() && desc.kind != ItemKind::Weapon {
            return Err(StageError::FieldNotApplicable {
                entity: "item",
                id: desc.id.clone(),
                field: "effect",
            });
        }

        let damage = match desc.kind {
            ItemKind::Bomb => desc.damage.unwrap_or(DEFAULT_BOMB_DAMAGE),
            _ => 0,
        };
        let heal = match desc.kind {
            ItemKind::Potion => desc.heal.unwrap_or(DEFAULT_POTION_HEAL),
            _ => 0,
        };
        let attack_bonus = match desc.kind {
            ItemKind::Weapon => match &desc.effect {
                Some(ItemEffect::AttackBoost { amount }) => *amount,
                None => DEFAULT_WEAPON_BONUS,
            },
            _ => 0,
        };
        for (field, value) in [("damage", damage), ("heal", heal), ("attack_bonus", attack_bonus)]
        {
            if value < 0 {
                return Err(StageError::NonPositive {
                    entity: "item",
                    id: desc.id.clone(),
                    field,
                    value: value as i64,
                });
            }
        }

        items.push(ItemState {
            id: ItemId::from(desc.id.as_str()),
            kind: desc.kind,
            position,
            damage,
            heal,
            attack_bonus,
        });
    }

    Ok(items)
}
