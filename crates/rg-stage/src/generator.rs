//! Seeded stage generation — five families, reproducible from `(family, seed)`.
//!
//! `generate_raw` is a pure function of family and seed. `generate` wraps it
//! in a validate-and-retry loop: every candidate must pass the structural
//! loader, and the caller supplies a solvability check (typically a
//! node-capped A* run) since this crate sits below the solver. Candidates
//! that fail solvability are regenerated with a derived seed up to
//! `GeneratorConfig::max_retries`, then either rejected or emitted with a
//! logged warning.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use rayon::prelude::*;
use thiserror::Error;

use rg_types::grid::{Direction, Position};
use rg_types::rng::StageRng;

use crate::descriptor::*;
use crate::loader::build_state;

// =============================================================================
// Families & configuration
// =============================================================================

/// Stage family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageFamily {
    /// Sparse walls, single start/goal, path guaranteed.
    Move,
    /// Static enemies, optional weapon.
    Attack,
    /// Items including bombs, collect-all policy, mixed obstacles.
    Pickup,
    /// Moving enemies with vision cones.
    Patrol,
    /// Large/rage enemies and a conditional-kill composition.
    Special,
}

impl StageFamily {
    pub const ALL: [Self; 5] = [
        Self::Move,
        Self::Attack,
        Self::Pickup,
        Self::Patrol,
        Self::Special,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Attack => "attack",
            Self::Pickup => "pickup",
            Self::Patrol => "patrol",
            Self::Special => "special",
        }
    }
}

impl std::fmt::Display for StageFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StageFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "move" => Ok(Self::Move),
            "attack" => Ok(Self::Attack),
            "pickup" => Ok(Self::Pickup),
            "patrol" => Ok(Self::Patrol),
            "special" => Ok(Self::Special),
            other => Err(format!("unknown stage family {other:?}")),
        }
    }
}

/// Generation policy.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    /// How many derived-seed candidates to try before giving up.
    pub max_retries: u32,
    /// Emit the last candidate with a warning instead of failing when no
    /// candidate passed the solvability check.
    pub emit_unsolvable: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            emit_unsolvable: false,
        }
    }
}

/// A generated, structurally valid stage.
#[derive(Debug, Clone)]
pub struct GeneratedStage {
    pub descriptor: StageDescriptor,
    pub family: StageFamily,
    pub seed: u64,
    /// 1-based attempt that produced this descriptor.
    pub attempt: u32,
    /// Whether the solvability check passed.
    pub solvable: bool,
}

/// Generation failure.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no solvable {family} stage found for seed {seed} in {attempts} attempts")]
    ExhaustedRetries {
        family: StageFamily,
        seed: u64,
        attempts: u32,
    },
}

// =============================================================================
// Public API
// =============================================================================

/// Build the candidate descriptor for `(family, seed)` with no validation.
/// Pure: identical inputs always yield the identical descriptor.
pub fn generate_raw(family: StageFamily, seed: u64) -> StageDescriptor {
    let mut rng = StageRng::new(seed);
    match family {
        StageFamily::Move => gen_move(&mut rng, family, seed),
        StageFamily::Attack => gen_attack(&mut rng, family, seed),
        StageFamily::Pickup => gen_pickup(&mut rng, family, seed),
        StageFamily::Patrol => gen_patrol(&mut rng, family, seed),
        StageFamily::Special => gen_special(&mut rng, family, seed),
    }
}

/// Generate a stage, retrying with derived seeds until both the structural
/// loader and the caller's solvability check accept a candidate.
pub fn generate<F>(
    family: StageFamily,
    seed: u64,
    config: GeneratorConfig,
    mut is_solvable: F,
) -> Result<GeneratedStage, GenerateError>
where
    F: FnMut(&StageDescriptor) -> bool,
{
    let attempts = config.max_retries.max(1);
    let mut last_valid: Option<(StageDescriptor, u32)> = None;

    for attempt in 1..=attempts {
        let derived = derive_seed(seed, attempt);
        let descriptor = generate_raw(family, derived);

        // The generator must only emit loader-clean stages; a structural
        // reject here means the candidate geometry collided, so retry.
        if let Err(err) = build_state(&descriptor) {
            log::warn!("{family} candidate seed={derived} structurally invalid: {err}");
            continue;
        }

        if is_solvable(&descriptor) {
            log::info!("{family} stage generated: seed={seed} attempt={attempt}");
            return Ok(GeneratedStage {
                descriptor,
                family,
                seed,
                attempt,
                solvable: true,
            });
        }

        log::warn!("{family} candidate seed={derived} failed solvability check");
        last_valid = Some((descriptor, attempt));
    }

    match (config.emit_unsolvable, last_valid) {
        (true, Some((descriptor, attempt))) => {
            log::warn!("emitting unverified {family} stage for seed {seed}");
            Ok(GeneratedStage {
                descriptor,
                family,
                seed,
                attempt,
                solvable: false,
            })
        }
        _ => Err(GenerateError::ExhaustedRetries {
            family,
            seed,
            attempts,
        }),
    }
}

/// Generate a batch of stages, validating candidates in parallel. Each seed
/// owns its own candidate state, so the batch is embarrassingly parallel.
pub fn generate_batch<F>(
    family: StageFamily,
    seeds: &[u64],
    config: GeneratorConfig,
    is_solvable: F,
) -> Vec<Result<GeneratedStage, GenerateError>>
where
    F: Fn(&StageDescriptor) -> bool + Sync,
{
    seeds
        .par_iter()
        .map(|&seed| generate(family, seed, config, &is_solvable))
        .collect()
}

/// Derived per-attempt seed; distinct attempts must not replay the same
/// candidate.
fn derive_seed(seed: u64, attempt: u32) -> u64 {
    seed.wrapping_add((attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

// =============================================================================
// Shared construction helpers
// =============================================================================

fn standard_legend() -> BTreeMap<char, String> {
    BTreeMap::from([
        ('.', "empty".to_string()),
        ('#', "wall".to_string()),
        ('X', "forbidden".to_string()),
        ('G', "goal".to_string()),
        ('S', "start".to_string()),
    ])
}

/// Cells on the L-shaped corridor from `from` to `to` (east/west leg first,
/// then north/south). Walls are never placed on these cells, so a path
/// always survives.
fn carve_path(from: Position, to: Position) -> BTreeSet<Position> {
    let mut cells = BTreeSet::new();
    let step_x = if to.x >= from.x { 1 } else { -1 };
    let mut x = from.x;
    while x != to.x {
        cells.insert(Position::new(x, from.y));
        x += step_x;
    }
    let step_y = if to.y >= from.y { 1 } else { -1 };
    let mut y = from.y;
    while y != to.y {
        cells.insert(Position::new(to.x, y));
        y += step_y;
    }
    cells.insert(from);
    cells.insert(to);
    cells
}

/// Grid rows for a board with the given walls, start and goal markers.
fn render_grid(width: i32, height: i32, walls: &BTreeSet<Position>, start: Position, goal: Position) -> Vec<String> {
    (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let pos = Position::new(x, y);
                    if pos == start {
                        'S'
                    } else if pos == goal {
                        'G'
                    } else if walls.contains(&pos) {
                        '#'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect()
}

/// Scatter walls over the board, skipping protected cells.
fn scatter_walls(
    rng: &mut StageRng,
    width: i32,
    height: i32,
    density: f64,
    protected: &BTreeSet<Position>,
) -> BTreeSet<Position> {
    let mut walls = BTreeSet::new();
    for y in 0..height {
        for x in 0..width {
            let pos = Position::new(x, y);
            if !protected.contains(&pos) && rng.chance(density) {
                walls.insert(pos);
            }
        }
    }
    walls
}

/// Pick `count` distinct free cells (not protected, not walls), shuffled
/// deterministically.
fn pick_free_cells(
    rng: &mut StageRng,
    width: i32,
    height: i32,
    walls: &BTreeSet<Position>,
    protected: &BTreeSet<Position>,
    count: usize,
) -> Vec<Position> {
    let mut candidates: Vec<Position> = (0..height)
        .flat_map(|y| (0..width).map(move |x| Position::new(x, y)))
        .filter(|pos| !walls.contains(pos) && !protected.contains(pos))
        .collect();
    rng.shuffle(&mut candidates);
    candidates.truncate(count);
    candidates
}

fn board_descriptor(
    width: i32,
    height: i32,
    walls: &BTreeSet<Position>,
    start: Position,
    goal: Position,
) -> BoardDescriptor {
    BoardDescriptor {
        size: (width, height),
        grid: render_grid(width, height, walls, start, goal),
        legend: standard_legend(),
    }
}

fn player_descriptor(start: Position, direction: Direction) -> PlayerDescriptor {
    PlayerDescriptor {
        start: (start.x, start.y),
        direction,
        hp: None,
        max_hp: None,
        attack_power: None,
        stamina: None,
        max_stamina: None,
    }
}

fn constraints(max_turns: u32, apis: &[&str]) -> ConstraintsDescriptor {
    ConstraintsDescriptor {
        max_turns,
        allowed_apis: apis.iter().map(|s| s.to_string()).collect(),
    }
}

const MOVEMENT_APIS: [&str; 5] = ["turn_left", "turn_right", "move", "wait", "see"];
const COMBAT_APIS: [&str; 7] = [
    "turn_left",
    "turn_right",
    "move",
    "attack",
    "pickup",
    "wait",
    "see",
];
const FULL_APIS: [&str; 8] = [
    "turn_left",
    "turn_right",
    "move",
    "attack",
    "pickup",
    "dispose",
    "wait",
    "see",
];

// =============================================================================
// Family builders
// =============================================================================

fn gen_move(rng: &mut StageRng, family: StageFamily, seed: u64) -> StageDescriptor {
    let width = rng.next_int(5, 9) as i32;
    let height = rng.next_int(5, 9) as i32;
    let start = Position::new(0, 0);
    let goal = Position::new(width - 1, height - 1);

    let protected = carve_path(start, goal);
    let walls = scatter_walls(rng, width, height, 0.15, &protected);

    StageDescriptor {
        id: format!("{}_{seed:08x}", family.name()),
        board: board_descriptor(width, height, &walls, start, goal),
        player: player_descriptor(start, Direction::E),
        goal: GoalDescriptor {
            position: (goal.x, goal.y),
        },
        enemies: Vec::new(),
        items: Vec::new(),
        constraints: constraints(4 * (width + height) as u32, &MOVEMENT_APIS),
        special_conditions: None,
    }
}

fn gen_attack(rng: &mut StageRng, family: StageFamily, seed: u64) -> StageDescriptor {
    let width = rng.next_int(6, 9) as i32;
    let height = rng.next_int(6, 9) as i32;
    let start = Position::new(0, 0);
    let goal = Position::new(width - 1, height - 1);

    let mut protected = carve_path(start, goal);
    let walls = scatter_walls(rng, width, height, 0.08, &protected);

    // Static sentries sit off the carved corridor so the stage stays
    // walkable even if the player never fights.
    let enemy_count = rng.next_int(1, 3) as usize;
    let spots = pick_free_cells(rng, width, height, &walls, &protected, enemy_count + 1);
    let mut enemies = Vec::new();
    for (i, &pos) in spots.iter().take(enemy_count).enumerate() {
        protected.insert(pos);
        enemies.push(EnemyDescriptor {
            id: format!("sentry_{i}"),
            kind: rg_types::enums::EnemyKind::Normal,
            position: (pos.x, pos.y),
            direction: Direction::ALL[rng.next_int(0, 3) as usize],
            hp: Some(30 * rng.next_int(1, 2) as i32),
            max_hp: None,
            attack_power: Some(10),
            behavior: Some(EnemyBehavior::Static),
            vision_range: Some(0),
            patrol: Vec::new(),
            rage_threshold: None,
            area_attack_range: None,
            special_conditions: None,
        });
    }

    // Optional weapon on the remaining spot.
    let mut items = Vec::new();
    if rng.chance(0.5) {
        if let Some(&pos) = spots.get(enemy_count) {
            items.push(ItemDescriptor {
                id: "blade".to_string(),
                kind: rg_types::enums::ItemKind::Weapon,
                position: (pos.x, pos.y),
                damage: None,
                heal: None,
                effect: Some(ItemEffect::AttackBoost { amount: 20 }),
            });
        }
    }

    StageDescriptor {
        id: format!("{}_{seed:08x}", family.name()),
        board: board_descriptor(width, height, &walls, start, goal),
        player: player_descriptor(start, Direction::E),
        goal: GoalDescriptor {
            position: (goal.x, goal.y),
        },
        enemies,
        items,
        constraints: constraints(6 * (width + height) as u32, &COMBAT_APIS),
        special_conditions: None,
    }
}

fn gen_pickup(rng: &mut StageRng, family: StageFamily, seed: u64) -> StageDescriptor {
    let width = rng.next_int(6, 9) as i32;
    let height = rng.next_int(6, 9) as i32;
    let start = Position::new(0, 0);
    let goal = Position::new(width - 1, height - 1);

    let protected = carve_path(start, goal);
    let walls = scatter_walls(rng, width, height, 0.10, &protected);

    let item_count = rng.next_int(2, 4) as usize;
    let mut item_protected = protected.clone();
    item_protected.insert(start);
    item_protected.insert(goal);
    let spots = pick_free_cells(rng, width, height, &walls, &item_protected, item_count);

    let mut items = Vec::new();
    for (i, &pos) in spots.iter().enumerate() {
        if rng.chance(0.4) {
            items.push(ItemDescriptor {
                id: format!("bomb_{i}"),
                kind: rg_types::enums::ItemKind::Bomb,
                position: (pos.x, pos.y),
                damage: Some(50),
                heal: None,
                effect: None,
            });
        } else {
            items.push(ItemDescriptor {
                id: format!("key_{i}"),
                kind: rg_types::enums::ItemKind::Key,
                position: (pos.x, pos.y),
                damage: None,
                heal: None,
                effect: None,
            });
        }
    }

    StageDescriptor {
        id: format!("{}_{seed:08x}", family.name()),
        board: board_descriptor(width, height, &walls, start, goal),
        player: player_descriptor(start, Direction::E),
        goal: GoalDescriptor {
            position: (goal.x, goal.y),
        },
        enemies: Vec::new(),
        items,
        constraints: constraints(8 * (width + height) as u32, &FULL_APIS),
        special_conditions: Some(StageConditions {
            stamina: false,
            collect_all_items: true,
        }),
    }
}

fn gen_patrol(rng: &mut StageRng, family: StageFamily, seed: u64) -> StageDescriptor {
    let width = rng.next_int(7, 10) as i32;
    let height = rng.next_int(7, 10) as i32;
    let start = Position::new(0, 0);
    let goal = Position::new(width - 1, height - 1);

    let protected = carve_path(start, goal);
    let walls = scatter_walls(rng, width, height, 0.05, &protected);

    // Patrol lanes: horizontal back-and-forth routes on interior rows.
    let enemy_count = rng.next_int(1, 2) as usize;
    let mut enemies = Vec::new();
    let mut used_rows: BTreeSet<i32> = BTreeSet::new();
    for i in 0..enemy_count {
        let y = rng.next_int(2, height as u32 - 2) as i32;
        if used_rows.contains(&y) {
            continue;
        }
        used_rows.insert(y);
        let lane: Vec<Position> = (1..width - 1)
            .map(|x| Position::new(x, y))
            .filter(|pos| !walls.contains(pos) && *pos != start && *pos != goal)
            .collect();
        if lane.len() < 2 {
            continue;
        }
        let a = lane[0];
        let b = lane[lane.len() - 1];
        enemies.push(EnemyDescriptor {
            id: format!("patroller_{i}"),
            kind: rg_types::enums::EnemyKind::Normal,
            position: (a.x, a.y),
            direction: Direction::E,
            hp: Some(30),
            max_hp: None,
            attack_power: Some(20),
            behavior: Some(EnemyBehavior::Patrol),
            vision_range: Some(rng.next_int(2, 3)),
            patrol: vec![(a.x, a.y), (b.x, b.y)],
            rage_threshold: None,
            area_attack_range: None,
            special_conditions: None,
        });
    }

    StageDescriptor {
        id: format!("{}_{seed:08x}", family.name()),
        board: board_descriptor(width, height, &walls, start, goal),
        player: player_descriptor(start, Direction::S),
        goal: GoalDescriptor {
            position: (goal.x, goal.y),
        },
        enemies,
        items: Vec::new(),
        constraints: constraints(10 * (width + height) as u32, &MOVEMENT_APIS),
        special_conditions: None,
    }
}

fn gen_special(rng: &mut StageRng, family: StageFamily, seed: u64) -> StageDescriptor {
    let width = 11;
    let height = 11;
    let start = Position::new(0, 0);
    let goal = Position::new(width - 1, height - 1);

    // Open arena; the challenge is the enemy composition, not the terrain.
    let walls = BTreeSet::new();

    let brute_anchor = Position::new(2, rng.next_int(4, 6) as i32);
    let giant_anchor = Position::new(7, rng.next_int(1, 3) as i32);
    let watcher_anchor = Position::new(4, 8);

    let enemies = vec![
        EnemyDescriptor {
            id: "brute".to_string(),
            kind: rg_types::enums::EnemyKind::Large2x2,
            position: (brute_anchor.x, brute_anchor.y),
            direction: Direction::E,
            hp: Some(100),
            max_hp: None,
            attack_power: Some(30),
            behavior: Some(EnemyBehavior::Static),
            vision_range: Some(2),
            patrol: Vec::new(),
            rage_threshold: None,
            area_attack_range: None,
            special_conditions: None,
        },
        EnemyDescriptor {
            id: "giant".to_string(),
            kind: rg_types::enums::EnemyKind::Large3x3,
            position: (giant_anchor.x, giant_anchor.y),
            direction: Direction::S,
            hp: Some(150),
            max_hp: None,
            attack_power: Some(40),
            behavior: Some(EnemyBehavior::Static),
            vision_range: Some(2),
            patrol: Vec::new(),
            rage_threshold: None,
            area_attack_range: None,
            special_conditions: None,
        },
        EnemyDescriptor {
            id: "watcher".to_string(),
            kind: rg_types::enums::EnemyKind::Special2x3,
            position: (watcher_anchor.x, watcher_anchor.y),
            direction: Direction::N,
            hp: None,
            max_hp: None,
            attack_power: None,
            behavior: Some(EnemyBehavior::Static),
            vision_range: Some(3),
            patrol: Vec::new(),
            rage_threshold: None,
            area_attack_range: None,
            special_conditions: Some(EnemyConditions {
                required_sequence: vec!["brute".to_string(), "giant".to_string()],
            }),
        },
    ];

    let items = vec![ItemDescriptor {
        id: "greatsword".to_string(),
        kind: rg_types::enums::ItemKind::Weapon,
        position: (1, 1),
        damage: None,
        heal: None,
        effect: Some(ItemEffect::AttackBoost { amount: 30 }),
    }];

    StageDescriptor {
        id: format!("{}_{seed:08x}", family.name()),
        board: board_descriptor(width, height, &walls, start, goal),
        player: player_descriptor(start, Direction::S),
        goal: GoalDescriptor {
            position: (goal.x, goal.y),
        },
        enemies,
        items,
        constraints: constraints(120, &FULL_APIS),
        special_conditions: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_reproducible() {
        for family in StageFamily::ALL {
            let a = generate_raw(family, 42);
            let b = generate_raw(family, 42);
            assert_eq!(a, b, "family {family} not reproducible");
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_raw(StageFamily::Move, 1);
        let b = generate_raw(StageFamily::Move, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn candidates_are_loader_clean() {
        for family in StageFamily::ALL {
            for seed in 0..20 {
                let descriptor = generate_raw(family, seed);
                build_state(&descriptor).unwrap_or_else(|err| {
                    panic!("family {family} seed {seed} structurally invalid: {err}")
                });
            }
        }
    }

    #[test]
    fn generate_accepts_first_solvable_candidate() {
        let result = generate(
            StageFamily::Move,
            42,
            GeneratorConfig::default(),
            |_| true,
        )
        .unwrap();
        assert!(result.solvable);
        assert_eq!(result.attempt, 1);
    }

    #[test]
    fn generate_exhausts_retries() {
        let config = GeneratorConfig {
            max_retries: 3,
            emit_unsolvable: false,
        };
        let err = generate(StageFamily::Move, 42, config, |_| false).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::ExhaustedRetries { attempts: 3, .. }
        ));
    }

    #[test]
    fn generate_can_emit_unverified() {
        let config = GeneratorConfig {
            max_retries: 2,
            emit_unsolvable: true,
        };
        let result = generate(StageFamily::Pickup, 7, config, |_| false).unwrap();
        assert!(!result.solvable);
    }

    #[test]
    fn batch_matches_single_generation() {
        let seeds = [1u64, 2, 3, 4];
        let batch = generate_batch(
            StageFamily::Attack,
            &seeds,
            GeneratorConfig::default(),
            |_| true,
        );
        for (seed, result) in seeds.iter().zip(batch) {
            let single =
                generate(StageFamily::Attack, *seed, GeneratorConfig::default(), |_| true).unwrap();
            assert_eq!(result.unwrap().descriptor, single.descriptor);
        }
    }

    #[test]
    fn special_family_composes_conditional_stage() {
        let descriptor = generate_raw(StageFamily::Special, 9);
        let state = build_state(&descriptor).unwrap();
        assert_eq!(state.enemies.len(), 3);
        let watcher = state.enemy_by_id(&"watcher".into()).unwrap();
        assert_eq!(watcher.required_sequence.len(), 2);
        assert_eq!(watcher.hp, rg_types::state::SPECIAL_ENEMY_HP);
    }
}
