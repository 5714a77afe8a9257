//! Command-line front-end for rogrid.
//!
//! Subcommands: `generate`, `validate`, `solve`, `replay`, `play`. Exit
//! codes are partitioned: 0 success, 2 generation error, 3 validation
//! error, 4 I/O error, 5 timeout/exhaustion.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};
use serde::{Deserialize, Serialize};

use rg_engine::{enumerate_actions, execute_turn, observe, RuleConfig};
use rg_solver::search::{solve, CancelToken, SearchLimits, SearchOutcome};
use rg_solver::{certify_solution, generate_validated};
use rg_stage::generator::{GeneratorConfig, StageFamily};
use rg_stage::{load_stage_file, parse_descriptor};
use rg_types::action::Action;
use rg_types::enums::GameStatus;
use rg_types::state::GameState;

const EXIT_GENERATION: u8 = 2;
const EXIT_VALIDATION: u8 = 3;
const EXIT_IO: u8 = 4;
const EXIT_TIMEOUT: u8 = 5;

#[derive(Parser)]
#[command(name = "rg-cli", about = "Roguelike stage tools: generate, validate, solve, replay, play")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a stage and write it as YAML.
    Generate {
        /// Stage family: move, attack, pickup, patrol, special.
        #[arg(long)]
        family: StageFamily,
        #[arg(long)]
        seed: u64,
        /// Output path; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Emit the last candidate even if the solvability check failed.
        #[arg(long)]
        allow_unsolvable: bool,
        /// Node cap for the per-candidate solvability check.
        #[arg(long, default_value_t = 100_000)]
        validate_nodes: usize,
    },
    /// Validate a stage descriptor file.
    Validate { stage: PathBuf },
    /// Solve a stage and print (or write) the action sequence.
    Solve {
        stage: PathBuf,
        #[arg(long)]
        max_nodes: Option<usize>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Write the solution as JSON instead of printing tokens.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a solution file against the engine and check parity.
    Replay {
        stage: PathBuf,
        solution: PathBuf,
    },
    /// Play a stage interactively.
    Play { stage: PathBuf },
}

/// Solution file format shared by `solve --out` and `replay`.
#[derive(Debug, Serialize, Deserialize)]
struct SolutionFile {
    stage_id: String,
    actions: Vec<Action>,
    nodes_explored: usize,
    solution_length: usize,
    elapsed_ms: u128,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate {
            family,
            seed,
            out,
            allow_unsolvable,
            validate_nodes,
        } => cmd_generate(family, seed, out, allow_unsolvable, validate_nodes),
        Command::Validate { stage } => cmd_validate(&stage),
        Command::Solve {
            stage,
            max_nodes,
            timeout_secs,
            out,
        } => cmd_solve(&stage, max_nodes, timeout_secs, out),
        Command::Replay { stage, solution } => cmd_replay(&stage, &solution),
        Command::Play { stage } => cmd_play(&stage),
    }
}

// =============================================================================
// generate
// =============================================================================

fn cmd_generate(
    family: StageFamily,
    seed: u64,
    out: Option<PathBuf>,
    allow_unsolvable: bool,
    validate_nodes: usize,
) -> ExitCode {
    let config = GeneratorConfig {
        emit_unsolvable: allow_unsolvable,
        ..GeneratorConfig::default()
    };
    let rules = RuleConfig::default();

    let generated = match generate_validated(family, seed, config, &rules, validate_nodes) {
        Ok(generated) => generated,
        Err(err) => {
            eprintln!("generation failed: {err}");
            return ExitCode::from(EXIT_GENERATION);
        }
    };

    let yaml = match generated.descriptor.to_yaml() {
        Ok(yaml) => yaml,
        Err(err) => {
            eprintln!("failed to serialize stage: {err}");
            return ExitCode::from(EXIT_GENERATION);
        }
    };

    match out {
        Some(path) => {
            if let Err(err) = std::fs::write(&path, yaml) {
                eprintln!("failed to write {}: {err}", path.display());
                return ExitCode::from(EXIT_IO);
            }
            println!(
                "wrote {} (family {}, seed {}, attempt {})",
                path.display(),
                generated.family,
                generated.seed,
                generated.attempt
            );
        }
        None => print!("{yaml}"),
    }
    ExitCode::SUCCESS
}

// =============================================================================
// validate
// =============================================================================

fn cmd_validate(stage: &Path) -> ExitCode {
    let yaml = match std::fs::read_to_string(stage) {
        Ok(yaml) => yaml,
        Err(err) => {
            eprintln!("failed to read {}: {err}", stage.display());
            return ExitCode::from(EXIT_IO);
        }
    };
    let descriptor = match parse_descriptor(&yaml) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            eprintln!("invalid stage: {err}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };
    match rg_stage::build_state(&descriptor) {
        Ok(state) => {
            println!(
                "{} ok: {}x{} board, {} enemies, {} items, {} turns",
                descriptor.id,
                state.board.width,
                state.board.height,
                state.enemies.len(),
                state.items.len(),
                state.max_turns
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("invalid stage: {err}");
            ExitCode::from(EXIT_VALIDATION)
        }
    }
}

// =============================================================================
// solve
// =============================================================================

fn cmd_solve(
    stage: &Path,
    max_nodes: Option<usize>,
    timeout_secs: Option<u64>,
    out: Option<PathBuf>,
) -> ExitCode {
    let initial = match load_stage_file(stage) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("failed to load stage: {err}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };
    let rules = RuleConfig::default();
    let limits = SearchLimits {
        max_nodes,
        timeout: timeout_secs.map(Duration::from_secs),
        ..SearchLimits::default()
    };

    let outcome = solve(&initial, &rules, &limits, &CancelToken::new(), None);
    let stats = outcome.stats().clone();

    match outcome {
        SearchOutcome::Solved { actions, stats } => {
            if let Err(err) = certify_solution(&initial, &rules, &actions) {
                eprintln!("solver produced an uncertifiable sequence: {err}");
                return ExitCode::from(EXIT_VALIDATION);
            }
            let solution = SolutionFile {
                stage_id: initial.stage_id.to_string(),
                solution_length: actions.len(),
                nodes_explored: stats.nodes_explored,
                elapsed_ms: stats.elapsed.as_millis(),
                actions,
            };
            match out {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&solution).expect("serialize solution");
                    if let Err(err) = std::fs::write(&path, json) {
                        eprintln!("failed to write {}: {err}", path.display());
                        return ExitCode::from(EXIT_IO);
                    }
                    println!("wrote {}", path.display());
                }
                None => {
                    let tokens: Vec<String> =
                        solution.actions.iter().map(|a| a.to_string()).collect();
                    println!("{}", tokens.join(" "));
                }
            }
            println!(
                "solved in {} actions, {} nodes, {} ms",
                solution.solution_length, solution.nodes_explored, solution.elapsed_ms
            );
            ExitCode::SUCCESS
        }
        SearchOutcome::Unsolvable { .. } => {
            eprintln!(
                "unreachable: no winning sequence exists ({} nodes explored)",
                stats.nodes_explored
            );
            ExitCode::from(EXIT_TIMEOUT)
        }
        SearchOutcome::NodeLimitReached { .. } => {
            eprintln!(
                "node limit reached after {} nodes; best partial path available",
                stats.nodes_explored
            );
            ExitCode::from(EXIT_TIMEOUT)
        }
        SearchOutcome::TimedOut { .. } | SearchOutcome::Cancelled { .. } => {
            eprintln!("search timed out after {} nodes", stats.nodes_explored);
            ExitCode::from(EXIT_TIMEOUT)
        }
    }
}

// =============================================================================
// replay
// =============================================================================

fn cmd_replay(stage: &Path, solution: &Path) -> ExitCode {
    let initial = match load_stage_file(stage) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("failed to load stage: {err}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };
    let json = match std::fs::read_to_string(solution) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("failed to read {}: {err}", solution.display());
            return ExitCode::from(EXIT_IO);
        }
    };
    let solution: SolutionFile = match serde_json::from_str(&json) {
        Ok(solution) => solution,
        Err(err) => {
            eprintln!("invalid solution file: {err}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };

    let rules = RuleConfig::default();
    match certify_solution(&initial, &rules, &solution.actions) {
        Ok(run) => {
            println!(
                "replay ok: won in {} steps, every snapshot identical",
                run.steps
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("replay failed: {err}");
            ExitCode::from(EXIT_VALIDATION)
        }
    }
}

// =============================================================================
// play
// =============================================================================

fn cmd_play(stage: &Path) -> ExitCode {
    let mut state = match load_stage_file(stage) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("failed to load stage: {err}");
            return ExitCode::from(EXIT_VALIDATION);
        }
    };
    let rules = RuleConfig::default();

    println!("\n  == {} ==\n", state.stage_id);

    loop {
        display_state(&state, &rules);

        if state.status != GameStatus::Playing {
            println!(
                "\n  {} at turn {}",
                if state.status == GameStatus::Won {
                    "You won"
                } else {
                    "You failed"
                },
                state.turn_count
            );
            return ExitCode::SUCCESS;
        }

        let actions = enumerate_actions(&state, &rules);
        if actions.is_empty() {
            println!("  no actions available");
            return ExitCode::SUCCESS;
        }

        let labels: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        let Ok(choice) = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("action")
            .items(&labels)
            .default(0)
            .interact()
        else {
            return ExitCode::SUCCESS;
        };

        let result = execute_turn(&mut state, &rules, actions[choice]);
        println!("  {}", result.message);
    }
}

fn display_state(state: &GameState, rules: &RuleConfig) {
    let obs = observe::see(state, rules.see_range);
    println!(
        "  turn {}/{}  hp {}/{}  at {} facing {}",
        state.turn_count,
        state.max_turns,
        obs.player.hp,
        obs.player.max_hp,
        obs.player.position,
        obs.player.direction
    );

    for y in 0..state.board.height {
        let row: String = (0..state.board.width)
            .map(|x| {
                let pos = rg_types::Position::new(x, y);
                if pos == state.player.position {
                    '@'
                } else if pos == state.board.goal {
                    'G'
                } else {
                    match state.cell_kind(pos) {
                        rg_types::CellKind::Wall => '#',
                        rg_types::CellKind::Forbidden => 'X',
                        rg_types::CellKind::Enemy => 'E',
                        rg_types::CellKind::Item => '*',
                        _ => '.',
                    }
                }
            })
            .collect();
        println!("  {row}");
    }
}
