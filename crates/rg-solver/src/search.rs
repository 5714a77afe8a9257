//! A* search over complete game states.
//!
//! The search node is the full `GameState`; successors come from the
//! engine's own `enumerate_actions` applied through the engine's own
//! `execute_turn`. There is no second simulation — whatever the search
//! finds is, by construction, what the engine will replay.
//!
//! Outcomes are data, never errors: exhaustion, node limits, timeouts and
//! cancellation all return the best-so-far path as a hint.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rg_engine::{enumerate_actions, execute_turn, RuleConfig};
use rg_types::action::Action;
use rg_types::enums::GameStatus;
use rg_types::state::GameState;

use crate::encode::SearchKey;
use crate::heuristic::heuristic;

// =============================================================================
// Configuration & results
// =============================================================================

/// Search bounds. `max_nodes: None` is the unlimited mode.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Cap on explored (popped) nodes.
    pub max_nodes: Option<usize>,
    /// Wall-clock budget.
    pub timeout: Option<Duration>,
    /// Emit progress every this many explored nodes.
    pub progress_every: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_nodes: Some(1_000_000),
            timeout: None,
            progress_every: 10_000,
        }
    }
}

/// Cooperative cancellation token, checked once per pop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress report emitted during the search.
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress {
    pub nodes_explored: usize,
    pub frontier_size: usize,
    pub best_h: u32,
}

/// Counters for a finished (or abandoned) search.
#[derive(Debug, Clone)]
pub struct SearchStats {
    pub nodes_explored: usize,
    pub frontier_size: usize,
    pub solution_length: Option<usize>,
    pub elapsed: Duration,
}

/// Why the search stopped.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Goal reached; `actions` replays from the initial state to the win.
    Solved {
        actions: Vec<Action>,
        stats: SearchStats,
    },
    /// Open list drained with no winning state.
    Unsolvable {
        stats: SearchStats,
        best_hint: Vec<Action>,
    },
    /// Node cap hit.
    NodeLimitReached {
        stats: SearchStats,
        best_hint: Vec<Action>,
    },
    /// Wall-clock budget hit.
    TimedOut {
        stats: SearchStats,
        best_hint: Vec<Action>,
    },
    /// External cancellation.
    Cancelled {
        stats: SearchStats,
        best_hint: Vec<Action>,
    },
}

impl SearchOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved { .. })
    }

    pub fn stats(&self) -> &SearchStats {
        match self {
            Self::Solved { stats, .. }
            | Self::Unsolvable { stats, .. }
            | Self::NodeLimitReached { stats, .. }
            | Self::TimedOut { stats, .. }
            | Self::Cancelled { stats, .. } => stats,
        }
    }
}

// =============================================================================
// Search internals
// =============================================================================

struct Node {
    state: GameState,
    parent: Option<usize>,
    action: Option<Action>,
    g: u32,
    h: u32,
}

/// Heap ordering: lowest f, then lowest h, then lowest turn count, then
/// insertion order. All baked into one reversed tuple.
type OpenEntry = Reverse<(u32, u32, u32, usize, usize)>;

fn open_entry(node: &Node, seq: usize, idx: usize) -> OpenEntry {
    Reverse((node.g + node.h, node.h, node.state.turn_count, seq, idx))
}

/// Run A* from `initial` until a winning state, exhaustion, or a bound.
pub fn solve(
    initial: &GameState,
    rules: &RuleConfig,
    limits: &SearchLimits,
    cancel: &CancelToken,
    mut progress: Option<&mut dyn FnMut(SearchProgress)>,
) -> SearchOutcome {
    let started = Instant::now();

    let mut nodes: Vec<Node> = Vec::new();
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut closed: HashSet<SearchKey> = HashSet::new();
    let mut seq: usize = 0;

    let root_h = heuristic(initial);
    nodes.push(Node {
        state: initial.clone(),
        parent: None,
        action: None,
        g: 0,
        h: root_h,
    });
    open.push(open_entry(&nodes[0], seq, 0));

    let mut nodes_explored = 0usize;
    let mut best_idx = 0usize;
    let mut best_h = root_h;

    macro_rules! stats {
        ($solution_length:expr) => {
            SearchStats {
                nodes_explored,
                frontier_size: open.len(),
                solution_length: $solution_length,
                elapsed: started.elapsed(),
            }
        };
    }

    while let Some(Reverse((_, _, _, _, idx))) = open.pop() {
        if cancel.is_cancelled() {
            log::info!("search cancelled after {nodes_explored} nodes");
            return SearchOutcome::Cancelled {
                stats: stats!(None),
                best_hint: path_to(&nodes, best_idx),
            };
        }
        if let Some(timeout) = limits.timeout {
            if started.elapsed() >= timeout {
                log::info!("search timed out after {nodes_explored} nodes");
                return SearchOutcome::TimedOut {
                    stats: stats!(None),
                    best_hint: path_to(&nodes, best_idx),
                };
            }
        }
        if let Some(max_nodes) = limits.max_nodes {
            if nodes_explored >= max_nodes {
                log::info!("search hit the node limit of {max_nodes}");
                return SearchOutcome::NodeLimitReached {
                    stats: stats!(None),
                    best_hint: path_to(&nodes, best_idx),
                };
            }
        }

        if !closed.insert(SearchKey::of(&nodes[idx].state)) {
            continue;
        }
        nodes_explored += 1;

        if nodes[idx].h < best_h {
            best_h = nodes[idx].h;
            best_idx = idx;
        }

        if nodes_explored % limits.progress_every == 0 {
            let report = SearchProgress {
                nodes_explored,
                frontier_size: open.len(),
                best_h,
            };
            log::debug!(
                "explored {} nodes, frontier {}, best h {}",
                report.nodes_explored,
                report.frontier_size,
                report.best_h
            );
            if let Some(callback) = progress.as_deref_mut() {
                callback(report);
            }
        }

        if nodes[idx].state.status == GameStatus::Won {
            let actions = path_to(&nodes, idx);
            log::info!(
                "solved in {} actions after {nodes_explored} nodes",
                actions.len()
            );
            return SearchOutcome::Solved {
                stats: stats!(Some(actions.len())),
                actions,
            };
        }

        // Expand. Failed successors are dead ends and never enter the open
        // list; the goal predicate above handles won successors when popped.
        for action in enumerate_actions(&nodes[idx].state, rules) {
            let mut successor = nodes[idx].state.clone();
            execute_turn(&mut successor, rules, action);
            if successor.status == GameStatus::Failed {
                continue;
            }
            if closed.contains(&SearchKey::of(&successor)) {
                continue;
            }
            let node = Node {
                h: heuristic(&successor),
                state: successor,
                parent: Some(idx),
                action: Some(action),
                g: nodes[idx].g + 1,
            };
            seq += 1;
            let child_idx = nodes.len();
            let entry = open_entry(&node, seq, child_idx);
            nodes.push(node);
            open.push(entry);
        }
    }

    log::info!("search exhausted after {nodes_explored} nodes");
    SearchOutcome::Unsolvable {
        stats: stats!(None),
        best_hint: path_to(&nodes, best_idx),
    }
}

/// Reconstruct the action path from the root to `idx`.
fn path_to(nodes: &[Node], idx: usize) -> Vec<Action> {
    let mut actions = Vec::new();
    let mut cursor = idx;
    while let (Some(parent), Some(action)) = (nodes[cursor].parent, nodes[cursor].action) {
        actions.push(action);
        cursor = parent;
    }
    actions.reverse();
    actions
}
