//! Solvability validation — the generator's solver-backed check.
//!
//! The stage crate sits below the solver, so it takes solvability as a
//! callback; this module supplies that callback and a convenience wrapper
//! that generates and validates in one call.

use rg_engine::RuleConfig;
use rg_stage::descriptor::StageDescriptor;
use rg_stage::generator::{generate, GeneratedStage, GenerateError, GeneratorConfig, StageFamily};
use rg_stage::loader::build_state;

use crate::search::{solve, CancelToken, SearchLimits, SearchOutcome};

/// Whether a node-capped A* run can win the stage.
pub fn solvable(descriptor: &StageDescriptor, rules: &RuleConfig, max_nodes: usize) -> bool {
    let Ok(initial) = build_state(descriptor) else {
        return false;
    };
    let limits = SearchLimits {
        max_nodes: Some(max_nodes),
        ..SearchLimits::default()
    };
    let outcome = solve(&initial, rules, &limits, &CancelToken::new(), None);
    if let SearchOutcome::NodeLimitReached { .. } = outcome {
        log::warn!(
            "stage {} validation inconclusive at {max_nodes} nodes",
            descriptor.id
        );
    }
    outcome.is_solved()
}

/// Generate a stage whose solvability was proven by the solver.
pub fn generate_validated(
    family: StageFamily,
    seed: u64,
    config: GeneratorConfig,
    rules: &RuleConfig,
    max_nodes: usize,
) -> Result<GeneratedStage, GenerateError> {
    generate(family, seed, config, |descriptor| {
        solvable(descriptor, rules, max_nodes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_move_stages_validate() {
        let rules = RuleConfig::default();
        let result =
            generate_validated(StageFamily::Move, 42, GeneratorConfig::default(), &rules, 50_000)
                .unwrap();
        assert!(result.solvable);
    }
}
