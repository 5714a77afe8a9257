//! Unified rule configuration.
//!
//! Every behavior toggle the engine branches on lives here, and the solver
//! runs the exact same kernel with the exact same struct. Keeping these in
//! one place is what prevents engine/solver drift: there is no second copy
//! of any of these numbers anywhere in the workspace.

use serde::{Deserialize, Serialize};

use rg_types::state::ALERT_COOLDOWN_TURNS;

/// Behavior configuration shared by the engine and the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Turns an enemy stays alerted after losing sight of the player.
    pub alert_cooldown: u32,
    /// Pursuit/patrol axis tie-break: horizontal before vertical.
    pub horizontal_first: bool,
    /// Stamina restored by a safe `wait` (stamina system only).
    pub stamina_recovery: i32,
    /// Stamina drained by every turn-consuming action except `wait`.
    pub stamina_drain: i32,
    /// Default radius for the `see` query.
    pub see_range: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            alert_cooldown: ALERT_COOLDOWN_TURNS,
            horizontal_first: true,
            stamina_recovery: 10,
            stamina_drain: 1,
            see_range: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stage_constants() {
        let rules = RuleConfig::default();
        assert_eq!(rules.alert_cooldown, 10);
        assert!(rules.horizontal_first);
        assert_eq!(rules.see_range, 2);
    }
}
