//! Game logic for rogrid — action kernel, enemy AI, turn scheduler, queries.
//!
//! All mutable game logic lives here. The solver runs this exact code on its
//! own state clones; there is no second simulation anywhere.

pub mod combat;
pub mod enemy_ai;
pub mod kernel;
pub mod legal;
pub mod observe;
pub mod rules;
pub mod turn;

pub use legal::enumerate_actions;
pub use rules::RuleConfig;
pub use turn::execute_turn;
