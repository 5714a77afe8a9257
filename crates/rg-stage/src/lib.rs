//! Stage content layer — the declarative YAML descriptor schema, the
//! loader/validator that turns descriptors into initial game states, and the
//! seeded procedural generator.

pub mod descriptor;
pub mod generator;
pub mod loader;

pub use descriptor::StageDescriptor;
pub use generator::{GeneratedStage, GenerateError, GeneratorConfig, StageFamily};
pub use loader::{build_state, load_stage, load_stage_file, parse_descriptor, StageError};
