//! Newtype ID types for stages, enemies and items.
//!
//! Each wraps a `Box<str>`: cheap to clone, two words on the stack, and
//! impossible to mix up at call sites. The surface is deliberately small —
//! construction from `&str` (the loader's path from descriptor strings),
//! `as_str` for assertions, and `Display` for messages and logs.

use serde::{Deserialize, Serialize};

/// Stage identifier (e.g., "patrol_0042").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(Box<str>);

/// Enemy instance identifier, unique within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyId(Box<str>);

/// Item instance identifier, unique within a stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Box<str>);

impl StageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl EnemyId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StageId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<&str> for EnemyId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for EnemyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
