use std::{collections::BTreeSet, time::Duration};

use serde::{Deserialize, Serialize};
use temporal_bot_core::LevelLayout;
use thiserror::Error;

use crate::{parse_layout, LevelParseError};

const BUILTIN_PACK: &str = include_str!("../levels/builtin.toml");

/// Level metadata paired with its textual layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    id: u32,
    name: String,
    layout: String,
    target_time_ms: u64,
    target_robots: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instruction: Option<String>,
}

impl LevelDefinition {
    /// Creates a level definition.
    #[must_use]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        layout: impl Into<String>,
        target_time: Duration,
        target_robots: u32,
        instruction: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            layout: layout.into(),
            target_time_ms: u64::try_from(target_time.as_millis()).unwrap_or(u64::MAX),
            target_robots,
            instruction,
        }
    }

    /// Identifier used to key scores.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Level string in the row-terminated tile encoding.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.layout
    }

    /// Completion time a run must match or beat to meet the time goal.
    #[must_use]
    pub const fn target_time(&self) -> Duration {
        Duration::from_millis(self.target_time_ms)
    }

    /// Robot count a run must match or beat to meet the robot goal.
    #[must_use]
    pub const fn target_robots(&self) -> u32 {
        self.target_robots
    }

    /// Optional hint shown before the level starts.
    #[must_use]
    pub fn instruction(&self) -> Option<&str> {
        self.instruction.as_deref()
    }

    /// Parses the level string into a layout.
    pub fn layout(&self) -> Result<LevelLayout, LevelParseError> {
        parse_layout(&self.layout)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackFile {
    #[serde(default, rename = "level")]
    levels: Vec<LevelDefinition>,
}

/// Ordered collection of levels loaded from a TOML document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelPack {
    levels: Vec<LevelDefinition>,
}

impl LevelPack {
    /// Parses and validates a pack. Every layout must parse and ids must be unique.
    pub fn from_toml_str(contents: &str) -> Result<Self, LevelPackError> {
        let file: PackFile = toml::from_str(contents)?;
        Self::from_levels(file.levels)
    }

    /// Levels bundled with the crate.
    pub fn builtin() -> Result<Self, LevelPackError> {
        Self::from_toml_str(BUILTIN_PACK)
    }

    /// Validates an ordered set of levels.
    pub fn from_levels(levels: Vec<LevelDefinition>) -> Result<Self, LevelPackError> {
        if levels.is_empty() {
            return Err(LevelPackError::Empty);
        }

        let mut ids = BTreeSet::new();
        for level in &levels {
            if !ids.insert(level.id) {
                return Err(LevelPackError::DuplicateId { id: level.id });
            }
            let _ = level
                .layout()
                .map_err(|source| LevelPackError::InvalidLevel {
                    id: level.id,
                    source,
                })?;
        }

        Ok(Self { levels })
    }

    /// Looks up a level by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&LevelDefinition> {
        self.levels.iter().find(|level| level.id == id)
    }

    /// Levels in pack order.
    #[must_use]
    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    /// Level that follows `id` in pack order.
    #[must_use]
    pub fn next_after(&self, id: u32) -> Option<&LevelDefinition> {
        let index = self.levels.iter().position(|level| level.id == id)?;
        self.levels.get(index + 1)
    }
}

/// Reasons a level pack is rejected.
#[derive(Debug, Error)]
pub enum LevelPackError {
    /// The document was not valid TOML or did not match the pack schema.
    #[error("failed to parse level pack: {0}")]
    Toml(#[from] toml::de::Error),
    /// The pack contained no levels.
    #[error("level pack contains no levels")]
    Empty,
    /// Two levels shared an id.
    #[error("level id {id} appears more than once")]
    DuplicateId {
        /// Repeated id.
        id: u32,
    },
    /// A level string failed to parse.
    #[error("level {id} is invalid")]
    InvalidLevel {
        /// Id of the offending level.
        id: u32,
        /// Underlying parse failure.
        #[source]
        source: LevelParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_pack_is_valid() {
        let pack = LevelPack::builtin().expect("builtin pack parses");
        assert!(!pack.levels().is_empty());
        let first = &pack.levels()[0];
        assert_eq!(first.id(), 1);
        assert_eq!(first.target_robots(), 1);
        assert!(first.instruction().is_some());
        assert_eq!(pack.next_after(1).map(LevelDefinition::id), Some(2));
    }

    #[test]
    fn pack_reads_metadata() {
        let pack = LevelPack::from_toml_str(
            r#"
            [[level]]
            id = 7
            name = "Tiny"
            layout = "1111_1>A1_1111_"
            target_time_ms = 1250
            target_robots = 3
            "#,
        )
        .expect("valid pack");

        let level = pack.get(7).expect("level 7");
        assert_eq!(level.name(), "Tiny");
        assert_eq!(level.target_time(), Duration::from_millis(1250));
        assert_eq!(level.target_robots(), 3);
        assert_eq!(level.instruction(), None);
        assert!(pack.get(8).is_none());
        assert!(pack.next_after(7).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let level = LevelDefinition::new(1, "a", "111_1>1_111_", Duration::ZERO, 1, None);
        let error = LevelPack::from_levels(vec![level.clone(), level]).expect_err("duplicate");
        assert!(matches!(error, LevelPackError::DuplicateId { id: 1 }));
    }

    #[test]
    fn invalid_layouts_are_reported_with_their_id() {
        let level = LevelDefinition::new(4, "broken", "111_1*1_111_", Duration::ZERO, 1, None);
        let error = LevelPack::from_levels(vec![level]).expect_err("invalid");
        assert!(matches!(
            error,
            LevelPackError::InvalidLevel {
                id: 4,
                source: LevelParseError::MissingRobot,
            }
        ));
    }

    #[test]
    fn empty_pack_is_rejected() {
        assert!(matches!(
            LevelPack::from_toml_str(""),
            Err(LevelPackError::Empty)
        ));
    }
}
