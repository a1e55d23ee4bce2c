#[cfg(test)]
#[path = "cefr_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// Common European Framework of Reference proficiency tiers, ordered from
/// beginner to mastery.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    strum::Display,
    Serialize,
    Deserialize,
)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Case-insensitive, whitespace-trimmed lookup.
    pub fn parse(level: &str) -> Option<CefrLevel> {
        let needle = level.trim();
        return CefrLevel::iter().find(|e| {
            return e.to_string().eq_ignore_ascii_case(needle);
        });
    }

    pub fn index(&self) -> i32 {
        return *self as i32;
    }

    pub fn from_index(idx: i32) -> Option<CefrLevel> {
        if idx < 0 {
            return None;
        }
        return CefrLevel::iter().nth(idx as usize);
    }
}

/// Position of a level string in the CEFR ordering, or -1 when the string is
/// not a recognized level.
pub fn level_index(level: &str) -> i32 {
    return CefrLevel::parse(level)
        .map(|e| return e.index())
        .unwrap_or(-1);
}
