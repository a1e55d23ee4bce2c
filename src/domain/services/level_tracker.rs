#[cfg(test)]
#[path = "level_tracker_test.rs"]
mod tests;

use crate::domain::models::level_index;
use crate::domain::models::CefrLevel;
use crate::domain::models::LevelUp;

/// Follows the evaluated CEFR level across finalized responses.
#[derive(Debug, PartialEq, Eq)]
pub struct LevelTracker {
    current_index: i32,
    steps_to_next_level: Option<u32>,
}

impl Default for LevelTracker {
    fn default() -> LevelTracker {
        return LevelTracker {
            current_index: -1,
            steps_to_next_level: None,
        };
    }
}

impl LevelTracker {
    /// Seeds the tracker from persisted state without emitting an event.
    pub fn restore(level: Option<&str>, steps_to_next_level: Option<u32>) -> LevelTracker {
        return LevelTracker {
            current_index: level.map(level_index).unwrap_or(-1),
            steps_to_next_level,
        };
    }

    /// Records a newly evaluated level. Only a strict increase between two
    /// recognized levels is reported; the first observation seeds silently and
    /// decreases are stored without a signal.
    pub fn observe(&mut self, level: &str, steps_to_next_level: Option<u32>) -> Option<LevelUp> {
        let new_index = level_index(level);
        let old_index = self.current_index;

        self.current_index = new_index;
        if steps_to_next_level.is_some() {
            self.steps_to_next_level = steps_to_next_level;
        }

        if old_index == -1 || new_index <= old_index {
            if new_index < old_index {
                tracing::debug!(from = old_index, to = new_index, "Evaluated level decreased");
            }
            return None;
        }

        let from = CefrLevel::from_index(old_index)?;
        let to = CefrLevel::from_index(new_index)?;
        tracing::info!(%from, %to, "Level up");

        return Some(LevelUp { from, to });
    }

    pub fn current_level(&self) -> Option<CefrLevel> {
        return CefrLevel::from_index(self.current_index);
    }

    pub fn steps_to_next_level(&self) -> Option<u32> {
        return self.steps_to_next_level;
    }
}
