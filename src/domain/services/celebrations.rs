#[cfg(test)]
#[path = "celebrations_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::time::Duration;
use std::time::Instant;

use crate::domain::models::LevelUp;

/// Presents level-ups one at a time, each for a fixed duration. Events that
/// arrive while another is showing wait their turn.
pub struct Celebrations {
    duration: Duration,
    queue: VecDeque<LevelUp>,
    active: Option<(LevelUp, Instant)>,
}

impl Celebrations {
    pub fn new(duration: Duration) -> Celebrations {
        return Celebrations {
            duration,
            queue: VecDeque::new(),
            active: None,
        };
    }

    pub fn push(&mut self, event: LevelUp) {
        self.queue.push_back(event);
    }

    /// Expires the active celebration once its time is up and promotes the
    /// next queued one. Returns an event exactly once, at the moment it starts.
    pub fn advance(&mut self, now: Instant) -> Option<LevelUp> {
        if let Some((_, started)) = self.active {
            if now.saturating_duration_since(started) < self.duration {
                return None;
            }
            self.active = None;
        }

        let next = self.queue.pop_front()?;
        self.active = Some((next, now));

        return Some(next);
    }

    pub fn current(&self) -> Option<LevelUp> {
        return self.active.map(|(event, _)| return event);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
    }
}
