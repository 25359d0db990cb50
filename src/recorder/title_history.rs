use std::collections::VecDeque;
use std::time::Duration;

use super::window_title::is_resolved;

pub const DEFAULT_CAPACITY: usize = 5;

/// Bounded record of recent foreground-title transitions, oldest evicted first.
///
/// Entries come from polling, so their timestamps are accurate only to the
/// poll interval.
#[derive(Debug, Clone)]
pub struct TitleHistory {
    capacity: usize,
    entries: VecDeque<(Duration, String)>,
}

impl TitleHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, at: Duration, title: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((at, title));
    }

    pub fn entries(&self) -> impl Iterator<Item = &(Duration, String)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry carrying a real title.
    pub fn last_resolved(&self) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .map(|(_, title)| title.as_str())
            .find(|title| is_resolved(title))
    }
}

impl Default for TitleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
