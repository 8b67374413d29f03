//! Recent active/inactive transitions announced by the region

use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One announcement delivered to the action callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub active: bool,
    pub at: DateTime<Utc>,
}

impl Transition {
    pub fn now(active: bool) -> Self {
        Self { active, at: Utc::now() }
    }
}

/// Bounded in-memory list of the latest transitions
#[derive(Debug, Clone)]
pub struct TransitionLog {
    capacity: usize,
    entries: VecDeque<Transition>,
}

impl TransitionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(transition);
    }

    pub fn latest(&self) -> Option<&Transition> {
        self.entries.back()
    }

    pub fn to_vec(&self) -> Vec<Transition> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_oldest_when_full() {
        let mut log = TransitionLog::new(2);
        log.push(Transition::now(false));
        log.push(Transition::now(true));
        log.push(Transition::now(false));

        let entries = log.to_vec();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].active);
        assert!(!entries[1].active);
        assert_eq!(log.latest().map(|t| t.active), Some(false));
    }
}
