use std::collections::VecDeque;

/// How many generated statements are fed back into the generation prompt.
pub const RECENT_STATEMENTS_CAPACITY: usize = 5;

/// Rolling window of the most recently accepted generated statements, oldest first.
///
/// Holds the raw service output, before sanitization.
#[derive(Debug, Clone)]
pub struct RecentStatements {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentStatements {
    fn default() -> Self {
        Self::with_capacity(RECENT_STATEMENTS_CAPACITY)
    }
}

impl RecentStatements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, statement: impl Into<String>) {
        self.entries.push_back(statement.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Snapshot of the window, oldest first.
    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
