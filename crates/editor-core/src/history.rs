/// Default cap on stored snapshots.
pub const MAX_HISTORY: usize = 50;

/// Linear undo history of serialized document snapshots.
///
/// Entries past `cursor` are the redo branch; pushing from a non-tip cursor
/// discards them. Consecutive duplicates are suppressed by exact string
/// equality, which is O(document length) per push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStack {
    entries: Vec<String>,
    cursor: usize,
    capacity: usize,
}

impl HistoryStack {
    pub fn new(initial: impl Into<String>, capacity: usize) -> Self {
        Self {
            entries: vec![initial.into()],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    pub fn with_default_capacity(initial: impl Into<String>) -> Self {
        Self::new(initial, MAX_HISTORY)
    }

    /// Drops every entry and reseeds the stack with `initial`.
    pub fn reset(&mut self, initial: impl Into<String>) {
        self.entries.clear();
        self.entries.push(initial.into());
        self.cursor = 0;
    }

    /// Records `document` as the newest state.
    ///
    /// Returns `false` when it equals the entry at the cursor.
    pub fn push(&mut self, document: &str) -> bool {
        if self.current() == document {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(document.to_string());
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
            self.cursor -= overflow;
        }
        true
    }

    pub fn undo(&mut self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn redo(&mut self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> &str {
        &self.entries[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
