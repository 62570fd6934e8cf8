//! Bounded log of submitted command lines with arrow-key navigation.

use std::collections::VecDeque;

/// Ordered, bounded history of command lines.
///
/// Index 0 is always the oldest retained entry. While the user browses with the
/// arrow keys, `position` points at the displayed entry; `None` means the user
/// is editing a fresh line.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
    position: Option<usize>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            position: None,
        }
    }

    /// Append a line, evicting the oldest entry once the store is full.
    pub fn append(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.into());
    }

    /// Step towards older entries.
    ///
    /// Returns `None` when there is nothing older to show.
    pub fn navigate_back(&mut self) -> Option<&str> {
        let next = match self.position {
            None if !self.entries.is_empty() => self.entries.len() - 1,
            Some(pos) if pos > 0 => pos - 1,
            _ => return None,
        };
        self.position = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step towards newer entries.
    ///
    /// Moving past the newest entry leaves navigation and yields an empty line.
    /// Returns `None` when not navigating.
    pub fn navigate_forward(&mut self) -> Option<&str> {
        let pos = self.position?;
        if pos + 1 >= self.entries.len() {
            self.position = None;
            return Some("");
        }
        self.position = Some(pos + 1);
        self.entries.get(pos + 1).map(String::as_str)
    }

    pub fn reset_cursor(&mut self) {
        self.position = None;
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, lines: &[&str]) -> History {
        let mut history = History::new(capacity);
        for line in lines {
            history.append(*line);
        }
        history
    }

    #[test]
    fn eviction_keeps_most_recent_in_order() {
        let mut history = History::new(3);
        for i in 0..4 {
            history.append(format!("cmd{i}"));
        }
        let kept: Vec<&str> = history.iter().collect();
        assert_eq!(kept, vec!["cmd1", "cmd2", "cmd3"]);
    }

    #[test]
    fn full_default_store_evicts_exactly_one() {
        let mut history = History::new(crate::config::MAX_HISTORY);
        for i in 0..=crate::config::MAX_HISTORY {
            history.append(format!("line {i}"));
        }
        assert_eq!(history.len(), crate::config::MAX_HISTORY);
        assert_eq!(history.iter().next(), Some("line 1"));
        assert_eq!(history.iter().last(), Some("line 50"));
    }

    #[test]
    fn back_starts_at_newest_and_stops_at_oldest() {
        let mut history = filled(10, &["a", "b", "c"]);
        assert_eq!(history.navigate_back(), Some("c"));
        assert_eq!(history.navigate_back(), Some("b"));
        assert_eq!(history.navigate_back(), Some("a"));
        assert_eq!(history.navigate_back(), None);
        assert_eq!(history.position(), Some(0));
    }

    #[test]
    fn forward_walks_newer_then_resets() {
        let mut history = filled(10, &["a", "b", "c"]);
        history.navigate_back();
        history.navigate_back();
        history.navigate_back();
        assert_eq!(history.navigate_forward(), Some("b"));
        assert_eq!(history.navigate_forward(), Some("c"));
        assert_eq!(history.navigate_forward(), Some(""));
        assert_eq!(history.position(), None);
        assert_eq!(history.navigate_forward(), None);
    }

    #[test]
    fn empty_store_does_not_navigate() {
        let mut history = History::new(5);
        assert_eq!(history.navigate_back(), None);
        assert_eq!(history.navigate_forward(), None);
        assert_eq!(history.position(), None);
    }

    #[test]
    fn reset_cursor_leaves_navigation() {
        let mut history = filled(5, &["a", "b"]);
        history.navigate_back();
        history.reset_cursor();
        assert_eq!(history.position(), None);
        assert_eq!(history.navigate_back(), Some("b"));
    }
}
