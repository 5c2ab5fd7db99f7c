// Paw Voice Engine — Context Window
// Append-only conversation log with a bounded "recent" view and the prompt
// renderer used on the generative path. The log itself is unbounded; only the
// view handed to the backend is capped.

use crate::atoms::constants::DEFAULT_CONTEXT_MAX_ENTRIES;
use crate::atoms::types::ContextEntry;

#[derive(Debug, Clone)]
pub struct ContextWindow {
    entries: Vec<ContextEntry>,
    max_entries: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_MAX_ENTRIES)
    }
}

impl ContextWindow {
    pub fn new(max_entries: usize) -> Self {
        ContextWindow { entries: Vec::new(), max_entries }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn add_entry(&mut self, entry: ContextEntry) {
        self.entries.push(entry);
    }

    /// The last `min(max_count, max_entries, count())` entries, oldest first.
    pub fn recent(&self, max_count: usize) -> &[ContextEntry] {
        let take = max_count.min(self.max_entries).min(self.entries.len());
        &self.entries[self.entries.len() - take..]
    }

    /// Render recent history as role-prefixed lines followed by the current
    /// utterance. With no history the utterance is returned unchanged.
    pub fn build_prompt(&self, current_utterance: &str) -> String {
        let history = self.recent(self.max_entries);
        if history.is_empty() {
            return current_utterance.to_string();
        }
        let mut prompt = String::new();
        for entry in history {
            prompt.push_str(entry.role.label());
            prompt.push_str(": ");
            prompt.push_str(&entry.text);
            prompt.push('\n');
        }
        prompt.push_str("User: ");
        prompt.push_str(current_utterance);
        prompt
    }

    /// Full history, oldest first.
    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
