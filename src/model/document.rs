use serde::{Deserialize, Serialize};

use super::task::Task;

/// Everything derived from one snapshot of the document text.
///
/// Recomputed from scratch on every parse; never edited in place and never
/// persisted separately from the markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Tasks in source line order
    pub tasks: Vec<Task>,
    /// Every section name seen, including the implicit `Inbox`, sorted
    pub sections: Vec<String>,
    /// Explicit non-empty top-level headings, sorted
    pub headings: Vec<String>,
}

impl ParsedDocument {
    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find a task by id, or by a unique id prefix (like a short git hash)
    pub fn find_task_by_prefix(&self, prefix: &str) -> Option<&Task> {
        if let Some(task) = self.find_task(prefix) {
            return Some(task);
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    pub fn has_heading(&self, heading: &str) -> bool {
        self.headings.iter().any(|h| h == heading)
    }
}
