use serde::{Deserialize, Serialize};

/// Section name used for tasks that appear before any `# ` heading
pub const INBOX: &str = "Inbox";

/// Priority levels carried by `!low`, `!high`/`!!` and `!!!`
pub mod priority {
    pub const NONE: u8 = 0;
    pub const LOW: u8 = 1;
    pub const HIGH: u8 = 2;
    pub const HIGHEST: u8 = 3;
}

/// A task derived from one markdown line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable id: hash of section + checkbox-normalized line
    pub id: String,
    /// The exact source line, used to find the line again on toggle
    pub raw: String,
    /// Free text left over once annotations are stripped
    pub title: String,
    /// True iff the checkbox is `[x]` or `[X]`
    pub completed: bool,
    /// Nearest preceding top-level heading, or `Inbox`
    pub section: String,
    /// Tags without the `#` prefix, in first-seen order
    pub tags: Vec<String>,
    /// Due date as `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    /// Time of day as `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// 0 = none, 1 = low, 2 = high, 3 = highest
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort_minutes: Option<u64>,
    /// 1-based line in the source text at parse time
    pub line_number: usize,
}

impl Task {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_due_on(&self, date: &str) -> bool {
        self.due.as_deref() == Some(date)
    }
}
