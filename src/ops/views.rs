use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::document::ParsedDocument;
use crate::model::task::{Task, INBOX};

/// Name of the section that, together with tasks due today, makes up the Today view
pub const TODAY: &str = "Today";

/// A filtered slice of the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Inbox,
    Today,
    Section(String),
    All,
}

impl View {
    /// Whether `task` belongs in this view. `today` is `YYYY-MM-DD`.
    pub fn includes(&self, task: &Task, today: &str) -> bool {
        match self {
            View::Inbox => task.section == INBOX,
            View::Today => task.section == TODAY || task.is_due_on(today),
            View::Section(name) => task.section == *name,
            View::All => true,
        }
    }

    /// Stable key, as accepted by `from_str`
    pub fn key(&self) -> String {
        match self {
            View::Inbox => "inbox".to_string(),
            View::Today => "today".to_string(),
            View::Section(name) => format!("section:{}", name),
            View::All => "all".to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            View::Inbox => INBOX,
            View::Today => TODAY,
            View::Section(name) => name,
            View::All => "All",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for View {
    type Err = std::convert::Infallible;

    /// `inbox`, `today`, `all`, `section:<name>`; anything else is a section name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "inbox" => View::Inbox,
            "today" => View::Today,
            "all" => View::All,
            other => View::Section(other.strip_prefix("section:").unwrap_or(other).to_string()),
        })
    }
}

/// One entry of the tab strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub key: String,
    pub label: String,
    pub count: usize,
    #[serde(skip)]
    pub view: View,
}

/// Tasks in `view`, in document order
pub fn filter_tasks<'a>(doc: &'a ParsedDocument, view: &View, today: &str) -> Vec<&'a Task> {
    doc.tasks.iter().filter(|t| view.includes(t, today)).collect()
}

/// Build the tab strip for a document.
///
/// A blank document only gets `All`. Otherwise the Inbox and Today tabs show
/// when the document has no headings at all or has that heading explicitly,
/// followed by one tab per other section and finally `All`.
pub fn tabs(doc: &ParsedDocument, text_is_blank: bool, today: &str) -> Vec<Tab> {
    let count = |view: &View| doc.tasks.iter().filter(|t| view.includes(t, today)).count();
    let make = |view: View| Tab {
        key: view.key(),
        label: view.label().to_string(),
        count: count(&view),
        view,
    };

    if text_is_blank {
        return vec![make(View::All)];
    }

    let no_headings = doc.headings.is_empty();
    let mut out = Vec::new();
    if no_headings || doc.has_heading(INBOX) {
        out.push(make(View::Inbox));
    }
    if no_headings || doc.has_heading(TODAY) {
        out.push(make(View::Today));
    }
    for section in &doc.sections {
        if section != INBOX && section != TODAY {
            out.push(make(View::Section(section.clone())));
        }
    }
    out.push(make(View::All));
    out
}

/// Keep `view` if it is one of the visible tabs, otherwise fall back to `All`
pub fn resolve_view(view: View, tabs: &[Tab]) -> View {
    if tabs.iter().any(|t| t.view == view) {
        view
    } else {
        View::All
    }
}

/// Sort tasks for listing: open tasks first, then by due date, time and title.
/// Tasks with a date (or time) come before those without.
pub fn sort_for_display(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| present_first(a.due.as_deref(), b.due.as_deref()))
            .then_with(|| present_first(a.time.as_deref(), b.time.as_deref()))
            .then_with(|| a.title.cmp(&b.title))
    });
}

fn present_first(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
