use std::collections::HashMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::io::store::{self, DocumentStore};
use crate::model::document::ParsedDocument;
use crate::model::task::Task;
use crate::ops::edit::toggle_line_at;
use crate::ops::toggle::{LinePatch, apply_patch, locate_toggle};
use crate::parse::parse_document;

/// Seed text for a fresh project, and what a session shows before hydration
pub const DEFAULT_DOCUMENT: &str = "\
# Inbox
- [ ] welcome to Flowmark  @today  #flow  !high  ~10m
- [ ] try: fm toggle <id> to complete a task
- buy milk

# Today
- [ ] ship MVP @today @15:00 !!!
";

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("task {0} is no longer in the document")]
    TaskNotFound(String),
    #[error("line {0} is not a list item")]
    NotAListItem(usize),
    #[error("could not save to {store}")]
    SaveFailed { store: String },
}

/// Remembers which tasks were complete in the last applied derivation
#[derive(Debug, Default)]
pub struct CompletionTracker {
    previous: HashMap<String, bool>,
}

impl CompletionTracker {
    pub fn new() -> Self {
        CompletionTracker::default()
    }

    /// Record `tasks` and return the first task that went from open to done.
    ///
    /// Tasks not seen before never count, so the first observation of a
    /// document reports nothing.
    pub fn observe(&mut self, tasks: &[Task]) -> Option<String> {
        let newly_completed = tasks
            .iter()
            .find(|t| t.completed && self.previous.get(&t.id) == Some(&false))
            .map(|t| t.id.clone());
        self.previous = tasks.iter().map(|t| (t.id.clone(), t.completed)).collect();
        newly_completed
    }
}

/// A parse result stamped with the edit it was computed from
#[derive(Debug, Clone)]
pub struct Derivation {
    pub seq: u64,
    pub doc: ParsedDocument,
}

/// Outcome of `Session::apply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// False when the derivation was older than the one already applied
    pub accepted: bool,
    /// Id of a task that just became complete
    pub newly_completed: Option<String>,
}

/// Headless editor state: the current text, the last applied derivation
/// and the store it is persisted to.
pub struct Session<S: DocumentStore> {
    store: S,
    recovery_dir: Option<PathBuf>,
    text: String,
    seq: u64,
    applied_seq: Option<u64>,
    hydrated: bool,
    saved_seq: Option<u64>,
    doc: ParsedDocument,
    tracker: CompletionTracker,
}

impl<S: DocumentStore> Session<S> {
    pub fn new(store: S) -> Self {
        Session {
            store,
            recovery_dir: None,
            text: DEFAULT_DOCUMENT.to_string(),
            seq: 0,
            applied_seq: None,
            hydrated: false,
            saved_seq: None,
            doc: ParsedDocument::default(),
            tracker: CompletionTracker::new(),
        }
    }

    /// Failed loads and saves get logged to the recovery log in `dir`
    pub fn with_recovery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recovery_dir = Some(dir.into());
        self
    }

    /// Load the stored text once. Empty or missing text keeps the current
    /// text; a failed load counts as missing. Later calls do nothing.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            return;
        }
        let stored = store::load_document(&self.store, self.recovery_dir.as_deref());
        match stored {
            Some(text) if !text.is_empty() => {
                self.set_text(text);
                self.saved_seq = Some(self.seq);
            }
            _ => {}
        }
        self.hydrated = true;
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The last applied derivation's document
    pub fn document(&self) -> &ParsedDocument {
        &self.doc
    }

    /// Replace the text. Returns the new edit sequence number.
    pub fn set_text(&mut self, text: impl Into<String>) -> u64 {
        self.text = text.into();
        self.seq += 1;
        self.seq
    }

    /// Parse the current text
    pub fn derive(&self, now: NaiveDateTime) -> Derivation {
        Derivation {
            seq: self.seq,
            doc: parse_document(&self.text, now),
        }
    }

    /// Adopt a derivation unless a newer one has already been applied
    pub fn apply(&mut self, derivation: Derivation) -> Applied {
        if self.applied_seq.is_some_and(|seq| derivation.seq < seq) {
            return Applied {
                accepted: false,
                newly_completed: None,
            };
        }
        let newly_completed = self.tracker.observe(&derivation.doc.tasks);
        self.applied_seq = Some(derivation.seq);
        self.doc = derivation.doc;
        Applied {
            accepted: true,
            newly_completed,
        }
    }

    /// Derive and apply in one step
    pub fn refresh(&mut self, now: NaiveDateTime) -> Applied {
        let derivation = self.derive(now);
        self.apply(derivation)
    }

    /// Flip `task`'s checkbox in the current text.
    ///
    /// The line is located again in the current text, so a task from an older
    /// derivation is found only while its line still reads as it did then.
    pub fn toggle(&mut self, task: &Task) -> Result<LinePatch, SessionError> {
        let patch =
            locate_toggle(&self.text, task).ok_or_else(|| SessionError::TaskNotFound(task.id.clone()))?;
        self.set_text(apply_patch(&self.text, &patch));
        Ok(patch)
    }

    /// Flip the checkbox on a 1-based line, whatever task it holds
    pub fn toggle_line(&mut self, line_number: usize) -> Result<LinePatch, SessionError> {
        let patch =
            toggle_line_at(&self.text, line_number).ok_or(SessionError::NotAListItem(line_number))?;
        self.set_text(apply_patch(&self.text, &patch));
        Ok(patch)
    }

    /// Re-read the store after an outside edit. Returns whether the text
    /// changed. Unlike `hydrate`, an empty stored text is taken as is.
    pub fn reload(&mut self) -> bool {
        let Some(text) = store::load_document(&self.store, self.recovery_dir.as_deref()) else {
            return false;
        };
        if text == self.text {
            return false;
        }
        self.set_text(text);
        self.saved_seq = Some(self.seq);
        self.hydrated = true;
        true
    }

    /// True when the text changed since it was last loaded or saved
    pub fn is_dirty(&self) -> bool {
        self.saved_seq != Some(self.seq)
    }

    /// Persist the current text. Does nothing before hydration so the
    /// default document never overwrites what is stored.
    pub fn save(&mut self) -> Result<(), SessionError> {
        if !self.hydrated {
            return Ok(());
        }
        if store::save_document(&self.store, &self.text, self.recovery_dir.as_deref()) {
            self.saved_seq = Some(self.seq);
            Ok(())
        } else {
            Err(SessionError::SaveFailed {
                store: self.store.describe(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::recovery;
    use crate::io::store::MemoryStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn starts_with_default_document() {
        let mut session = Session::new(MemoryStore::new());
        assert_eq!(session.text(), DEFAULT_DOCUMENT);
        session.refresh(now());
        let titles: Vec<&str> = session.document().tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "welcome to Flowmark",
                "try: fm toggle <id> to complete a task",
                "buy milk",
                "ship MVP"
            ]
        );
    }

    #[test]
    fn hydrate_replaces_with_stored_text() {
        let mut session = Session::new(MemoryStore::with_text("- stored"));
        session.hydrate();
        assert_eq!(session.text(), "- stored");
        assert!(!session.is_dirty());
    }

    #[test]
    fn hydrate_keeps_default_for_empty_or_failed_store() {
        let mut session = Session::new(MemoryStore::with_text(""));
        session.hydrate();
        assert_eq!(session.text(), DEFAULT_DOCUMENT);

        let mut session = Session::new(MemoryStore::failing());
        session.hydrate();
        assert!(session.is_hydrated());
        assert_eq!(session.text(), DEFAULT_DOCUMENT);
    }

    #[test]
    fn hydrate_runs_once() {
        let mut session = Session::new(MemoryStore::with_text("- first"));
        session.hydrate();
        session.set_text("- edited");
        session.hydrate();
        assert_eq!(session.text(), "- edited");
    }

    #[test]
    fn save_is_noop_before_hydration() {
        let mut session = Session::new(MemoryStore::with_text("- keep me"));
        session.set_text("- typed early");
        session.save().unwrap();
        assert_eq!(session.store().contents().as_deref(), Some("- keep me"));

        session.hydrate();
        session.set_text("- typed later");
        session.save().unwrap();
        assert_eq!(session.store().contents().as_deref(), Some("- typed later"));
        assert!(!session.is_dirty());
    }

    #[test]
    fn failed_save_keeps_text_and_logs_recovery() {
        let tmp = TempDir::new().unwrap();
        let mut session = Session::new(MemoryStore::failing()).with_recovery_dir(tmp.path());
        session.hydrate();
        session.set_text("- unsaved work");

        assert!(matches!(session.save(), Err(SessionError::SaveFailed { .. })));
        assert_eq!(session.text(), "- unsaved work");
        assert!(session.is_dirty());

        let entries = recovery::read_recovery_entries(tmp.path(), None);
        assert_eq!(entries[0].body, "- unsaved work");
    }

    #[test]
    fn stale_derivation_is_rejected() {
        let mut session = Session::new(MemoryStore::new());
        session.set_text("- old");
        let stale = session.derive(now());
        session.set_text("- new");
        let fresh = session.derive(now());

        assert!(session.apply(fresh).accepted);
        let applied = session.apply(stale);
        assert!(!applied.accepted);
        assert_eq!(session.document().tasks[0].title, "new");
    }

    #[test]
    fn toggle_reports_newly_completed() {
        let mut session = Session::new(MemoryStore::new());
        session.set_text("# Inbox\n- [ ] a\n- [ ] b");
        let first = session.refresh(now());
        assert_eq!(first.newly_completed, None);

        let b = session.document().tasks[1].clone();
        session.toggle(&b).unwrap();
        assert_eq!(session.text(), "# Inbox\n- [ ] a\n- [x] b");

        let applied = session.refresh(now());
        assert_eq!(applied.newly_completed, Some(b.id.clone()));

        // Unchecking is not a completion
        let done_b = session.document().tasks[1].clone();
        assert!(done_b.completed);
        session.toggle(&done_b).unwrap();
        assert_eq!(session.refresh(now()).newly_completed, None);
    }

    #[test]
    fn task_from_before_its_own_toggle_is_not_found() {
        let mut session = Session::new(MemoryStore::new());
        session.set_text("- [ ] a");
        session.refresh(now());
        let before = session.document().tasks[0].clone();
        session.toggle(&before).unwrap();

        assert!(matches!(session.toggle(&before), Err(SessionError::TaskNotFound(_))));
        assert_eq!(session.text(), "- [x] a");
    }

    #[test]
    fn toggle_missing_task_errors() {
        let mut session = Session::new(MemoryStore::new());
        session.set_text("- a");
        session.refresh(now());
        let task = session.document().tasks[0].clone();
        session.set_text("- something else");
        assert!(matches!(session.toggle(&task), Err(SessionError::TaskNotFound(_))));
        assert_eq!(session.text(), "- something else");
    }

    #[test]
    fn toggle_line_flips_cursor_line() {
        let mut session = Session::new(MemoryStore::new());
        session.set_text("# Inbox\n- a\ntext");
        let patch = session.toggle_line(2).unwrap();
        assert_eq!(patch.new_text, "- [x] a");
        assert_eq!(session.text(), "# Inbox\n- [x] a\ntext");
        assert!(matches!(session.toggle_line(3), Err(SessionError::NotAListItem(3))));
    }

    #[test]
    fn reload_picks_up_outside_edits() {
        let mut session = Session::new(MemoryStore::with_text("- a"));
        session.hydrate();
        assert!(!session.reload());

        session.store().save("- b").unwrap();
        assert!(session.reload());
        assert_eq!(session.text(), "- b");
        assert!(!session.is_dirty());
    }

    #[test]
    fn tracker_ignores_tasks_seen_for_the_first_time() {
        let doc = parse_document("- [x] done", now());
        let mut tracker = CompletionTracker::new();
        assert_eq!(tracker.observe(&doc.tasks), None);
        assert_eq!(tracker.observe(&doc.tasks), None);
    }
}
