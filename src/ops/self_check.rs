use chrono::{NaiveDate, NaiveDateTime};

use crate::model::document::ParsedDocument;
use crate::model::task::Task;
use crate::parse::parse_document;

/// Fixture parsed by the self-check
pub const SELF_CHECK_SAMPLE: &str = "\
# Inbox
- [ ] write blog @2026-01-10 #oss !high ~30m
- [x] fix parser bug @2026-01-07 @15:00 #wbs !!
- [ ] buy milk

# Today
- ship MVP @today !!!";

/// A failed self-check assertion
#[derive(Debug, Clone, thiserror::Error)]
pub enum SelfCheckError {
    #[error("parser self-check failed: no task titled {0:?}")]
    MissingTask(&'static str),
    #[error("parser self-check failed: {task}: expected {field} = {expected}, got {actual}")]
    FieldMismatch {
        task: &'static str,
        field: &'static str,
        expected: String,
        actual: String,
    },
    #[error("parser self-check failed: {set} is missing {name:?}")]
    MissingName { set: &'static str, name: &'static str },
}

/// The fixed "now" the fixture is evaluated against: 2026-01-05T12:00:00
pub fn self_check_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 5)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_default()
}

/// Parse the fixed sample and verify the fixed expectations.
///
/// Development-time regression guard; the error names the assertion that
/// failed.
pub fn run_self_check() -> Result<(), SelfCheckError> {
    let doc = parse_document(SELF_CHECK_SAMPLE, self_check_now());

    let blog = by_title(&doc, "write blog")?;
    expect("write blog", "completed", false, blog.completed)?;
    expect("write blog", "section", "Inbox", blog.section.as_str())?;
    expect("write blog", "due", Some("2026-01-10"), blog.due.as_deref())?;

    let bug = by_title(&doc, "fix parser bug")?;
    expect("fix parser bug", "completed", true, bug.completed)?;
    expect("fix parser bug", "time", Some("15:00"), bug.time.as_deref())?;
    expect("fix parser bug", "priority", 2, bug.priority)?;

    let milk = by_title(&doc, "buy milk")?;
    expect("buy milk", "tags.len", 0, milk.tags.len())?;

    let ship = by_title(&doc, "ship MVP")?;
    expect("ship MVP", "section", "Today", ship.section.as_str())?;
    expect("ship MVP", "due", Some("2026-01-05"), ship.due.as_deref())?;

    for name in ["Inbox", "Today"] {
        if !doc.sections.iter().any(|s| s == name) {
            return Err(SelfCheckError::MissingName { set: "sections", name });
        }
        if !doc.has_heading(name) {
            return Err(SelfCheckError::MissingName { set: "headings", name });
        }
    }

    Ok(())
}

fn by_title<'a>(doc: &'a ParsedDocument, title: &'static str) -> Result<&'a Task, SelfCheckError> {
    doc.tasks
        .iter()
        .find(|t| t.title == title)
        .ok_or(SelfCheckError::MissingTask(title))
}

fn expect<T: PartialEq + std::fmt::Debug>(
    task: &'static str,
    field: &'static str,
    expected: T,
    actual: T,
) -> Result<(), SelfCheckError> {
    if expected == actual {
        return Ok(());
    }
    Err(SelfCheckError::FieldMismatch {
        task,
        field,
        expected: format!("{:?}", expected),
        actual: format!("{:?}", actual),
    })
}
