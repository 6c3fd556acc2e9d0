use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::model::document::ParsedDocument;
use crate::model::task::{Task, INBOX};
use crate::parse::identity::task_id;
use crate::parse::{split_lines, trim_space};
use crate::parse::task_parser::{is_candidate, parse_task_line};
use crate::parse::tokens::TokenContext;

/// Derive the task list from the whole document.
///
/// Only top-level `# ` headings start a section; `## ` and deeper are
/// ordinary non-task lines. Pure: the same text and `now` always give the
/// same result.
pub fn parse_document(source: &str, now: NaiveDateTime) -> ParsedDocument {
    let ctx = TokenContext::new(now);

    let mut tasks = Vec::new();
    let mut sections: BTreeSet<String> = BTreeSet::new();
    let mut headings: BTreeSet<String> = BTreeSet::new();
    let mut current_section = INBOX.to_string();
    sections.insert(current_section.clone());

    for (idx, line) in split_lines(source).enumerate() {
        if let Some(heading) = heading_text(line) {
            current_section = if heading.is_empty() {
                INBOX.to_string()
            } else {
                headings.insert(heading.to_string());
                heading.to_string()
            };
            sections.insert(current_section.clone());
            continue;
        }

        if !is_candidate(line) {
            continue;
        }

        let Some(parsed) = parse_task_line(line, &ctx) else {
            continue;
        };

        tasks.push(Task {
            id: task_id(&current_section, line),
            raw: line.to_string(),
            title: parsed.title,
            completed: parsed.completed,
            section: current_section.clone(),
            tags: parsed.tags,
            due: parsed.due,
            time: parsed.time,
            priority: parsed.priority,
            effort_minutes: parsed.effort_minutes,
            line_number: idx + 1,
        });
    }

    ParsedDocument {
        tasks,
        sections: sections.into_iter().collect(),
        headings: headings.into_iter().collect(),
    }
}

/// The trimmed text of a top-level `# ` heading
fn heading_text(line: &str) -> Option<&str> {
    line.strip_prefix("# ").map(trim_space)
}
