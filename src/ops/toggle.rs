use serde::Serialize;

use crate::model::task::Task;
use crate::parse::split_lines;

/// A single-line replacement for a live editor to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePatch {
    /// 1-based line to replace
    pub line_number: usize,
    /// Current text of that line
    pub old_text: String,
    /// Text to put in its place
    pub new_text: String,
}

/// Flip the checkbox on one line.
///
/// `- [ ] ` becomes `- [x] `, `- [x] `/`- [X] ` become `- [ ] `, and a bare
/// `- ` item gets a checked box inserted (completing it). Returns `None` for
/// lines that aren't list items.
pub fn toggle_checkbox_line(line: &str) -> Option<String> {
    let rest = line.strip_prefix("- ")?;

    if let Some(after) = rest.strip_prefix("[ ] ") {
        return Some(format!("- [x] {}", after));
    }
    if let Some(after) = rest
        .strip_prefix("[x] ")
        .or_else(|| rest.strip_prefix("[X] "))
    {
        return Some(format!("- [ ] {}", after));
    }
    Some(format!("- [x] {}", rest))
}

/// Find the 0-based index of the line `task` came from.
///
/// The recorded line number wins if that line still reads exactly like the
/// task's raw text; otherwise the first exact match from the top is used.
pub fn locate_task_line(lines: &[&str], task: &Task) -> Option<usize> {
    if let Some(idx) = task.line_number.checked_sub(1)
        && lines.get(idx).is_some_and(|line| *line == task.raw)
    {
        return Some(idx);
    }
    lines.iter().position(|line| *line == task.raw)
}

/// Work out the edit that toggles `task` in `text`, without applying it.
///
/// `None` means the task's line is gone (or isn't a list item any more).
pub fn locate_toggle(text: &str, task: &Task) -> Option<LinePatch> {
    let lines: Vec<&str> = split_lines(text).collect();
    let idx = locate_task_line(&lines, task)?;
    let old_text = lines[idx];
    let new_text = toggle_checkbox_line(old_text)?;
    Some(LinePatch {
        line_number: idx + 1,
        old_text: old_text.to_string(),
        new_text,
    })
}

/// Apply a line patch to a text snapshot. Lines are rejoined with `\n`.
pub fn apply_patch(text: &str, patch: &LinePatch) -> String {
    split_lines(text)
        .enumerate()
        .map(|(idx, line)| {
            if idx + 1 == patch.line_number {
                patch.new_text.as_str()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Toggle `task` in `text` and return the new text.
///
/// If the task can't be found the input comes back unchanged.
pub fn toggle_in_text(text: &str, task: &Task) -> String {
    match locate_toggle(text, task) {
        Some(patch) => apply_patch(text, &patch),
        None => text.to_string(),
    }
}
