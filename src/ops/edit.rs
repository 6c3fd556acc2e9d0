use std::sync::LazyLock;

use regex::Regex;

use crate::ops::toggle::{LinePatch, toggle_checkbox_line};
use crate::parse::split_lines;

static DASH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)-\s+(.*)$").expect("dash line regex"));

/// What a list line looks like to the Enter key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashLine {
    /// Prefix for the next item: same indent, unchecked box if this one had a box
    pub continue_prefix: String,
    /// True when the item has no text after the marker
    pub is_empty_item: bool,
}

/// What Enter at the end of a line should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Start a new line beginning with this prefix
    Continue(String),
    /// The item was empty: clear the line and leave the list
    EndList,
}

/// Inspect a (possibly indented) `- ` list line
pub fn analyze_dash_line(line: &str) -> Option<DashLine> {
    let caps = DASH_LINE.captures(line)?;
    let indent = caps.get(1).map_or("", |m| m.as_str());
    let mut rest = caps.get(2).map_or("", |m| m.as_str());

    let has_checkbox = ["[ ]", "[x]", "[X]"]
        .iter()
        .any(|marker| rest.starts_with(marker));
    if has_checkbox {
        rest = &rest[3..];
    }
    rest = rest.strip_prefix(' ').unwrap_or(rest);

    let continue_prefix = if has_checkbox {
        format!("{}- [ ] ", indent)
    } else {
        format!("{}- ", indent)
    };

    Some(DashLine {
        continue_prefix,
        is_empty_item: rest.trim().is_empty(),
    })
}

/// Decide how Enter at the end of `line` continues the list.
///
/// Returns `None` when the line isn't a list item and Enter should behave
/// normally.
pub fn continue_list(line: &str) -> Option<Continuation> {
    let dash = analyze_dash_line(line)?;
    if dash.is_empty_item {
        Some(Continuation::EndList)
    } else {
        Some(Continuation::Continue(dash.continue_prefix))
    }
}

/// Toggle the checkbox on the line under the cursor (1-based).
///
/// Unlike toggling from the task list, this needs no task record: whatever
/// `- ` line the cursor is on gets flipped.
pub fn toggle_line_at(text: &str, line_number: usize) -> Option<LinePatch> {
    let idx = line_number.checked_sub(1)?;
    let old_text = split_lines(text).nth(idx)?;
    let new_text = toggle_checkbox_line(old_text)?;
    Some(LinePatch {
        line_number,
        old_text: old_text.to_string(),
        new_text,
    })
}
