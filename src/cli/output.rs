use serde::Serialize;

use crate::model::task::{Task, priority};
use crate::ops::toggle::LinePatch;
use crate::ops::views::Tab;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskListJson<'a> {
    pub view: String,
    pub today: String,
    pub tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
pub struct ViewsJson<'a> {
    pub sections: &'a [String],
    pub headings: &'a [String],
    pub tabs: &'a [Tab],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'a str>,
    pub completed: bool,
    pub patch: &'a LinePatch,
}

#[derive(Serialize)]
pub struct CheckJson {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn priority_marker(level: u8) -> Option<&'static str> {
    match level {
        priority::LOW => Some("!low"),
        priority::HIGH => Some("!high"),
        priority::HIGHEST => Some("!!!"),
        _ => None,
    }
}

/// Format an effort in minutes as `~45m`, `~2h` or `~1h30m`
fn format_effort(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("~{}m", m),
        (h, 0) => format!("~{}h", h),
        (h, m) => format!("~{}h{}m", h, m),
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    let mut parts = vec![format!("[{}] {} {}", check, task.id, task.title)];

    if let Some(ref due) = task.due {
        parts.push(format!("@{}", due));
    }
    if let Some(ref time) = task.time {
        parts.push(format!("@{}", time));
    }
    parts.extend(task.tags.iter().map(|t| format!("#{}", t)));
    if let Some(marker) = priority_marker(task.priority) {
        parts.push(marker.to_string());
    }
    if let Some(minutes) = task.effort_minutes {
        parts.push(format_effort(minutes));
    }
    parts.join(" ")
}

/// Format tasks grouped under their section headers, in the order given.
/// A section header repeats if its tasks are not contiguous.
pub fn format_task_listing(tasks: &[&Task], with_sections: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;
    for task in tasks {
        if with_sections && current != Some(task.section.as_str()) {
            if current.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("{}:", task.section));
            current = Some(task.section.as_str());
        }
        let indent = if with_sections { "  " } else { "" };
        lines.push(format!("{}{}", indent, format_task_line(task)));
    }
    lines
}

pub fn format_tab(tab: &Tab) -> String {
    format!("{:<20} {}", tab.key, tab.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_document;
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    fn parse(text: &str) -> Vec<Task> {
        let now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        parse_document(text, now).tasks
    }

    #[test]
    fn effort_formatting() {
        assert_eq!(format_effort(10), "~10m");
        assert_eq!(format_effort(120), "~2h");
        assert_eq!(format_effort(90), "~1h30m");
        assert_eq!(format_effort(0), "~0m");
    }

    #[test]
    fn task_line_with_every_annotation() {
        let tasks = parse("- [x] fix parser bug @2026-01-07 @15:00 #wbs !! ~1.5h");
        let mut task = tasks[0].clone();
        task.id = "0000beef".to_string();
        assert_snapshot!(format_task_line(&task), @"[x] 0000beef fix parser bug @2026-01-07 @15:00 #wbs !high ~1h30m");
    }

    #[test]
    fn task_line_plain() {
        let mut task = parse("- buy milk")[0].clone();
        task.id = "12345678".to_string();
        assert_snapshot!(format_task_line(&task), @"[ ] 12345678 buy milk");
    }

    #[test]
    fn listing_groups_sections() {
        let mut tasks = parse("- a\n# Work\n- b !low\n- c");
        for (i, t) in tasks.iter_mut().enumerate() {
            t.id = format!("0000000{}", i);
        }
        let refs: Vec<&Task> = tasks.iter().collect();
        let out = format_task_listing(&refs, true).join("\n");
        assert_snapshot!(out, @r"
        Inbox:
          [ ] 00000000 a

        Work:
          [ ] 00000001 b !low
          [ ] 00000002 c
        ");
    }

    #[test]
    fn task_json_uses_camel_case() {
        let tasks = parse("- [ ] write blog @2026-01-10 #oss !high ~30m");
        let json = serde_json::to_value(&tasks[0]).unwrap();
        assert_eq!(json["effortMinutes"], 30);
        assert_eq!(json["lineNumber"], 1);
        assert_eq!(json["due"], "2026-01-10");
        assert!(json.get("time").is_none());
    }
}
