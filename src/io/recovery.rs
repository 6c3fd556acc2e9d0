use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::io::store::atomic_write;

/// Once the log passes this size, expired entries are dropped on the next append.
const TRIM_THRESHOLD_BYTES: u64 = 1 << 20;

/// Entries older than this are removed by `fm recovery prune` without `--before`.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

const FENCE: &str = "````";

const LOG_PREAMBLE: &str = "\
<!-- flowmark recovery log
     Document text that could not be loaded or saved is appended below.
     List entries with `fm recovery`, drop old ones with `fm recovery prune`.
     Delete this file once nothing in it is needed. -->

";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    Load,
    Save,
}

impl RecoveryCategory {
    fn as_str(self) -> &'static str {
        match self {
            RecoveryCategory::Load => "load",
            RecoveryCategory::Save => "save",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word {
            "load" => Some(RecoveryCategory::Load),
            "save" => Some(RecoveryCategory::Save),
            _ => None,
        }
    }
}

/// One failed load or save, with the text that was at stake.
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryEntry {
    #[serde(rename = "timestamp", serialize_with = "serialize_stamp")]
    pub at: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub summary: String,
    pub details: IndexMap<String, String>,
    pub body: String,
}

fn serialize_stamp<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&stamp(at))
}

fn stamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, summary: impl Into<String>) -> Self {
        RecoveryEntry {
            at: Utc::now(),
            category,
            summary: summary.into(),
            details: IndexMap::new(),
            body: String::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// The entry as it appears in the log file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "## {} {}: {}",
            stamp(&self.at),
            self.category.as_str(),
            self.summary
        );
        for (key, value) in &self.details {
            let _ = writeln!(out, "- {}: {}", key, value);
        }
        if !self.body.is_empty() {
            let _ = writeln!(out, "\n{}text", FENCE);
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            let _ = writeln!(out, "{}", FENCE);
        }
        out.push('\n');
        out
    }

    fn from_section(section: &Section<'_>) -> Option<Self> {
        let mut entry = RecoveryEntry::new(section.category?, section.summary);
        entry.at = section.at;

        let mut body: Vec<&str> = Vec::new();
        let mut fenced = false;
        for &line in &section.lines {
            if line.starts_with(FENCE) {
                fenced = !fenced;
            } else if fenced {
                body.push(line);
            } else if let Some((key, value)) =
                line.strip_prefix("- ").and_then(|l| l.split_once(": "))
            {
                entry.details.insert(key.to_string(), value.to_string());
            }
        }
        entry.body = body.join("\n");
        Some(entry)
    }
}

pub fn recovery_log_path(flowmark_dir: &Path) -> PathBuf {
    flowmark_dir.join(".recovery.log")
}

/// Append an entry to the log. A failure here only produces a warning.
pub fn log_recovery(flowmark_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(&recovery_log_path(flowmark_dir), &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(path: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if size > TRIM_THRESHOLD_BYTES {
        let cutoff = Utc::now() - chrono::Duration::days(DEFAULT_RETENTION_DAYS);
        if let Err(e) = rewrite_keeping(path, |s| s.at >= cutoff) {
            eprintln!("warning: could not trim recovery log: {}", e);
        }
    }

    let fresh = fs::metadata(path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        file.write_all(LOG_PREAMBLE.as_bytes())?;
    }
    file.write_all(entry.render().as_bytes())
}

/// Read entries newest first, at most `limit` of them.
pub fn read_recovery_entries(flowmark_dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = fs::read_to_string(recovery_log_path(flowmark_dir)) else {
        return Vec::new();
    };
    let (_, sections) = split_log(&content);
    let mut entries: Vec<RecoveryEntry> = sections
        .iter()
        .rev()
        .filter_map(RecoveryEntry::from_section)
        .collect();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

/// Remove entries older than `before` (default: the retention window), or
/// every entry when `all` is set. Returns how many were removed.
pub fn prune_recovery(
    flowmark_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(flowmark_dir);
    if !path.exists() {
        return Ok(0);
    }
    if all {
        let content = fs::read_to_string(&path)?;
        let (_, sections) = split_log(&content);
        atomic_write(&path, LOG_PREAMBLE.as_bytes())?;
        return Ok(sections.len());
    }
    let cutoff =
        before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(DEFAULT_RETENTION_DAYS));
    rewrite_keeping(&path, |s| s.at >= cutoff)
}

/// Rewrite the log with only the sections `keep` accepts. Returns the
/// number of sections dropped.
fn rewrite_keeping(path: &Path, keep: impl Fn(&Section<'_>) -> bool) -> io::Result<usize> {
    let content = fs::read_to_string(path)?;
    let (preamble, sections) = split_log(&content);

    let mut out = String::with_capacity(content.len());
    for line in preamble {
        out.push_str(line);
        out.push('\n');
    }
    let mut dropped = 0;
    for section in &sections {
        if !keep(section) {
            dropped += 1;
            continue;
        }
        for line in std::iter::once(&section.heading).chain(&section.lines) {
            out.push_str(line);
            out.push('\n');
        }
    }
    if dropped > 0 {
        atomic_write(path, out.as_bytes())?;
    }
    Ok(dropped)
}

/// A `## <stamp> ...` heading and the lines under it.
struct Section<'a> {
    heading: &'a str,
    at: DateTime<Utc>,
    category: Option<RecoveryCategory>,
    summary: &'a str,
    lines: Vec<&'a str>,
}

/// Split the log into the lines before the first entry and the entries.
/// Headings inside a fenced body don't start a new entry.
fn split_log(content: &str) -> (Vec<&str>, Vec<Section<'_>>) {
    let mut preamble = Vec::new();
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut fenced = false;

    for line in content.lines() {
        if !fenced && let Some(section) = parse_heading(line) {
            sections.push(section);
            continue;
        }
        if line.starts_with(FENCE) {
            fenced = !fenced;
        }
        match sections.last_mut() {
            Some(section) => section.lines.push(line),
            None => preamble.push(line),
        }
    }
    (preamble, sections)
}

fn parse_heading(line: &str) -> Option<Section<'_>> {
    let rest = line.strip_prefix("## ")?;
    let (stamp, rest) = rest.split_once(' ')?;
    let at = DateTime::parse_from_rfc3339(stamp).ok()?.with_timezone(&Utc);
    let (word, summary) = rest.split_once(": ").unwrap_or((rest, ""));
    Some(Section {
        heading: line,
        at,
        category: RecoveryCategory::from_word(word),
        summary,
        lines: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn saved(body: &str) -> RecoveryEntry {
        RecoveryEntry::new(RecoveryCategory::Save, "document could not be saved")
            .with_detail("Store", "tasks.md")
            .with_body(body)
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - chrono::Duration::days(days)
    }

    #[test]
    fn entries_read_back_newest_first() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), saved("# Inbox\n- [ ] a"));
        log_recovery(tmp.path(), saved("- second"));

        let raw = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(raw.starts_with("<!-- flowmark recovery log"));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].body, "- second");
        assert_eq!(entries[1].body, "# Inbox\n- [ ] a");
        assert_eq!(entries[1].details.get("Store").map(String::as_str), Some("tasks.md"));
        assert_eq!(entries[1].summary, "document could not be saved");
    }

    #[test]
    fn markdown_in_body_stays_inside_the_entry() {
        let tmp = TempDir::new().unwrap();
        let body = "- [ ] task\n- Key: not a detail\n```\ncode\n```\n---\n## 2026-01-01T00:00:00Z load: fake";
        log_recovery(tmp.path(), saved(body));

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, body);
        assert_eq!(entries[0].details.len(), 1);
    }

    #[test]
    fn limit_keeps_the_latest() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_recovery(tmp.path(), saved(&format!("body {}", i)));
        }
        let bodies: Vec<String> = read_recovery_entries(tmp.path(), Some(2))
            .into_iter()
            .map(|e| e.body)
            .collect();
        assert_eq!(bodies, vec!["body 4", "body 3"]);
    }

    #[test]
    fn no_log_file() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
        assert_eq!(prune_recovery(tmp.path(), None, false).unwrap(), 0);
    }

    #[test]
    fn prune_drops_expired_entries() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), RecoveryEntry { at: days_ago(60), ..saved("old") });
        log_recovery(tmp.path(), saved("new"));

        assert_eq!(prune_recovery(tmp.path(), None, false).unwrap(), 1);
        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "new");

        let raw = fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert!(raw.starts_with("<!-- flowmark recovery log"));
    }

    #[test]
    fn prune_with_explicit_cutoff() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), RecoveryEntry { at: days_ago(5), ..saved("five") });
        log_recovery(tmp.path(), RecoveryEntry { at: days_ago(1), ..saved("one") });

        assert_eq!(prune_recovery(tmp.path(), Some(days_ago(2)), false).unwrap(), 1);
        assert_eq!(read_recovery_entries(tmp.path(), None)[0].body, "one");
    }

    #[test]
    fn prune_everything() {
        let tmp = TempDir::new().unwrap();
        log_recovery(tmp.path(), saved("a"));
        log_recovery(tmp.path(), saved("b"));
        assert_eq!(prune_recovery(tmp.path(), None, true).unwrap(), 2);
        assert!(read_recovery_entries(tmp.path(), None).is_empty());
    }

    #[test]
    fn json_shape() {
        let at = DateTime::parse_from_rfc3339("2026-01-05T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(RecoveryEntry { at, ..saved("x") }).unwrap();
        assert_eq!(json["timestamp"], "2026-01-05T12:00:00Z");
        assert_eq!(json["category"], "save");
        assert_eq!(json["summary"], "document could not be saved");
        assert_eq!(json["details"]["Store"], "tasks.md");
        assert_eq!(json["body"], "x");
    }
}
