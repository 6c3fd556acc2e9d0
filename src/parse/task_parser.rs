use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;

use crate::model::task::priority;
use crate::parse::tokens::{classify, Token, TokenContext};
use crate::parse::{is_space, trim_space, SPACE_CLASS};

/// `- ` then an optional `[ ]`/`[x]`/`[X]` followed by one whitespace char
static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^- (?:\[([ xX])\]{})?(.*)$", SPACE_CLASS)).expect("task line regex")
});

/// The fields one task line contributes, before section and identity are known
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTaskLine {
    pub completed: bool,
    pub title: String,
    pub tags: Vec<String>,
    pub due: Option<String>,
    pub time: Option<String>,
    pub priority: u8,
    pub effort_minutes: Option<u64>,
}

/// Cheap gate applied before the full parse: task lines start with `- `
pub fn is_candidate(line: &str) -> bool {
    line.starts_with("- ")
}

/// Parse one line: `- [x] title words @due @HH:MM #tag !prio ~effort`.
///
/// Returns `None` for lines that aren't task lines. Annotation words may
/// appear anywhere; the title is whatever words are left, in order.
pub fn parse_task_line(line: &str, ctx: &TokenContext) -> Option<ParsedTaskLine> {
    let caps = TASK_LINE.captures(line)?;

    let completed = matches!(caps.get(1).map(|m| m.as_str()), Some("x" | "X"));
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let mut tags: IndexSet<String> = IndexSet::new();
    let mut due = None;
    let mut time = None;
    let mut prio = priority::NONE;
    let mut effort_minutes = None;
    let mut title_words: Vec<&str> = Vec::new();

    for word in rest.split(is_space).filter(|w| !w.is_empty()) {
        match classify(word, ctx) {
            Some(Token::Due(d)) => due = Some(d),
            Some(Token::Time(t)) => time = Some(t),
            Some(Token::Tag(t)) => {
                tags.insert(t);
            }
            Some(Token::Priority(p)) => prio = p,
            Some(Token::Effort(m)) => effort_minutes = Some(m),
            None => title_words.push(word),
        }
    }

    Some(ParsedTaskLine {
        completed,
        title: trim_space(&title_words.join(" ")).to_string(),
        tags: tags.into_iter().collect(),
        due,
        time,
        priority: prio,
        effort_minutes,
    })
}
