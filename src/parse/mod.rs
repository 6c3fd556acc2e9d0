pub mod document_parser;
pub mod identity;
pub mod task_parser;
pub mod tokens;

pub use document_parser::parse_document;
pub use identity::task_id;
pub use task_parser::{parse_task_line, ParsedTaskLine};
pub use tokens::TokenContext;

/// Split text into lines on `\n` or `\r\n`.
///
/// Unlike `str::lines`, a trailing newline yields a final empty line, so
/// joining the pieces with `\n` gives back the original (LF) text and line
/// numbers line up with what an editor shows.
pub fn split_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Word-separating whitespace: Unicode `White_Space` minus U+0085 (NEL),
/// plus U+FEFF (BOM). This is the set JavaScript's `\s` matches.
pub fn is_space(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

/// Regex class matching exactly the chars `is_space` accepts
pub(crate) const SPACE_CLASS: &str =
    r"[\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}]";

/// Trim `is_space` chars from both ends
pub fn trim_space(s: &str) -> &str {
    s.trim_matches(is_space)
}
