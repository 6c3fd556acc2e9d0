use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::model::task::priority;

// ASCII digit classes on purpose: `\d` in the regex crate is Unicode-aware.
static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([0-9]{4}-[0-9]{2}-[0-9]{2})$").expect("date token regex"));
static TIME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([0-9]{2}):([0-9]{2})$").expect("time token regex"));
static TAG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Za-z0-9_]+)$").expect("tag token regex"));
static EFFORT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~([0-9]+(?:\.[0-9]+)?)([mh])$").expect("effort token regex"));

/// Caller-supplied context for resolving relative tokens.
///
/// The parser never reads a clock itself; `now` is the local wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct TokenContext {
    pub now: NaiveDateTime,
}

impl TokenContext {
    pub fn new(now: NaiveDateTime) -> Self {
        TokenContext { now }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}

/// A word recognized as an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Due(String),
    Time(String),
    Tag(String),
    Priority(u8),
    Effort(u64),
}

type Classifier = fn(&str, &TokenContext) -> Option<Token>;

/// Classifiers in precedence order. The first one that matches consumes the word.
const CLASSIFIERS: [Classifier; 5] = [due, time, tag, priority_level, effort];

fn due(word: &str, ctx: &TokenContext) -> Option<Token> {
    parse_due_token(word, ctx).map(Token::Due)
}

fn time(word: &str, _: &TokenContext) -> Option<Token> {
    parse_time_token(word).map(Token::Time)
}

fn tag(word: &str, _: &TokenContext) -> Option<Token> {
    parse_tag_token(word).map(|t| Token::Tag(t.to_string()))
}

fn priority_level(word: &str, _: &TokenContext) -> Option<Token> {
    parse_priority_token(word).map(Token::Priority)
}

fn effort(word: &str, _: &TokenContext) -> Option<Token> {
    parse_effort_token(word).map(Token::Effort)
}

/// Classify one whitespace-delimited word. `None` means it is a title word.
pub fn classify(word: &str, ctx: &TokenContext) -> Option<Token> {
    CLASSIFIERS.iter().find_map(|classifier| classifier(word, ctx))
}

/// Format a date the way due dates are stored: zero-padded `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `@today`, `@tomorrow`, or a literal `@YYYY-MM-DD`.
///
/// Literal dates are passed through without calendar validation.
pub fn parse_due_token(word: &str, ctx: &TokenContext) -> Option<String> {
    match word {
        "@today" => return Some(iso_date(ctx.today())),
        "@tomorrow" => return ctx.today().checked_add_days(Days::new(1)).map(iso_date),
        _ => {}
    }
    DATE_TOKEN
        .captures(word)
        .map(|caps| caps[1].to_string())
}

/// `@HH:MM` with HH in 00..=23 and MM in 00..=59
pub fn parse_time_token(word: &str) -> Option<String> {
    let caps = TIME_TOKEN.captures(word)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{}:{}", &caps[1], &caps[2]))
}

/// `#name` where name is ASCII letters, digits and underscores
pub fn parse_tag_token(word: &str) -> Option<&str> {
    TAG_TOKEN
        .captures(word)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The priority words are a closed set; `!!` is an alias for `!high`.
pub fn parse_priority_token(word: &str) -> Option<u8> {
    match word {
        "!low" => Some(priority::LOW),
        "!high" | "!!" => Some(priority::HIGH),
        "!!!" => Some(priority::HIGHEST),
        _ => None,
    }
}

/// Largest minute count a float holds exactly (2^53 - 1)
const MAX_EFFORT_MINUTES: f64 = 9_007_199_254_740_991.0;

/// `~30m`, `~1.5h`: effort in minutes, rounded to the nearest whole minute.
/// Counts past `MAX_EFFORT_MINUTES` are not effort tokens.
pub fn parse_effort_token(word: &str) -> Option<u64> {
    let caps = EFFORT_TOKEN.captures(word)?;
    let value: f64 = caps[1].parse().ok()?;
    let minutes = if &caps[2] == "h" { value * 60.0 } else { value };
    let minutes = minutes.round();
    if minutes > MAX_EFFORT_MINUTES {
        return None;
    }
    Some(minutes as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> TokenContext {
        let now = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        TokenContext::new(now)
    }

    #[test]
    fn due_today_and_tomorrow() {
        assert_eq!(parse_due_token("@today", &ctx()).as_deref(), Some("2026-01-05"));
        assert_eq!(parse_due_token("@tomorrow", &ctx()).as_deref(), Some("2026-01-06"));
    }

    #[test]
    fn due_tomorrow_crosses_month_and_year() {
        let now = NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let ctx = TokenContext::new(now);
        assert_eq!(parse_due_token("@tomorrow", &ctx).as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn due_literal_is_not_validated() {
        assert_eq!(parse_due_token("@2026-01-10", &ctx()).as_deref(), Some("2026-01-10"));
        assert_eq!(parse_due_token("@2026-13-99", &ctx()).as_deref(), Some("2026-13-99"));
        assert_eq!(parse_due_token("@2026-1-10", &ctx()), None);
        assert_eq!(parse_due_token("2026-01-10", &ctx()), None);
        assert_eq!(parse_due_token("@Today", &ctx()), None);
        assert_eq!(parse_due_token("@today!", &ctx()), None);
    }

    #[test]
    fn time_range_checks() {
        assert_eq!(parse_time_token("@15:00").as_deref(), Some("15:00"));
        assert_eq!(parse_time_token("@00:00").as_deref(), Some("00:00"));
        assert_eq!(parse_time_token("@23:59").as_deref(), Some("23:59"));
        assert_eq!(parse_time_token("@24:00"), None);
        assert_eq!(parse_time_token("@12:60"), None);
        assert_eq!(parse_time_token("@9:30"), None);
        assert_eq!(parse_time_token("@１２:００"), None);
    }

    #[test]
    fn tag_charset() {
        assert_eq!(parse_tag_token("#oss"), Some("oss"));
        assert_eq!(parse_tag_token("#snake_case_42"), Some("snake_case_42"));
        assert_eq!(parse_tag_token("#"), None);
        assert_eq!(parse_tag_token("#kebab-case"), None);
        assert_eq!(parse_tag_token("##double"), None);
        assert_eq!(parse_tag_token("#café"), None);
    }

    #[test]
    fn priority_is_a_closed_set() {
        assert_eq!(parse_priority_token("!low"), Some(1));
        assert_eq!(parse_priority_token("!high"), Some(2));
        assert_eq!(parse_priority_token("!!"), Some(2));
        assert_eq!(parse_priority_token("!!!"), Some(3));
        assert_eq!(parse_priority_token("!"), None);
        assert_eq!(parse_priority_token("!med"), None);
        assert_eq!(parse_priority_token("!!!!"), None);
        assert_eq!(parse_priority_token("!HIGH"), None);
    }

    #[test]
    fn effort_units_and_rounding() {
        assert_eq!(parse_effort_token("~30m"), Some(30));
        assert_eq!(parse_effort_token("~2h"), Some(120));
        assert_eq!(parse_effort_token("~1.5h"), Some(90));
        assert_eq!(parse_effort_token("~0.01h"), Some(1));
        assert_eq!(parse_effort_token("~2.5m"), Some(3));
        assert_eq!(parse_effort_token("~0m"), Some(0));
        assert_eq!(parse_effort_token("~-5m"), None);
        assert_eq!(parse_effort_token("~5"), None);
        assert_eq!(parse_effort_token("~5d"), None);
        assert_eq!(parse_effort_token("~.5h"), None);
        assert_eq!(parse_effort_token("~abcm"), None);
    }

    #[test]
    fn oversized_effort_is_a_title_word() {
        assert_eq!(parse_effort_token("~9007199254740991m"), Some(9_007_199_254_740_991));
        assert_eq!(parse_effort_token("~99999999999999999999999m"), None);
        assert_eq!(parse_effort_token("~200000000000000h"), None);
        assert_eq!(classify("~99999999999999999999999m", &ctx()), None);
    }

    #[test]
    fn classify_falls_through_to_title() {
        assert_eq!(classify("hello", &ctx()), None);
        assert_eq!(classify("@25:00", &ctx()), None);
        assert_eq!(classify("@", &ctx()), None);
    }

    #[test]
    fn classify_dispatches_each_category() {
        assert_eq!(classify("@today", &ctx()), Some(Token::Due("2026-01-05".into())));
        assert_eq!(classify("@08:15", &ctx()), Some(Token::Time("08:15".into())));
        assert_eq!(classify("#wbs", &ctx()), Some(Token::Tag("wbs".into())));
        assert_eq!(classify("!!!", &ctx()), Some(Token::Priority(3)));
        assert_eq!(classify("~1h", &ctx()), Some(Token::Effort(60)));
    }
}
