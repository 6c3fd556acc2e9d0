use serde::{Deserialize, Serialize};

/// Configuration from flowmark/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowmarkConfig {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Markdown file holding the task document, relative to flowmark/
    #[serde(default = "default_file")]
    pub file: String,
    /// Where saves go when the primary file can't be written
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            file: default_file(),
            fallback: default_fallback(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Quiet period after an edit before the task list is re-derived
    #[serde(default = "default_parse_debounce")]
    pub parse_debounce_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            parse_debounce_ms: default_parse_debounce(),
        }
    }
}

/// Defaults mirror CONFIG_TEMPLATE in src/io/config_io.rs
fn default_file() -> String {
    "tasks.md".to_string()
}

fn default_fallback() -> String {
    ".fallback.md".to_string()
}

fn default_parse_debounce() -> u64 {
    150
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: FlowmarkConfig = toml::from_str("").unwrap();
        assert_eq!(config.document.file, "tasks.md");
        assert_eq!(config.document.fallback, ".fallback.md");
        assert_eq!(config.timing.parse_debounce_ms, 150);
    }

    #[test]
    fn partial_tables_fill_in_defaults() {
        let config: FlowmarkConfig = toml::from_str(
            r#"
[document]
file = "todo.md"

[timing]
parse_debounce_ms = 1000
"#,
        )
        .unwrap();
        assert_eq!(config.document.file, "todo.md");
        assert_eq!(config.document.fallback, ".fallback.md");
        assert_eq!(config.timing.parse_debounce_ms, 1000);
    }
}
