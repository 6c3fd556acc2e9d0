use std::fs;
use std::path::Path;

use crate::io::project_io::ProjectError;
use crate::io::store::atomic_write;
use crate::model::config::FlowmarkConfig;

/// Written by `fm init`. Comments survive later edits through toml_edit.
pub const CONFIG_TEMPLATE: &str = r#"# flowmark configuration

[document]
# Markdown file holding your tasks, relative to this directory
file = "tasks.md"
# Where saves go when the document file can't be written
fallback = ".fallback.md"

[timing]
# Quiet period after an edit before `fm watch` re-reads the task list
parse_debounce_ms = 150
"#;

/// Render the config template, pointing it at `file` when given.
pub fn render_config(file: Option<&str>) -> Result<String, ProjectError> {
    let mut doc: toml_edit::DocumentMut = CONFIG_TEMPLATE.parse()?;
    if let Some(file) = file {
        set_document_file(&mut doc, file);
    }
    Ok(doc.to_string())
}

/// Load `config.toml` twice over: typed, and as an editable document that
/// keeps the user's comments and layout.
pub fn read_config(
    flowmark_dir: &Path,
) -> Result<(FlowmarkConfig, toml_edit::DocumentMut), ProjectError> {
    let config_path = flowmark_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: FlowmarkConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Save an edited config document in place.
pub fn write_config(flowmark_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ProjectError> {
    atomic_write(&flowmark_dir.join("config.toml"), doc.to_string().as_bytes())?;
    Ok(())
}

/// Point the config at a different document file
pub fn set_document_file(doc: &mut toml_edit::DocumentMut, file: &str) {
    if !doc.contains_key("document") {
        doc["document"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["document"]["file"] = toml_edit::value(file);
}
