use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store::{FallbackStore, FileStore};
use crate::model::config::FlowmarkConfig;
use crate::model::project::Project;

/// Name of the directory that marks a flowmark project
pub const FLOWMARK_DIR: &str = "flowmark";

/// Failures finding or reading a project
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("not a flowmark project: no flowmark/ directory found (try `fm init`)")]
    NotAProject,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The nearest directory at or above `start` holding `flowmark/config.toml`.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    start
        .ancestors()
        .find(|dir| dir.join(FLOWMARK_DIR).join("config.toml").is_file())
        .map(Path::to_path_buf)
        .ok_or(ProjectError::NotAProject)
}

/// Load the project rooted at `root` (the parent of `flowmark/`).
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let flowmark_dir = root.join(FLOWMARK_DIR);
    if !flowmark_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }

    let config_path = flowmark_dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| ProjectError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: FlowmarkConfig = toml::from_str(&config_text)?;

    Ok(Project {
        root: root.to_path_buf(),
        flowmark_dir,
        config,
    })
}

/// The store the document lives in: the configured file, falling back to
/// the fallback file when the primary can't be read or written.
pub fn open_store(project: &Project) -> FallbackStore<FileStore, FileStore> {
    FallbackStore::new(
        FileStore::new(project.document_path()),
        FileStore::new(project.fallback_path()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::DocumentStore;
    use tempfile::TempDir;

    fn make_project(root: &Path, config: &str) {
        let dir = root.join(FLOWMARK_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), config).unwrap();
    }

    #[test]
    fn discover_walks_up() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "");
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let root = discover_project(&nested).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn load_without_flowmark_dir_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_project(tmp.path()),
            Err(ProjectError::NotAProject)
        ));
    }

    #[test]
    fn flowmark_dir_without_config_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("inner/flowmark")).unwrap();
        make_project(tmp.path(), "");
        let root = discover_project(&tmp.path().join("inner")).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn load_reads_config() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "[document]\nfile = \"todo.md\"\n");
        let project = load_project(tmp.path()).unwrap();
        assert_eq!(project.config.document.file, "todo.md");
        assert_eq!(project.document_path(), tmp.path().join("flowmark/todo.md"));
    }

    #[test]
    fn bad_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "[document\n");
        assert!(matches!(
            load_project(tmp.path()),
            Err(ProjectError::ConfigParseError(_))
        ));
    }

    #[test]
    fn store_reads_document_file() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path(), "");
        fs::write(tmp.path().join("flowmark/tasks.md"), "- a\n").unwrap();
        let project = load_project(tmp.path()).unwrap();
        let store = open_store(&project);
        assert_eq!(store.load().unwrap().as_deref(), Some("- a\n"));
    }
}
