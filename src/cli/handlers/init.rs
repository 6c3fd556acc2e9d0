use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::project_io::{self, FLOWMARK_DIR};
use crate::io::store::atomic_write;
use crate::ops::session::DEFAULT_DOCUMENT;

/// Document file names must stay inside flowmark/
fn validate_file_name(file: &str) -> Result<(), String> {
    if file.trim().is_empty() {
        return Err("document file name cannot be empty".to_string());
    }
    let path = Path::new(file);
    if path.is_absolute() || path.components().count() != 1 {
        return Err(format!(
            "invalid document file \"{}\": use a plain file name like \"tasks.md\"",
            file
        ));
    }
    Ok(())
}

/// Reinitializing keeps a readable config and only re-points its document
/// file. A missing or unreadable config is replaced by the template.
fn write_project_config(flowmark_dir: &Path, file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    if flowmark_dir.join("config.toml").exists() {
        match config_io::read_config(flowmark_dir) {
            Ok((_, mut doc)) => {
                if let Some(file) = file {
                    config_io::set_document_file(&mut doc, file);
                }
                config_io::write_config(flowmark_dir, &doc)?;
                return Ok(());
            }
            Err(e) => eprintln!("warning: replacing unreadable config: {}", e),
        }
    }
    let config_text = config_io::render_config(file)?;
    atomic_write(&flowmark_dir.join("config.toml"), config_text.as_bytes())?;
    Ok(())
}

pub fn cmd_init(args: InitArgs, project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match project_dir {
        Some(dir) => fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let flowmark_dir = root.join(FLOWMARK_DIR);

    if flowmark_dir.join("config.toml").exists() && !args.force {
        return Err("flowmark project already exists in ./flowmark/ (use --force to reinitialize)".into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!(
            "Note: parent project found at {}/",
            parent_root.join(FLOWMARK_DIR).display()
        );
        eprintln!("Creating new project in ./flowmark/");
    }

    if let Some(ref file) = args.file {
        validate_file_name(file)?;
    }

    fs::create_dir_all(&flowmark_dir)?;
    write_project_config(&flowmark_dir, args.file.as_deref())?;

    // Never clobber an existing document, even with --force
    let project = project_io::load_project(&root)?;
    let document = project.document_path();
    if document.exists() {
        println!("Initialized flowmark project (kept existing {})", project.config.document.file);
    } else {
        atomic_write(&document, DEFAULT_DOCUMENT.as_bytes())?;
        println!("Initialized flowmark project: {}", document.display());
    }

    Ok(())
}
