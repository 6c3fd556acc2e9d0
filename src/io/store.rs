use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};

/// Error type for document storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Opaque get/set of the single document text.
///
/// Nothing here is transactional; callers treat both operations as best effort.
pub trait DocumentStore {
    /// The stored text, or `None` if nothing has been stored yet
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, text: &str) -> Result<(), StoreError>;
    /// Short human-readable description for messages
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A markdown file on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save(&self, text: &str) -> Result<(), StoreError> {
        atomic_write(&self.path, text.as_bytes()).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the document in memory. `failing()` builds one whose every call errors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: RefCell<Option<String>>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        MemoryStore {
            text: RefCell::new(Some(text.into())),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        MemoryStore {
            text: RefCell::new(None),
            failing: true,
        }
    }

    /// What was last saved, bypassing the failure flag
    pub fn contents(&self) -> Option<String> {
        self.text.borrow().clone()
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("memory store is failing".to_string()));
        }
        Ok(self.text.borrow().clone())
    }

    fn save(&self, text: &str) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("memory store is failing".to_string()));
        }
        *self.text.borrow_mut() = Some(text.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Primary + fallback
// ---------------------------------------------------------------------------

/// Try the primary store; if it errors, use the fallback instead.
#[derive(Debug)]
pub struct FallbackStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P: DocumentStore, F: DocumentStore> FallbackStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        FallbackStore { primary, fallback }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P: DocumentStore, F: DocumentStore> DocumentStore for FallbackStore<P, F> {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match self.primary.load() {
            Ok(text) => Ok(text),
            Err(e) => {
                eprintln!(
                    "warning: {}; reading {} instead",
                    e,
                    self.fallback.describe()
                );
                self.fallback.load()
            }
        }
    }

    fn save(&self, text: &str) -> Result<(), StoreError> {
        match self.primary.save(text) {
            Ok(()) => Ok(()),
            Err(e) => {
                eprintln!(
                    "warning: {}; saving to {} instead",
                    e,
                    self.fallback.describe()
                );
                self.fallback.save(text)
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} (fallback {})", self.primary.describe(), self.fallback.describe())
    }
}

// ---------------------------------------------------------------------------
// Boundary functions: failures stop here
// ---------------------------------------------------------------------------

/// Load the document, treating any failure as "nothing stored".
pub fn load_document<S: DocumentStore + ?Sized>(store: &S, recovery_dir: Option<&Path>) -> Option<String> {
    match store.load() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("warning: could not load document: {}", e);
            if let Some(dir) = recovery_dir {
                let entry = RecoveryEntry::new(RecoveryCategory::Load, "document could not be loaded")
                    .with_detail("Store", store.describe())
                    .with_detail("Error", e.to_string());
                recovery::log_recovery(dir, entry);
            }
            None
        }
    }
}

/// Save the document. Returns whether it was stored.
///
/// On failure the text is appended to the recovery log (when a directory for
/// it is known) so nothing typed is lost; the error is never propagated.
pub fn save_document<S: DocumentStore + ?Sized>(
    store: &S,
    text: &str,
    recovery_dir: Option<&Path>,
) -> bool {
    match store.save(text) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("warning: could not save document: {}", e);
            if let Some(dir) = recovery_dir {
                let entry = RecoveryEntry::new(RecoveryCategory::Save, "document could not be saved")
                    .with_detail("Store", store.describe())
                    .with_detail("Error", e.to_string())
                    .with_body(text);
                recovery::log_recovery(dir, entry);
            }
            false
        }
    }
}
