use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the `fm watch` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The document file was written, created or removed.
    Changed(PathBuf),
}

/// Watches the task document for edits made by other programs.
pub struct DocumentWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<DocumentEvent>,
}

impl DocumentWatcher {
    /// Start watching `document`. The parent directory is watched rather than
    /// the file itself so atomic saves (write to temp + rename) are seen.
    pub fn start(document: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target = document.to_path_buf();
        let target_name = document.file_name().map(|n| n.to_os_string());
        let dir = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }

                // Paths may come back canonicalized, so compare file names
                let touches_document = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == target_name);
                if touches_document {
                    let _ = tx.send(DocumentEvent::Changed(target.clone()));
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(DocumentWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Block until the document changes, then keep absorbing events until
    /// none arrive for `quiet`. Returns `false` if the watcher has gone away.
    pub fn wait_settled(&self, quiet: Duration) -> bool {
        if self.rx.recv().is_err() {
            return false;
        }
        loop {
            match self.rx.recv_timeout(quiet) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }
}
