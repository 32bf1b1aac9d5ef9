use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::{Component, Path};
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the file watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Relevant paths changed since the last debounce window
    FilesChanged(Vec<String>),
}

/// Debounced recursive watcher over a repository's working tree
pub struct FileWatcher {
    _watcher: notify_debouncer_mini::Debouncer<RecommendedWatcher>,
}

impl FileWatcher {
    /// Start watching `root`. Batches of relevant changes are sent on `tx`
    /// at most once per `debounce_ms`.
    pub fn new(root: &Path, debounce_ms: u64, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let mut debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let paths: Vec<String> = events
                        .iter()
                        .filter(|e| e.kind == DebouncedEventKind::Any)
                        .filter(|e| is_relevant(&e.path))
                        .map(|e| e.path.to_string_lossy().into_owned())
                        .collect();
                    if !paths.is_empty() {
                        tracing::trace!(count = paths.len(), "watched files changed");
                        let _ = tx.send(WatchEvent::FilesChanged(paths));
                    }
                }
                Err(err) => tracing::warn!(%err, "file watcher error"),
            },
        )
        .context("Failed to create file watcher")?;

        debouncer
            .watcher()
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        tracing::debug!(root = %root.display(), debounce_ms, "file watcher started");
        Ok(FileWatcher {
            _watcher: debouncer,
        })
    }
}

/// Working-tree files always count. Inside `.git/` only the index (staging)
/// and refs (commits, branch moves) matter; objects and logs are noise.
fn is_relevant(path: &Path) -> bool {
    let mut components = path.components();
    while let Some(component) = components.next() {
        if component == Component::Normal(".git".as_ref()) {
            let rest: Vec<_> = components.collect();
            return match rest.first() {
                Some(Component::Normal(name)) => {
                    (*name == "index" && rest.len() == 1) || *name == "refs" || *name == "HEAD"
                }
                _ => false,
            };
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_tree_files_are_relevant() {
        assert!(is_relevant(Path::new("/repo/src/main.rs")));
        assert!(is_relevant(Path::new("/repo/.gitignore")));
    }

    #[test]
    fn git_internals_are_filtered() {
        assert!(is_relevant(Path::new("/repo/.git/index")));
        assert!(is_relevant(Path::new("/repo/.git/HEAD")));
        assert!(is_relevant(Path::new("/repo/.git/refs/heads/main")));
        assert!(!is_relevant(Path::new("/repo/.git/objects/ab/cdef")));
        assert!(!is_relevant(Path::new("/repo/.git/logs/HEAD")));
        assert!(!is_relevant(Path::new("/repo/.git/index.lock")));
        assert!(!is_relevant(Path::new("/repo/.git")));
    }

    #[test]
    fn watcher_reports_file_writes() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let _watcher = FileWatcher::new(dir.path(), 50, tx).unwrap();
        std::fs::write(dir.path().join("touched.txt"), "x").unwrap();

        let event = rx.recv_timeout(Duration::from_secs(5));
        match event {
            Ok(WatchEvent::FilesChanged(paths)) => {
                assert!(paths.iter().any(|p| p.ends_with("touched.txt")));
            }
            Err(err) => panic!("no watch event: {err}"),
        }
    }
}
