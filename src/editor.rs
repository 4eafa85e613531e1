use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A file the user edits in their own editor, standing in for the code
/// editor widget. Changes are reported on a channel; the caller decides when
/// to commit them.
pub struct EditorFile {
    path: PathBuf,
    last_synced: String,
    /// Dropping the watcher stops watching.
    _watcher: RecommendedWatcher,
}

impl EditorFile {
    /// Start watching `path` with `code` written into it. An existing file is
    /// adopted as-is only when `code` is empty.
    pub fn open(path: &Path, code: &str, changes_tx: mpsc::UnboundedSender<()>) -> Result<Self> {
        let path = std::path::absolute(path)
            .with_context(|| format!("failed to resolve editor file: {}", path.display()))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .context("editor file has no parent directory")?;
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .context("editor file has no file name")?;

        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create editor dir: {}", dir.display()))?;
        let last_synced = if code.is_empty() && path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read editor file: {}", path.display()))?
        } else {
            std::fs::write(&path, code)
                .with_context(|| format!("failed to write editor file: {}", path.display()))?;
            code.to_string()
        };

        // Watch the directory: many editors save by replacing the file.
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let event = match res {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "editor watcher error");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            if event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str())) {
                // Ignore send errors (session gone)
                let _ = changes_tx.send(());
            }
        })
        .context("failed to create editor watcher")?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        tracing::info!(path = %path.display(), "watching editor file");
        Ok(Self {
            path,
            last_synced,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// What the file held when last read or written.
    pub fn contents(&self) -> &str {
        &self.last_synced
    }

    /// Current file contents when they differ from what was last seen.
    pub async fn read_change(&mut self) -> Result<Option<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read editor file: {}", self.path.display()))?;
        if content == self.last_synced {
            return Ok(None);
        }
        self.last_synced = content.clone();
        Ok(Some(content))
    }

    /// Overwrite the file with a code buffer produced elsewhere.
    pub async fn sync(&mut self, code: &str) -> Result<()> {
        if code == self.last_synced {
            return Ok(());
        }
        tokio::fs::write(&self.path, code)
            .await
            .with_context(|| format!("failed to write editor file: {}", self.path.display()))?;
        self.last_synced = code.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_seeds_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        let (tx, _rx) = mpsc::unbounded_channel();

        let editor = EditorFile::open(&path, "<p>seed</p>", tx).unwrap();
        assert_eq!(std::fs::read_to_string(editor.path()).unwrap(), "<p>seed</p>");
    }

    #[tokio::test]
    async fn test_open_overwrites_existing_file_with_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        std::fs::write(&path, "<p>stale</p>").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut editor = EditorFile::open(&path, "<p>current</p>", tx).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>current</p>");
        assert_eq!(editor.contents(), "<p>current</p>");
        assert!(editor.read_change().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_adopts_existing_file_without_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        std::fs::write(&path, "<p>mine</p>").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut editor = EditorFile::open(&path, "", tx).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>mine</p>");
        assert_eq!(editor.contents(), "<p>mine</p>");
        assert!(editor.read_change().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_change_reports_only_new_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut editor = EditorFile::open(&path, "a", tx).unwrap();

        std::fs::write(&path, "b").unwrap();
        assert_eq!(editor.read_change().await.unwrap().as_deref(), Some("b"));
        assert!(editor.read_change().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sync_writes_file_and_suppresses_echo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut editor = EditorFile::open(&path, "old", tx).unwrap();

        editor.sync("new").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(editor.read_change().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_external_write_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("component.html");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _editor = EditorFile::open(&path, "start", tx).unwrap();

        std::fs::write(&path, "edited").unwrap();
        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(matches!(got, Ok(Some(()))));
    }
}
