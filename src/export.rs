use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name of the downloaded artifact.
pub const EXPORT_FILE_NAME: &str = "Ideafy-Component.html";

/// Write `code` verbatim to `<dir>/Ideafy-Component.html`, replacing any
/// earlier export, and return the written path.
pub async fn export_code(code: &str, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create export dir: {}", dir.display()))?;

    let path = dir.join(EXPORT_FILE_NAME);
    tokio::fs::write(&path, code)
        .await
        .with_context(|| format!("failed to write export file: {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = code.len(), "exported component");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_export_writes_code_verbatim() {
        let dir = tempdir().unwrap();
        let code = "<!DOCTYPE html>\n<html><body>é</body></html>\n";
        let path = export_code(code, dir.path()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "Ideafy-Component.html");
        assert_eq!(std::fs::read_to_string(path).unwrap(), code);
    }

    #[tokio::test]
    async fn test_export_overwrites_previous_file() {
        let dir = tempdir().unwrap();
        export_code("old", dir.path()).await.unwrap();
        let path = export_code("new", dir.path()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_export_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        assert!(export_code("code", &blocker).await.is_err());
    }
}
