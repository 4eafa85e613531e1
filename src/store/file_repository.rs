use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::STORAGE_SLOT;
use super::repository::ComponentRepository;
use crate::component::SavedComponent;

/// Keeps the saved collection as a JSON array in `<base_dir>/saved_components.json`.
pub struct FileComponentRepository {
    base_dir: PathBuf,
}

impl FileComponentRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn slot_path(&self) -> PathBuf {
        self.base_dir.join(STORAGE_SLOT)
    }
}

#[async_trait]
impl ComponentRepository for FileComponentRepository {
    async fn load(&self) -> Vec<SavedComponent> {
        let path = self.slot_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read saved components");
                }
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<SavedComponent>>(&content) {
            Ok(components) => {
                tracing::debug!(count = components.len(), "loaded saved components");
                components
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable saved components");
                Vec::new()
            }
        }
    }

    async fn save(&self, all: &[SavedComponent]) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .with_context(|| format!("failed to create data dir: {}", self.base_dir.display()))?;

        let path = self.slot_path();
        let content = serde_json::to_string(all).context("failed to serialize saved components")?;

        // Atomic write via temp file + rename
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("failed to write temp file: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("failed to replace saved components: {}", path.display()))?;

        tracing::debug!(count = all.len(), path = %path.display(), "saved components written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Framework;
    use chrono::Local;
    use tempfile::tempdir;

    fn component(id: i64, prompt: &str) -> SavedComponent {
        SavedComponent::new(id, prompt, "<div>x</div>", Framework::HtmlCss, Local::now())
    }

    #[tokio::test]
    async fn test_load_missing_slot_is_empty() {
        let dir = tempdir().unwrap();
        let repo = FileComponentRepository::new(dir.path());
        assert!(repo.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_slot_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_SLOT), "{not json").unwrap();
        let repo = FileComponentRepository::new(dir.path());
        assert!(repo.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_wrong_shape_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(STORAGE_SLOT), r#"{"id": 1}"#).unwrap();
        let repo = FileComponentRepository::new(dir.path());
        assert!(repo.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let repo = FileComponentRepository::new(dir.path());
        let all = vec![component(3, "third"), component(2, "second"), component(1, "first")];
        repo.save(&all).await.unwrap();

        // New repo on same dir
        let repo2 = FileComponentRepository::new(dir.path());
        let loaded = repo2.load().await;
        assert_eq!(loaded, all);
    }

    #[tokio::test]
    async fn test_save_replaces_prior_content() {
        let dir = tempdir().unwrap();
        let repo = FileComponentRepository::new(dir.path());
        repo.save(&[component(1, "a"), component(2, "b")]).await.unwrap();
        repo.save(&[component(9, "only")]).await.unwrap();

        let loaded = repo.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, 9);
        assert!(!dir.path().join("saved_components.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_creates_missing_data_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested").join("ideafy");
        let repo = FileComponentRepository::new(&nested);
        repo.save(&[component(1, "a")]).await.unwrap();
        assert!(nested.join(STORAGE_SLOT).exists());
    }

    #[tokio::test]
    async fn test_slot_is_a_plain_json_array() {
        let dir = tempdir().unwrap();
        let repo = FileComponentRepository::new(dir.path());
        repo.save(&[component(7, "card")]).await.unwrap();

        let raw = std::fs::read_to_string(repo.slot_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], 7);
        assert_eq!(value[0]["name"], "card");
    }
}
