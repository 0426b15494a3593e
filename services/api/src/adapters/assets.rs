//! services/api/src/adapters/assets.rs
//!
//! A local-disk implementation of the `AssetStore` port. Uploaded images are
//! written below the configured asset directory and served back by the router
//! under the public URL prefix.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use storefront_core::ports::{AssetStore, ImageTransform, PortError, PortResult, StoredAsset};
use tracing::{debug, warn};
use uuid::Uuid;

/// An asset store that keeps every upload as a file on the local filesystem.
pub struct LocalAssetAdapter {
    root: PathBuf,
    public_url: String,
}

impl LocalAssetAdapter {
    /// Creates a new adapter rooted at `root`, whose files are reachable under `public_url`.
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolves an external id to a path below the root, refusing anything that escapes it.
    fn path_for(&self, external_id: &str) -> PortResult<PathBuf> {
        let relative = Path::new(external_id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || external_id.is_empty() {
            return Err(PortError::Unexpected(format!(
                "Invalid asset id '{}'",
                external_id
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// Picks a file extension for an image content type.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "img",
    }
}

#[async_trait]
impl AssetStore for LocalAssetAdapter {
    async fn upload(
        &self,
        data: Bytes,
        content_type: &str,
        folder: &str,
        transform: ImageTransform,
    ) -> PortResult<StoredAsset> {
        let external_id = format!(
            "{}/{}.{}",
            folder.trim_matches('/'),
            Uuid::new_v4(),
            extension_for(content_type)
        );
        let path = self.path_for(&external_id)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(format!("Failed to create asset folder: {}", e)))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write asset: {}", e)))?;

        debug!(
            external_id = %external_id,
            bytes = data.len(),
            width = transform.width,
            "Asset stored."
        );
        Ok(StoredAsset {
            url: format!("{}/{}", self.public_url, external_id),
            external_id,
        })
    }

    async fn destroy(&self, external_id: &str) -> PortResult<()> {
        let path = self.path_for(external_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(external_id = %external_id, "Asset already gone.");
                Ok(())
            }
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to delete asset: {}",
                e
            ))),
        }
    }

    fn external_id_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> (LocalAssetAdapter, PathBuf) {
        let root = std::env::temp_dir().join(format!("storefront-assets-{}", Uuid::new_v4()));
        (LocalAssetAdapter::new(&root, "/uploads/"), root)
    }

    #[tokio::test]
    async fn upload_then_destroy_round_trip() {
        let (store, root) = adapter();
        let stored = store
            .upload(
                Bytes::from_static(b"png"),
                "image/png",
                "brands",
                ImageTransform { width: 200 },
            )
            .await
            .unwrap();

        assert!(stored.external_id.starts_with("brands/"));
        assert!(stored.external_id.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.external_id));
        assert_eq!(
            store.external_id_for_url(&stored.url).as_deref(),
            Some(stored.external_id.as_str())
        );
        assert!(root.join(&stored.external_id).exists());

        store.destroy(&stored.external_id).await.unwrap();
        assert!(!root.join(&stored.external_id).exists());
        // A second release of the same asset is not an error.
        store.destroy(&stored.external_id).await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn refuses_ids_outside_the_root() {
        let (store, _root) = adapter();
        assert!(store.destroy("../etc/passwd").await.is_err());
        assert!(store.destroy("/etc/passwd").await.is_err());
        assert_eq!(store.external_id_for_url("https://cdn.example.com/x.png"), None);
        assert_eq!(store.external_id_for_url("no-logo.png"), None);
    }
}
