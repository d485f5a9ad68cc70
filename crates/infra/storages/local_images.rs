use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    repositories::image_storage::ImageStorage,
    value_objects::uploads::{
        DEFAULT_POST_IMAGE, allowed_image_extension, content_matches_extension,
        is_safe_stored_filename,
    },
};

/// Stores post images as `<uuid>.<ext>` files in one flat directory.
pub struct LocalImageStorage {
    upload_dir: PathBuf,
}

impl LocalImageStorage {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    async fn write_validated(&self, extension: &str, bytes: &[u8], temp_path: &Path) -> Option<PathBuf> {
        if let Err(err) = fs::create_dir_all(&self.upload_dir).await {
            error!(
                upload_dir = %self.upload_dir.display(),
                io_error = ?err,
                "local_images: failed to create upload directory"
            );
            return None;
        }

        if let Err(err) = fs::write(temp_path, bytes).await {
            error!(
                path = %temp_path.display(),
                io_error = ?err,
                "local_images: failed to write temporary upload"
            );
            return None;
        }

        let written = match fs::read(temp_path).await {
            Ok(written) => written,
            Err(err) => {
                error!(
                    path = %temp_path.display(),
                    io_error = ?err,
                    "local_images: failed to read back temporary upload"
                );
                return None;
            }
        };

        if written.is_empty() || !content_matches_extension(extension, &written) {
            warn!(
                extension,
                size = written.len(),
                "local_images: upload content does not match its extension"
            );
            return None;
        }

        let final_path = self
            .upload_dir
            .join(format!("{}.{extension}", Uuid::new_v4().simple()));

        if let Err(err) = fs::rename(temp_path, &final_path).await {
            error!(
                path = %final_path.display(),
                io_error = ?err,
                "local_images: failed to move upload into place"
            );
            return None;
        }

        Some(final_path)
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, original_filename: String, bytes: Vec<u8>) -> Option<String> {
        let Some(extension) = allowed_image_extension(&original_filename) else {
            warn!(
                original_filename,
                "local_images: rejected upload with unsupported extension"
            );
            return None;
        };

        let temp_path = self
            .upload_dir
            .join(format!(".{}.upload", Uuid::new_v4().simple()));

        match self.write_validated(&extension, &bytes, &temp_path).await {
            Some(final_path) => {
                let stored = final_path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())?;
                info!(stored, size = bytes.len(), "local_images: image stored");
                Some(stored)
            }
            None => {
                if fs::try_exists(&temp_path).await.unwrap_or(false) {
                    if let Err(err) = fs::remove_file(&temp_path).await {
                        warn!(
                            path = %temp_path.display(),
                            io_error = ?err,
                            "local_images: failed to clean up temporary upload"
                        );
                    }
                }
                None
            }
        }
    }

    async fn delete(&self, stored_filename: String) -> bool {
        if stored_filename.is_empty() || stored_filename == DEFAULT_POST_IMAGE {
            return false;
        }

        if !is_safe_stored_filename(&stored_filename) {
            warn!(stored_filename, "local_images: refused to delete unsafe filename");
            return false;
        }

        let (Ok(upload_dir), Ok(target)) = (
            fs::canonicalize(&self.upload_dir).await,
            fs::canonicalize(self.upload_dir.join(&stored_filename)).await,
        ) else {
            debug!(stored_filename, "local_images: nothing to delete");
            return false;
        };

        if !target.starts_with(&upload_dir) {
            warn!(
                stored_filename,
                "local_images: resolved path escapes the upload directory"
            );
            return false;
        }

        match fs::remove_file(&target).await {
            Ok(()) => {
                info!(stored_filename, "local_images: image deleted");
                true
            }
            Err(err) => {
                error!(
                    stored_filename,
                    io_error = ?err,
                    "local_images: failed to delete image"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn saves_valid_image_under_random_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        let stored = storage
            .save("Minha Foto.PNG".to_string(), PNG_BYTES.to_vec())
            .await
            .unwrap();

        assert!(stored.ends_with(".png"));
        assert_eq!(stored.len(), 32 + ".png".len());
        assert_eq!(entries(dir.path()), vec![stored.clone()]);
        assert_eq!(std::fs::read(dir.path().join(&stored)).unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn rejects_disallowed_extension_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        assert!(storage.save("shell.php".to_string(), PNG_BYTES.to_vec()).await.is_none());
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn rejects_mismatched_content_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());

        assert!(
            storage
                .save("photo.jpg".to_string(), b"<?php system($_GET['c']); ?>".to_vec())
                .await
                .is_none()
        );
        assert!(storage.save("empty.png".to_string(), Vec::new()).await.is_none());
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn deletes_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalImageStorage::new(dir.path());
        let stored = storage
            .save("a.png".to_string(), PNG_BYTES.to_vec())
            .await
            .unwrap();

        assert!(storage.delete(stored.clone()).await);
        assert!(!dir.path().join(stored).exists());
    }

    #[tokio::test]
    async fn refuses_sentinel_traversal_and_missing_files() {
        let root = tempfile::tempdir().unwrap();
        let upload_dir = root.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();
        std::fs::write(root.path().join("secret.png"), PNG_BYTES).unwrap();
        std::fs::write(upload_dir.join("default.jpg"), PNG_BYTES).unwrap();
        let storage = LocalImageStorage::new(&upload_dir);

        assert!(!storage.delete("default.jpg".to_string()).await);
        assert!(!storage.delete("../secret.png".to_string()).await);
        assert!(!storage.delete("missing.png".to_string()).await);
        assert!(!storage.delete(String::new()).await);

        assert!(root.path().join("secret.png").exists());
        assert!(upload_dir.join("default.jpg").exists());
    }
}
