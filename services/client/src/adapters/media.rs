//! services/client/src/adapters/media.rs
//!
//! This module contains the filesystem image source. It implements the
//! `ImageSource` port for a desktop/CLI client: the "media library" is a root
//! directory, and only images inside it may be read.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use stylesense_core::domain::ImageRef;
use stylesense_core::ports::{ImageSource, PortError, PortResult};

/// An `ImageSource` that reads image files below a media root directory.
#[derive(Clone, Debug)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves an image reference to a canonical path inside the media root.
    async fn resolve(&self, image: &ImageRef) -> PortResult<PathBuf> {
        let root = canonical(&self.root).await?;
        let candidate = Path::new(&image.uri);
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            root.join(candidate)
        };
        let resolved = canonical(&candidate).await?;
        if !resolved.starts_with(&root) {
            return Err(PortError::PermissionDenied(format!(
                "{} is outside the media library",
                image.uri
            )));
        }
        Ok(resolved)
    }
}

async fn canonical(path: &Path) -> PortResult<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|e| map_io(e, path))
}

fn map_io(e: std::io::Error, path: &Path) -> PortError {
    match e.kind() {
        ErrorKind::NotFound => PortError::NotFound(path.display().to_string()),
        ErrorKind::PermissionDenied => PortError::PermissionDenied(path.display().to_string()),
        _ => PortError::Unexpected(format!("{}: {}", path.display(), e)),
    }
}

#[async_trait]
impl ImageSource for FsImageSource {
    async fn ensure_permission(&self) -> PortResult<()> {
        let deny = |reason: String| PortError::PermissionDenied(reason);
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| deny(format!("{}: {}", self.root.display(), e)))?;
        if !metadata.is_dir() {
            return Err(deny(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| deny(format!("{}: {}", self.root.display(), e)))?;
        entries
            .next_entry()
            .await
            .map_err(|e| deny(format!("{}: {}", self.root.display(), e)))?;
        Ok(())
    }

    async fn read_image(&self, image: &ImageRef) -> PortResult<Bytes> {
        let path = self.resolve(image).await?;
        let raw = tokio::fs::read(&path).await.map_err(|e| map_io(e, &path))?;
        if raw.is_empty() {
            return Err(PortError::Unexpected(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Bytes::from(raw))
    }
}
