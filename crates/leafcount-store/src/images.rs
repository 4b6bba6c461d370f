// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed page image store on the local filesystem.
//
// Each image is written to `<dir>/<sha256-hex>`; the digest is the
// `ImageRef`. Resolved URLs use the `file://` scheme, and a fetch re-hashes
// the bytes against the file name before handing them out.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::ImageRef;

use crate::integrity::{check_content, content_ref, is_content_ref};
use crate::traits::ImageStore;

const FILE_SCHEME: &str = "file://";

/// Image store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileImageStore {
    dir: PathBuf,
}

impl FileImageStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a reference, or `None` if it is not a content reference.
    fn path_for(&self, image_ref: &ImageRef) -> Option<PathBuf> {
        is_content_ref(image_ref).then(|| self.dir.join(image_ref.as_str()))
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn put(&self, data: &[u8]) -> Result<ImageRef> {
        let format = image::guess_format(data)
            .map_err(|e| LeafcountError::InvalidImage(e.to_string()))?;

        let image_ref = content_ref(data);
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(image_ref.as_str());
        if tokio::fs::try_exists(&path).await? {
            debug!(image_ref = %image_ref, "image already stored");
        } else {
            tokio::fs::write(&path, data).await?;
            info!(image_ref = %image_ref, format = ?format, "image stored");
        }

        Ok(image_ref)
    }

    async fn resolve(&self, image_ref: &ImageRef) -> Result<Option<String>> {
        let Some(path) = self.path_for(image_ref) else {
            warn!(image_ref = %image_ref, "malformed image reference");
            return Ok(None);
        };

        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }

        let absolute = tokio::fs::canonicalize(&path).await?;
        Ok(Some(format!("{FILE_SCHEME}{}", absolute.display())))
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = url
            .strip_prefix(FILE_SCHEME)
            .map(PathBuf::from)
            .ok_or_else(|| LeafcountError::ImageFetch(format!("unsupported URL: {url}")))?;

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| LeafcountError::ImageFetch(e.to_string()))?;

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            check_content(&data, &ImageRef(name.to_owned()))
                .map_err(|e| LeafcountError::ImageFetch(e.to_string()))?;
        }

        debug!(bytes = data.len(), "image fetched");
        Ok(data)
    }

    #[instrument(skip(self), fields(image_ref = %image_ref))]
    async fn delete(&self, image_ref: &ImageRef) -> Result<()> {
        let Some(path) = self.path_for(image_ref) else {
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
