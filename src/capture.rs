//! Composite capture and gallery export.
//!
//! Rasterizing the composition belongs to the platform; this module fixes
//! the capturable region (background plus overlay, nothing else) and the
//! order of operations when exporting: permission, then capture, then
//! write. A failure at any step leaves nothing in the album.
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{sanitize_file_name, Position, QuoteError, QuoteRecord, Result, Size};

/// The capturable view boundary: one image tile and its overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub tile: Size,
    pub background_image: Option<String>,
    pub text: String,
    pub author: Option<String>,
    pub text_position: Position,
}

impl Composition {
    pub fn from_record(record: &QuoteRecord, tile: Size) -> Self {
        Self {
            tile,
            background_image: record.display_image().map(str::to_string),
            text: record.text.clone(),
            author: record.author.clone(),
            text_position: record.text_position.unwrap_or_default(),
        }
    }
}

/// A flattened composition on local disk, ready to share or export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAsset {
    pub path: PathBuf,
}

/// Flattens a composition into an asset.
#[async_trait]
pub trait CompositeCapture: Send + Sync {
    async fn capture(&self, composition: &Composition) -> Result<CapturedAsset>;
}

/// Media library access level granted by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPermission {
    Granted,
    /// Access restricted to a user-picked subset; not enough to write albums
    Limited,
    Denied,
}

/// A device photo gallery with named albums.
#[async_trait]
pub trait Gallery: Send + Sync {
    async fn request_permission(&self) -> MediaPermission;

    /// Writes the asset into `album` and returns where it landed.
    async fn save_asset(&self, asset: &CapturedAsset, album: &str) -> Result<PathBuf>;
}

/// Captures the composition and writes it to `album`.
pub async fn save_to_device(
    capture: &dyn CompositeCapture,
    gallery: &dyn Gallery,
    composition: &Composition,
    album: &str,
) -> Result<PathBuf> {
    match gallery.request_permission().await {
        MediaPermission::Granted => {}
        MediaPermission::Limited => {
            warn!("Media library access is limited; export aborted");
            return Err(QuoteError::PermissionDenied {
                message: "App does not have full access to the media library.".to_string(),
            });
        }
        MediaPermission::Denied => {
            warn!("Media library write permission denied; export aborted");
            return Err(QuoteError::PermissionDenied {
                message: "Media library write permission not granted".to_string(),
            });
        }
    }

    let asset = capture.capture(composition).await.map_err(|e| match e {
        QuoteError::CaptureFailed { .. } => e,
        other => QuoteError::CaptureFailed {
            message: other.to_string(),
        },
    })?;

    let saved = gallery.save_asset(&asset, album).await;

    if let Err(e) = fs::remove_file(&asset.path) {
        debug!("Could not remove staged capture {}: {}", asset.path.display(), e);
    }

    let saved = saved?;
    info!("Exported quote image to {}", saved.display());
    Ok(saved)
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.persist(target).map_err(|e| {
        error!("Failed to persist file {}: {}", target.display(), e.error);
        QuoteError::Io(e.error)
    })?;
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            QuoteError::DirectoryError {
                path: dir.to_path_buf(),
            }
        })?;
    }
    Ok(())
}

/// Writes the composition as a JSON descriptor, for setups where a
/// separate renderer rasterizes it later.
pub struct DescriptorCapture {
    staging_dir: PathBuf,
}

impl DescriptorCapture {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }
}

#[async_trait]
impl CompositeCapture for DescriptorCapture {
    async fn capture(&self, composition: &Composition) -> Result<CapturedAsset> {
        if composition.text.trim().is_empty() {
            return Err(QuoteError::CaptureFailed {
                message: "nothing to capture: overlay text is empty".to_string(),
            });
        }

        ensure_dir(&self.staging_dir)?;
        let path = self
            .staging_dir
            .join(format!("{}.quote.json", Uuid::new_v4().simple()));
        let json = serde_json::to_vec_pretty(composition)?;
        write_atomic(&self.staging_dir, &path, &json)?;

        debug!("Captured composition to {}", path.display());
        Ok(CapturedAsset { path })
    }
}

/// A gallery rooted at a directory, one sub-directory per album.
pub struct DirectoryGallery {
    root: PathBuf,
    permission: MediaPermission,
}

impl DirectoryGallery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_permission(root, MediaPermission::Granted)
    }

    pub fn with_permission(root: impl Into<PathBuf>, permission: MediaPermission) -> Self {
        Self {
            root: root.into(),
            permission,
        }
    }

    /// Directory for `album`, always a direct child of the gallery root.
    pub fn album_dir(&self, album: &str) -> PathBuf {
        self.root.join(sanitize_file_name(album))
    }
}

#[async_trait]
impl Gallery for DirectoryGallery {
    async fn request_permission(&self) -> MediaPermission {
        self.permission
    }

    async fn save_asset(&self, asset: &CapturedAsset, album: &str) -> Result<PathBuf> {
        let album_dir = self.album_dir(album);
        ensure_dir(&album_dir)?;

        let file_name = asset
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| QuoteError::CaptureFailed {
                message: format!("captured asset has no file name: {}", asset.path.display()),
            })?;
        let target = album_dir.join(format!("{}-{}", Utc::now().timestamp_millis(), file_name));

        let bytes = fs::read(&asset.path)?;
        write_atomic(&album_dir, &target, &bytes)?;
        Ok(target)
    }
}
