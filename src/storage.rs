use crate::config::CaptureConfig;
use crate::error::{Result, StorageError};
use crate::frame::Picture;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Metadata written next to a saved picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPictureMetadata {
    pub picture_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub saved_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub jpeg_quality: u8,
    pub file_name: String,
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPicture {
    pub path: PathBuf,
    pub metadata: SavedPictureMetadata,
}

/// Persistence boundary for accepted pictures
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn save(&self, picture: &Picture) -> Result<SavedPicture>;
}

/// Writes accepted pictures as JPEG files into a directory
pub struct FileImageRepository {
    directory: PathBuf,
    jpeg_quality: u8,
    save_metadata: bool,
}

impl FileImageRepository {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.path),
            jpeg_quality: config.jpeg_quality,
            save_metadata: config.save_metadata,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_stem(picture: &Picture) -> String {
        format!(
            "{}_{}",
            picture.captured_at().format("%Y%m%d_%H%M%S_%3f"),
            picture.id().simple()
        )
    }
}

#[async_trait]
impl ImageRepository for FileImageRepository {
    async fn save(&self, picture: &Picture) -> Result<SavedPicture> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| StorageError::DirectoryCreation {
                path: self.directory.display().to_string(),
                source: e,
            })?;

        let stem = Self::file_stem(picture);
        let file_name = format!("{}.jpg", stem);
        let path = self.directory.join(&file_name);

        let quality = self.jpeg_quality;
        let encode_source = picture.clone();
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&encode_source, quality))
            .await
            .map_err(|e| StorageError::Encode {
                details: format!("encoder task failed: {}", e),
            })??;

        fs::write(&path, &jpeg)
            .await
            .map_err(|e| StorageError::Write {
                path: path.display().to_string(),
                source: e,
            })?;

        let metadata = SavedPictureMetadata {
            picture_id: picture.id(),
            captured_at: picture.captured_at(),
            saved_at: Utc::now(),
            width: picture.width(),
            height: picture.height(),
            jpeg_quality: quality,
            file_name,
        };

        if self.save_metadata {
            save_metadata(&metadata, &self.directory.join(format!("{}.json", stem))).await?;
        }

        info!("Saved picture {} to {}", picture.id(), path.display());
        Ok(SavedPicture { path, metadata })
    }
}

fn encode_jpeg(picture: &Picture, quality: u8) -> std::result::Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(picture.image())
        .map_err(|e| StorageError::Encode {
            details: e.to_string(),
        })?;
    Ok(buf)
}

async fn save_metadata(metadata: &SavedPictureMetadata, path: &Path) -> Result<()> {
    let metadata_json = serde_json::to_string_pretty(metadata)?;

    fs::write(path, metadata_json)
        .await
        .map_err(|e| StorageError::Write {
            path: path.display().to_string(),
            source: e,
        })?;

    debug!("Saved metadata to {}", path.display());
    Ok(())
}

/// Hands an accepted picture to the repository
#[derive(Clone)]
pub struct SaveImageUseCase {
    repository: Arc<dyn ImageRepository>,
}

impl SaveImageUseCase {
    pub fn new(repository: Arc<dyn ImageRepository>) -> Self {
        Self { repository }
    }

    pub fn to_directory(config: &CaptureConfig) -> Self {
        Self::new(Arc::new(FileImageRepository::new(config)))
    }

    pub async fn execute(&self, picture: &Picture) -> Result<SavedPicture> {
        self.repository.save(picture).await
    }
}
