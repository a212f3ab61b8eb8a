//! Media collaborator seams.
//!
//! Object storage and transcoding are external systems; the content layer
//! only needs "store these bytes and give me a URL" and "normalize this
//! video". Both live behind traits so tests run against in-memory doubles.

use std::sync::Arc;

use async_trait::async_trait;

use chirp_store::{Media, MediaKind};

use crate::error::{Result, SocialError};

/// Stores a binary blob and returns its public URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads `bytes` under the given content type.
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Normalizes uploaded video into the serving format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcodes raw upload bytes, returning the bytes to store.
    async fn transcode(&self, bytes: Vec<u8>) -> Result<Vec<u8>>;
}

/// Thin glue over the two collaborators.
pub struct MediaService {
    storage: Arc<dyn ObjectStorage>,
    transcoder: Arc<dyn Transcoder>,
}

impl MediaService {
    /// Wires the service from its collaborators.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { storage, transcoder }
    }

    /// Uploads an image and returns its media descriptor.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload_image(&self, bytes: Vec<u8>) -> Result<Media> {
        let url = self.storage.upload(bytes, "image/jpeg").await?;
        Ok(Media { url, kind: MediaKind::Image })
    }

    /// Transcodes and uploads a video, returning its media descriptor.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn upload_video(&self, bytes: Vec<u8>) -> Result<Media> {
        let normalized = self.transcoder.transcode(bytes).await?;
        let url = self.storage.upload(normalized, "video/mp4").await?;
        Ok(Media { url, kind: MediaKind::Video })
    }
}

/// In-memory [`ObjectStorage`] double returning deterministic URLs.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStorage {
    uploads: Arc<parking_lot::Mutex<Vec<(String, usize)>>>,
}

impl MemoryObjectStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(content_type, byte_len)` of every upload so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(SocialError::Validation {
                errors: [("file".to_owned(), "File must not be empty".to_owned())].into(),
            });
        }
        let mut uploads = self.uploads.lock();
        uploads.push((content_type.to_owned(), bytes.len()));
        Ok(format!("https://media.chirp.example/{}", uploads.len()))
    }
}

/// [`Transcoder`] double that passes bytes through unchanged.
#[derive(Debug, Default, Clone)]
pub struct PassthroughTranscoder;

#[async_trait]
impl Transcoder for PassthroughTranscoder {
    async fn transcode(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        Ok(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_image_and_video() {
        let storage = MemoryObjectStorage::new();
        let service =
            MediaService::new(Arc::new(storage.clone()), Arc::new(PassthroughTranscoder));

        let image = service.upload_image(vec![1, 2, 3]).await.unwrap();
        assert_eq!(image.kind, MediaKind::Image);
        assert!(image.url.starts_with("https://media.chirp.example/"));

        let video = service.upload_video(vec![4, 5, 6, 7]).await.unwrap();
        assert_eq!(video.kind, MediaKind::Video);

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[1], ("video/mp4".to_owned(), 4));
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let service = MediaService::new(
            Arc::new(MemoryObjectStorage::new()),
            Arc::new(PassthroughTranscoder),
        );

        assert!(service.upload_image(Vec::new()).await.is_err());
    }
}
