//! Local filesystem storage for post images.
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::forms::ImageUpload;

pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const IMAGE_TOO_LARGE: &str = "The image is too large. Each side may be at most 4096 pixels.";

/// Largest accepted width or height.
pub const MAX_IMAGE_SIDE: u32 = 4096;
const MAX_DECODE_ALLOC: u64 = 128 * 1024 * 1024;

fn reader(data: &[u8]) -> std::result::Result<image::io::Reader<Cursor<&[u8]>>, &'static str> {
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| INVALID_IMAGE)
}

/// Sniff the format, check the declared dimensions, then decode under explicit limits.
fn check_image(bytes: &[u8]) -> std::result::Result<image::ImageFormat, &'static str> {
    if bytes.is_empty() {
        return Err(EMPTY_FILE);
    }

    let format = reader(bytes)?.format().ok_or(INVALID_IMAGE)?;
    let (width, height) = reader(bytes)?
        .into_dimensions()
        .map_err(|_| INVALID_IMAGE)?;
    if width > MAX_IMAGE_SIDE || height > MAX_IMAGE_SIDE {
        return Err(IMAGE_TOO_LARGE);
    }

    let mut limits = image::io::Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_SIDE);
    limits.max_image_height = Some(MAX_IMAGE_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);

    let mut decoder = reader(bytes)?;
    decoder.limits(limits);
    decoder.decode().map_err(|_| INVALID_IMAGE)?;
    Ok(format)
}

/// Check that an upload decodes as an image, off the async runtime.
/// The inner error is the message to show on the `image` field.
pub async fn validate_image(
    upload: &ImageUpload,
) -> Result<std::result::Result<image::ImageFormat, &'static str>> {
    let bytes = upload.bytes.clone();
    tokio::task::spawn_blocking(move || check_image(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Image validation task failed: {}", e)))
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Public URL of a stored relative path such as `posts/ab12.png`.
    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }

    /// Write a validated upload under `posts/` with a fresh name; returns the relative path.
    pub async fn save_post_image(
        &self,
        upload: &ImageUpload,
        format: image::ImageFormat,
    ) -> Result<String> {
        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let relative = format!("posts/{}.{}", uuid::Uuid::new_v4().simple(), extension);
        let path = self.root.join(&relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to create media directory: {}", e))
            })?;
        }
        tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to store image {}: {}", relative, e))
        })?;

        tracing::info!(path = %relative, bytes = upload.bytes.len(), "Stored post image");
        Ok(relative)
    }

    /// Delete a stored file that ended up unreferenced. Failures are only logged.
    pub async fn remove(&self, relative: &str) {
        if let Err(e) = tokio::fs::remove_file(self.root.join(relative)).await {
            tracing::warn!(path = %relative, "Failed to remove orphaned media file: {}", e);
        } else {
            tracing::debug!(path = %relative, "Removed orphaned media file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_of(image: image::DynamicImage) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, image::ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn png_bytes() -> Vec<u8> {
        png_of(image::DynamicImage::new_rgb8(2, 2))
    }

    fn upload(bytes: Vec<u8>) -> ImageUpload {
        ImageUpload {
            file_name: "small.png".into(),
            content_type: Some("image/png".into()),
            bytes: bytes.into(),
        }
    }

    #[tokio::test]
    async fn accepts_real_images_only() {
        assert_eq!(
            validate_image(&upload(png_bytes())).await.unwrap(),
            Ok(image::ImageFormat::Png)
        );
        assert_eq!(
            validate_image(&upload(Vec::new())).await.unwrap(),
            Err(EMPTY_FILE)
        );
        assert_eq!(
            validate_image(&upload(b"plain text, not pixels".to_vec()))
                .await
                .unwrap(),
            Err(INVALID_IMAGE)
        );
    }

    #[tokio::test]
    async fn oversized_dimensions_are_rejected_before_decoding() {
        let wide = png_of(image::DynamicImage::new_luma8(MAX_IMAGE_SIDE + 1, 1));
        assert_eq!(
            validate_image(&upload(wide)).await.unwrap(),
            Err(IMAGE_TOO_LARGE)
        );
    }

    #[tokio::test]
    async fn remove_deletes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(&MediaConfig {
            root: dir.path().to_string_lossy().into_owned(),
            url_prefix: "/media".into(),
            max_upload_bytes: 1024,
        });
        let relative = store
            .save_post_image(&upload(png_bytes()), image::ImageFormat::Png)
            .await
            .unwrap();

        store.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn saves_under_posts_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(&MediaConfig {
            root: dir.path().to_string_lossy().into_owned(),
            url_prefix: "/media/".into(),
            max_upload_bytes: 1024,
        });

        let relative = store
            .save_post_image(&upload(png_bytes()), image::ImageFormat::Png)
            .await
            .unwrap();
        assert!(relative.starts_with("posts/") && relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());
        assert_eq!(store.url(&relative), format!("/media/{}", relative));
    }
}
