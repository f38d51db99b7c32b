//! Image attachments for threads
//!
//! - Format is decided by magic bytes, never by name or Content-Type
//! - Every upload is fully decoded once, before it is written
//! - Files are stored under a random name

use anyhow::{anyhow, Result};
use image::{GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllowedFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    WebP,
}

impl AllowedFormat {
    /// Detect format from magic bytes (first 12 bytes)
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 12 {
            return None;
        }

        // JPEG: FF D8 FF
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(AllowedFormat::Jpeg);
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(AllowedFormat::Png);
        }

        // GIF: 47 49 46 38 (GIF87a or GIF89a)
        if bytes.starts_with(&[0x47, 0x49, 0x46, 0x38]) {
            return Some(AllowedFormat::Gif);
        }

        // BMP: 42 4D ("BM")
        if bytes.starts_with(b"BM") {
            return Some(AllowedFormat::Bmp);
        }

        // TIFF: little endian "II*\0" or big endian "MM\0*"
        if bytes.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || bytes.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
            return Some(AllowedFormat::Tiff);
        }

        // WebP: 52 49 46 46 ... 57 45 42 50 (RIFF....WEBP)
        if bytes.starts_with(&[0x52, 0x49, 0x46, 0x46]) && bytes[8..12] == [0x57, 0x45, 0x42, 0x50]
        {
            return Some(AllowedFormat::WebP);
        }

        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AllowedFormat::Jpeg => "jpg",
            AllowedFormat::Png => "png",
            AllowedFormat::Gif => "gif",
            AllowedFormat::Bmp => "bmp",
            AllowedFormat::Tiff => "tiff",
            AllowedFormat::WebP => "webp",
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            AllowedFormat::Jpeg => ImageFormat::Jpeg,
            AllowedFormat::Png => ImageFormat::Png,
            AllowedFormat::Gif => ImageFormat::Gif,
            AllowedFormat::Bmp => ImageFormat::Bmp,
            AllowedFormat::Tiff => ImageFormat::Tiff,
            AllowedFormat::WebP => ImageFormat::WebP,
        }
    }
}

/// An image written to the image directory
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// `<uuid>.<ext>`, also the image id
    pub file_name: String,
    /// Sanitized name supplied by the uploader
    pub original_name: String,
    pub file_size: i64,
}

/// Where and how large uploads may be
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub image_dir: PathBuf,
    pub max_file_size: usize,
    /// Maximum width or height
    pub max_dimension: u32,
}

impl From<&crate::config::UploadConfig> for UploadConfig {
    fn from(config: &crate::config::UploadConfig) -> Self {
        Self {
            image_dir: PathBuf::from(&config.image_dir),
            max_file_size: config.max_file_size,
            max_dimension: config.max_dimension,
        }
    }
}

/// Check an upload without touching the disk, returning its format
pub async fn validate_image(data: &[u8], config: &UploadConfig) -> Result<AllowedFormat> {
    if data.len() > config.max_file_size {
        return Err(anyhow!(
            "File too large: {} bytes (max: {} bytes)",
            data.len(),
            config.max_file_size
        ));
    }

    let format = AllowedFormat::from_magic_bytes(data).ok_or_else(|| {
        anyhow!("Invalid or unsupported image format. Allowed: JPEG, PNG, GIF, BMP, TIFF, WebP")
    })?;

    // Decoding is CPU bound
    let data_owned = data.to_vec();
    let max_dimension = config.max_dimension;
    tokio::task::spawn_blocking(move || -> Result<()> {
        let img = image::load_from_memory_with_format(&data_owned, format.to_image_format())
            .map_err(|e| anyhow!("Failed to decode image: {}", e))?;

        let (width, height) = img.dimensions();
        if width > max_dimension || height > max_dimension {
            return Err(anyhow!(
                "Image too large: {}x{} (max: {}x{})",
                width,
                height,
                max_dimension,
                max_dimension
            ));
        }
        Ok(())
    })
    .await
    .map_err(|e| anyhow!("Image processing task failed: {}", e))??;

    Ok(format)
}

/// Write an upload already checked by [`validate_image`] under a random name
pub async fn store_image(
    data: &[u8],
    format: AllowedFormat,
    original_name: &str,
    config: &UploadConfig,
) -> Result<StoredImage> {
    let file_name = format!("{}.{}", Uuid::new_v4(), format.extension());
    fs::create_dir_all(&config.image_dir).await?;
    fs::write(config.image_dir.join(&file_name), data).await?;

    Ok(StoredImage {
        file_name,
        original_name: sanitize_filename(original_name),
        file_size: data.len() as i64,
    })
}

/// Remove a stored image, ignoring files that are already gone
pub async fn delete_image(image_dir: &Path, file_name: &str) -> Result<()> {
    let path = image_dir.join(sanitize_filename(file_name));
    if path.exists() {
        fs::remove_file(path).await?;
    }
    Ok(())
}

/// Remove every file of a batch that will not be referenced after all
pub async fn discard_images(image_dir: &Path, images: &[StoredImage]) {
    for image in images {
        if let Err(e) = delete_image(image_dir, &image.file_name).await {
            tracing::warn!("Failed to remove image {}: {}", image.file_name, e);
        }
    }
}

/// Sanitize filename to prevent path traversal
fn sanitize_filename(name: &str) -> String {
    // Get just the filename, no path components
    let name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed");

    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '_' || *c == '-')
        .take(100)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgb([200u8, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn config(dir: PathBuf) -> UploadConfig {
        UploadConfig {
            image_dir: dir,
            max_file_size: 1024 * 1024,
            max_dimension: 64,
        }
    }

    #[test]
    fn test_magic_bytes_jpeg() {
        let jpeg_magic = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01];
        assert_eq!(AllowedFormat::from_magic_bytes(&jpeg_magic), Some(AllowedFormat::Jpeg));
    }

    #[test]
    fn test_magic_bytes_bmp_and_tiff() {
        let bmp = [0x42, 0x4D, 0x36, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x36, 0x00];
        let tiff_le = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let tiff_be = [0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(AllowedFormat::from_magic_bytes(&bmp), Some(AllowedFormat::Bmp));
        assert_eq!(AllowedFormat::from_magic_bytes(&tiff_le), Some(AllowedFormat::Tiff));
        assert_eq!(AllowedFormat::from_magic_bytes(&tiff_be), Some(AllowedFormat::Tiff));
    }

    #[test]
    fn test_magic_bytes_invalid() {
        let invalid = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B];
        assert_eq!(AllowedFormat::from_magic_bytes(&invalid), None);
        assert_eq!(AllowedFormat::from_magic_bytes(b"GIF8"), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("normal_file.jpg"), "normal_file.jpg");
        assert_eq!(sanitize_filename("file with spaces.png"), "filewithspaces.png");
    }

    #[tokio::test]
    async fn test_store_image_writes_random_name() {
        let dir = std::env::temp_dir().join(format!("forum-images-{}", Uuid::new_v4()));
        let config = config(dir.clone());

        let data = png(8, 8);
        let format = validate_image(&data, &config).await.unwrap();
        let stored = store_image(&data, format, "../cat picture.png", &config).await.unwrap();

        assert!(stored.file_name.ends_with(".png"));
        assert_eq!(stored.original_name, "catpicture.png");
        assert!(dir.join(&stored.file_name).exists());

        delete_image(&dir, &stored.file_name).await.unwrap();
        assert!(!dir.join(&stored.file_name).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_discard_removes_whole_batch() {
        let dir = std::env::temp_dir().join(format!("forum-images-{}", Uuid::new_v4()));
        let config = config(dir.clone());
        let data = png(4, 4);

        let mut batch = Vec::new();
        for name in ["a.png", "b.png"] {
            batch.push(store_image(&data, AllowedFormat::Png, name, &config).await.unwrap());
        }
        // Already gone files are skipped
        std::fs::remove_file(dir.join(&batch[0].file_name)).unwrap();

        discard_images(&dir, &batch).await;

        assert!(batch.iter().all(|image| !dir.join(&image.file_name).exists()));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_rejects_oversized_and_fake_images() {
        let config = config(std::env::temp_dir());

        assert!(validate_image(&png(65, 10), &config).await.is_err());

        // PNG signature with garbage after it
        let mut fake = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        fake.extend_from_slice(&[0u8; 32]);
        assert!(validate_image(&fake, &config).await.is_err());

        assert_eq!(validate_image(&png(64, 64), &config).await.unwrap(), AllowedFormat::Png);
    }
}
