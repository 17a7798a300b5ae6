//! Transfer Thumbnails
//!
//! Image files get a small preview in the chat log: the outgoing file when a
//! send is announced, the saved file once a receive finishes. The preview is
//! scaled to a fixed height, re-encoded as PNG and kept base64-encoded so
//! rendering never touches the image pipeline again.
//!
//! Non-image files, unreadable files and files above the configured size bound
//! simply have no preview.

use crate::config::PreviewConfig;
use crate::{Result, TransferError};
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, trace};

/// PNG thumbnail ready to embed in markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    width: u32,
    height: u32,
    png_base64: String,
}

impl Thumbnail {
    /// Decode `bytes` and scale the image to `height` pixels
    pub fn from_bytes(bytes: &[u8], height: u32) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        trace!("Decoded preview source: {}x{}", image.width(), image.height());
        Self::from_image(&image, height)
    }

    /// Load a thumbnail from a file no larger than `max_bytes`
    pub fn from_path(path: impl AsRef<Path>, max_bytes: u64, height: u32) -> Result<Self> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(TransferError::PreviewTooLarge {
                size,
                limit: max_bytes,
            });
        }

        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, height)
    }

    /// Best-effort preview for a transfer; every failure yields `None`
    pub fn load(path: impl AsRef<Path>, config: &PreviewConfig) -> Option<Self> {
        let path = path.as_ref();
        match Self::from_path(path, config.max_file_bytes, config.thumbnail_height) {
            Ok(thumbnail) => {
                debug!(
                    "Loaded preview for {} ({}x{})",
                    path.display(),
                    thumbnail.width,
                    thumbnail.height
                );
                Some(thumbnail)
            }
            Err(e) => {
                debug!("No preview for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn from_image(image: &DynamicImage, height: u32) -> Result<Self> {
        let height = height.max(1);
        let scaled = if image.height() == height {
            image.clone()
        } else {
            let width = scaled_width(image.width(), image.height(), height);
            image.resize_exact(width, height, FilterType::Triangle)
        };

        let mut buffer = Cursor::new(Vec::new());
        scaled.write_to(&mut buffer, ImageFormat::Png)?;

        Ok(Self {
            width: scaled.width(),
            height: scaled.height(),
            png_base64: base64::engine::general_purpose::STANDARD.encode(buffer.into_inner()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Base64 of the PNG encoding
    pub fn png_base64(&self) -> &str {
        &self.png_base64
    }
}

fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    if height == 0 {
        return 1;
    }
    let scaled = (width as u64 * target_height as u64) / height as u64;
    scaled.clamp(1, u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 120, 200, 255]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_thumbnail_scaled_to_height() {
        let thumbnail = Thumbnail::from_bytes(&png_fixture(200, 100), 50).unwrap();
        assert_eq!(thumbnail.height(), 50);
        assert_eq!(thumbnail.width(), 100);

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(thumbnail.png_base64())
            .unwrap();
        let image = image::load_from_memory(&decoded).unwrap();
        assert_eq!((image.width(), image.height()), (100, 50));
    }

    #[test]
    fn test_small_images_are_scaled_up() {
        let thumbnail = Thumbnail::from_bytes(&png_fixture(10, 5), 50).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (100, 50));
    }

    #[test]
    fn test_non_image_bytes_fail() {
        assert!(Thumbnail::from_bytes(b"definitely not an image", 50).is_err());
    }

    #[test]
    fn test_load_respects_size_bound() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        let bytes = png_fixture(64, 64);
        fs::write(&path, &bytes).unwrap();

        let config = PreviewConfig {
            max_file_bytes: bytes.len() as u64 - 1,
            thumbnail_height: 50,
        };
        assert!(Thumbnail::load(&path, &config).is_none());
        assert!(matches!(
            Thumbnail::from_path(&path, config.max_file_bytes, 50),
            Err(TransferError::PreviewTooLarge { .. })
        ));

        let config = PreviewConfig::default();
        assert!(Thumbnail::load(&path, &config).is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = PreviewConfig::default();
        assert!(Thumbnail::load(dir.path().join("gone.png"), &config).is_none());
    }

    #[test]
    fn test_scaled_width_keeps_aspect() {
        assert_eq!(scaled_width(300, 150, 50), 100);
        assert_eq!(scaled_width(1, 1000, 50), 1);
        assert_eq!(scaled_width(10, 0, 50), 1);
    }
}
