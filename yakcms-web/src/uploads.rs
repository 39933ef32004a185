// YakCMS - A content management backend built with Rust
// Copyright (C) 2025 YakCMS Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use image::GenericImageView;
use std::fs;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;
use yakcms_core::models::media::MediaVariants;

/// Magic bytes for common image formats
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const GIF_MAGIC: &[u8] = b"GIF";
const WEBP_MAGIC: &[u8] = b"RIFF";
const SVG_MAGIC: &[u8] = b"<svg";
const SVG_MAGIC_ALT: &[u8] = b"<?xml";

/// Derived sizes generated on request: (variant name, max edge in pixels)
pub const VARIANT_SIZES: &[(&str, u32)] = &[
    ("thumbnail", 150),
    ("small", 300),
    ("medium", 800),
    ("large", 1200),
];

/// Accepted image formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Detect format from file content, never from the declared MIME type.
    pub fn detect(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(anyhow::anyhow!("File too small to determine format"));
        }

        if data.starts_with(JPEG_MAGIC) {
            Ok(ImageFormat::Jpeg)
        } else if data.starts_with(PNG_MAGIC) {
            Ok(ImageFormat::Png)
        } else if data.starts_with(GIF_MAGIC) {
            Ok(ImageFormat::Gif)
        } else if data.starts_with(WEBP_MAGIC) && data.len() > 12 && &data[8..12] == b"WEBP" {
            Ok(ImageFormat::Webp)
        } else if data.starts_with(SVG_MAGIC) || data.starts_with(SVG_MAGIC_ALT) {
            Ok(ImageFormat::Svg)
        } else {
            Err(anyhow::anyhow!("Unsupported image format"))
        }
    }
}

/// Metadata probed from an uploaded file
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub size: usize,
}

pub fn extract_image_metadata(data: &[u8]) -> Result<ImageMetadata> {
    let format = ImageFormat::detect(data)?;
    let size = data.len();

    let (width, height) = match format {
        ImageFormat::Svg => (None, None), // SVG dimensions are not fixed
        _ => match image::load_from_memory(data) {
            Ok(img) => {
                let dimensions = img.dimensions();
                (Some(dimensions.0), Some(dimensions.1))
            }
            Err(_) => (None, None),
        },
    };

    Ok(ImageMetadata {
        format,
        width,
        height,
        size,
    })
}

/// Generate a unique stored filename for a detected format.
pub fn generate_unique_filename(format: ImageFormat) -> String {
    format!("{}.{}", Uuid::new_v4(), format.extension())
}

/// Save uploaded bytes under the media directory, returning the stored
/// path relative to it.
pub fn save_upload(data: &[u8], media_dir: &Path, filename: &str) -> Result<String> {
    fs::create_dir_all(media_dir)
        .with_context(|| format!("Failed to create media directory: {:?}", media_dir))?;
    let file_path = media_dir.join(filename);

    let mut file = fs::File::create(&file_path)
        .with_context(|| format!("Failed to create file: {:?}", file_path))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write file: {:?}", file_path))?;

    Ok(filename.to_string())
}

/// Generate resized copies of a raster image. Each variant fits within a
/// square of the configured edge; images already smaller than a given
/// edge skip that variant. SVG never gets variants.
pub fn generate_variants(
    data: &[u8],
    media_dir: &Path,
    filename: &str,
    format: ImageFormat,
) -> Result<MediaVariants> {
    if format == ImageFormat::Svg {
        return Ok(MediaVariants::default());
    }

    let img = image::load_from_memory(data).context("Failed to decode image for resizing")?;
    let (width, height) = img.dimensions();
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let extension = format.extension();

    let mut variants = MediaVariants::default();
    for (name, edge) in VARIANT_SIZES {
        if width <= *edge && height <= *edge {
            continue;
        }
        let resized = img.thumbnail(*edge, *edge);
        let variant_filename = format!("{}-{}.{}", stem, name, extension);
        let variant_path = media_dir.join(&variant_filename);
        resized
            .save(&variant_path)
            .with_context(|| format!("Failed to write variant {:?}", variant_path))?;

        let slot = match *name {
            "thumbnail" => &mut variants.thumbnail,
            "small" => &mut variants.small,
            "medium" => &mut variants.medium,
            _ => &mut variants.large,
        };
        *slot = Some(variant_filename);
    }
    Ok(variants)
}

/// Delete the original and any variants, tolerating missing files.
pub fn remove_files(media_dir: &Path, paths: &[&str]) -> Result<()> {
    for path in paths {
        let full = media_dir.join(path);
        match fs::remove_file(&full) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {:?}", full));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_detect_png() {
        let data = png_bytes(4, 4);
        assert_eq!(ImageFormat::detect(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_svg() {
        let data = b"<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>";
        assert_eq!(ImageFormat::detect(data).unwrap(), ImageFormat::Svg);
    }

    #[test]
    fn test_detect_rejects_unknown() {
        assert!(ImageFormat::detect(b"#!/bin/sh echo hello").is_err());
        assert!(ImageFormat::detect(b"tiny").is_err());
    }

    #[test]
    fn test_extract_metadata_has_dimensions() {
        let data = png_bytes(32, 16);
        let meta = extract_image_metadata(&data).unwrap();
        assert_eq!(meta.format, ImageFormat::Png);
        assert_eq!(meta.width, Some(32));
        assert_eq!(meta.height, Some(16));
        assert_eq!(meta.size, data.len());
    }

    #[test]
    fn test_generate_unique_filename_keeps_extension() {
        let name = generate_unique_filename(ImageFormat::Jpeg);
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, generate_unique_filename(ImageFormat::Jpeg));
    }

    #[test]
    fn test_generate_variants_skips_sizes_larger_than_source() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let data = png_bytes(400, 200);
        let stored = save_upload(&data, dir.path(), "photo.png")?;

        let variants = generate_variants(&data, dir.path(), &stored, ImageFormat::Png)?;
        // 400x200 only exceeds the 150 and 300 edges
        assert!(variants.thumbnail.is_some());
        assert!(variants.small.is_some());
        assert!(variants.medium.is_none());
        assert!(variants.large.is_none());

        let thumb = dir.path().join(variants.thumbnail.unwrap());
        let resized = image::open(&thumb)?;
        assert!(resized.dimensions().0 <= 150 && resized.dimensions().1 <= 150);
        Ok(())
    }

    #[test]
    fn test_remove_files_tolerates_missing() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let data = png_bytes(4, 4);
        let stored = save_upload(&data, dir.path(), "a.png")?;

        remove_files(dir.path(), &[&stored, "never-existed.png"])?;
        assert!(!dir.path().join("a.png").exists());
        Ok(())
    }
}
