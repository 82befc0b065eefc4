// * Payload encoder
// * Raster payloads are normalized to RGB and re-encoded; anything else is written as-is

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::constants::{AVIF_QUALITY_COMPRESSED, AVIF_QUALITY_MAX, AVIF_SPEED, JPEG_QUALITY};
use crate::config::OutputFormat;
use crate::persistence::persister::PersistError;

static EXTENSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.([a-zA-Z0-9]+)$").expect("! CRITICAL: Failed to compile extension regex")
});

/// How a payload ended up on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedPayload {
    /// Decoded as a raster and re-encoded (`.jpg` / `.avif`)
    Transcoded(PathBuf),
    /// Written byte-for-byte with the source extension (videos, unknown formats)
    Raw(PathBuf),
}

impl SavedPayload {
    pub fn path(&self) -> &Path {
        match self {
            SavedPayload::Transcoded(p) | SavedPayload::Raw(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder {
    format: OutputFormat,
    compress: bool,
}

impl PayloadEncoder {
    pub fn new(format: OutputFormat, compress: bool) -> Self {
        Self { format, compress }
    }

    // * AVIF quality: 70 when compressing, otherwise the encoder maximum
    pub fn avif_quality(&self) -> u8 {
        if self.compress {
            AVIF_QUALITY_COMPRESSED
        } else {
            AVIF_QUALITY_MAX
        }
    }

    /// Writes the payload of item `id` into `dir`. Blocking; call from a blocking task.
    pub fn save(&self, bytes: &[u8], dir: &Path, id: u64, url: &str) -> Result<SavedPayload, PersistError> {
        match image::load_from_memory(bytes) {
            Ok(decoded) => {
                let path = dir.join(format!("{}.{}", id, self.format.extension()));
                self.write_raster(to_rgb(decoded), &path)?;
                Ok(SavedPayload::Transcoded(path))
            }
            Err(e) => {
                // * Not a raster we can read (video, unknown container): keep the bytes
                tracing::debug!(id = id, error = %e, "Payload is not a decodable image, writing raw bytes");
                let extension =
                    source_extension(url).ok_or_else(|| PersistError::MissingExtension(url.to_string()))?;
                let path = dir.join(format!("{}.{}", id, extension));
                std::fs::write(&path, bytes)?;
                Ok(SavedPayload::Raw(path))
            }
        }
    }

    fn write_raster(&self, rgb: RgbImage, path: &Path) -> Result<(), PersistError> {
        let mut writer = BufWriter::new(File::create(path)?);

        match self.format {
            OutputFormat::Jpeg => {
                rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY))?;
            }
            OutputFormat::Avif => {
                let encoder = AvifEncoder::new_with_speed_quality(&mut writer, AVIF_SPEED, self.avif_quality());
                rgb.write_with_encoder(encoder)?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

// * Paletted, grey and alpha models all collapse to 8-bit RGB
fn to_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.into_rgb8(),
    }
}

/// Extension of the source URL (`https://h/x/abc123.mp4` -> `mp4`).
pub fn source_extension(url: &str) -> Option<&str> {
    EXTENSION_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 3, Rgba([200, 10, 10, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_source_extension() {
        assert_eq!(source_extension("https://host/x/abc123.mp4"), Some("mp4"));
        assert_eq!(source_extension("https://host/width=450/1234.jpeg"), Some("jpeg"));
        assert_eq!(source_extension("https://host/x/abc123"), None);
        assert_eq!(source_extension("https://host/x/abc.mp4?token=1"), None);
    }

    #[test]
    fn test_rgba_png_becomes_jpeg() {
        let tmp = tempfile::tempdir().unwrap();
        let encoder = PayloadEncoder::new(OutputFormat::Jpeg, false);

        let saved = encoder.save(&png_bytes(), tmp.path(), 11, "https://h/11.png").unwrap();
        assert_eq!(saved, SavedPayload::Transcoded(tmp.path().join("11.jpg")));

        let reread = image::open(saved.path()).unwrap();
        assert_eq!((reread.width(), reread.height()), (4, 3));
        assert_eq!(reread.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_avif_output_name() {
        let tmp = tempfile::tempdir().unwrap();
        let encoder = PayloadEncoder::new(OutputFormat::Avif, true);
        assert_eq!(encoder.avif_quality(), 70);
        assert_eq!(PayloadEncoder::new(OutputFormat::Avif, false).avif_quality(), AVIF_QUALITY_MAX);

        let saved = encoder.save(&png_bytes(), tmp.path(), 12, "https://h/12.png").unwrap();
        assert_eq!(saved.path(), tmp.path().join("12.avif"));
        assert!(std::fs::metadata(saved.path()).unwrap().len() > 0);
    }

    #[test]
    fn test_video_written_raw() {
        let tmp = tempfile::tempdir().unwrap();
        let bytes = b"\x00\x00\x00\x18ftypmp42 not really a video".to_vec();

        let saved = PayloadEncoder::default()
            .save(&bytes, tmp.path(), 13, "https://h/x/13.mp4")
            .unwrap();
        assert_eq!(saved, SavedPayload::Raw(tmp.path().join("13.mp4")));
        assert_eq!(std::fs::read(saved.path()).unwrap(), bytes);
    }

    #[test]
    fn test_raw_without_extension_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = PayloadEncoder::default().save(b"garbage", tmp.path(), 14, "https://h/x/14");

        assert!(matches!(result, Err(PersistError::MissingExtension(_))));
        assert!(std::fs::read_dir(tmp.path()).unwrap().next().is_none());
    }
}
