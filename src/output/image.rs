//! Image persister.

use std::path::Path;

use image::DynamicImage;

use crate::error::{Result, SynthError};

/// Writes the first generated image to `path`.
///
/// The format follows the file extension. No color conversion or resizing
/// happens here; remaining images are discarded.
pub fn save_image(images: &[DynamicImage], path: &Path) -> Result<(u32, u32)> {
    let first = images
        .first()
        .ok_or_else(|| SynthError::engine("engine returned no images"))?;
    if images.len() > 1 {
        tracing::debug!(count = images.len(), "keeping first image only");
    }

    first
        .save(path)
        .map_err(|e| SynthError::write_failed(path, e))?;

    tracing::debug!(path = %path.display(), width = first.width(), height = first.height(), "image written");
    Ok((first.width(), first.height()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn writes_png_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.png");

        let dims = save_image(&[solid(6, 4, [1, 2, 3])], &path).unwrap();
        assert_eq!(dims, (6, 4));

        let read = image::open(&path).unwrap().to_rgb8();
        assert_eq!(read.dimensions(), (6, 4));
        assert_eq!(read.get_pixel(5, 3), &Rgb([1, 2, 3]));
    }

    #[test]
    fn keeps_only_first_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("first.png");

        save_image(&[solid(2, 2, [9, 9, 9]), solid(3, 3, [0, 0, 0])], &path).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8().get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn missing_directory_is_filesystem_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.png");

        let err = save_image(&[solid(2, 2, [0, 0, 0])], &path).unwrap_err();
        assert_eq!(err.code, ErrorCode::FilesystemError);
        assert!(err.message.contains("out.png"));
    }

    #[test]
    fn unknown_extension_is_filesystem_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.notaformat");

        let err = save_image(&[solid(2, 2, [0, 0, 0])], &path).unwrap_err();
        assert_eq!(err.code, ErrorCode::FilesystemError);
    }

    #[test]
    fn empty_output_is_engine_error() {
        let dir = tempdir().unwrap();
        let err = save_image(&[], &dir.path().join("x.png")).unwrap_err();
        assert_eq!(err.code, ErrorCode::EngineError);
    }
}
