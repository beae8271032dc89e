//! Grid composition of QR bitmaps into a single output image
//!
//! Codes are laid out row-major on a white canvas, each inside a cell padded
//! by an eighth of the code size, and written as one raster file whose format
//! follows the output path's extension.

use crate::error::{Error, Result};
use image::{DynamicImage, Rgb, RgbImage, imageops};
use std::path::Path;

/// Output formats accepted for the composite sheet, keyed by extension
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Grid geometry for a composite sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Number of columns
    pub cols: u32,
    /// Number of rows
    pub rows: u32,
    /// Edge length of one cell (code size plus margins) in pixels
    pub cell: u32,
    /// Padding around each code in pixels
    pub margin: u32,
}

impl GridLayout {
    /// Compute the near-square grid holding `count` codes of `size` pixels.
    pub fn for_codes(count: usize, size: u32) -> Self {
        let cols = (count as f64).sqrt().ceil() as u32;
        let rows = (count as u32).div_ceil(cols.max(1));
        let margin = size / 8;
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            cell: size + margin * 2,
            margin,
        }
    }

    /// Total canvas dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols * self.cell, self.rows * self.cell)
    }

    /// Top-left pixel of the code at `index`, row-major.
    pub fn origin(&self, index: usize) -> (i64, i64) {
        let col = index as u32 % self.cols;
        let row = index as u32 / self.cols;
        (
            i64::from(col * self.cell + self.margin),
            i64::from(row * self.cell + self.margin),
        )
    }
}

/// Check that the output path carries a supported image extension.
///
/// Runs before any portal request so that a doomed run fails immediately.
pub fn validate_output_path(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ref ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::Validation(format!(
            "output path '{}' must end in one of: {}",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        ))),
    }
}

/// Arrange QR images of `size` pixels into a single grid canvas.
pub fn composite(images: &[DynamicImage], size: u32) -> Result<RgbImage> {
    if images.is_empty() {
        return Err(Error::Validation("no QR images to composite".to_string()));
    }

    let layout = GridLayout::for_codes(images.len(), size);
    let (width, height) = layout.dimensions();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    for (index, qr) in images.iter().enumerate() {
        let (x, y) = layout.origin(index);
        imageops::replace(&mut canvas, &qr.to_rgb8(), x, y);
    }

    tracing::debug!(codes = images.len(), width, height, "Composited QR sheet");
    Ok(canvas)
}

/// Write the composite sheet to disk; format follows the path extension.
pub fn write(image: &RgbImage, path: &Path) -> Result<()> {
    validate_output_path(path)?;
    image.save(path)?;
    tracing::info!(path = %path.display(), "Wrote QR sheet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn white_square(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([255, 255, 255])))
    }

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("payqr-compose-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn layouts_are_near_square() {
        assert_eq!(GridLayout::for_codes(1, 300).cols, 1);
        assert_eq!(GridLayout::for_codes(1, 300).rows, 1);

        assert_eq!(GridLayout::for_codes(2, 300).cols, 2);
        assert_eq!(GridLayout::for_codes(2, 300).rows, 1);

        // Three codes leave one empty cell.
        assert_eq!(GridLayout::for_codes(3, 300).cols, 2);
        assert_eq!(GridLayout::for_codes(3, 300).rows, 2);

        assert_eq!(GridLayout::for_codes(4, 300).cols, 2);
        assert_eq!(GridLayout::for_codes(4, 300).rows, 2);
    }

    #[test]
    fn cell_geometry_includes_the_margin() {
        let layout = GridLayout::for_codes(3, 300);
        assert_eq!(layout.margin, 37);
        assert_eq!(layout.cell, 374);
        assert_eq!(layout.dimensions(), (748, 748));
        assert_eq!(layout.origin(0), (37, 37));
        assert_eq!(layout.origin(1), (411, 37));
        assert_eq!(layout.origin(2), (37, 411));
    }

    #[test]
    fn composite_dimensions_scale_with_count() {
        let size = 120;
        for count in 1..=3 {
            let images: Vec<DynamicImage> = (0..count).map(|_| white_square(size)).collect();
            let sheet = composite(&images, size).unwrap();
            let expected = GridLayout::for_codes(count, size).dimensions();
            assert_eq!((sheet.width(), sheet.height()), expected, "count {count}");
        }
    }

    #[test]
    fn composite_is_deterministic() {
        let images = vec![white_square(96), white_square(96)];
        let first = composite(&images, 96).unwrap();
        let second = composite(&images, 96).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(composite(&[], 96), Err(Error::Validation(_))));
    }

    #[test]
    fn accepts_the_original_extension_set() {
        for name in ["out.png", "out.jpg", "out.jpeg", "out.gif", "OUT.PNG"] {
            assert!(validate_output_path(Path::new(name)).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_unsupported_extensions() {
        for name in ["out.bmp", "out", "out.png.txt", ".png"] {
            let err = validate_output_path(Path::new(name)).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{name}: {err:?}");
        }
    }

    #[test]
    fn writes_a_readable_image() {
        let path = scratch_dir().join("sheet.png");
        let sheet = composite(&[white_square(64)], 64).unwrap();
        write(&sheet, &path).unwrap();

        let read_back = image::open(&path).expect("reopen sheet");
        assert_eq!((read_back.width(), read_back.height()), (80, 80));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_destination_is_an_io_error() {
        let sheet = composite(&[white_square(64)], 64).unwrap();
        let err = write(&sheet, Path::new("/definitely-missing-dir/out.png")).unwrap_err();
        assert!(matches!(err, Error::Io(_)), "unexpected error: {err:?}");
    }
}
