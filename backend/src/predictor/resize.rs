use image::{DynamicImage, ImageFormat, ImageReader};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

use super::PredictorError;

pub const MAX_HEIGHT: u32 = 800;

/// Downscales the image at `path` so its height is at most `max_height`,
/// keeping the aspect ratio. Images within bounds are returned untouched.
/// The format is sniffed from the file contents, not the extension.
pub fn constrain_to_height(path: &Path, max_height: u32) -> Result<PathBuf, PredictorError> {
    let preprocessing = |e: &dyn std::fmt::Display| PredictorError::Preprocessing(format!("{}: {}", path.display(), e));

    let reader = ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .map_err(|e| preprocessing(&e))?;
    let format = reader
        .format()
        .ok_or_else(|| preprocessing(&"unrecognised image format"))?;
    let image = reader.decode().map_err(|e| preprocessing(&e))?;
    let (width, height) = (image.width(), image.height());
    if height <= max_height {
        return Ok(path.to_path_buf());
    }

    let new_width = ((u64::from(width) * u64::from(max_height)) / u64::from(height)).max(1) as u32;
    let mut resized = image.resize_exact(new_width, max_height, FilterType::Triangle);
    log::debug!(
        "Resized {} from {}x{} to {}x{}",
        path.display(),
        width,
        height,
        new_width,
        max_height
    );

    let output = resized_path(path);
    if format == ImageFormat::Jpeg {
        // the JPEG encoder rejects alpha channels
        resized = DynamicImage::ImageRgb8(resized.to_rgb8());
    }
    resized
        .save_with_format(&output, format)
        .map_err(|e| preprocessing(&e))?;
    Ok(output)
}

fn resized_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(extension) => format!("{}_resized.{}", stem, extension),
        None => format!("{}_resized", stem),
    };
    path.with_file_name(name)
}
