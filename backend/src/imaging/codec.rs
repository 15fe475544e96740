use super::ImageError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;

/// Resampling filter for both the downscale and the final resize.
const RESAMPLE_FILTER: FilterType = FilterType::Lanczos3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub target_size: (u32, u32),
    pub max_dimension: Option<u32>,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            target_size: (224, 224),
            max_dimension: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    pub image: RgbImage,
    /// Decoded size before any scaling.
    pub source_dimensions: (u32, u32),
    /// Size after the optional `max_dimension` downscale.
    pub scaled_dimensions: (u32, u32),
}

impl PreprocessedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ImageError::Invalid("image has zero width or height".to_string()));
    }
    Ok(img)
}

/// Full structural decode of the buffer. Truncated or unsupported data fails.
pub fn validate(bytes: &[u8]) -> Result<(), ImageError> {
    decode(bytes).map(|_| ())
}

pub fn preprocess(bytes: &[u8], options: &PreprocessOptions) -> Result<PreprocessedImage, ImageError> {
    let img = decode(bytes)?;
    let source_dimensions = (img.width(), img.height());

    let img = match options
        .max_dimension
        .and_then(|max| downscale_dimensions(source_dimensions, max))
    {
        Some((width, height)) => {
            log::debug!(
                "Downscaling {}x{} to {}x{} before resize",
                source_dimensions.0,
                source_dimensions.1,
                width,
                height
            );
            img.resize_exact(width, height, RESAMPLE_FILTER)
        }
        None => img,
    };
    let scaled_dimensions = (img.width(), img.height());

    let rgb = match img {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.into_rgb8(),
    };

    let (target_width, target_height) = options.target_size;
    let image = image::imageops::resize(&rgb, target_width, target_height, RESAMPLE_FILTER);

    Ok(PreprocessedImage {
        image,
        source_dimensions,
        scaled_dimensions,
    })
}

/// Proportional size whose longer side equals `max_dimension`, or `None` if
/// the image already fits. Sides are truncated and never drop below 1.
pub fn downscale_dimensions(source: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (width, height) = source;
    let longest = width.max(height);
    if max_dimension == 0 || longest <= max_dimension {
        return None;
    }
    let scale =
        |side: u32| (u64::from(side) * u64::from(max_dimension) / u64::from(longest)).max(1) as u32;
    Some((scale(width), scale(height)))
}
