use super::ImageError;
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use serde::Serialize;
use std::fmt;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorMode {
    #[serde(rename = "L")]
    L,
    #[serde(rename = "LA")]
    La,
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "RGBA")]
    Rgba,
    #[serde(rename = "I;16")]
    L16,
    #[serde(rename = "LA;16")]
    La16,
    #[serde(rename = "RGB;16")]
    Rgb16,
    #[serde(rename = "RGBA;16")]
    Rgba16,
    #[serde(rename = "RGB;F32")]
    Rgb32F,
    #[serde(rename = "RGBA;F32")]
    Rgba32F,
    #[serde(rename = "unknown")]
    Unknown,
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => ColorMode::L,
            ColorType::La8 => ColorMode::La,
            ColorType::Rgb8 => ColorMode::Rgb,
            ColorType::Rgba8 => ColorMode::Rgba,
            ColorType::L16 => ColorMode::L16,
            ColorType::La16 => ColorMode::La16,
            ColorType::Rgb16 => ColorMode::Rgb16,
            ColorType::Rgba16 => ColorMode::Rgba16,
            ColorType::Rgb32F => ColorMode::Rgb32F,
            ColorType::Rgba32F => ColorMode::Rgba32F,
            _ => ColorMode::Unknown,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::L => "L",
            ColorMode::La => "LA",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::L16 => "I;16",
            ColorMode::La16 => "LA;16",
            ColorMode::Rgb16 => "RGB;16",
            ColorMode::Rgba16 => "RGBA;16",
            ColorMode::Rgb32F => "RGB;F32",
            ColorMode::Rgba32F => "RGBA;F32",
            ColorMode::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: String,
    pub color_mode: ColorMode,
    pub width: u32,
    pub height: u32,
}

impl ImageInfo {
    pub fn dimensions_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        other => format!("{other:?}").to_uppercase(),
    }
}

/// Reads format, color mode and size from the header only; pixels are not decoded.
pub fn inspect(bytes: &[u8]) -> Result<ImageInfo, ImageError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| ImageError::Invalid("unrecognized image format".to_string()))?;
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    Ok(ImageInfo {
        format: format_name(format),
        color_mode: decoder.color_type().into(),
        width,
        height,
    })
}
