//! Upload decoding and normalization.
//!
//! Every function here takes the uploaded bytes as a slice. The request
//! handler buffers the upload once and each step decodes from that buffer.
//!
//! - **codec**: structural validation and the resize pipeline
//! - **metadata**: header-only format / color mode / dimensions
//! - **tensor**: RGB raster to NCHW `f32` tensor for the classifier

pub mod codec;
pub mod metadata;
pub mod tensor;

pub use codec::{PreprocessOptions, PreprocessedImage, preprocess, validate};
pub use metadata::{ImageInfo, inspect};
pub use tensor::to_tensor;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Invalid image file: {0}")]
    Invalid(String),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Invalid(err.to_string())
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Invalid(err.to_string())
    }
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
    use std::io::Cursor;

    /// 1x1 GIF89a.
    pub const TINY_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

    pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
        }))
    }

    pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        encode(&gradient_rgb(width, height), ImageFormat::Png)
    }

    pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encode(&gradient_rgb(width, height), ImageFormat::Jpeg)
    }
}
