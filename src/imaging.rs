//! Image conveniences on `FolderPath`
//!
//! Pixel arrays are `u8` arrays shaped `(height, width, channels)`; a 2-D
//! array is accepted as grayscale on write.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, LumaA, Rgb, Rgba};
use ndarray::{Array2, Array3, ArrayD};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::path::FolderPath;

const MAX_JPEG_QUALITY: u8 = 95;

/// Image accepted by `imwrite`
#[derive(Debug, Clone)]
pub enum ImageInput {
    Array(ArrayD<u8>),
    Image(DynamicImage),
}

impl From<Array3<u8>> for ImageInput {
    fn from(value: Array3<u8>) -> Self {
        ImageInput::Array(value.into_dyn())
    }
}

impl From<Array2<u8>> for ImageInput {
    fn from(value: Array2<u8>) -> Self {
        ImageInput::Array(value.into_dyn())
    }
}

impl From<ArrayD<u8>> for ImageInput {
    fn from(value: ArrayD<u8>) -> Self {
        ImageInput::Array(value)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(value: DynamicImage) -> Self {
        ImageInput::Image(value)
    }
}

/// Extensions of every format the enabled codecs can encode
pub fn writable_formats() -> Vec<String> {
    ImageFormat::all()
        .filter(|format| format.writing_enabled())
        .filter_map(|format| format.extensions_str().first())
        .map(|ext| ext.to_string())
        .collect()
}

fn resolve_format(extension: &str) -> Result<ImageFormat> {
    let extension = match extension.to_lowercase().as_str() {
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    };
    match ImageFormat::from_extension(&extension) {
        Some(format) if format.writing_enabled() => Ok(format),
        _ => Err(Error::UnsupportedImageFormat {
            format: extension,
            supported: writable_formats(),
        }),
    }
}

fn to_array(image: DynamicImage) -> Result<Array3<u8>> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let (channels, raw) = match image {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        // wider sample types are narrowed to 8 bits
        other => {
            let color = other.color();
            match (color.has_color(), color.has_alpha()) {
                (false, false) => (1, other.into_luma8().into_raw()),
                (false, true) => (2, other.into_luma_alpha8().into_raw()),
                (true, false) => (3, other.into_rgb8().into_raw()),
                (true, true) => (4, other.into_rgba8().into_raw()),
            }
        }
    };
    Array3::from_shape_vec((height, width, channels), raw)
        .map_err(|_| Error::InvalidImageShape(vec![height, width, channels]))
}

fn from_array(array: ArrayD<u8>) -> Result<DynamicImage> {
    let shape = array.shape().to_vec();
    let (height, width, channels) = match shape.as_slice() {
        [h, w] => (*h, *w, 1),
        [h, w, c] if (1..=4).contains(c) => (*h, *w, *c),
        _ => return Err(Error::InvalidImageShape(shape)),
    };
    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        return Err(Error::InvalidImageShape(shape));
    };
    let raw: Vec<u8> = array.iter().copied().collect();

    let image = match channels {
        1 => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        _ => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgba8),
    };
    image.ok_or(Error::InvalidImageShape(shape))
}

impl FolderPath {
    /// Decode the content as an image into a `(height, width, channels)` array
    pub fn imread(&self) -> Result<Array3<u8>> {
        let data = self.read_bytes()?;
        let image = image::load_from_memory(&data)?;
        to_array(image)
    }

    /// Encode `image` in the format named by the path extension and upload it.
    ///
    /// `quality` only applies to JPEG and must be within `0..=95`.
    pub fn imwrite(&self, image: impl Into<ImageInput>, quality: Option<u8>) -> Result<()> {
        let image = match image.into() {
            ImageInput::Array(array) => from_array(array)?,
            ImageInput::Image(image) => image,
        };

        let extension = self.suffix().trim_start_matches('.');
        if extension.is_empty() {
            return Err(Error::MissingImageExtension(self.as_str().to_string()));
        }
        let format = resolve_format(extension)?;

        let mut buffer = Cursor::new(Vec::new());
        match (format, quality) {
            (ImageFormat::Jpeg, Some(quality)) => {
                if quality > MAX_JPEG_QUALITY {
                    return Err(Error::InvalidJpegQuality(quality));
                }
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
            }
            _ => image.write_to(&mut buffer, format)?,
        }

        tracing::debug!("Encoded {} as {:?}", self.as_str(), format);
        self.write_bytes(buffer.into_inner())
    }
}
