//! Image decoding capability.

use crate::common::*;

/// Decoded image pixels in row-major, interleaved channel order.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

/// Turns an image file into pixels.
///
/// Decoding is blocking. Callers run it on a blocking task.
pub trait ImageDecoder
where
    Self: Debug + Send + Sync,
{
    fn decode(&self, path: &Path) -> Result<Image>;
}

/// The decoder backed by the `image` crate.
///
/// 8-bit images keep their channel layout (gray, gray-alpha, RGB, RGBA).
/// Deeper formats are converted to 8-bit RGB or RGBA.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<Image> {
        use image::{ColorType, DynamicImage};

        let image = image::open(path)?;
        let width = image.width() as usize;
        let height = image.height() as usize;

        let (channels, data) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            image => match image.color() {
                ColorType::La16 | ColorType::Rgba16 | ColorType::Rgba32F => {
                    (4, image.into_rgba8().into_raw())
                }
                _ => (3, image.into_rgb8().into_raw()),
            },
        };

        Ok(Image {
            width,
            height,
            channels,
            data,
        })
    }
}
