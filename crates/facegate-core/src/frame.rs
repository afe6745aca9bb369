//! Decoded RGB frames: the pixel array every analyzer call consumes.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero area ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// An 8-bit RGB image, row-major, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbFrame {
    /// Wrap a raw RGB buffer, checking that it covers `width * height` pixels.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 {
            return Err(FrameError::Empty { width, height });
        }
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Decode an encoded image (JPEG, PNG, ...) into RGB channel order.
    ///
    /// Alpha is dropped and grayscale is expanded to three channels.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height)
    }

    /// Read and decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height)
    }

    /// RGB triple at (x, y). Out-of-bounds reads return black.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}
