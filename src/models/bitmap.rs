//! Bitmap model
//!
//! An uncompressed raster whose memory footprint is `row_bytes * height`.

use thiserror::Error;

/// Pixel layout of a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 8-bit alpha mask
    Alpha8,
    /// 16-bit color, no alpha
    Rgb565,
    /// 16-bit color with 4-bit alpha
    Argb4444,
    /// 32-bit color with 8-bit alpha
    #[default]
    Argb8888,
}

impl PixelFormat {
    /// Number of bytes each pixel occupies.
    pub fn bytes_per_pixel(self) -> u64 {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgb565 | PixelFormat::Argb4444 => 2,
            PixelFormat::Argb8888 => 4,
        }
    }
}

/// Raised when a bitmap cannot be built from the given dimensions or data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitmapError {
    /// Pixel data does not match the declared dimensions
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    PixelBufferLength { expected: usize, actual: usize },

    /// The pixel buffer would not be addressable
    #[error("Bitmap of {width}x{height} pixels is too large")]
    TooLarge { width: u32, height: u32 },
}

/// An in-memory bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Creates a zero-filled bitmap.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> std::result::Result<Self, BitmapError> {
        let len = buffer_len(width, height, format)?;
        Ok(Self {
            width,
            height,
            format,
            pixels: vec![0; len],
        })
    }

    /// Wraps existing pixel data, which must be exactly `row_bytes * height` long.
    pub fn from_pixels(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> std::result::Result<Self, BitmapError> {
        let expected = buffer_len(width, height, format)?;
        if pixels.len() != expected {
            return Err(BitmapError::PixelBufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Row stride in bytes.
    pub fn row_bytes(&self) -> u64 {
        row_bytes(self.width, self.format)
    }

    /// Bytes occupied by the pixel data. Checked against overflow on construction.
    pub fn byte_count(&self) -> u64 {
        self.row_bytes() * u64::from(self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

fn row_bytes(width: u32, format: PixelFormat) -> u64 {
    u64::from(width) * format.bytes_per_pixel()
}

/// `row_bytes * height`, if it fits in memory.
fn buffer_len(
    width: u32,
    height: u32,
    format: PixelFormat,
) -> std::result::Result<usize, BitmapError> {
    row_bytes(width, format)
        .checked_mul(u64::from(height))
        .and_then(|len| usize::try_from(len).ok())
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(BitmapError::TooLarge { width, height })
}
