//! Payload models stored by the cache

pub mod bitmap;

pub use bitmap::{Bitmap, BitmapError, PixelFormat};
