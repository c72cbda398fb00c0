//! Decoded raster frames.
//!
//! A [`Frame`] is one decoded picture in the decoder's native packed channel
//! order. It lives for a single pipeline iteration: the source produces it,
//! the writer encodes it, and it is dropped straight after the write attempt.

use image::RgbImage;

/// Packed pixel layout of a [`Frame`]'s buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// 8-bit red, green, blue.
    Rgb24,
    /// 8-bit blue, green, red. The native order of many raw/AVI decoders.
    Bgr24,
    /// 8-bit red, green, blue, alpha.
    Rgba32,
    /// 8-bit blue, green, red, alpha.
    Bgra32,
    /// 8-bit luma.
    Gray8,
}

impl PixelLayout {
    /// Bytes occupied by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb24 | PixelLayout::Bgr24 => 3,
            PixelLayout::Rgba32 | PixelLayout::Bgra32 => 4,
            PixelLayout::Gray8 => 1,
        }
    }
}

/// One decoded frame with a tightly packed pixel buffer (no row padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a packed buffer.
    ///
    /// Returns `None` if `data` is not exactly `width * height * bpp` bytes.
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * layout.bytes_per_pixel();
        if data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert to an RGB image, fixing up the channel order.
    ///
    /// BGR(A) buffers are swizzled, alpha is dropped and luma is replicated
    /// into all three channels. Returns `None` if the buffer does not cover
    /// the frame's dimensions.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let rgb = match self.layout {
            PixelLayout::Rgb24 => self.data.clone(),
            PixelLayout::Bgr24 => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
            PixelLayout::Rgba32 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            PixelLayout::Bgra32 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
            PixelLayout::Gray8 => self.data.iter().flat_map(|&y| [y, y, y]).collect(),
        };

        RgbImage::from_raw(self.width, self.height, rgb)
    }
}
