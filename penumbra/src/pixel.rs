//! Pixel formats.
//!
//! Render targets and textures only deal with a small, closed set of formats: the ones a forward
//! renderer with shadow maps and a post-process actually needs.

use std::fmt;

/// Pixel format of a texture or renderbuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PixelFormat {
  /// Normalized 8-bit RGBA, linear color space.
  RGBA8,
  /// Normalized 8-bit RGBA; the RGB channels are sRGB-encoded and decoded at sampling time.
  SRGBA8,
  /// Normalized 8-bit RGB, linear color space.
  RGB8,
  /// Single 32-bit floating channel.
  R32F,
  /// 16-bit depth.
  Depth16,
  /// 24-bit depth.
  Depth24,
  /// 32-bit floating depth.
  Depth32F,
}

impl PixelFormat {
  /// Does this format carry depth information?
  pub fn is_depth(self) -> bool {
    matches!(
      self,
      PixelFormat::Depth16 | PixelFormat::Depth24 | PixelFormat::Depth32F
    )
  }

  /// Can this format be used as a color attachment?
  pub fn is_color_renderable(self) -> bool {
    !self.is_depth()
  }

  /// Number of bytes a single texel of this format takes when uploaded.
  pub fn bytes_per_texel(self) -> usize {
    match self {
      PixelFormat::RGBA8 | PixelFormat::SRGBA8 => 4,
      PixelFormat::RGB8 => 3,
      PixelFormat::R32F => 4,
      PixelFormat::Depth16 => 2,
      PixelFormat::Depth24 | PixelFormat::Depth32F => 4,
    }
  }
}

impl fmt::Display for PixelFormat {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let name = match *self {
      PixelFormat::RGBA8 => "RGBA8",
      PixelFormat::SRGBA8 => "sRGBA8",
      PixelFormat::RGB8 => "RGB8",
      PixelFormat::R32F => "R32F",
      PixelFormat::Depth16 => "depth 16",
      PixelFormat::Depth24 => "depth 24",
      PixelFormat::Depth32F => "depth 32F",
    };

    f.write_str(name)
  }
}

/// Precision of a depth buffer.
///
/// Shadow maps need at least [`DepthPrecision::Bits24`]; anything lower produces visible acne
/// over the light frustum depth range.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum DepthPrecision {
  /// 16-bit depth.
  Bits16,
  /// 24-bit depth.
  Bits24,
  /// 32-bit floating depth.
  Bits32F,
}

impl DepthPrecision {
  /// Pixel format matching this precision.
  pub fn pixel_format(self) -> PixelFormat {
    match self {
      DepthPrecision::Bits16 => PixelFormat::Depth16,
      DepthPrecision::Bits24 => PixelFormat::Depth24,
      DepthPrecision::Bits32F => PixelFormat::Depth32F,
    }
  }
}

impl Default for DepthPrecision {
  fn default() -> Self {
    DepthPrecision::Bits32F
  }
}
