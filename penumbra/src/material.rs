//! Diffuse maps.
//!
//! The same image is uploaded twice: once as plain RGBA8, sampled as-is when gamma correction is
//! off, and once as sRGB, decoded to linear by the sampler when gamma correction is on.

use image::{Rgba, RgbaImage};

use crate::backend::texture::TextureBackend;
use crate::context::GraphicsContext;
use crate::pixel::PixelFormat;
use crate::texture::{Sampler, Texture, TextureError};

/// Procedural checkerboard, used as the floor texture until a real one is loaded.
pub fn checkerboard(size: u32, cells: u32) -> RgbaImage {
  let cell = (size / cells.max(1)).max(1);

  RgbaImage::from_fn(size, size, |x, y| {
    if (x / cell + y / cell) % 2 == 0 {
      Rgba([200, 200, 200, 255])
    } else {
      Rgba([90, 90, 110, 255])
    }
  })
}

/// Linear and sRGB variants of a diffuse map.
pub struct DiffuseMaps<B>
where
  B: TextureBackend,
{
  linear: Texture<B>,
  srgb: Texture<B>,
}

impl<B> DiffuseMaps<B>
where
  B: TextureBackend,
{
  /// Upload both variants of an image.
  pub fn upload<C>(ctx: &mut C, image: &RgbaImage) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let size = [image.width(), image.height()];
    let texels = image.as_raw();

    let mut linear = Texture::new(ctx, size, PixelFormat::RGBA8, Sampler::repeat_mipmapped())?;
    linear.upload_raw(texels)?;

    let mut srgb = Texture::new(ctx, size, PixelFormat::SRGBA8, Sampler::repeat_mipmapped())?;
    srgb.upload_raw(texels)?;

    Ok(DiffuseMaps { linear, srgb })
  }

  /// The variant to sample, depending on gamma correction.
  pub fn get(&self, gamma: bool) -> &Texture<B> {
    if gamma {
      &self.srgb
    } else {
      &self.linear
    }
  }

  pub fn size(&self) -> [u32; 2] {
    self.linear.size()
  }
}
