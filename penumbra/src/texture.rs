//! Texture API.
//!
//! Textures are 2D images living on the GPU. They are used as render targets (color and depth)
//! and as material maps. Renderbuffers are their write-only counterparts, only usable as depth
//! attachments.

use std::error;
use std::fmt;

use crate::backend::texture::TextureBackend;
use crate::context::GraphicsContext;
use crate::pixel::PixelFormat;

/// How to wrap texture coordinates while sampling textures?
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Wrap {
  /// If textures coordinates lay outside of *[0;1]*, they will be clamped to either *0* or *1*.
  ClampToEdge,
  /// Textures coordinates are repeated if they lay outside of *[0;1]*.
  Repeat,
}

/// Minification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MinFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
  /// Linear interpolation between two mipmaps, which texels are linearly interpolated as well.
  LinearMipmapLinear,
}

impl MinFilter {
  /// Does this filter require mipmaps?
  pub fn uses_mipmaps(self) -> bool {
    matches!(self, MinFilter::LinearMipmapLinear)
  }
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MagFilter {
  /// Nearest interpolation.
  Nearest,
  /// Linear interpolation between surrounding pixels.
  Linear,
}

/// A sampler configures how texels are fetched from a texture.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sampler {
  /// How should we wrap around the *s* sampling coordinate?
  pub wrap_s: Wrap,
  /// How should we wrap around the *t* sampling coordinate?
  pub wrap_t: Wrap,
  /// Minification filter.
  pub min_filter: MinFilter,
  /// Magnification filter.
  pub mag_filter: MagFilter,
}

impl Sampler {
  /// Sampler used for material maps: repeating, trilinear filtering.
  pub fn repeat_mipmapped() -> Self {
    Sampler {
      wrap_s: Wrap::Repeat,
      wrap_t: Wrap::Repeat,
      min_filter: MinFilter::LinearMipmapLinear,
      mag_filter: MagFilter::Linear,
    }
  }

  /// Sampler used for depth maps: clamped, nearest filtering.
  pub fn depth_target() -> Self {
    Sampler {
      wrap_s: Wrap::ClampToEdge,
      wrap_t: Wrap::ClampToEdge,
      min_filter: MinFilter::Nearest,
      mag_filter: MagFilter::Nearest,
    }
  }
}

/// Default sampler: clamped, linear filtering, no mipmaps. That is what color render targets use.
impl Default for Sampler {
  fn default() -> Self {
    Sampler {
      wrap_s: Wrap::ClampToEdge,
      wrap_t: Wrap::ClampToEdge,
      min_filter: MinFilter::Linear,
      mag_filter: MagFilter::Linear,
    }
  }
}

/// Errors that might happen when working with textures.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TextureError {
  /// A texture’s storage failed to be created.
  ///
  /// The carried [`String`] gives the reason of the failure.
  TextureStorageCreationFailed(String),
  /// A texture or renderbuffer cannot have a zero-sized dimension.
  InvalidSize([u32; 2]),
  /// The uploaded texels don’t match the storage of the texture.
  ///
  /// The first [`usize`] is the number of expected bytes and the second one is the number of
  /// bytes provided.
  TexelSizeMismatch(usize, usize),
  /// Unsupported pixel format.
  ///
  /// Renderbuffers, for instance, only support depth formats.
  UnsupportedPixelFormat(PixelFormat),
}

impl fmt::Display for TextureError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      TextureError::TextureStorageCreationFailed(ref e) => {
        write!(f, "texture storage creation failed: {}", e)
      }

      TextureError::InvalidSize([w, h]) => write!(f, "invalid texture size: {}×{}", w, h),

      TextureError::TexelSizeMismatch(expected, provided) => write!(
        f,
        "texel size mismatch: expected {} bytes, provided {} bytes",
        expected, provided
      ),

      TextureError::UnsupportedPixelFormat(fmt) => write!(f, "unsupported pixel format: {}", fmt),
    }
  }
}

impl error::Error for TextureError {}

/// A 2D texture.
///
/// Dropping a texture releases its GPU storage.
pub struct Texture<B>
where
  B: TextureBackend,
{
  pub(crate) repr: B::TextureRepr,
  size: [u32; 2],
  format: PixelFormat,
  sampler: Sampler,
}

impl<B> Texture<B>
where
  B: TextureBackend,
{
  /// Create a new texture with uninitialized texels.
  pub fn new<C>(
    ctx: &mut C,
    size: [u32; 2],
    format: PixelFormat,
    sampler: Sampler,
  ) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    if size[0] == 0 || size[1] == 0 {
      return Err(TextureError::InvalidSize(size));
    }

    unsafe {
      ctx
        .backend()
        .new_texture(size, format, &sampler)
        .map(|repr| Texture {
          repr,
          size,
          format,
          sampler,
        })
    }
  }

  /// Replace the whole content of the texture.
  ///
  /// `texels` must be tightly packed, with the first row being the bottom one.
  pub fn upload_raw(&mut self, texels: &[u8]) -> Result<(), TextureError> {
    let expected = texel_bytes(self.size, self.format);

    if texels.len() != expected {
      return Err(TextureError::TexelSizeMismatch(expected, texels.len()));
    }

    unsafe { B::upload_texels(&mut self.repr, texels) }
  }

  /// Size of the texture, in texels.
  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  /// Pixel format of the texture.
  pub fn format(&self) -> PixelFormat {
    self.format
  }

  /// Sampler the texture was created with.
  pub fn sampler(&self) -> &Sampler {
    &self.sampler
  }
}

/// A write-only image, used as a depth attachment.
pub struct Renderbuffer<B>
where
  B: TextureBackend,
{
  pub(crate) repr: B::RenderbufferRepr,
  size: [u32; 2],
  format: PixelFormat,
}

impl<B> Renderbuffer<B>
where
  B: TextureBackend,
{
  /// Create a new depth renderbuffer.
  pub fn new<C>(ctx: &mut C, size: [u32; 2], format: PixelFormat) -> Result<Self, TextureError>
  where
    C: GraphicsContext<Backend = B>,
  {
    if size[0] == 0 || size[1] == 0 {
      return Err(TextureError::InvalidSize(size));
    }

    if !format.is_depth() {
      return Err(TextureError::UnsupportedPixelFormat(format));
    }

    unsafe {
      ctx
        .backend()
        .new_renderbuffer(size, format)
        .map(|repr| Renderbuffer { repr, size, format })
    }
  }

  /// Size of the renderbuffer, in pixels.
  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  /// Pixel format of the renderbuffer.
  pub fn format(&self) -> PixelFormat {
    self.format
  }
}

/// Number of bytes a full upload of a texture of the given size and format takes.
pub fn texel_bytes(size: [u32; 2], format: PixelFormat) -> usize {
  size[0] as usize * size[1] as usize * format.bytes_per_texel()
}
