//! Texture backend interface.
//!
//! This interface defines the low-level API textures and renderbuffers must implement to be usable.

use crate::pixel::PixelFormat;
use crate::texture::{Sampler, TextureError};

/// Texture and renderbuffer support.
///
/// Renderbuffers are write-only images; they are only ever used as depth attachments of
/// framebuffers which depth is never sampled.
pub unsafe trait TextureBackend {
  /// Backend representation of a texture.
  type TextureRepr;

  /// Backend representation of a renderbuffer.
  type RenderbufferRepr;

  /// Create a new 2D texture with uninitialized texels.
  unsafe fn new_texture(
    &mut self,
    size: [u32; 2],
    format: PixelFormat,
    sampler: &Sampler,
  ) -> Result<Self::TextureRepr, TextureError>;

  /// Upload the whole texture storage.
  ///
  /// `texels` is tightly packed, row-major, first row at the bottom. Its length has already been
  /// checked against the size and format of the texture. If the sampler of the texture asks for
  /// mipmaps, they must be regenerated.
  unsafe fn upload_texels(
    texture: &mut Self::TextureRepr,
    texels: &[u8],
  ) -> Result<(), TextureError>;

  /// Create a new renderbuffer.
  unsafe fn new_renderbuffer(
    &mut self,
    size: [u32; 2],
    format: PixelFormat,
  ) -> Result<Self::RenderbufferRepr, TextureError>;
}
