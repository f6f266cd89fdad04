//! Framebuffer backend interface.
//!
//! This interface defines the low-level API framebuffers must implement to be usable.

use crate::backend::texture::TextureBackend;
use crate::framebuffer::FramebufferError;

/// Framebuffer support.
///
/// A framebuffer is created empty, gets its attachments one at a time and is finally validated.
/// Attachments are owned by the caller; the framebuffer representation only refers to them.
pub unsafe trait FramebufferBackend: TextureBackend {
  /// Backend representation of a framebuffer.
  type FramebufferRepr;

  /// Create a new, attachment-less framebuffer.
  ///
  /// A framebuffer without a color attachment must not draw nor read any color buffer.
  unsafe fn new_framebuffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError>;

  /// Attach a texture as the (single) color attachment.
  unsafe fn attach_color_texture(
    framebuffer: &mut Self::FramebufferRepr,
    texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError>;

  /// Attach a depth texture.
  unsafe fn attach_depth_texture(
    framebuffer: &mut Self::FramebufferRepr,
    texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError>;

  /// Attach a depth renderbuffer.
  unsafe fn attach_depth_renderbuffer(
    framebuffer: &mut Self::FramebufferRepr,
    renderbuffer: &Self::RenderbufferRepr,
  ) -> Result<(), FramebufferError>;

  /// Check the completeness of a framebuffer once all of its attachments are in place.
  ///
  /// On error, the representation is dropped, releasing the framebuffer object.
  unsafe fn validate_framebuffer(
    framebuffer: Self::FramebufferRepr,
  ) -> Result<Self::FramebufferRepr, FramebufferError>;

  /// Get the default framebuffer of the display.
  ///
  /// Dropping the returned representation must not release anything.
  unsafe fn back_buffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError>;
}
