//! Framebuffers and render targets.
//!
//! A framebuffer is a render target made of an optional color texture and an optional depth
//! attachment. Both are owned by the framebuffer and released with it. The back buffer is a
//! special framebuffer that represents the display; it owns no attachment.
//!
//! Framebuffers are validated when created. The attachment layout is checked first (sizes and
//! formats); the backend completeness check runs afterwards. Whatever the failure, the
//! attachments that were handed over are released before the error is returned and no
//! framebuffer ever escapes in a half-built state.

use std::error;
use std::fmt;

use crate::backend::framebuffer::FramebufferBackend;
use crate::context::GraphicsContext;
use crate::pixel::PixelFormat;
use crate::texture::{Renderbuffer, Texture, TextureError};

/// Framebuffer error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FramebufferError {
  /// Texture error.
  ///
  /// This happens while creating the color / depth attachments.
  TextureError(TextureError),
  /// The backend could not create the framebuffer object.
  CannotCreate(String),
  /// Incomplete error.
  ///
  /// This happens when validating the framebuffer.
  Incomplete(IncompleteReason),
}

impl fmt::Display for FramebufferError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      FramebufferError::TextureError(ref e) => write!(f, "framebuffer texture error: {}", e),

      FramebufferError::CannotCreate(ref e) => write!(f, "cannot create framebuffer: {}", e),

      FramebufferError::Incomplete(ref e) => write!(f, "incomplete framebuffer: {}", e),
    }
  }
}

impl error::Error for FramebufferError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      FramebufferError::TextureError(e) => Some(e),
      _ => None,
    }
  }
}

impl From<TextureError> for FramebufferError {
  fn from(e: TextureError) -> Self {
    FramebufferError::TextureError(e)
  }
}

impl From<IncompleteReason> for FramebufferError {
  fn from(e: IncompleteReason) -> Self {
    FramebufferError::Incomplete(e)
  }
}

/// Reason a framebuffer is incomplete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IncompleteReason {
  /// Incomplete framebuffer.
  Undefined,
  /// Incomplete attachment (color / depth), such as a zero-sized one.
  IncompleteAttachment,
  /// The framebuffer has no attachment at all.
  MissingAttachment,
  /// The color and depth attachments don’t have the same size.
  SizeMismatch {
    /// Size of the color attachment.
    color: [u32; 2],
    /// Size of the depth attachment.
    depth: [u32; 2],
  },
  /// The attachment formats cannot be combined, or a format was used in the wrong slot.
  UnsupportedCombination,
  /// Incomplete draw buffer.
  IncompleteDrawBuffer,
  /// Incomplete read buffer.
  IncompleteReadBuffer,
  /// Incomplete multisample configuration.
  IncompleteMultisample,
  /// Incomplete layer targets.
  IncompleteLayerTargets,
}

impl fmt::Display for IncompleteReason {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      IncompleteReason::Undefined => write!(f, "undefined framebuffer"),
      IncompleteReason::IncompleteAttachment => write!(f, "incomplete attachment"),
      IncompleteReason::MissingAttachment => write!(f, "missing attachment"),
      IncompleteReason::SizeMismatch { color, depth } => write!(
        f,
        "attachment size mismatch: color is {}×{}, depth is {}×{}",
        color[0], color[1], depth[0], depth[1]
      ),
      IncompleteReason::UnsupportedCombination => write!(f, "unsupported attachment combination"),
      IncompleteReason::IncompleteDrawBuffer => write!(f, "incomplete draw buffer"),
      IncompleteReason::IncompleteReadBuffer => write!(f, "incomplete read buffer"),
      IncompleteReason::IncompleteMultisample => write!(f, "incomplete multisample"),
      IncompleteReason::IncompleteLayerTargets => write!(f, "incomplete layer targets"),
    }
  }
}

impl error::Error for IncompleteReason {}

/// Depth attachment of a framebuffer.
pub enum DepthAttachment<B>
where
  B: FramebufferBackend,
{
  /// A depth texture, for depth that is sampled later on.
  Texture(Texture<B>),
  /// A depth renderbuffer, for depth that is only used for testing.
  Renderbuffer(Renderbuffer<B>),
}

impl<B> DepthAttachment<B>
where
  B: FramebufferBackend,
{
  /// Size of the attachment.
  pub fn size(&self) -> [u32; 2] {
    match self {
      DepthAttachment::Texture(t) => t.size(),
      DepthAttachment::Renderbuffer(r) => r.size(),
    }
  }

  /// Pixel format of the attachment.
  pub fn format(&self) -> PixelFormat {
    match self {
      DepthAttachment::Texture(t) => t.format(),
      DepthAttachment::Renderbuffer(r) => r.format(),
    }
  }
}

impl<B> From<Texture<B>> for DepthAttachment<B>
where
  B: FramebufferBackend,
{
  fn from(texture: Texture<B>) -> Self {
    DepthAttachment::Texture(texture)
  }
}

impl<B> From<Renderbuffer<B>> for DepthAttachment<B>
where
  B: FramebufferBackend,
{
  fn from(renderbuffer: Renderbuffer<B>) -> Self {
    DepthAttachment::Renderbuffer(renderbuffer)
  }
}

/// Check that a set of attachments can form a framebuffer.
///
/// Each attachment is given as its size and pixel format. On success, the size of the
/// framebuffer is returned.
pub fn validate_layout(
  color: Option<([u32; 2], PixelFormat)>,
  depth: Option<([u32; 2], PixelFormat)>,
) -> Result<[u32; 2], IncompleteReason> {
  if let Some((_, pf)) = color {
    if !pf.is_color_renderable() {
      return Err(IncompleteReason::UnsupportedCombination);
    }
  }

  if let Some((_, pf)) = depth {
    if !pf.is_depth() {
      return Err(IncompleteReason::UnsupportedCombination);
    }
  }

  let size = match (color, depth) {
    (None, None) => return Err(IncompleteReason::MissingAttachment),
    (Some((color, _)), Some((depth, _))) if color != depth => {
      return Err(IncompleteReason::SizeMismatch { color, depth })
    }
    (Some((size, _)), _) | (None, Some((size, _))) => size,
  };

  if size[0] == 0 || size[1] == 0 {
    return Err(IncompleteReason::IncompleteAttachment);
  }

  Ok(size)
}

/// A render target.
pub struct Framebuffer<B>
where
  B: FramebufferBackend,
{
  // dropped before the attachments it refers to
  pub(crate) repr: B::FramebufferRepr,
  size: [u32; 2],
  color: Option<Texture<B>>,
  depth: Option<DepthAttachment<B>>,
}

impl<B> Framebuffer<B>
where
  B: FramebufferBackend,
{
  /// Create a new framebuffer out of its attachments.
  ///
  /// On error, the attachments are dropped (and thus released) before returning.
  pub fn new<C>(
    ctx: &mut C,
    color: Option<Texture<B>>,
    depth: Option<DepthAttachment<B>>,
  ) -> Result<Self, FramebufferError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let size = validate_layout(
      color.as_ref().map(|t| (t.size(), t.format())),
      depth.as_ref().map(|d| (d.size(), d.format())),
    )?;

    unsafe {
      let mut repr = ctx.backend().new_framebuffer(size)?;

      if let Some(ref texture) = color {
        B::attach_color_texture(&mut repr, &texture.repr)?;
      }

      match depth {
        Some(DepthAttachment::Texture(ref texture)) => {
          B::attach_depth_texture(&mut repr, &texture.repr)?
        }
        Some(DepthAttachment::Renderbuffer(ref renderbuffer)) => {
          B::attach_depth_renderbuffer(&mut repr, &renderbuffer.repr)?
        }
        None => (),
      }

      let repr = B::validate_framebuffer(repr)?;

      Ok(Framebuffer {
        repr,
        size,
        color,
        depth,
      })
    }
  }

  /// Get the back buffer, representing the display, with the given size.
  pub fn back_buffer<C>(ctx: &mut C, size: [u32; 2]) -> Result<Self, FramebufferError>
  where
    C: GraphicsContext<Backend = B>,
  {
    unsafe {
      ctx.backend().back_buffer(size).map(|repr| Framebuffer {
        repr,
        size,
        color: None,
        depth: None,
      })
    }
  }

  /// Size of the framebuffer, in pixels.
  pub fn size(&self) -> [u32; 2] {
    self.size
  }

  /// Color texture, if any.
  pub fn color_texture(&self) -> Option<&Texture<B>> {
    self.color.as_ref()
  }

  /// Depth texture, if the depth attachment is a texture.
  pub fn depth_texture(&self) -> Option<&Texture<B>> {
    match self.depth {
      Some(DepthAttachment::Texture(ref texture)) => Some(texture),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn color_and_depth_layouts() {
    let rgba = Some(([800, 600], PixelFormat::RGBA8));
    let depth = Some(([800, 600], PixelFormat::Depth24));

    assert_eq!(validate_layout(rgba, depth), Ok([800, 600]));
    assert_eq!(validate_layout(rgba, None), Ok([800, 600]));
    assert_eq!(validate_layout(None, depth), Ok([800, 600]));
  }

  #[test]
  fn missing_attachment() {
    assert_eq!(
      validate_layout(None, None),
      Err(IncompleteReason::MissingAttachment)
    );
  }

  #[test]
  fn size_mismatch() {
    assert_eq!(
      validate_layout(
        Some(([800, 600], PixelFormat::RGBA8)),
        Some(([1024, 1024], PixelFormat::Depth32F))
      ),
      Err(IncompleteReason::SizeMismatch {
        color: [800, 600],
        depth: [1024, 1024]
      })
    );
  }

  #[test]
  fn formats_in_wrong_slots() {
    assert_eq!(
      validate_layout(Some(([4, 4], PixelFormat::Depth16)), None),
      Err(IncompleteReason::UnsupportedCombination)
    );
    assert_eq!(
      validate_layout(None, Some(([4, 4], PixelFormat::R32F))),
      Err(IncompleteReason::UnsupportedCombination)
    );
  }

  #[test]
  fn zero_sized_attachment() {
    assert_eq!(
      validate_layout(None, Some(([0, 1024], PixelFormat::Depth32F))),
      Err(IncompleteReason::IncompleteAttachment)
    );
  }
}
