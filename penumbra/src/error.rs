//! Renderer errors.
//!
//! Setup errors name the resource that failed so that a diagnostic can tell which pass is broken.

use std::error;
use std::fmt;

use crate::framebuffer::FramebufferError;
use crate::mesh::MeshError;
use crate::pixel::DepthPrecision;
use crate::shader::ProgramError;
use crate::tess::TessError;
use crate::texture::TextureError;

/// Errors of the render passes and of the renderer.
#[derive(Debug)]
pub enum RenderError {
  /// A shader program failed to compile or link.
  Program {
    name: &'static str,
    source: ProgramError,
  },
  /// A render target is incomplete or could not be created.
  Framebuffer {
    name: &'static str,
    source: FramebufferError,
  },
  /// A texture could not be created or uploaded.
  Texture {
    name: &'static str,
    source: TextureError,
  },
  /// Static geometry could not be uploaded.
  Tess(TessError),
  /// A user mesh was rejected.
  Mesh(MeshError),
  /// Shadow maps need at least 24 bits of depth.
  UnsupportedDepthPrecision(DepthPrecision),
  /// The renderer was disposed and owns no GPU resource anymore.
  Disposed,
}

impl RenderError {
  pub(crate) fn program(name: &'static str) -> impl FnOnce(ProgramError) -> Self {
    move |source| RenderError::Program { name, source }
  }

  pub(crate) fn framebuffer(name: &'static str) -> impl FnOnce(FramebufferError) -> Self {
    move |source| RenderError::Framebuffer { name, source }
  }

  pub(crate) fn texture(name: &'static str) -> impl FnOnce(TextureError) -> Self {
    move |source| RenderError::Texture { name, source }
  }
}

impl fmt::Display for RenderError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      RenderError::Program { name, ref source } => {
        write!(f, "cannot build the {} program: {}", name, source)
      }

      RenderError::Framebuffer { name, ref source } => {
        write!(f, "cannot build the {} framebuffer: {}", name, source)
      }

      RenderError::Texture { name, ref source } => {
        write!(f, "cannot build the {} texture: {}", name, source)
      }

      RenderError::Tess(ref e) => write!(f, "cannot upload geometry: {}", e),

      RenderError::Mesh(ref e) => write!(f, "cannot use mesh: {}", e),

      RenderError::UnsupportedDepthPrecision(p) => {
        write!(f, "unsupported shadow map depth precision: {:?}", p)
      }

      RenderError::Disposed => f.write_str("renderer disposed"),
    }
  }
}

impl error::Error for RenderError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      RenderError::Program { source, .. } => Some(source),
      RenderError::Framebuffer { source, .. } => Some(source),
      RenderError::Texture { source, .. } => Some(source),
      RenderError::Tess(e) => Some(e),
      RenderError::Mesh(e) => Some(e),
      _ => None,
    }
  }
}

impl From<TessError> for RenderError {
  fn from(e: TessError) -> Self {
    RenderError::Tess(e)
  }
}

impl From<MeshError> for RenderError {
  fn from(e: MeshError) -> Self {
    RenderError::Mesh(e)
  }
}
