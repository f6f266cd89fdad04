//! Graphics context.
//!
//! # Graphics context and backends
//!
//! A graphics context is an external type typically implemented by other crates and which
//! provides support for backends. Its main scope is to unify all possible implementations of
//! backends behind a single trait: [`GraphicsContext`]. A [`GraphicsContext`] really only
//! requires two items to be implemented:
//!
//! - The type of the backend to use, [`GraphicsContext::Backend`]. That type will often be used
//!   to access the GPU, cache costly operations, etc.
//! - A method to get a mutable access to the underlying backend, [`GraphicsContext::backend`].
//!
//! Most of the time, if you want to work with _any_ windowing implementation, you will want to
//! use a type variable such as `C: GraphicsContext`.
//!
//! The rest of the trait is made of provided methods: resource factories and pipeline helpers.
//! Resources are owned by whoever created them and released when dropped.

use crate::backend::pipeline::PipelineBackend;
use crate::backend::Backend;
use crate::framebuffer::{DepthAttachment, Framebuffer, FramebufferError};
use crate::pipeline::{Pipeline, PipelineState, Viewport};
use crate::pixel::{DepthPrecision, PixelFormat};
use crate::shader::{Program, ProgramError};
use crate::tess::{Mode, Tess, TessError, Vertex};
use crate::texture::{Renderbuffer, Sampler, Texture, TextureError};

/// Class of graphics context.
///
/// Graphics context must implement this trait to be able to be used throughout the rest of the
/// crate.
///
/// # Safety
///
/// A context must hand out a backend bound to a current, valid graphics state. Two contexts must
/// never share the same backend state.
pub unsafe trait GraphicsContext: Sized {
  /// Internal type used by the backend to cache, optimize and store data. This roughly represents
  /// the GPU data / context a backend implementation needs to work correctly.
  type Backend: Backend;

  /// Access the underlying backend.
  fn backend(&mut self) -> &mut Self::Backend;

  /// Create a new RGBA8 color texture, usable as a color attachment and sampled linearly.
  fn new_color_texture(&mut self, size: [u32; 2]) -> Result<Texture<Self::Backend>, TextureError> {
    Texture::new(self, size, PixelFormat::RGBA8, Sampler::default())
  }

  /// Create a new depth texture, usable as a depth attachment and sampled later on.
  fn new_depth_texture(
    &mut self,
    size: [u32; 2],
    precision: DepthPrecision,
  ) -> Result<Texture<Self::Backend>, TextureError> {
    Texture::new(
      self,
      size,
      precision.pixel_format(),
      Sampler::depth_target(),
    )
  }

  /// Create a new depth renderbuffer, usable as a depth attachment that is never sampled.
  fn new_depth_renderbuffer(
    &mut self,
    size: [u32; 2],
    precision: DepthPrecision,
  ) -> Result<Renderbuffer<Self::Backend>, TextureError> {
    Renderbuffer::new(self, size, precision.pixel_format())
  }

  /// Create a new framebuffer out of its attachments.
  ///
  /// See [`Framebuffer::new`].
  fn new_framebuffer(
    &mut self,
    color: Option<Texture<Self::Backend>>,
    depth: Option<DepthAttachment<Self::Backend>>,
  ) -> Result<Framebuffer<Self::Backend>, FramebufferError> {
    Framebuffer::new(self, color, depth)
  }

  /// Compile and link a new shader program.
  fn new_shader_program(
    &mut self,
    vertex: &str,
    fragment: &str,
  ) -> Result<Program<Self::Backend>, ProgramError> {
    Program::from_sources(self, vertex, fragment)
  }

  /// Create a new tessellation.
  fn new_tess<V>(
    &mut self,
    vertices: &[V],
    indices: Option<&[u32]>,
    mode: Mode,
  ) -> Result<Tess<Self::Backend>, TessError>
  where
    V: Vertex,
  {
    Tess::new(self, vertices, indices, mode)
  }

  /// Get the back buffer of the display.
  fn back_buffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Framebuffer<Self::Backend>, FramebufferError> {
    Framebuffer::back_buffer(self, size)
  }

  /// Open a pipeline on a framebuffer.
  ///
  /// The framebuffer is bound, the viewport set and the buffers cleared according to `state`
  /// before `f` is called.
  fn pipeline<F, R>(
    &mut self,
    framebuffer: &Framebuffer<Self::Backend>,
    state: &PipelineState,
    f: F,
  ) -> R
  where
    F: FnOnce(Pipeline<'_, Self::Backend>) -> R,
  {
    let viewport = state.viewport.resolve(framebuffer.size());
    let backend = self.backend();

    unsafe {
      backend.bind_framebuffer(&framebuffer.repr, viewport);
      backend.clear(state.clear_color, state.clear_depth);
    }

    f(Pipeline::new(backend, viewport))
  }

  /// Rebind the display framebuffer with a viewport covering all of it.
  ///
  /// Offscreen passes change the bound framebuffer and viewport; this puts both back.
  fn restore_display(&mut self, back_buffer: &Framebuffer<Self::Backend>) {
    let viewport = Viewport::Whole.resolve(back_buffer.size());
    unsafe { self.backend().bind_framebuffer(&back_buffer.repr, viewport) };
  }
}
