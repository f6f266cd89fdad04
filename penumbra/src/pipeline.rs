//! Graphics pipelines.
//!
//! A pipeline is opened on a framebuffer with [`GraphicsContext::pipeline`]: the framebuffer gets
//! bound, the viewport set and the buffers cleared as described by a [`PipelineState`]. Shading
//! then happens by entering a [`Program`] with [`Pipeline::shade`], which yields a
//! [`ProgramInterface`] to update uniforms, bind textures and render tessellations.
//!
//! [`GraphicsContext::pipeline`]: crate::context::GraphicsContext::pipeline

use crate::backend::pipeline::PipelineBackend;
use crate::shader::{Program, UniformValue};
use crate::tess::Tess;
use crate::texture::Texture;

/// The viewport being part of the [`PipelineState`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Viewport {
  /// The whole viewport is used. The position and dimension of the viewport rectangle are
  /// extracted from the framebuffer.
  Whole,
  /// The viewport is specific and the rectangle area is user-defined.
  Specific {
    /// The lower position on the X axis to start the viewport rectangle at.
    x: u32,
    /// The lower position on the Y axis to start the viewport rectangle at.
    y: u32,
    /// The width of the viewport.
    width: u32,
    /// The height of the viewport.
    height: u32,
  },
}

impl Viewport {
  /// Resolve the viewport rectangle (`[x, y, width, height]`) for a framebuffer of a given size.
  pub fn resolve(self, framebuffer_size: [u32; 2]) -> [u32; 4] {
    match self {
      Viewport::Whole => [0, 0, framebuffer_size[0], framebuffer_size[1]],
      Viewport::Specific {
        x,
        y,
        width,
        height,
      } => [x, y, width, height],
    }
  }
}

impl Default for Viewport {
  fn default() -> Self {
    Viewport::Whole
  }
}

/// Various customization options for pipelines.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineState {
  /// Color to clear the color buffer with, if any.
  pub clear_color: Option<[f32; 4]>,
  /// Depth to clear the depth buffer with, if any.
  pub clear_depth: Option<f32>,
  /// Viewport to use when rendering.
  pub viewport: Viewport,
}

impl Default for PipelineState {
  /// Default [`PipelineState`]:
  ///
  /// - Clear color is `Some([0., 0., 0., 1.])`.
  /// - Clear depth is `Some(1.)`.
  /// - The viewport uses the whole framebuffer’s.
  fn default() -> Self {
    PipelineState {
      clear_color: Some([0., 0., 0., 1.]),
      clear_depth: Some(1.),
      viewport: Viewport::Whole,
    }
  }
}

impl PipelineState {
  /// Create a default [`PipelineState`].
  ///
  /// See the documentation of the [`Default`] for further details.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the clear color. [`None`] leaves the color buffer untouched.
  pub fn set_clear_color(self, clear_color: Option<[f32; 4]>) -> Self {
    Self {
      clear_color,
      ..self
    }
  }

  /// Set the clear depth. [`None`] leaves the depth buffer untouched.
  pub fn set_clear_depth(self, clear_depth: Option<f32>) -> Self {
    Self {
      clear_depth,
      ..self
    }
  }

  /// Set the viewport.
  pub fn set_viewport(self, viewport: Viewport) -> Self {
    Self { viewport, ..self }
  }
}

/// Per-draw render state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RenderState {
  /// Whether fragments are depth-tested (less-than comparison).
  pub depth_test: bool,
  /// Whether fragments write their depth.
  pub depth_write: bool,
}

impl Default for RenderState {
  /// Depth test and depth writes enabled.
  fn default() -> Self {
    RenderState {
      depth_test: true,
      depth_write: true,
    }
  }
}

impl RenderState {
  /// Enable or disable the depth test.
  pub fn set_depth_test(self, depth_test: bool) -> Self {
    Self { depth_test, ..self }
  }

  /// Enable or disable depth writes.
  pub fn set_depth_write(self, depth_write: bool) -> Self {
    Self {
      depth_write,
      ..self
    }
  }
}

/// A pipeline opened on a framebuffer.
pub struct Pipeline<'a, B>
where
  B: PipelineBackend,
{
  backend: &'a mut B,
  viewport: [u32; 4],
}

impl<'a, B> Pipeline<'a, B>
where
  B: PipelineBackend,
{
  pub(crate) fn new(backend: &'a mut B, viewport: [u32; 4]) -> Self {
    Pipeline { backend, viewport }
  }

  /// Viewport rectangle (`[x, y, width, height]`) the pipeline renders into.
  pub fn viewport(&self) -> [u32; 4] {
    self.viewport
  }

  /// Enter a shader program.
  ///
  /// The program is in use for as long as the returned interface lives.
  pub fn shade<'b>(&'b mut self, program: &'b mut Program<B>) -> ProgramInterface<'b, B> {
    unsafe { self.backend.use_program(&program.repr) };

    ProgramInterface {
      backend: &mut *self.backend,
      program,
    }
  }
}

/// A program in use in a [`Pipeline`].
pub struct ProgramInterface<'a, B>
where
  B: PipelineBackend,
{
  backend: &'a mut B,
  program: &'a mut Program<B>,
}

impl<'a, B> ProgramInterface<'a, B>
where
  B: PipelineBackend,
{
  /// Update a uniform.
  ///
  /// Updating a uniform the program doesn’t have (or that was optimized away) does nothing.
  /// Returns whether the uniform was active.
  pub fn set<V>(&mut self, name: &str, value: V) -> bool
  where
    V: Into<UniformValue>,
  {
    self.program.update(name, &value.into())
  }

  /// Bind a texture to a texture unit and point a `sampler2D` uniform at it.
  pub fn bind_texture(&mut self, name: &str, unit: u32, texture: &Texture<B>) {
    unsafe { self.backend.bind_texture(unit, &texture.repr) };
    self.program.update(name, &UniformValue::Int(unit as i32));
  }

  /// Render a tessellation with a given render state.
  pub fn render(&mut self, state: &RenderState, tess: &Tess<B>) {
    unsafe {
      self.backend.set_render_state(state);
      self.backend.render_tess(&tess.repr);
    }
  }
}
