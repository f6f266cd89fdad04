//! Pipeline backend interface.
//!
//! This interface defines the low-level API pipelines must implement to be usable. Pipelines are
//! the only way to issue draw calls.

use crate::backend::framebuffer::FramebufferBackend;
use crate::backend::shader::ShaderBackend;
use crate::backend::tess::TessBackend;
use crate::pipeline::RenderState;

/// Render pipeline support.
pub unsafe trait PipelineBackend: FramebufferBackend + ShaderBackend + TessBackend {
  /// Bind a framebuffer for drawing and set the viewport (`[x, y, width, height]`, in pixels).
  unsafe fn bind_framebuffer(&mut self, framebuffer: &Self::FramebufferRepr, viewport: [u32; 4]);

  /// Clear the currently bound framebuffer.
  ///
  /// [`None`] leaves the corresponding buffer untouched. Clearing depth must happen even if depth
  /// writes were disabled by a previous render state.
  unsafe fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>);

  /// Use a program for the next draw calls.
  unsafe fn use_program(&mut self, program: &Self::ProgramRepr);

  /// Bind a texture to a texture unit.
  unsafe fn bind_texture(&mut self, unit: u32, texture: &Self::TextureRepr);

  /// Apply a render state.
  unsafe fn set_render_state(&mut self, state: &RenderState);

  /// Draw a tessellation with the current program, textures and render state.
  unsafe fn render_tess(&mut self, tess: &Self::TessRepr);
}
