use gl::{self, types::*};

use crate::gl33::GL33;
use penumbra::backend::pipeline::PipelineBackend;
use penumbra::pipeline::RenderState;

unsafe impl PipelineBackend for GL33 {
  unsafe fn bind_framebuffer(&mut self, framebuffer: &Self::FramebufferRepr, viewport: [u32; 4]) {
    let mut state = self.state.borrow_mut();

    state.bind_framebuffer(framebuffer.handle);
    state.set_viewport([
      viewport[0] as GLint,
      viewport[1] as GLint,
      viewport[2] as GLint,
      viewport[3] as GLint,
    ]);
  }

  unsafe fn clear(&mut self, color: Option<[f32; 4]>, depth: Option<f32>) {
    let mut state = self.state.borrow_mut();
    let mut bits = 0;

    if let Some(color) = color {
      state.set_clear_color(color);
      bits |= gl::COLOR_BUFFER_BIT;
    }

    if let Some(depth) = depth {
      // a previous render state might have disabled depth writes, which masks clears too
      state.set_depth_write(true);
      state.set_clear_depth(depth);
      bits |= gl::DEPTH_BUFFER_BIT;
    }

    if bits != 0 {
      gl::Clear(bits);
    }
  }

  unsafe fn use_program(&mut self, program: &Self::ProgramRepr) {
    self.state.borrow_mut().use_program(program.handle);
  }

  unsafe fn bind_texture(&mut self, unit: u32, texture: &Self::TextureRepr) {
    self.state.borrow_mut().bind_texture(unit, texture.handle);
  }

  unsafe fn set_render_state(&mut self, render_state: &RenderState) {
    let mut state = self.state.borrow_mut();

    state.set_depth_test(render_state.depth_test);
    state.set_depth_write(render_state.depth_write);
  }

  unsafe fn render_tess(&mut self, tess: &Self::TessRepr) {
    tess.render();
  }
}
