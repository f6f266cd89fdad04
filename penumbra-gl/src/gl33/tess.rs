use gl::{self, types::*};
use std::cell::RefCell;
use std::mem;
use std::os::raw::c_void;
use std::rc::Rc;

use crate::gl33::state::GLState;
use crate::gl33::GL33;
use penumbra::backend::tess::{TessBackend, TessDesc};
use penumbra::tess::{Mode, TessError};

pub struct Tess {
  vao: GLuint,
  vbo: GLuint,
  ibo: Option<GLuint>,
  mode: GLenum,
  render_count: usize,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Tess {
  fn drop(&mut self) {
    unsafe {
      if let Some(ibo) = self.ibo {
        gl::DeleteBuffers(1, &ibo);
      }

      gl::DeleteBuffers(1, &self.vbo);
      gl::DeleteVertexArrays(1, &self.vao);
    }

    if let Ok(mut state) = self.state.try_borrow_mut() {
      state.array_buffer_deleted(self.vbo);
      state.vertex_array_deleted(self.vao);
    }
  }
}

impl Tess {
  /// Bind the vertex array and draw it.
  pub(crate) unsafe fn render(&self) {
    self.state.borrow_mut().bind_vertex_array(self.vao);

    let count = self.render_count as GLsizei;

    if self.ibo.is_some() {
      gl::DrawElements(self.mode, count, gl::UNSIGNED_INT, std::ptr::null());
    } else {
      gl::DrawArrays(self.mode, 0, count);
    }
  }
}

fn opengl_mode(mode: Mode) -> GLenum {
  match mode {
    Mode::Triangle => gl::TRIANGLES,
    Mode::TriangleStrip => gl::TRIANGLE_STRIP,
    Mode::TriangleFan => gl::TRIANGLE_FAN,
  }
}

unsafe impl TessBackend for GL33 {
  type TessRepr = Tess;

  unsafe fn new_tess(&mut self, desc: TessDesc<'_>) -> Result<Self::TessRepr, TessError> {
    if desc.vertices.len() != desc.stride * desc.vertex_count {
      return Err(TessError::CannotCreate(format!(
        "{} vertex bytes for {} vertices of {} bytes",
        desc.vertices.len(),
        desc.vertex_count,
        desc.stride
      )));
    }

    let mut vao: GLuint = 0;
    let mut vbo: GLuint = 0;
    gl::GenVertexArrays(1, &mut vao);
    gl::GenBuffers(1, &mut vbo);

    let mut tess = Tess {
      vao,
      vbo,
      ibo: None,
      mode: opengl_mode(desc.mode),
      render_count: desc.indices.map_or(desc.vertex_count, <[u32]>::len),
      state: self.state.clone(),
    };

    {
      let mut state = self.state.borrow_mut();
      state.bind_vertex_array(vao);
      state.bind_array_buffer(vbo);
    }

    gl::BufferData(
      gl::ARRAY_BUFFER,
      desc.vertices.len() as GLsizeiptr,
      desc.vertices.as_ptr() as *const c_void,
      gl::STATIC_DRAW,
    );

    for attrib in desc.attribs {
      gl::EnableVertexAttribArray(attrib.index);
      gl::VertexAttribPointer(
        attrib.index,
        attrib.components as GLint,
        gl::FLOAT,
        gl::FALSE,
        desc.stride as GLsizei,
        attrib.offset as *const c_void,
      );
    }

    if let Some(indices) = desc.indices {
      let mut ibo: GLuint = 0;
      gl::GenBuffers(1, &mut ibo);

      // the element buffer binding is part of the vertex array state
      gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ibo);
      gl::BufferData(
        gl::ELEMENT_ARRAY_BUFFER,
        (indices.len() * mem::size_of::<u32>()) as GLsizeiptr,
        indices.as_ptr() as *const c_void,
        gl::STATIC_DRAW,
      );

      tess.ibo = Some(ibo);
    }

    self.state.borrow_mut().bind_vertex_array(0);

    log::trace!(
      "tessellation {} created: {} vertices, {} rendered",
      vao,
      desc.vertex_count,
      tess.render_count
    );

    Ok(tess)
  }
}
