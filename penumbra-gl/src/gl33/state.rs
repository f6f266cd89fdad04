//! OpenGL state cache.
//!
//! Every bind and every fixed-function setting the backend needs goes through [`GLState`], which
//! remembers what the driver was last told and drops redundant calls. The cache starts from what
//! the context reports when the backend is created.

use gl::types::*;
use std::cell::Cell;
use std::error;
use std::fmt;
use std::marker::PhantomData;

// Texture units every OpenGL 3.3 implementation must provide to the fragment stage.
const MIN_TEXTURE_UNITS: usize = 16;

thread_local!(static STATE_TAKEN: Cell<bool> = Cell::new(false));

/// Last value sent to the driver, if known.
#[derive(Debug)]
struct Cached<T>(Option<T>);

impl<T> Cached<T>
where
  T: Copy + PartialEq,
{
  fn new(value: T) -> Self {
    Cached(Some(value))
  }

  /// Record `value`; returns `true` if the driver must be told about it.
  fn update(&mut self, value: T) -> bool {
    if self.0 == Some(value) {
      false
    } else {
      self.0 = Some(value);
      true
    }
  }

  fn forget(&mut self) {
    self.0 = None;
  }

  /// Reset to `fallback` if the cached value is `value`.
  fn replace_if(&mut self, value: T, fallback: T) {
    if self.0 == Some(value) {
      self.0 = Some(fallback);
    }
  }
}

/// Cached OpenGL state of the current context.
///
/// There is at most one per thread. It is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct GLState {
  _not_send: PhantomData<*const ()>,
  viewport: Cached<[GLint; 4]>,
  clear_color: Cached<[GLfloat; 4]>,
  clear_depth: Cached<GLfloat>,
  depth_test: Cached<bool>,
  depth_write: Cached<bool>,
  active_unit: Cached<u32>,
  // 2D texture bound to each unit
  unit_textures: Vec<Cached<GLuint>>,
  framebuffer: Cached<GLuint>,
  vertex_array: Cached<GLuint>,
  array_buffer: Cached<GLuint>,
  program: Cached<GLuint>,
}

impl GLState {
  /// Take the state of the context current on this thread.
  ///
  /// Fails with [`StateQueryError::UnavailableGLState`] if it was already taken.
  pub(crate) fn new() -> Result<Self, StateQueryError> {
    if STATE_TAKEN.with(|taken| taken.replace(true)) {
      return Err(StateQueryError::UnavailableGLState);
    }

    unsafe { Self::query() }
  }

  unsafe fn query() -> Result<Self, StateQueryError> {
    let mut viewport = [0; 4];
    gl::GetIntegerv(gl::VIEWPORT, viewport.as_mut_ptr());

    let mut clear_color = [0.; 4];
    gl::GetFloatv(gl::COLOR_CLEAR_VALUE, clear_color.as_mut_ptr());

    let mut clear_depth = 1.;
    gl::GetFloatv(gl::DEPTH_CLEAR_VALUE, &mut clear_depth);

    let depth_test = as_bool("depth test", gl::IsEnabled(gl::DEPTH_TEST))?;

    let mut depth_write = gl::TRUE;
    gl::GetBooleanv(gl::DEPTH_WRITEMASK, &mut depth_write);
    let depth_write = as_bool("depth write", depth_write)?;

    let active_unit = get_integer(gl::ACTIVE_TEXTURE) as GLenum - gl::TEXTURE0;

    // depth tests always keep the closest fragment
    gl::DepthFunc(gl::LESS);

    Ok(GLState {
      _not_send: PhantomData,
      viewport: Cached::new(viewport),
      clear_color: Cached::new(clear_color),
      clear_depth: Cached::new(clear_depth),
      depth_test: Cached::new(depth_test),
      depth_write: Cached::new(depth_write),
      active_unit: Cached::new(active_unit),
      unit_textures: (0..MIN_TEXTURE_UNITS).map(|_| Cached(None)).collect(),
      framebuffer: Cached::new(get_integer(gl::DRAW_FRAMEBUFFER_BINDING) as GLuint),
      vertex_array: Cached::new(get_integer(gl::VERTEX_ARRAY_BINDING) as GLuint),
      array_buffer: Cached::new(get_integer(gl::ARRAY_BUFFER_BINDING) as GLuint),
      program: Cached::new(get_integer(gl::CURRENT_PROGRAM) as GLuint),
    })
  }

  /// Forget every cached value.
  ///
  /// Call this after touching the OpenGL state without going through the backend; the next
  /// binds and settings will all reach the driver.
  pub fn invalidate(&mut self) {
    self.viewport.forget();
    self.clear_color.forget();
    self.clear_depth.forget();
    self.depth_test.forget();
    self.depth_write.forget();
    self.active_unit.forget();
    self.unit_textures.iter_mut().for_each(Cached::forget);
    self.framebuffer.forget();
    self.vertex_array.forget();
    self.array_buffer.forget();
    self.program.forget();
  }

  pub(crate) unsafe fn set_viewport(&mut self, [x, y, w, h]: [GLint; 4]) {
    if self.viewport.update([x, y, w, h]) {
      gl::Viewport(x, y, w, h);
    }
  }

  pub(crate) unsafe fn set_clear_color(&mut self, [r, g, b, a]: [GLfloat; 4]) {
    if self.clear_color.update([r, g, b, a]) {
      gl::ClearColor(r, g, b, a);
    }
  }

  pub(crate) unsafe fn set_clear_depth(&mut self, depth: GLfloat) {
    if self.clear_depth.update(depth) {
      gl::ClearDepth(depth as GLdouble);
    }
  }

  pub(crate) unsafe fn set_depth_test(&mut self, enabled: bool) {
    if self.depth_test.update(enabled) {
      if enabled {
        gl::Enable(gl::DEPTH_TEST);
      } else {
        gl::Disable(gl::DEPTH_TEST);
      }
    }
  }

  pub(crate) unsafe fn set_depth_write(&mut self, enabled: bool) {
    if self.depth_write.update(enabled) {
      gl::DepthMask(if enabled { gl::TRUE } else { gl::FALSE });
    }
  }

  /// Bind a 2D texture to a texture unit, making that unit the active one.
  pub(crate) unsafe fn bind_texture(&mut self, unit: u32, handle: GLuint) {
    if self.active_unit.update(unit) {
      gl::ActiveTexture(gl::TEXTURE0 + unit);
    }

    let index = unit as usize;
    if index >= self.unit_textures.len() {
      self.unit_textures.resize_with(index + 1, || Cached(None));
    }

    if self.unit_textures[index].update(handle) {
      gl::BindTexture(gl::TEXTURE_2D, handle);
    }
  }

  /// A deleted texture is unbound from every unit it was bound to.
  pub(crate) fn texture_deleted(&mut self, handle: GLuint) {
    for bound in &mut self.unit_textures {
      bound.replace_if(handle, 0);
    }
  }

  pub(crate) unsafe fn bind_framebuffer(&mut self, handle: GLuint) {
    if self.framebuffer.update(handle) {
      gl::BindFramebuffer(gl::FRAMEBUFFER, handle);
    }
  }

  /// Deleting the bound framebuffer makes OpenGL fall back to the display.
  pub(crate) fn framebuffer_deleted(&mut self, handle: GLuint) {
    self.framebuffer.replace_if(handle, 0);
  }

  pub(crate) unsafe fn bind_vertex_array(&mut self, handle: GLuint) {
    if self.vertex_array.update(handle) {
      gl::BindVertexArray(handle);
    }
  }

  pub(crate) fn vertex_array_deleted(&mut self, handle: GLuint) {
    self.vertex_array.replace_if(handle, 0);
  }

  pub(crate) unsafe fn bind_array_buffer(&mut self, handle: GLuint) {
    if self.array_buffer.update(handle) {
      gl::BindBuffer(gl::ARRAY_BUFFER, handle);
    }
  }

  pub(crate) fn array_buffer_deleted(&mut self, handle: GLuint) {
    self.array_buffer.replace_if(handle, 0);
  }

  pub(crate) unsafe fn use_program(&mut self, handle: GLuint) {
    if self.program.update(handle) {
      gl::UseProgram(handle);
    }
  }

  pub(crate) fn program_deleted(&mut self, handle: GLuint) {
    self.program.replace_if(handle, 0);
  }
}

/// Error raised while taking the OpenGL state.
#[non_exhaustive]
#[derive(Debug)]
pub enum StateQueryError {
  /// The state of this thread’s context was already taken by another backend.
  UnavailableGLState,
  /// The driver answered something else than `GL_TRUE` or `GL_FALSE` for a boolean setting.
  UnknownBooleanState(&'static str, GLboolean),
}

impl fmt::Display for StateQueryError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      StateQueryError::UnavailableGLState => {
        f.write_str("OpenGL state already in use on this thread")
      }
      StateQueryError::UnknownBooleanState(what, value) => {
        write!(f, "unknown {} state: {}", what, value)
      }
    }
  }
}

impl error::Error for StateQueryError {}

unsafe fn get_integer(pname: GLenum) -> GLint {
  let mut value = 0;
  gl::GetIntegerv(pname, &mut value);
  value
}

fn as_bool(what: &'static str, value: GLboolean) -> Result<bool, StateQueryError> {
  match value {
    gl::TRUE => Ok(true),
    gl::FALSE => Ok(false),
    _ => Err(StateQueryError::UnknownBooleanState(what, value)),
  }
}
