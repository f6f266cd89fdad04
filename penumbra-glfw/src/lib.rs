//! [GLFW](https://crates.io/crates/glfw) backend for penumbra.

#![deny(missing_docs)]

use glfw::{Context as _, Glfw, GlfwReceiver, InitError, PWindow, WindowEvent, WindowMode};
use penumbra::context::GraphicsContext;
use penumbra::framebuffer::{Framebuffer, FramebufferError};
pub use penumbra_gl::gl33::StateQueryError;
use penumbra_gl::GL33;
use std::{error, fmt, os::raw::c_void};

/// Error raised while opening a [`GlfwSurface`].
#[non_exhaustive]
#[derive(Debug)]
pub enum GlfwSurfaceError {
  /// GLFW itself could not be initialized.
  InitError(InitError),

  /// The window (and its OpenGL 3.3 core context) could not be created.
  WindowCreationFailed,

  /// The OpenGL state could not be taken, typically because another surface already lives on
  /// this thread.
  GraphicsStateError(StateQueryError),
}

impl fmt::Display for GlfwSurfaceError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      GlfwSurfaceError::InitError(ref e) => write!(f, "cannot initialize GLFW: {}", e),
      GlfwSurfaceError::WindowCreationFailed => f.write_str("failed to create window"),
      GlfwSurfaceError::GraphicsStateError(ref e) => {
        write!(f, "cannot take the OpenGL state: {}", e)
      }
    }
  }
}

impl From<InitError> for GlfwSurfaceError {
  fn from(e: InitError) -> Self {
    GlfwSurfaceError::InitError(e)
  }
}

impl error::Error for GlfwSurfaceError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      GlfwSurfaceError::InitError(e) => Some(e),
      GlfwSurfaceError::WindowCreationFailed => None,
      GlfwSurfaceError::GraphicsStateError(e) => Some(e),
    }
  }
}

/// A window with an OpenGL 3.3 context.
///
/// Events are read from `events_rx` after polling; rendering goes through `context`.
pub struct GlfwSurface {
  /// Window events, filled by `poll_events`.
  pub events_rx: GlfwReceiver<(f64, WindowEvent)>,

  /// Graphics context of the window.
  pub context: GL33Context,
}

impl GlfwSurface {
  /// Initialize GLFW and open a window with an OpenGL 3.3 core context.
  ///
  /// `create_window` is handed the GLFW instance, with the OpenGL hints already set, and must
  /// return the window.
  pub fn new(
    create_window: impl FnOnce(&mut Glfw) -> Option<(PWindow, GlfwReceiver<(f64, WindowEvent)>)>,
  ) -> Result<Self, GlfwSurfaceError> {
    #[cfg(feature = "log-errors")]
    let error_cbk = glfw::log_errors;
    #[cfg(not(feature = "log-errors"))]
    let error_cbk = glfw::fail_on_errors;

    let mut glfw = glfw::init(error_cbk)?;

    // OpenGL hints
    glfw.window_hint(glfw::WindowHint::OpenGlProfile(
      glfw::OpenGlProfileHint::Core,
    ));
    glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
    glfw.window_hint(glfw::WindowHint::ContextVersionMajor(3));
    glfw.window_hint(glfw::WindowHint::ContextVersionMinor(3));

    let (mut window, events_rx) =
      create_window(&mut glfw).ok_or(GlfwSurfaceError::WindowCreationFailed)?;
    window.make_current();

    // init OpenGL
    gl::load_with(|s| window.get_proc_address(s) as *const c_void);

    let gl = GL33::new().map_err(GlfwSurfaceError::GraphicsStateError)?;
    let context = GL33Context { window, gl };
    let surface = GlfwSurface { events_rx, context };

    Ok(surface)
  }

  /// Open a regular window with all of its events polled.
  pub fn new_windowed(
    width: u32,
    height: u32,
    title: &str,
  ) -> Result<Self, GlfwSurfaceError> {
    let surface = Self::new(|glfw| {
      let (mut window, events) = glfw.create_window(width, height, title, WindowMode::Windowed)?;
      window.set_all_polling(true);
      Some((window, events))
    })?;

    log::info!("{}×{} window opened", width, height);
    Ok(surface)
  }
}

/// Graphics context driving the [`GL33`] backend of a GLFW window.
pub struct GL33Context {
  /// The window, for input settings and buffer swaps.
  pub window: PWindow,

  /// OpenGL 3.3 state.
  gl: GL33,
}

impl GL33Context {
  /// Get the back buffer, sized after the current framebuffer size of the window.
  pub fn back_buffer(&mut self) -> Result<Framebuffer<GL33>, FramebufferError> {
    let (w, h) = self.window.get_framebuffer_size();
    Framebuffer::back_buffer(self, [w.max(0) as u32, h.max(0) as u32])
  }
}

unsafe impl GraphicsContext for GL33Context {
  type Backend = GL33;

  fn backend(&mut self) -> &mut Self::Backend {
    &mut self.gl
  }
}
