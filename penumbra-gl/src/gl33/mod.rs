//! OpenGL 3.3 backend.
//!
//! This module implements an OpenGL 3.3 backend for penumbra. The backend type is [`GL33`].

mod framebuffer;
mod pipeline;
mod shader;
mod state;
mod tess;
mod texture;

pub use self::state::{GLState, StateQueryError};
use std::cell::RefCell;
use std::rc::Rc;

/// An OpenGL 3.3 backend.
///
/// This type is to be used as a penumbra backend type. It implements every backend trait.
#[derive(Debug)]
pub struct GL33 {
  pub(crate) state: Rc<RefCell<GLState>>,
}

impl GL33 {
  /// Create a new OpenGL 3.3 backend.
  ///
  /// Only one backend can exist per thread.
  pub fn new() -> Result<Self, StateQueryError> {
    GLState::new().map(|state| GL33 {
      state: Rc::new(RefCell::new(state)),
    })
  }

  /// Internal access to the backend state.
  ///
  /// # Safety
  ///
  /// This method exposes the internals of the backend. Changing the OpenGL state behind its back
  /// must be followed by invalidating the matching cached values.
  pub unsafe fn state(&self) -> &Rc<RefCell<GLState>> {
    &self.state
  }
}
