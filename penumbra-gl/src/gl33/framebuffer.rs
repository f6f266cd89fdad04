use gl::{self, types::*};
use std::cell::RefCell;
use std::rc::Rc;

use crate::gl33::state::GLState;
use crate::gl33::GL33;
use penumbra::backend::framebuffer::FramebufferBackend;
use penumbra::framebuffer::{FramebufferError, IncompleteReason};

pub struct Framebuffer {
  pub(crate) handle: GLuint,
  pub(crate) size: [u32; 2],
  state: Rc<RefCell<GLState>>,
}

impl Drop for Framebuffer {
  fn drop(&mut self) {
    // the back buffer belongs to the windowing system
    if self.handle == 0 {
      return;
    }

    unsafe {
      gl::DeleteFramebuffers(1, &self.handle);
    }

    if let Ok(mut state) = self.state.try_borrow_mut() {
      state.framebuffer_deleted(self.handle);
    }
  }
}

impl Framebuffer {
  unsafe fn bind(&self) {
    self.state.borrow_mut().bind_framebuffer(self.handle);
  }
}

unsafe impl FramebufferBackend for GL33 {
  type FramebufferRepr = Framebuffer;

  unsafe fn new_framebuffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    let mut handle: GLuint = 0;
    gl::GenFramebuffers(1, &mut handle);

    if handle == 0 {
      return Err(FramebufferError::CannotCreate(
        "no framebuffer name available".to_owned(),
      ));
    }

    let framebuffer = Framebuffer {
      handle,
      size,
      state: self.state.clone(),
    };

    framebuffer.bind();

    // until a color texture gets attached, there is nothing to draw into nor read from
    gl::DrawBuffer(gl::NONE);
    gl::ReadBuffer(gl::NONE);

    Ok(framebuffer)
  }

  unsafe fn attach_color_texture(
    framebuffer: &mut Self::FramebufferRepr,
    texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.bind();

    gl::FramebufferTexture2D(
      gl::FRAMEBUFFER,
      gl::COLOR_ATTACHMENT0,
      gl::TEXTURE_2D,
      texture.handle,
      0,
    );
    gl::DrawBuffer(gl::COLOR_ATTACHMENT0);
    gl::ReadBuffer(gl::COLOR_ATTACHMENT0);

    Ok(())
  }

  unsafe fn attach_depth_texture(
    framebuffer: &mut Self::FramebufferRepr,
    texture: &Self::TextureRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.bind();

    gl::FramebufferTexture2D(
      gl::FRAMEBUFFER,
      gl::DEPTH_ATTACHMENT,
      gl::TEXTURE_2D,
      texture.handle,
      0,
    );

    Ok(())
  }

  unsafe fn attach_depth_renderbuffer(
    framebuffer: &mut Self::FramebufferRepr,
    renderbuffer: &Self::RenderbufferRepr,
  ) -> Result<(), FramebufferError> {
    framebuffer.bind();

    gl::FramebufferRenderbuffer(
      gl::FRAMEBUFFER,
      gl::DEPTH_ATTACHMENT,
      gl::RENDERBUFFER,
      renderbuffer.handle,
    );

    Ok(())
  }

  unsafe fn validate_framebuffer(
    framebuffer: Self::FramebufferRepr,
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    framebuffer.bind();

    get_framebuffer_status().map(move |_| framebuffer)
  }

  unsafe fn back_buffer(
    &mut self,
    size: [u32; 2],
  ) -> Result<Self::FramebufferRepr, FramebufferError> {
    Ok(Framebuffer {
      handle: 0,
      size,
      state: self.state.clone(),
    })
  }
}

fn get_framebuffer_status() -> Result<(), FramebufferError> {
  let status = unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER) };

  incomplete_reason(status).map_or(Ok(()), Err)
}

/// Map a framebuffer status to an error, if the framebuffer is not complete.
fn incomplete_reason(status: GLenum) -> Option<FramebufferError> {
  let reason = match status {
    gl::FRAMEBUFFER_COMPLETE => return None,
    gl::FRAMEBUFFER_UNDEFINED => IncompleteReason::Undefined,
    gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => IncompleteReason::IncompleteAttachment,
    gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => IncompleteReason::MissingAttachment,
    gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => IncompleteReason::IncompleteDrawBuffer,
    gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => IncompleteReason::IncompleteReadBuffer,
    gl::FRAMEBUFFER_UNSUPPORTED => IncompleteReason::UnsupportedCombination,
    gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => IncompleteReason::IncompleteMultisample,
    gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => IncompleteReason::IncompleteLayerTargets,
    _ => {
      return Some(FramebufferError::CannotCreate(format!(
        "unknown OpenGL framebuffer status {:#x}",
        status
      )))
    }
  };

  Some(FramebufferError::Incomplete(reason))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn complete_status_is_not_an_error() {
    assert_eq!(incomplete_reason(gl::FRAMEBUFFER_COMPLETE), None);
  }

  #[test]
  fn unsupported_status_is_an_unsupported_combination() {
    assert_eq!(
      incomplete_reason(gl::FRAMEBUFFER_UNSUPPORTED),
      Some(FramebufferError::Incomplete(
        IncompleteReason::UnsupportedCombination
      ))
    );
  }

  #[test]
  fn unknown_status_is_reported() {
    assert!(matches!(
      incomplete_reason(0xdead),
      Some(FramebufferError::CannotCreate(_))
    ));
  }
}
