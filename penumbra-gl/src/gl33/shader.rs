use gl::{self, types::*};
use std::cell::RefCell;
use std::ffi::CString;
use std::ptr::{null, null_mut};
use std::rc::Rc;

use crate::gl33::state::GLState;
use crate::gl33::GL33;
use penumbra::backend::shader::ShaderBackend;
use penumbra::shader::{ProgramError, StageError, StageType, UniformValue};

#[derive(Debug)]
pub struct Stage {
  handle: GLuint,
}

impl Drop for Stage {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteShader(self.handle);
    }
  }
}

#[derive(Debug)]
pub struct Program {
  pub(crate) handle: GLuint,
  state: Rc<RefCell<GLState>>,
}

impl Drop for Program {
  fn drop(&mut self) {
    unsafe {
      gl::DeleteProgram(self.handle);
    }

    if let Ok(mut state) = self.state.try_borrow_mut() {
      state.program_deleted(self.handle);
    }
  }
}

impl Program {
  fn link(&self) -> Result<(), ProgramError> {
    let handle = self.handle;

    unsafe {
      gl::LinkProgram(handle);

      let mut linked: GLint = gl::FALSE.into();
      gl::GetProgramiv(handle, gl::LINK_STATUS, &mut linked);

      if linked == gl::TRUE.into() {
        Ok(())
      } else {
        let mut log_len: GLint = 0;
        gl::GetProgramiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

        let mut log: Vec<u8> = vec![0; log_len.max(0) as usize];
        gl::GetProgramInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

        Err(ProgramError::LinkFailed(info_log(log)))
      }
    }
  }
}

/// Turn a raw, NUL-terminated info log into a string.
fn info_log(mut log: Vec<u8>) -> String {
  if let Some(nul) = log.iter().position(|&b| b == 0) {
    log.truncate(nul);
  }

  String::from_utf8_lossy(&log).trim_end().to_owned()
}

fn opengl_shader_type(ty: StageType) -> GLenum {
  match ty {
    StageType::VertexShader => gl::VERTEX_SHADER,
    StageType::FragmentShader => gl::FRAGMENT_SHADER,
  }
}

unsafe impl ShaderBackend for GL33 {
  type StageRepr = Stage;
  type ProgramRepr = Program;
  type UniformRepr = GLint;

  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError> {
    let c_src = CString::new(src.as_bytes()).map_err(|e| {
      StageError::CompilationFailed(ty, format!("NUL byte at offset {}", e.nul_position()))
    })?;

    let handle = gl::CreateShader(opengl_shader_type(ty));

    if handle == 0 {
      return Err(StageError::UnsupportedType(ty));
    }

    gl::ShaderSource(handle, 1, [c_src.as_ptr()].as_ptr(), null());
    gl::CompileShader(handle);

    let mut compiled: GLint = gl::FALSE.into();
    gl::GetShaderiv(handle, gl::COMPILE_STATUS, &mut compiled);

    if compiled == gl::TRUE.into() {
      Ok(Stage { handle })
    } else {
      let mut log_len: GLint = 0;
      gl::GetShaderiv(handle, gl::INFO_LOG_LENGTH, &mut log_len);

      let mut log: Vec<u8> = vec![0; log_len.max(0) as usize];
      gl::GetShaderInfoLog(handle, log_len, null_mut(), log.as_mut_ptr() as *mut GLchar);

      gl::DeleteShader(handle);

      Err(StageError::CompilationFailed(ty, info_log(log)))
    }
  }

  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError> {
    let handle = gl::CreateProgram();

    if handle == 0 {
      return Err(ProgramError::CreationFailed(
        "no program name available".to_owned(),
      ));
    }

    let program = Program {
      handle,
      state: self.state.clone(),
    };

    gl::AttachShader(handle, vertex.handle);
    gl::AttachShader(handle, fragment.handle);

    let linked = program.link();

    // stages can go away once linked
    gl::DetachShader(handle, vertex.handle);
    gl::DetachShader(handle, fragment.handle);

    linked.map(move |_| program)
  }

  unsafe fn uniform_location(program: &Self::ProgramRepr, name: &str) -> Option<Self::UniformRepr> {
    let c_name = CString::new(name.as_bytes()).ok()?;
    let location = gl::GetUniformLocation(program.handle, c_name.as_ptr() as *const GLchar);

    if location < 0 {
      None
    } else {
      Some(location)
    }
  }

  unsafe fn set_uniform(
    _: &mut Self::ProgramRepr,
    uniform: &Self::UniformRepr,
    value: &UniformValue,
  ) {
    let location = *uniform;

    match *value {
      UniformValue::Float(x) => gl::Uniform1f(location, x),
      UniformValue::Int(x) => gl::Uniform1i(location, x),
      UniformValue::Bool(x) => gl::Uniform1i(location, x as GLint),
      UniformValue::Vec2(v) => gl::Uniform2fv(location, 1, v.as_ptr()),
      UniformValue::Vec3(v) => gl::Uniform3fv(location, 1, v.as_ptr()),
      UniformValue::Mat3(ref m) => {
        gl::UniformMatrix3fv(location, 1, gl::FALSE, m.as_ptr() as *const GLfloat)
      }
      UniformValue::Mat4(ref m) => {
        gl::UniformMatrix4fv(location, 1, gl::FALSE, m.as_ptr() as *const GLfloat)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn info_log_stops_at_nul() {
    let log = b"0:12(3): error: syntax error\n\0garbage".to_vec();
    assert_eq!(info_log(log), "0:12(3): error: syntax error");
  }

  #[test]
  fn empty_info_log() {
    assert_eq!(info_log(Vec::new()), "");
  }
}
