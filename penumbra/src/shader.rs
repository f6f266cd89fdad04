//! Shader stages, programs and uniforms.
//!
//! A [`Program`] is made of a vertex and a fragment stage. Uniforms are addressed by name and
//! looked up lazily: the first update of a name asks the backend for its location and the result
//! is cached, including when the uniform turns out to be inactive. Updating an inactive uniform
//! is a no-op (logged once, at debug level) so that render passes can share uniform-setting code
//! even when some of their shaders optimize a uniform away.

use std::collections::HashMap;
use std::error;
use std::fmt;

use cgmath::{Matrix3, Matrix4, Vector2, Vector3};

use crate::backend::shader::ShaderBackend;
use crate::context::GraphicsContext;

/// A shader stage type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StageType {
  /// Vertex shader.
  VertexShader,
  /// Fragment shader.
  FragmentShader,
}

impl fmt::Display for StageType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      StageType::VertexShader => f.write_str("vertex shader"),
      StageType::FragmentShader => f.write_str("fragment shader"),
    }
  }
}

/// Error raised while compiling a shader stage.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StageError {
  /// The driver rejected the source; carries the compiler log.
  CompilationFailed(StageType, String),
  /// The backend cannot create stages of this type.
  UnsupportedType(StageType),
}

impl fmt::Display for StageError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      StageError::CompilationFailed(ref ty, ref log) => {
        write!(f, "{} does not compile: {}", ty, log)
      }

      StageError::UnsupportedType(ty) => write!(f, "unsupported {}", ty),
    }
  }
}

impl error::Error for StageError {}

impl From<StageError> for ProgramError {
  fn from(e: StageError) -> Self {
    ProgramError::StageError(e)
  }
}

/// Error raised while building a [`Program`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgramError {
  /// The backend could not create the program object.
  CreationFailed(String),
  /// One of the stages failed.
  StageError(StageError),
  /// The stages do not link together; carries the linker log.
  LinkFailed(String),
}

impl fmt::Display for ProgramError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      ProgramError::CreationFailed(ref e) => write!(f, "cannot create shader program: {}", e),

      ProgramError::StageError(ref e) => write!(f, "shader program stage error: {}", e),

      ProgramError::LinkFailed(ref log) => write!(f, "shader program does not link: {}", log),
    }
  }
}

impl error::Error for ProgramError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      ProgramError::StageError(e) => Some(e),
      _ => None,
    }
  }
}

/// Uniform lookups that did not go as planned.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UniformWarning {
  /// The program has no such active uniform; the GLSL compiler may have optimized it out.
  Inactive(String),
}

impl UniformWarning {
  pub fn inactive<N>(name: N) -> Self
  where
    N: Into<String>,
  {
    UniformWarning::Inactive(name.into())
  }
}

impl fmt::Display for UniformWarning {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      UniformWarning::Inactive(ref name) => write!(f, "uniform {} is not active", name),
    }
  }
}

/// Value of a uniform.
///
/// Matrices are stored column-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
  /// `float`.
  Float(f32),
  /// `int`, also used for `sampler2D` texture units.
  Int(i32),
  /// `bool`.
  Bool(bool),
  /// `vec2`.
  Vec2([f32; 2]),
  /// `vec3`.
  Vec3([f32; 3]),
  /// `mat3`.
  Mat3([[f32; 3]; 3]),
  /// `mat4`.
  Mat4([[f32; 4]; 4]),
}

impl From<f32> for UniformValue {
  fn from(x: f32) -> Self {
    UniformValue::Float(x)
  }
}

impl From<i32> for UniformValue {
  fn from(x: i32) -> Self {
    UniformValue::Int(x)
  }
}

impl From<bool> for UniformValue {
  fn from(x: bool) -> Self {
    UniformValue::Bool(x)
  }
}

impl From<[f32; 2]> for UniformValue {
  fn from(x: [f32; 2]) -> Self {
    UniformValue::Vec2(x)
  }
}

impl From<[f32; 3]> for UniformValue {
  fn from(x: [f32; 3]) -> Self {
    UniformValue::Vec3(x)
  }
}

impl From<Vector2<f32>> for UniformValue {
  fn from(x: Vector2<f32>) -> Self {
    UniformValue::Vec2(x.into())
  }
}

impl From<Vector3<f32>> for UniformValue {
  fn from(x: Vector3<f32>) -> Self {
    UniformValue::Vec3(x.into())
  }
}

impl From<Matrix3<f32>> for UniformValue {
  fn from(x: Matrix3<f32>) -> Self {
    UniformValue::Mat3(x.into())
  }
}

impl From<Matrix4<f32>> for UniformValue {
  fn from(x: Matrix4<f32>) -> Self {
    UniformValue::Mat4(x.into())
  }
}

/// A linked shader program.
///
/// Uniforms can only be updated while the program is in use, that is, through the
/// [`ProgramInterface`](crate::pipeline::ProgramInterface) handed out by
/// [`Pipeline::shade`](crate::pipeline::Pipeline::shade).
pub struct Program<B>
where
  B: ShaderBackend,
{
  pub(crate) repr: B::ProgramRepr,
  uniforms: HashMap<String, Option<B::UniformRepr>>,
}

impl<B> Program<B>
where
  B: ShaderBackend,
{
  /// Compile and link a program from its vertex and fragment sources.
  pub fn from_sources<C>(ctx: &mut C, vertex: &str, fragment: &str) -> Result<Self, ProgramError>
  where
    C: GraphicsContext<Backend = B>,
  {
    unsafe {
      let backend = ctx.backend();
      let vs = backend.new_stage(StageType::VertexShader, vertex)?;
      let fs = backend.new_stage(StageType::FragmentShader, fragment)?;
      let repr = backend.new_program(&vs, &fs)?;

      Ok(Program {
        repr,
        uniforms: HashMap::new(),
      })
    }
  }

  /// Is a uniform active in this program?
  pub fn is_active(&mut self, name: &str) -> bool {
    self.lookup(name);
    matches!(self.uniforms.get(name), Some(Some(_)))
  }

  /// Update a uniform.
  ///
  /// Returns whether the uniform was active. Must only be called while the program is in use.
  pub(crate) fn update(&mut self, name: &str, value: &UniformValue) -> bool {
    self.lookup(name);

    match self.uniforms.get(name) {
      Some(Some(uniform)) => {
        unsafe { B::set_uniform(&mut self.repr, uniform, value) };
        true
      }

      _ => false,
    }
  }

  fn lookup(&mut self, name: &str) {
    if !self.uniforms.contains_key(name) {
      let location = unsafe { B::uniform_location(&self.repr, name) };

      if location.is_none() {
        log::debug!("{}", UniformWarning::inactive(name));
      }

      self.uniforms.insert(name.to_owned(), location);
    }
  }
}
