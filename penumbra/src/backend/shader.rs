//! Shader backend interface.
//!
//! This interface defines the low-level API shaders must implement to be usable.

use crate::shader::{ProgramError, StageError, StageType, UniformValue};

/// Shader stages, programs and uniforms.
pub unsafe trait ShaderBackend {
  /// Backend representation of a compiled shader stage.
  type StageRepr;

  /// Backend representation of a linked shader program.
  type ProgramRepr;

  /// Backend representation of a uniform location.
  type UniformRepr;

  /// Compile a shader stage from its source.
  unsafe fn new_stage(&mut self, ty: StageType, src: &str) -> Result<Self::StageRepr, StageError>;

  /// Link a vertex and a fragment stage into a program.
  ///
  /// Stages can be dropped once the program is linked.
  unsafe fn new_program(
    &mut self,
    vertex: &Self::StageRepr,
    fragment: &Self::StageRepr,
  ) -> Result<Self::ProgramRepr, ProgramError>;

  /// Look up the location of an active uniform.
  ///
  /// Returns [`None`] if the program has no active uniform with that name. Unused uniforms are
  /// typically optimized away by shader compilers and end up inactive too.
  unsafe fn uniform_location(
    program: &Self::ProgramRepr,
    name: &str,
  ) -> Option<Self::UniformRepr>;

  /// Update a uniform of a program.
  ///
  /// The program is always in use when this is called.
  unsafe fn set_uniform(
    program: &mut Self::ProgramRepr,
    uniform: &Self::UniformRepr,
    value: &UniformValue,
  );
}
