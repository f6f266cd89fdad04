//! OpenGL backends.
//!
//! This crate exports [OpenGL](https://www.khronos.org/opengl/) backends for penumbra. The only
//! backend so far is [`GL33`], which requires an OpenGL 3.3 core context to be current on the
//! thread creating it. Loading the OpenGL symbols is the job of the windowing crate (see
//! penumbra-glfw).

pub mod gl33;

pub use gl33::GL33;
