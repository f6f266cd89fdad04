//! # A shadow-mapped forward renderer with camera motion blur
//!
//! penumbra renders a small lit scene (a floor and a few cubes, plus an optional user mesh) with
//! three cooperating passes:
//!
//! - A **shadow pass** renders the depth of the scene from a directional light, through an
//!   orthographic projection, into a fixed-resolution depth map.
//! - A **lighting pass** shades the scene with Phong or Blinn-Phong lighting, optionally gamma
//!   corrected, and looks the shadow map up to decide which fragments are in the shadow.
//! - A **motion blur** post-process reconstructs the world position of every display fragment,
//!   reprojects it with the view-projection matrix of the previous frame and averages a few taps
//!   of the lit scene along the resulting screen-space velocity.
//!
//! [`renderer::ForwardRenderer`] sequences these passes and owns every GPU resource they need.
//!
//! # Backends and contexts
//!
//! penumbra doesn’t know anything about the graphics API it runs on. Every resource type is
//! parametric over a backend type `B` implementing the traits of the [`backend`] module, and every
//! resource is created through a [`context::GraphicsContext`], which hands out that backend. The
//! penumbra-gl crate provides an OpenGL 3.3 backend; penumbra-glfw provides a window and a
//! context for it.
//!
//! All resources are owned: dropping a texture, a framebuffer, a shader program or a tessellation
//! releases the GPU objects behind it.
//!
//! # Threading
//!
//! Graphics contexts are bound to the thread that created them. The only work done elsewhere is
//! asset decoding (see [`loader`]); uploading the decoded assets always happens on the rendering
//! thread.

pub mod backend;
pub mod camera;
pub mod context;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod loader;
pub mod material;
pub mod mesh;
pub mod motion_blur;
pub mod pipeline;
pub mod pixel;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod shadow;
pub mod tess;
pub mod texture;
pub mod transform;
