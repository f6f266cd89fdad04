//! Backend interfaces.
//!
//! A backend is the glue between the typed resources of this crate ([`Texture`], [`Framebuffer`],
//! [`Program`], [`Tess`]) and an actual graphics API. Every backend trait is `unsafe` to
//! implement: the rest of the crate trusts the backend to create the objects it was asked for,
//! with the sizes and formats it was asked for, and to release them when their representation is
//! dropped.
//!
//! Representations (the `*Repr` associated types) own their GPU objects. Dropping a
//! representation must release the object it refers to; that is how resources get freed on
//! teardown and on error paths alike.
//!
//! [`Texture`]: crate::texture::Texture
//! [`Framebuffer`]: crate::framebuffer::Framebuffer
//! [`Program`]: crate::shader::Program
//! [`Tess`]: crate::tess::Tess

pub mod framebuffer;
pub mod pipeline;
pub mod shader;
pub mod tess;
pub mod texture;

use self::pipeline::PipelineBackend;

/// Umbrella trait gathering all the backend features the renderer needs.
///
/// You never implement this trait directly: any type implementing [`PipelineBackend`] (and thus
/// all of its super traits) gets it for free.
pub trait Backend: PipelineBackend {}

impl<B> Backend for B where B: PipelineBackend {}
