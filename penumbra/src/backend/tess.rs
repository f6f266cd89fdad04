//! Tessellation backend interface.
//!
//! This interface defines the low-level API tessellations must implement to be usable.

use crate::tess::{Mode, TessError, VertexAttribDesc};

/// Raw description of a tessellation to create.
///
/// Vertices are interleaved; every attribute is made of `f32` components.
#[derive(Debug)]
pub struct TessDesc<'a> {
  /// Interleaved vertex bytes.
  pub vertices: &'a [u8],
  /// Size in bytes of a single vertex.
  pub stride: usize,
  /// Number of vertices in `vertices`.
  pub vertex_count: usize,
  /// Vertex attributes.
  pub attribs: &'a [VertexAttribDesc],
  /// Optional index buffer. All indices are known to be in bounds.
  pub indices: Option<&'a [u32]>,
  /// Primitive mode.
  pub mode: Mode,
}

/// Tessellation support.
pub unsafe trait TessBackend {
  /// Backend representation of a tessellation.
  type TessRepr;

  /// Upload vertex (and optionally index) data into a new tessellation.
  unsafe fn new_tess(&mut self, desc: TessDesc<'_>) -> Result<Self::TessRepr, TessError>;
}
