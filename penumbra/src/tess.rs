//! Tessellations.
//!
//! A tessellation is a GPU-side set of vertices, optionally indexed, that gets drawn in a given
//! primitive mode.

use std::error;
use std::fmt;
use std::mem;
use std::slice;

use crate::backend::tess::{TessBackend, TessDesc};
use crate::context::GraphicsContext;

/// Primitive mode.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
  /// Every three vertices form a triangle.
  Triangle,
  /// A strip of triangles, each new vertex forming a triangle with the two previous ones.
  TriangleStrip,
  /// A fan of triangles, all sharing the first vertex.
  TriangleFan,
}

/// Description of a single vertex attribute.
///
/// All attributes are made of `f32` components.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct VertexAttribDesc {
  /// Attribute location in the vertex shader.
  pub index: u32,
  /// Number of `f32` components (1 to 4).
  pub components: u32,
  /// Offset in bytes of the attribute in the vertex.
  pub offset: usize,
}

/// Vertex types that can be uploaded into a [`Tess`].
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` and only made of `f32` fields, and [`Vertex::ATTRIBS`] must
/// describe those fields exactly.
pub unsafe trait Vertex: Copy {
  /// Attributes of the vertex.
  const ATTRIBS: &'static [VertexAttribDesc];
}

/// Errors that might occur when creating tessellations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TessError {
  /// The backend failed to create the tessellation.
  CannotCreate(String),
  /// No vertex was provided.
  NoVertices,
  /// An index points past the last vertex.
  IndexOutOfBounds {
    /// Faulty index.
    index: u32,
    /// Number of vertices.
    vertex_count: usize,
  },
}

impl fmt::Display for TessError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      TessError::CannotCreate(ref s) => write!(f, "cannot create tessellation: {}", s),
      TessError::NoVertices => f.write_str("no vertices"),
      TessError::IndexOutOfBounds {
        index,
        vertex_count,
      } => write!(
        f,
        "index {} out of bounds (vertex count is {})",
        index, vertex_count
      ),
    }
  }
}

impl error::Error for TessError {}

/// A GPU tessellation.
pub struct Tess<B>
where
  B: TessBackend,
{
  pub(crate) repr: B::TessRepr,
  vertex_count: usize,
  index_count: Option<usize>,
  mode: Mode,
}

impl<B> Tess<B>
where
  B: TessBackend,
{
  /// Upload vertices, and optionally indices, into a new tessellation.
  pub fn new<C, V>(
    ctx: &mut C,
    vertices: &[V],
    indices: Option<&[u32]>,
    mode: Mode,
  ) -> Result<Self, TessError>
  where
    C: GraphicsContext<Backend = B>,
    V: Vertex,
  {
    if vertices.is_empty() {
      return Err(TessError::NoVertices);
    }

    let vertex_count = vertices.len();

    if let Some(indices) = indices {
      if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(TessError::IndexOutOfBounds {
          index,
          vertex_count,
        });
      }
    }

    // Vertex guarantees a plain f32 layout without padding
    let bytes = unsafe {
      slice::from_raw_parts(
        vertices.as_ptr() as *const u8,
        mem::size_of_val(vertices),
      )
    };

    let desc = TessDesc {
      vertices: bytes,
      stride: mem::size_of::<V>(),
      vertex_count,
      attribs: V::ATTRIBS,
      indices,
      mode,
    };

    unsafe {
      ctx.backend().new_tess(desc).map(|repr| Tess {
        repr,
        vertex_count,
        index_count: indices.map(<[u32]>::len),
        mode,
      })
    }
  }

  /// Number of vertices.
  pub fn vertex_count(&self) -> usize {
    self.vertex_count
  }

  /// Number of vertices a draw call renders (indices if indexed, vertices otherwise).
  pub fn render_count(&self) -> usize {
    self.index_count.unwrap_or(self.vertex_count)
  }

  /// Primitive mode.
  pub fn mode(&self) -> Mode {
    self.mode
  }
}
