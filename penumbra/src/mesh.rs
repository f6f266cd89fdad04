//! User-supplied triangle meshes.
//!
//! Parsing model files is not this crate’s business: callers hand over already-structured
//! [`MeshData`], which is validated and then uploaded as a [`Mesh`]. Validation happens before any
//! GPU work so that a bad mesh never replaces a good one.

use std::error;
use std::fmt;

use crate::backend::tess::TessBackend;
use crate::context::GraphicsContext;
use crate::geometry::SceneVertex;
use crate::tess::{Mode, Tess, TessError};

/// Default material color of a mesh.
pub const DEFAULT_COLOR: [f32; 3] = [0.8, 0.8, 0.8];
/// Default specular shininess of a mesh.
pub const DEFAULT_SHININESS: f32 = 64.;

/// CPU-side triangle mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
  pub positions: Vec<[f32; 3]>,
  pub normals: Vec<[f32; 3]>,
  /// Optional; missing texture coordinates default to zero.
  pub uvs: Vec<[f32; 2]>,
  pub indices: Option<Vec<u32>>,
  pub color: [f32; 3],
  pub shininess: f32,
}

impl MeshData {
  pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>) -> Self {
    MeshData {
      positions,
      normals,
      uvs: Vec::new(),
      indices: None,
      color: DEFAULT_COLOR,
      shininess: DEFAULT_SHININESS,
    }
  }

  pub fn with_uvs(self, uvs: Vec<[f32; 2]>) -> Self {
    MeshData { uvs, ..self }
  }

  pub fn with_indices(self, indices: Vec<u32>) -> Self {
    MeshData {
      indices: Some(indices),
      ..self
    }
  }

  pub fn with_material(self, color: [f32; 3], shininess: f32) -> Self {
    MeshData {
      color,
      shininess,
      ..self
    }
  }

  /// Check the mesh is a well-formed triangle list.
  pub fn validate(&self) -> Result<(), MeshError> {
    let vertex_count = self.positions.len();

    if vertex_count == 0 {
      return Err(MeshError::Empty);
    }

    if self.normals.len() != vertex_count {
      return Err(MeshError::LengthMismatch {
        attribute: "normals",
        expected: vertex_count,
        found: self.normals.len(),
      });
    }

    if !self.uvs.is_empty() && self.uvs.len() != vertex_count {
      return Err(MeshError::LengthMismatch {
        attribute: "uvs",
        expected: vertex_count,
        found: self.uvs.len(),
      });
    }

    let corners = match self.indices {
      Some(ref indices) => {
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
          return Err(MeshError::IndexOutOfBounds {
            index,
            vertex_count,
          });
        }

        indices.len()
      }

      None => vertex_count,
    };

    if corners == 0 || corners % 3 != 0 {
      return Err(MeshError::NotTriangles(corners));
    }

    if !self.shininess.is_finite() || self.shininess <= 0. {
      return Err(MeshError::InvalidShininess(self.shininess));
    }

    Ok(())
  }

  /// Interleave the attributes into scene vertices.
  pub fn vertices(&self) -> Vec<SceneVertex> {
    self
      .positions
      .iter()
      .zip(&self.normals)
      .enumerate()
      .map(|(i, (&position, &normal))| {
        let uv = self.uvs.get(i).copied().unwrap_or([0., 0.]);
        SceneVertex::new(position, normal, uv)
      })
      .collect()
  }
}

/// Reasons a mesh is rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
  /// No vertex at all.
  Empty,
  /// An attribute doesn’t have one entry per vertex.
  LengthMismatch {
    attribute: &'static str,
    expected: usize,
    found: usize,
  },
  /// An index points past the last vertex.
  IndexOutOfBounds { index: u32, vertex_count: usize },
  /// The number of triangle corners is not a (non-zero) multiple of three.
  NotTriangles(usize),
  /// Shininess must be strictly positive.
  InvalidShininess(f32),
  /// The tessellation could not be created.
  Tess(TessError),
}

impl fmt::Display for MeshError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      MeshError::Empty => f.write_str("empty mesh"),
      MeshError::LengthMismatch {
        attribute,
        expected,
        found,
      } => write!(
        f,
        "mesh has {} {} for {} vertices",
        found, attribute, expected
      ),
      MeshError::IndexOutOfBounds {
        index,
        vertex_count,
      } => write!(
        f,
        "mesh index {} out of bounds (vertex count is {})",
        index, vertex_count
      ),
      MeshError::NotTriangles(n) => write!(f, "{} corners don’t make a triangle list", n),
      MeshError::InvalidShininess(s) => write!(f, "invalid shininess: {}", s),
      MeshError::Tess(ref e) => write!(f, "cannot upload mesh: {}", e),
    }
  }
}

impl error::Error for MeshError {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match self {
      MeshError::Tess(e) => Some(e),
      _ => None,
    }
  }
}

impl From<TessError> for MeshError {
  fn from(e: TessError) -> Self {
    MeshError::Tess(e)
  }
}

/// A mesh uploaded to the GPU with its material.
pub struct Mesh<B>
where
  B: TessBackend,
{
  tess: Tess<B>,
  color: [f32; 3],
  shininess: f32,
}

impl<B> Mesh<B>
where
  B: TessBackend,
{
  /// Validate and upload a mesh.
  pub fn upload<C>(ctx: &mut C, data: &MeshData) -> Result<Self, MeshError>
  where
    C: GraphicsContext<Backend = B>,
  {
    data.validate()?;

    let vertices = data.vertices();
    let tess = Tess::new(
      ctx,
      &vertices,
      data.indices.as_deref(),
      Mode::Triangle,
    )?;

    Ok(Mesh {
      tess,
      color: data.color,
      shininess: data.shininess,
    })
  }

  pub fn tess(&self) -> &Tess<B> {
    &self.tess
  }

  pub fn color(&self) -> [f32; 3] {
    self.color
  }

  pub fn shininess(&self) -> f32 {
    self.shininess
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn triangle() -> MeshData {
    MeshData::new(
      vec![[0., 0., 0.], [1., 0., 0.], [0., 1., 0.]],
      vec![[0., 0., 1.]; 3],
    )
  }

  #[test]
  fn valid_triangle() {
    assert_eq!(triangle().validate(), Ok(()));
    assert_eq!(triangle().with_indices(vec![0, 1, 2, 2, 1, 0]).validate(), Ok(()));
  }

  #[test]
  fn missing_uvs_default_to_zero() {
    let vertices = triangle().vertices();

    assert_eq!(vertices.len(), 3);
    assert!(vertices.iter().all(|v| v.uv == [0., 0.]));
  }

  #[test]
  fn rejected_meshes() {
    assert_eq!(
      MeshData::new(Vec::new(), Vec::new()).validate(),
      Err(MeshError::Empty)
    );

    let mut bad_normals = triangle();
    bad_normals.normals.pop();
    assert_eq!(
      bad_normals.validate(),
      Err(MeshError::LengthMismatch {
        attribute: "normals",
        expected: 3,
        found: 2
      })
    );

    assert_eq!(
      triangle().with_indices(vec![0, 1, 3]).validate(),
      Err(MeshError::IndexOutOfBounds {
        index: 3,
        vertex_count: 3
      })
    );

    assert_eq!(
      triangle().with_indices(vec![0, 1]).validate(),
      Err(MeshError::NotTriangles(2))
    );

    assert_eq!(
      triangle().with_material([1., 0., 0.], 0.).validate(),
      Err(MeshError::InvalidShininess(0.))
    );
  }
}
