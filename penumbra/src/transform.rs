//! Per-frame and per-object transforms.

use cgmath::{Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

/// Camera transforms of a frame.
///
/// Computed once at the beginning of a frame and read by every pass of that frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTransform {
  pub view: Matrix4<f32>,
  pub projection: Matrix4<f32>,
  /// `projection * view`.
  pub view_projection: Matrix4<f32>,
}

impl FrameTransform {
  pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
    FrameTransform {
      view,
      projection,
      view_projection: projection * view,
    }
  }
}

/// Translate / rotate / scale composition of a scene object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseTransform {
  pub translation: Vector3<f32>,
  /// Rotation axis (normalized) and angle.
  pub rotation: Option<(Vector3<f32>, Rad<f32>)>,
  pub scale: Vector3<f32>,
}

impl BaseTransform {
  pub fn identity() -> Self {
    BaseTransform {
      translation: Vector3::new(0., 0., 0.),
      rotation: None,
      scale: Vector3::new(1., 1., 1.),
    }
  }

  pub fn translated(translation: Vector3<f32>) -> Self {
    BaseTransform {
      translation,
      ..Self::identity()
    }
  }

  pub fn rotated(self, axis: Vector3<f32>, angle: Rad<f32>) -> Self {
    BaseTransform {
      rotation: Some((axis, angle)),
      ..self
    }
  }

  pub fn scaled(self, factor: f32) -> Self {
    BaseTransform {
      scale: Vector3::new(factor, factor, factor),
      ..self
    }
  }

  pub fn scaled_nonuniform(self, scale: Vector3<f32>) -> Self {
    BaseTransform { scale, ..self }
  }

  /// `translation * rotation * scale`.
  pub fn model_matrix(&self) -> Matrix4<f32> {
    let t = Matrix4::from_translation(self.translation);
    let r = self
      .rotation
      .map_or_else(Matrix4::identity, |(axis, angle)| {
        Matrix4::from_axis_angle(axis, angle)
      });
    let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);

    t * r * s
  }
}

impl Default for BaseTransform {
  fn default() -> Self {
    Self::identity()
  }
}

/// Transforms of one object for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObjectInstance {
  pub model: Matrix4<f32>,
  pub normal: Matrix3<f32>,
}

impl SceneObjectInstance {
  /// Derive the instance of a model matrix; the normal matrix is always recomputed from it.
  pub fn new(model: Matrix4<f32>) -> Self {
    SceneObjectInstance {
      model,
      normal: normal_matrix(&model),
    }
  }
}

impl From<&BaseTransform> for SceneObjectInstance {
  fn from(transform: &BaseTransform) -> Self {
    SceneObjectInstance::new(transform.model_matrix())
  }
}

/// Inverse-transpose of the upper-left 3×3 block of a model matrix.
///
/// A singular block (e.g. zero scale) has no inverse; its plain upper 3×3 is returned instead.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
  let upper = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());

  upper
    .invert()
    .map(|inv| inv.transpose())
    .unwrap_or(upper)
}
