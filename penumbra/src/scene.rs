//! Scene layout.

use cgmath::{InnerSpace, Rad, Vector3};

use crate::geometry::Primitive;
use crate::transform::{BaseTransform, SceneObjectInstance};

/// An object of the scene: a static primitive and where it stands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObject {
  pub primitive: Primitive,
  pub transform: BaseTransform,
}

impl SceneObject {
  pub fn new(primitive: Primitive, transform: BaseTransform) -> Self {
    SceneObject {
      primitive,
      transform,
    }
  }

  pub fn instance(&self) -> SceneObjectInstance {
    SceneObjectInstance::from(&self.transform)
  }
}

/// Static objects drawn by every pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
  objects: Vec<SceneObject>,
}

impl Scene {
  pub fn new(objects: Vec<SceneObject>) -> Self {
    Scene { objects }
  }

  /// A floor and three cubes casting shadows on it and on each other.
  pub fn shadow_demo() -> Self {
    // the angle is in radians, not degrees
    let tilted = BaseTransform::translated(Vector3::new(-1., 0., 2.))
      .rotated(Vector3::new(1., 0., 1.).normalize(), Rad(60.))
      .scaled(0.25);

    Scene::new(vec![
      SceneObject::new(Primitive::Plane, BaseTransform::identity()),
      SceneObject::new(
        Primitive::Cube,
        BaseTransform::translated(Vector3::new(0., 1.5, 0.)).scaled(0.5),
      ),
      SceneObject::new(
        Primitive::Cube,
        BaseTransform::translated(Vector3::new(2., 0., 1.)).scaled(0.5),
      ),
      SceneObject::new(Primitive::Cube, tilted),
    ])
  }

  pub fn objects(&self) -> &[SceneObject] {
    &self.objects
  }

  pub fn push(&mut self, object: SceneObject) {
    self.objects.push(object);
  }
}

impl Default for Scene {
  fn default() -> Self {
    Scene::shadow_demo()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shadow_demo_layout() {
    let scene = Scene::shadow_demo();
    let objects = scene.objects();

    assert_eq!(objects.len(), 4);
    assert_eq!(objects[0].primitive, Primitive::Plane);
    assert!(objects[1..].iter().all(|o| o.primitive == Primitive::Cube));
    assert_eq!(objects[1].transform.translation, Vector3::new(0., 1.5, 0.));
  }
}
