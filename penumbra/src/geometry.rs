//! Static scene geometry.
//!
//! Every pass draws the same tessellations, so every vertex shader must agree on the
//! [`SceneVertex`] layout: position at location 0, normal at 1, texture coordinates at 2.

use std::mem;

use crate::backend::tess::TessBackend;
use crate::context::GraphicsContext;
use crate::tess::{Mode, Tess, TessError, Vertex, VertexAttribDesc};

/// Vertex of every scene primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct SceneVertex {
  pub position: [f32; 3],
  pub normal: [f32; 3],
  pub uv: [f32; 2],
}

impl SceneVertex {
  pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
    SceneVertex {
      position,
      normal,
      uv,
    }
  }
}

unsafe impl Vertex for SceneVertex {
  const ATTRIBS: &'static [VertexAttribDesc] = &[
    VertexAttribDesc {
      index: 0,
      components: 3,
      offset: 0,
    },
    VertexAttribDesc {
      index: 1,
      components: 3,
      offset: 3 * mem::size_of::<f32>(),
    },
    VertexAttribDesc {
      index: 2,
      components: 2,
      offset: 6 * mem::size_of::<f32>(),
    },
  ];
}

/// Vertex of the full-screen quad.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct QuadVertex {
  pub position: [f32; 2],
  pub uv: [f32; 2],
}

unsafe impl Vertex for QuadVertex {
  const ATTRIBS: &'static [VertexAttribDesc] = &[
    VertexAttribDesc {
      index: 0,
      components: 2,
      offset: 0,
    },
    VertexAttribDesc {
      index: 1,
      components: 2,
      offset: 2 * mem::size_of::<f32>(),
    },
  ];
}

const UP: [f32; 3] = [0., 1., 0.];

/// 50×50 floor at y = -0.5; texture coordinates repeat 25 times.
pub const PLANE_VERTICES: [SceneVertex; 6] = [
  SceneVertex::new([25., -0.5, 25.], UP, [25., 0.]),
  SceneVertex::new([-25., -0.5, 25.], UP, [0., 0.]),
  SceneVertex::new([-25., -0.5, -25.], UP, [0., 25.]),
  SceneVertex::new([25., -0.5, 25.], UP, [25., 0.]),
  SceneVertex::new([-25., -0.5, -25.], UP, [0., 25.]),
  SceneVertex::new([25., -0.5, -25.], UP, [25., 25.]),
];

const BACK: [f32; 3] = [0., 0., -1.];
const FRONT: [f32; 3] = [0., 0., 1.];
const LEFT: [f32; 3] = [-1., 0., 0.];
const RIGHT: [f32; 3] = [1., 0., 0.];
const DOWN: [f32; 3] = [0., -1., 0.];

/// Unit cube spanning [-1; 1]³, counter-clockwise faces.
pub const CUBE_VERTICES: [SceneVertex; 36] = [
  // back
  SceneVertex::new([-1., -1., -1.], BACK, [0., 0.]),
  SceneVertex::new([1., 1., -1.], BACK, [1., 1.]),
  SceneVertex::new([1., -1., -1.], BACK, [1., 0.]),
  SceneVertex::new([1., 1., -1.], BACK, [1., 1.]),
  SceneVertex::new([-1., -1., -1.], BACK, [0., 0.]),
  SceneVertex::new([-1., 1., -1.], BACK, [0., 1.]),
  // front
  SceneVertex::new([-1., -1., 1.], FRONT, [0., 0.]),
  SceneVertex::new([1., -1., 1.], FRONT, [1., 0.]),
  SceneVertex::new([1., 1., 1.], FRONT, [1., 1.]),
  SceneVertex::new([1., 1., 1.], FRONT, [1., 1.]),
  SceneVertex::new([-1., 1., 1.], FRONT, [0., 1.]),
  SceneVertex::new([-1., -1., 1.], FRONT, [0., 0.]),
  // left
  SceneVertex::new([-1., 1., 1.], LEFT, [1., 0.]),
  SceneVertex::new([-1., 1., -1.], LEFT, [1., 1.]),
  SceneVertex::new([-1., -1., -1.], LEFT, [0., 1.]),
  SceneVertex::new([-1., -1., -1.], LEFT, [0., 1.]),
  SceneVertex::new([-1., -1., 1.], LEFT, [0., 0.]),
  SceneVertex::new([-1., 1., 1.], LEFT, [1., 0.]),
  // right
  SceneVertex::new([1., 1., 1.], RIGHT, [1., 0.]),
  SceneVertex::new([1., -1., -1.], RIGHT, [0., 1.]),
  SceneVertex::new([1., 1., -1.], RIGHT, [1., 1.]),
  SceneVertex::new([1., -1., -1.], RIGHT, [0., 1.]),
  SceneVertex::new([1., 1., 1.], RIGHT, [1., 0.]),
  SceneVertex::new([1., -1., 1.], RIGHT, [0., 0.]),
  // bottom
  SceneVertex::new([-1., -1., -1.], DOWN, [0., 1.]),
  SceneVertex::new([1., -1., -1.], DOWN, [1., 1.]),
  SceneVertex::new([1., -1., 1.], DOWN, [1., 0.]),
  SceneVertex::new([1., -1., 1.], DOWN, [1., 0.]),
  SceneVertex::new([-1., -1., 1.], DOWN, [0., 0.]),
  SceneVertex::new([-1., -1., -1.], DOWN, [0., 1.]),
  // top
  SceneVertex::new([-1., 1., -1.], UP, [0., 1.]),
  SceneVertex::new([1., 1., 1.], UP, [1., 0.]),
  SceneVertex::new([1., 1., -1.], UP, [1., 1.]),
  SceneVertex::new([1., 1., 1.], UP, [1., 0.]),
  SceneVertex::new([-1., 1., -1.], UP, [0., 1.]),
  SceneVertex::new([-1., 1., 1.], UP, [0., 0.]),
];

/// Two triangles covering the whole normalized device coordinates square.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
  QuadVertex {
    position: [-1., 1.],
    uv: [0., 1.],
  },
  QuadVertex {
    position: [-1., -1.],
    uv: [0., 0.],
  },
  QuadVertex {
    position: [1., -1.],
    uv: [1., 0.],
  },
  QuadVertex {
    position: [-1., 1.],
    uv: [0., 1.],
  },
  QuadVertex {
    position: [1., -1.],
    uv: [1., 0.],
  },
  QuadVertex {
    position: [1., 1.],
    uv: [1., 1.],
  },
];

/// Which static primitive a scene object is drawn with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Primitive {
  Plane,
  Cube,
}

/// Tessellations of the static primitives, built once and shared by every pass.
pub struct SceneGeometry<B>
where
  B: TessBackend,
{
  plane: Tess<B>,
  cube: Tess<B>,
}

impl<B> SceneGeometry<B>
where
  B: TessBackend,
{
  pub fn new<C>(ctx: &mut C) -> Result<Self, TessError>
  where
    C: GraphicsContext<Backend = B>,
  {
    let plane = Tess::new(ctx, &PLANE_VERTICES, None, Mode::Triangle)?;
    let cube = Tess::new(ctx, &CUBE_VERTICES, None, Mode::Triangle)?;

    Ok(SceneGeometry { plane, cube })
  }

  pub fn get(&self, primitive: Primitive) -> &Tess<B> {
    match primitive {
      Primitive::Plane => &self.plane,
      Primitive::Cube => &self.cube,
    }
  }
}
